// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

// log_dir "stdout" (or empty) logs to standard output, "stderr" to standard
// error, anything else is a directory for daily-rolling files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConf {
    pub level: String,
    pub log_dir: String,
    pub file_name: String,
    pub max_log_files: usize,
}

impl Default for LogConf {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            log_dir: "stdout".to_string(),
            file_name: "squall".to_string(),
            max_log_files: 10,
        }
    }
}

static GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// One-shot logging bootstrap. The first init wins, later calls are no-ops,
/// so libraries and tests can both call it safely.
pub struct Logger;

impl Logger {
    pub fn init(conf: LogConf) {
        GUARD.get_or_init(|| Self::setup(conf));
    }

    pub fn default() {
        Self::init(LogConf::default())
    }

    fn setup(conf: LogConf) -> WorkerGuard {
        let level = Level::from_str(&conf.level).unwrap_or(Level::INFO);
        let (writer, guard) = Self::writer_for(&conf);

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_target(false)
            .with_writer(writer)
            .init();

        guard
    }

    fn writer_for(conf: &LogConf) -> (NonBlocking, WorkerGuard) {
        match conf.log_dir.to_ascii_lowercase().as_str() {
            "" | "stdout" => tracing_appender::non_blocking(io::stdout()),
            "stderr" => tracing_appender::non_blocking(io::stderr()),
            dir => {
                let appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .filename_prefix(&conf.file_name)
                    .max_log_files(conf.max_log_files)
                    .build(dir)
                    .expect("initializing rolling file appender failed");
                tracing_appender::non_blocking(appender)
            }
        }
    }
}
