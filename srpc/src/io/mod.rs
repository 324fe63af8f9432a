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

use std::io;
use std::num::ParseIntError;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;

pub mod net;

mod retry;
pub use self::retry::LimitedRetry;

mod local_file;
pub use self::local_file::LocalFile;

pub type IOResult<T> = Result<T, IOError>;

/// Transport failures, split by what the callers react to: a connect that
/// never got through, a timed out exchange, a dropped connection, or a peer
/// that violated the framing.
#[derive(Debug, Error)]
pub enum IOError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connect {addr} failed after {attempts} attempts: {cause}")]
    ConnectFailed {
        addr: String,
        attempts: u32,
        cause: String,
    },

    #[error("connection {0} is closed")]
    Closed(String),

    // Framing violations: impossible lengths, replies that do not echo the
    // request ids.
    #[error("{0}")]
    Protocol(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for IOError {
    fn from(value: String) -> Self {
        Self::Other(value)
    }
}

impl From<Elapsed> for IOError {
    fn from(value: Elapsed) -> Self {
        Self::Timeout(value.to_string())
    }
}

impl From<JoinError> for IOError {
    fn from(value: JoinError) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<ParseIntError> for IOError {
    fn from(value: ParseIntError) -> Self {
        Self::Other(value.to_string())
    }
}
