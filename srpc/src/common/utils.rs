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

use crate::CommonResult;
use rand::Rng;
use serde::de::DeserializeOwned;
use std::time::Duration;
use std::{env, fs, thread};
use uuid::Uuid;

pub struct Utils;

impl Utils {
    // A process-unique 64-bit request id.
    pub fn req_id() -> i64 {
        Uuid::new_v4().as_u128() as i64
    }

    pub fn rand_id() -> u64 {
        rand::thread_rng().gen()
    }

    // Random lowercase ascii, used by the test fixtures for record payloads.
    pub fn rand_str(len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
    }

    pub fn sleep(time_ms: u64) {
        thread::sleep(Duration::from_millis(time_ms));
    }

    pub fn cpu_nums() -> usize {
        thread::available_parallelism()
            .map(|x| x.get())
            .unwrap_or(0)
    }

    pub fn worker_threads(min: usize) -> usize {
        (Self::cpu_nums() * 2).max(min)
    }

    pub fn temp_file() -> String {
        let mut path = env::temp_dir();
        path.push(format!("temp-{}", Self::rand_id()));
        format!("{}", path.display())
    }

    pub fn read_toml_conf<T: DeserializeOwned>(path: &str) -> CommonResult<T> {
        let content = fs::read_to_string(path)?;
        let conf = toml::from_str(&content)?;
        Ok(conf)
    }
}
