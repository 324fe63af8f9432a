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

use crate::common::Utils;
use crate::io::LimitedRetry;
use crate::runtime::Runtime;
use std::time::Duration;

/// Transport-side knobs of one client process. Retry here only covers
/// establishing a connection; failed exchanges are judged by the shuffle
/// reader, which owns the piece-level retry and failover policy.
#[derive(Debug, Clone)]
pub struct ClientConf {
    pub io_threads: usize,
    pub worker_threads: usize,
    pub buffer_size: usize,
    pub close_idle: bool,

    // Capacity of the request queue in front of the writer future.
    pub message_size: usize,

    pub conn_retry_max_times: u32,
    pub conn_retry_wait_ms: u64,

    // conn_timeout_ms bounds one connect; rpc_timeout_ms one plain exchange;
    // data_timeout_ms one data-carrying exchange.
    pub conn_timeout_ms: u64,
    pub rpc_timeout_ms: u64,
    pub data_timeout_ms: u64,

    // How many connections one worker address is multiplexed over.
    pub conn_size: usize,
}

impl ClientConf {
    pub fn conn_retry_policy(&self) -> LimitedRetry {
        LimitedRetry::new(
            self.conn_retry_max_times,
            Duration::from_millis(self.conn_retry_wait_ms),
        )
    }

    pub fn create_runtime(&self) -> Runtime {
        Runtime::new("rpc-client", self.io_threads, self.worker_threads)
    }
}

impl Default for ClientConf {
    fn default() -> Self {
        ClientConf {
            io_threads: 16,
            worker_threads: Utils::worker_threads(16),
            buffer_size: 128 * 1024,
            close_idle: false,
            message_size: 16,

            conn_retry_max_times: 3,
            conn_retry_wait_ms: 300,

            conn_timeout_ms: 30 * 1000,
            rpc_timeout_ms: 2 * 60 * 1000,
            data_timeout_ms: 5 * 60 * 1000,

            conn_size: 1,
        }
    }
}
