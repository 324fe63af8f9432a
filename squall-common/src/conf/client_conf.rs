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

use crate::ShuffleResult;
use serde::{Deserialize, Serialize};
use srpc::client::ClientConf as RpcConf;
use srpc::common::{ByteUnit, DurationUnit, Utils};
use srpc::runtime::Runtime;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConf {
    pub io_threads: usize,
    pub worker_threads: usize,

    // Maximum fetch attempts charged to one piece before it is abandoned.
    pub chunk_fetch_retry_max_times: u32,

    #[serde(skip)]
    pub chunk_fetch_retry_wait: Duration,
    #[serde(alias = "chunk_fetch_retry_wait")]
    pub chunk_fetch_retry_wait_str: String,

    // Off for the remote reader; turning it on selects a co-located fast
    // path that this client does not ship.
    pub local_chunk_fetch_enabled: bool,

    // When enabled the reader decodes every chunk through the framed block
    // codec before yielding it.
    pub compression_enabled: bool,

    // Forces the compressor to emit RAW frames.
    pub compression_test_mode: bool,

    // Block size the push side hands to the compressor.
    #[serde(skip)]
    pub push_buffer_size: usize,
    #[serde(alias = "push_buffer_size")]
    pub push_buffer_size_str: String,

    // Upper bound on the original length of one decoded frame.
    #[serde(skip)]
    pub max_frame_original_size: usize,
    #[serde(alias = "max_frame_original_size")]
    pub max_frame_original_size_str: String,

    // Connection establishment retry policy.
    pub conn_retry_max_times: u32,
    pub conn_retry_wait_ms: u64,

    // Timeout configuration of one request.
    pub conn_timeout_ms: u64,
    pub rpc_timeout_ms: u64,
    pub data_timeout_ms: u64,

    // How many connections can be shared per worker.
    pub conn_size: usize,
}

impl ClientConf {
    pub fn with_file(path: impl AsRef<str>) -> ShuffleResult<Self> {
        let mut conf: ClientConf = Utils::read_toml_conf(path.as_ref())?;
        conf.init()?;

        Ok(conf)
    }

    // Parse the string-typed fields into their numeric forms.
    pub fn init(&mut self) -> ShuffleResult<()> {
        self.chunk_fetch_retry_wait =
            DurationUnit::from_str(&self.chunk_fetch_retry_wait_str)?.as_duration();
        self.push_buffer_size = ByteUnit::from_str(&self.push_buffer_size_str)?.as_byte() as usize;
        self.max_frame_original_size =
            ByteUnit::from_str(&self.max_frame_original_size_str)?.as_byte() as usize;

        Ok(())
    }

    pub fn to_rpc_conf(&self) -> RpcConf {
        RpcConf {
            io_threads: self.io_threads,
            worker_threads: self.worker_threads,
            conn_retry_max_times: self.conn_retry_max_times,
            conn_retry_wait_ms: self.conn_retry_wait_ms,
            conn_timeout_ms: self.conn_timeout_ms,
            rpc_timeout_ms: self.rpc_timeout_ms,
            data_timeout_ms: self.data_timeout_ms,
            conn_size: self.conn_size,
            ..Default::default()
        }
    }

    pub fn create_runtime(&self) -> Runtime {
        Runtime::new("squall-client", self.io_threads, self.worker_threads)
    }
}

impl Default for ClientConf {
    fn default() -> Self {
        Self {
            io_threads: 16,
            worker_threads: Utils::worker_threads(16),

            chunk_fetch_retry_max_times: 3,

            chunk_fetch_retry_wait: Duration::from_millis(10),
            chunk_fetch_retry_wait_str: "10ms".to_string(),

            local_chunk_fetch_enabled: false,

            compression_enabled: true,
            compression_test_mode: false,

            push_buffer_size: 64 * 1024,
            push_buffer_size_str: "64KB".to_string(),

            max_frame_original_size: 16 * 1024 * 1024,
            max_frame_original_size_str: "16MB".to_string(),

            conn_retry_max_times: 3,
            conn_retry_wait_ms: 300,

            conn_timeout_ms: 30 * 1000,
            rpc_timeout_ms: 2 * 60 * 1000,
            data_timeout_ms: 5 * 60 * 1000,

            conn_size: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::conf::ClientConf;
    use std::time::Duration;

    #[test]
    fn init_parses_strings() {
        let mut conf = ClientConf {
            chunk_fetch_retry_wait_str: "5ms".to_string(),
            push_buffer_size_str: "32KB".to_string(),
            ..Default::default()
        };
        conf.init().unwrap();

        assert_eq!(conf.chunk_fetch_retry_wait, Duration::from_millis(5));
        assert_eq!(conf.push_buffer_size, 32 * 1024);
        assert_eq!(conf.max_frame_original_size, 16 * 1024 * 1024);
    }
}
