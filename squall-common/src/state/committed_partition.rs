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

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use srpc::io::net::NetAddr;
use std::fmt::{Display, Formatter};

// How the worker persisted the partition. Only disk mode exists today.
#[repr(i8)]
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, IntoPrimitive, FromPrimitive, Serialize, Deserialize,
)]
pub enum ShuffleMode {
    #[num_enum(default)]
    Disk = 0,
}

/// One physical replica of a reduce partition, produced by the control plane
/// at shuffle commit. Immutable once created; the ordering of the replicas
/// handed to a reader defines its failover priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedPartitionInfo {
    pub epoch_id: i32,
    pub reduce_id: i32,
    pub hostname: String,
    pub port: u16,
    pub mode: ShuffleMode,

    // Opaque identifier of the partition file on the worker.
    pub file_path: String,
    pub file_length: i64,
}

impl CommittedPartitionInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        epoch_id: i32,
        reduce_id: i32,
        hostname: impl Into<String>,
        port: u16,
        mode: ShuffleMode,
        file_path: impl Into<String>,
        file_length: i64,
    ) -> Self {
        Self {
            epoch_id,
            reduce_id,
            hostname: hostname.into(),
            port,
            mode,
            file_path: file_path.into(),
            file_length,
        }
    }

    pub fn connect_addr(&self) -> NetAddr {
        NetAddr::new(self.hostname.clone(), self.port)
    }

    // The key a worker uses to locate the partition file.
    pub fn locate_key(shuffle_key: &str, file_path: &str) -> String {
        format!("{}-{}", shuffle_key, file_path)
    }
}

impl Display for CommittedPartitionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "epoch_id = {}, reduce_id = {}, addr = {}:{}, file = {}({} bytes)",
            self.epoch_id, self.reduce_id, self.hostname, self.port, self.file_path, self.file_length
        )
    }
}
