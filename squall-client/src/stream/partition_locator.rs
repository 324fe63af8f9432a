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

use dashmap::DashMap;
use squall_common::error::ShuffleError;
use squall_common::state::CommittedPartitionInfo;
use squall_common::ShuffleResult;

/// Control-plane collaborator. The caller resolves the ordered replica list
/// of its reduce partition and hands it to the reader; the reader itself
/// never talks to the control plane.
pub trait PartitionLocator: Send + Sync {
    fn committed_partitions(
        &self,
        shuffle_key: &str,
        reduce_id: i32,
    ) -> ShuffleResult<Vec<CommittedPartitionInfo>>;
}

// In-memory registry, for embedding and tests.
#[derive(Default)]
pub struct StaticPartitionLocator {
    map: DashMap<(String, i32), Vec<CommittedPartitionInfo>>,
}

impl StaticPartitionLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        shuffle_key: impl Into<String>,
        reduce_id: i32,
        pieces: Vec<CommittedPartitionInfo>,
    ) {
        self.map.insert((shuffle_key.into(), reduce_id), pieces);
    }
}

impl PartitionLocator for StaticPartitionLocator {
    fn committed_partitions(
        &self,
        shuffle_key: &str,
        reduce_id: i32,
    ) -> ShuffleResult<Vec<CommittedPartitionInfo>> {
        match self.map.get(&(shuffle_key.to_string(), reduce_id)) {
            Some(v) => Ok(v.value().clone()),
            None => Err(ShuffleError::common(format!(
                "No committed partitions for shuffle {} reduce {}",
                shuffle_key, reduce_id
            ))),
        }
    }
}
