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

use crate::stream::remote_epoch_reader::RemoteEpochReader;
use crate::ClientContext;
use bytes::BytesMut;
use squall_common::error::ShuffleError;
use squall_common::state::CommittedPartitionInfo;
use squall_common::ShuffleResult;
use srpc::runtime::Runtime;
use std::sync::Arc;

use self::EpochReader::RemoteDisk;

/// The closed set of reader kinds over one epoch. Only the remote disk
/// reader ships today; a co-located fast path would join as a new variant.
#[derive(Debug)]
pub enum EpochReader {
    RemoteDisk(RemoteEpochReader),
}

impl EpochReader {
    pub fn create(
        context: Arc<ClientContext>,
        shuffle_key: impl Into<String>,
        pieces: Vec<CommittedPartitionInfo>,
    ) -> ShuffleResult<Self> {
        if context.conf.local_chunk_fetch_enabled {
            return Err(ShuffleError::unsupported("local chunk fetch"));
        }

        let reader = RemoteEpochReader::new(context, shuffle_key, pieces)?;
        Ok(RemoteDisk(reader))
    }

    pub fn has_next(&self) -> bool {
        match self {
            RemoteDisk(r) => r.has_next(),
        }
    }

    pub async fn next(&mut self) -> ShuffleResult<BytesMut> {
        match self {
            RemoteDisk(r) => r.next().await,
        }
    }

    pub async fn close(&mut self) {
        match self {
            RemoteDisk(r) => r.close().await,
        }
    }

    // Blocking entry points for synchronous callers.
    pub fn blocking_next(&mut self, rt: &Runtime) -> ShuffleResult<BytesMut> {
        rt.block_on(self.next())
    }

    pub fn blocking_close(&mut self, rt: &Runtime) {
        rt.block_on(self.close())
    }
}
