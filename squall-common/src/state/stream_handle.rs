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

use crate::proto::StreamHandleProto;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The worker's acknowledgement that a streaming fetch is in progress.
/// Valid until the stream is closed or the transport drops.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StreamHandle {
    pub stream_id: i64,
    pub num_chunks: i32,
}

impl StreamHandle {
    pub fn new(stream_id: i64, num_chunks: i32) -> Self {
        Self {
            stream_id,
            num_chunks,
        }
    }
}

impl From<StreamHandleProto> for StreamHandle {
    fn from(value: StreamHandleProto) -> Self {
        Self::new(value.stream_id, value.num_chunks)
    }
}

impl From<StreamHandle> for StreamHandleProto {
    fn from(value: StreamHandle) -> Self {
        StreamHandleProto {
            stream_id: value.stream_id,
            num_chunks: value.num_chunks,
        }
    }
}

impl Display for StreamHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "stream_id = {}, num_chunks = {}",
            self.stream_id, self.num_chunks
        )
    }
}
