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

//! Wire headers of the chunk-stream protocol. The structs are hand-derived
//! prost messages, byte-compatible with the equivalent .proto definitions.

use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;

// All stream operations share one code; the request status selects open,
// chunk delivery or close.
#[repr(i8)]
#[derive(Debug, IntoPrimitive, FromPrimitive, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ShuffleCode {
    #[num_enum(default)]
    Undefined = 0,

    ReadChunks = 1,
}

impl fmt::Display for ShuffleCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpenStreamRequest {
    #[prost(string, tag = "1")]
    pub shuffle_key: String,

    #[prost(string, tag = "2")]
    pub file_path: String,

    #[prost(int32, tag = "3")]
    pub init_chunk_index: i32,

    // The file length the client expects; the worker rejects the open when
    // its committed metadata disagrees.
    #[prost(int64, tag = "4")]
    pub file_length: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamHandleProto {
    #[prost(int64, tag = "1")]
    pub stream_id: i64,

    #[prost(int32, tag = "2")]
    pub num_chunks: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChunkFetchRequest {
    #[prost(int64, tag = "1")]
    pub stream_id: i64,

    #[prost(int32, tag = "2")]
    pub chunk_index: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CloseStreamRequest {
    #[prost(int64, tag = "1")]
    pub stream_id: i64,
}
