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

use bytes::BytesMut;
use log::warn;
use squall_common::conf::ClientConf;
use squall_common::error::ShuffleError;
use squall_common::proto::{
    ChunkFetchRequest, CloseStreamRequest, OpenStreamRequest, ShuffleCode, StreamHandleProto,
};
use squall_common::state::StreamHandle;
use squall_common::ShuffleResult;
use srpc::client::RpcClient;
use srpc::message::{Builder, Message, RequestStatus};
use std::time::Duration;

/// Chunk-stream protocol client for one worker. All three operations ride on
/// the ReadChunks code; the request status selects the operation.
pub struct StreamClient {
    client: RpcClient,
    timeout: Duration,
}

impl StreamClient {
    pub fn new(client: RpcClient, conf: &ClientConf) -> Self {
        Self {
            client,
            timeout: Duration::from_millis(conf.data_timeout_ms),
        }
    }

    async fn rpc(&self, msg: Message) -> ShuffleResult<Message> {
        let rep_msg = self.client.timeout_rpc(self.timeout, msg).await?;
        rep_msg.check_error::<ShuffleError>()?;
        Ok(rep_msg)
    }

    // Register a stream over (shuffle_key, file_path) whose cursor starts at
    // init_chunk_index. The worker validates its chunk metadata against
    // file_length before answering.
    pub async fn open_stream(
        &self,
        shuffle_key: &str,
        file_path: &str,
        init_chunk_index: i32,
        file_length: i64,
        req_id: i64,
    ) -> ShuffleResult<StreamHandle> {
        let header = OpenStreamRequest {
            shuffle_key: shuffle_key.to_string(),
            file_path: file_path.to_string(),
            init_chunk_index,
            file_length,
        };

        let msg = Builder::new()
            .code(ShuffleCode::ReadChunks)
            .request(RequestStatus::Open)
            .req_id(req_id)
            .seq_id(0)
            .proto_header(header)
            .build();

        let rep = match self.rpc(msg).await {
            Ok(v) => v,
            Err(e) => return Err(ShuffleError::stream_open_failed(e.to_string())),
        };

        let rep_header: StreamHandleProto = rep
            .parse_header()
            .map_err(|e| ShuffleError::stream_open_failed(e.to_string()))?;

        Ok(StreamHandle::from(rep_header))
    }

    // Pull the chunk at chunk_index. The index must equal the server-side
    // cursor; the cursor advances after delivery.
    pub async fn fetch_chunk(
        &self,
        handle: &StreamHandle,
        chunk_index: i32,
        req_id: i64,
        seq_id: i32,
    ) -> ShuffleResult<BytesMut> {
        let header = ChunkFetchRequest {
            stream_id: handle.stream_id,
            chunk_index,
        };

        let msg = Builder::new()
            .code(ShuffleCode::ReadChunks)
            .request(RequestStatus::Running)
            .req_id(req_id)
            .seq_id(seq_id)
            .proto_header(header)
            .build();

        let rep = match self.rpc(msg).await {
            Ok(v) => v,
            Err(e) => return Err(ShuffleError::chunk_fetch_failed(chunk_index, e.to_string())),
        };

        Ok(rep.data)
    }

    // Release the server-side cursor. Idempotent and never fails, a close
    // that cannot reach the worker only loses server memory until its
    // stream sweep.
    pub async fn close_stream(&self, handle: &StreamHandle, req_id: i64, seq_id: i32) {
        let header = CloseStreamRequest {
            stream_id: handle.stream_id,
        };

        let msg = Builder::new()
            .code(ShuffleCode::ReadChunks)
            .request(RequestStatus::Complete)
            .req_id(req_id)
            .seq_id(seq_id)
            .proto_header(header)
            .build();

        if let Err(e) = self.rpc(msg).await {
            warn!("Close stream {} failed: {}", handle.stream_id, e);
        }
    }

    pub fn is_active(&self) -> bool {
        self.client.is_active()
    }
}
