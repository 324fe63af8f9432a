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

use crate::compress::Lz4Decompressor;
use crate::stream::StreamClient;
use crate::ClientContext;
use bytes::BytesMut;
use log::warn;
use squall_common::error::ShuffleError;
use squall_common::state::{CommittedPartitionInfo, StreamHandle};
use squall_common::ShuffleResult;
use srpc::common::Utils;
use srpc::ternary;
use std::sync::Arc;
use std::time::Duration;

// One open stream against the current piece, with its request bookkeeping.
struct PieceStream {
    client: StreamClient,
    handle: StreamHandle,
    req_id: i64,
    seq_id: i32,
}

impl PieceStream {
    fn next_seq_id(&mut self) -> i32 {
        self.seq_id += 1;
        self.seq_id
    }
}

/// Streams one reduce partition from its committed replicas.
///
/// The replicas carry identical logical content and their order defines the
/// failover priority. A fetch failure is retried against the same piece from
/// the failed chunk (fresh stream, constant wait between attempts); a piece
/// whose stream cannot be opened, or whose failure budget is spent, is
/// abandoned and the next replica is scanned from chunk 0.
pub struct RemoteEpochReader {
    context: Arc<ClientContext>,
    shuffle_key: String,
    pieces: Vec<CommittedPartitionInfo>,
    decompressor: Option<Lz4Decompressor>,

    retry_max: u32,
    retry_wait: Duration,

    piece_index: usize,
    next_chunk: i32,
    // Failed fetch attempts charged to the current piece. Never reset within
    // a piece: at most retry_max fetches of any chunk and retry_max + 1
    // stream opens can hit one piece.
    failures: u32,
    stream: Option<PieceStream>,

    drained: bool,
    closed: bool,
}

impl std::fmt::Debug for RemoteEpochReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEpochReader")
            .field("shuffle_key", &self.shuffle_key)
            .field("piece_index", &self.piece_index)
            .field("next_chunk", &self.next_chunk)
            .field("failures", &self.failures)
            .field("drained", &self.drained)
            .field("closed", &self.closed)
            .finish()
    }
}

impl RemoteEpochReader {
    pub fn new(
        context: Arc<ClientContext>,
        shuffle_key: impl Into<String>,
        pieces: Vec<CommittedPartitionInfo>,
    ) -> ShuffleResult<Self> {
        let shuffle_key = shuffle_key.into();
        if shuffle_key.is_empty() {
            return Err(ShuffleError::invalid_argument("shuffle key is empty"));
        }

        // Replicas hold the same bytes, so a zero-length priority piece means
        // the whole epoch is empty.
        let drained = pieces.first().map(|p| p.file_length == 0).unwrap_or(false);

        let conf = &context.conf;
        let retry_max = conf.chunk_fetch_retry_max_times.max(1);
        let retry_wait = conf.chunk_fetch_retry_wait;
        let decompressor = ternary!(
            conf.compression_enabled,
            Some(Lz4Decompressor::new(conf)),
            None
        );

        Ok(Self {
            context,
            shuffle_key,
            pieces,
            decompressor,
            retry_max,
            retry_wait,
            piece_index: 0,
            next_chunk: 0,
            failures: 0,
            stream: None,
            drained,
            closed: false,
        })
    }

    // True iff the current piece has more chunks or a later piece remains
    // untried. Local state only, no io.
    pub fn has_next(&self) -> bool {
        !self.closed && !self.drained && self.piece_index < self.pieces.len()
    }

    /// Return the next chunk of the epoch. Recovers from fetch and stream
    /// failures internally; the errors that surface are terminal.
    pub async fn next(&mut self) -> ShuffleResult<BytesMut> {
        if self.closed {
            return Err(ShuffleError::ReaderClosed);
        }
        if self.drained {
            return Err(ShuffleError::ReaderDrained);
        }

        let mut last_error: Option<ShuffleError> = None;
        loop {
            if self.piece_index >= self.pieces.len() {
                let cause = match last_error {
                    Some(e) => e.to_string(),
                    None => "no usable piece".to_string(),
                };
                return Err(ShuffleError::epoch_exhausted(format!(
                    "all {} pieces of shuffle {} failed, last error: {}",
                    self.pieces.len(),
                    self.shuffle_key,
                    cause
                )));
            }

            if self.stream.is_none() {
                match self.open_piece().await {
                    Ok(mut stream) => {
                        // A stream that cannot cover the cursor is corrupt
                        // metadata; the piece is unusable.
                        if stream.handle.num_chunks <= self.next_chunk {
                            let e = ShuffleError::stream_open_failed(format!(
                                "piece {} reports {} chunks, cursor at {}",
                                self.pieces[self.piece_index],
                                stream.handle.num_chunks,
                                self.next_chunk
                            ));
                            warn!("{}", e);
                            let seq_id = stream.next_seq_id();
                            stream
                                .client
                                .close_stream(&stream.handle, stream.req_id, seq_id)
                                .await;
                            last_error = Some(e);
                            self.fail_piece();
                            continue;
                        }
                        self.stream = Some(stream);
                    }

                    Err(e) => {
                        // Opens are not retried against the same piece; the
                        // retry budget governs chunk fetches only.
                        warn!(
                            "Open stream for piece {} of shuffle {} failed: {}",
                            self.pieces[self.piece_index], self.shuffle_key, e
                        );
                        last_error = Some(e);
                        self.fail_piece();
                        continue;
                    }
                }
            }

            match self.fetch_next().await {
                Ok(chunk) => {
                    self.next_chunk += 1;
                    let num_chunks = match &self.stream {
                        Some(s) => s.handle.num_chunks,
                        None => self.next_chunk,
                    };
                    if self.next_chunk >= num_chunks {
                        self.drained = true;
                        self.release_stream().await;
                    }
                    return Ok(chunk);
                }

                Err(e) => {
                    warn!(
                        "Fetch chunk {} from piece {} of shuffle {} failed (attempt {} of {}): {}",
                        self.next_chunk,
                        self.pieces[self.piece_index],
                        self.shuffle_key,
                        self.failures + 1,
                        self.retry_max,
                        e
                    );
                    self.release_stream().await;
                    self.failures += 1;
                    last_error = Some(e);

                    if self.failures >= self.retry_max {
                        self.fail_piece();
                    } else {
                        // Constant wait, then a fresh stream resumes at the
                        // failed chunk.
                        tokio::time::sleep(self.retry_wait).await;
                    }
                }
            }
        }
    }

    /// Idempotent; releases the open stream and leaves the reader inert.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.release_stream().await;
    }

    pub fn shuffle_key(&self) -> &str {
        &self.shuffle_key
    }

    pub fn piece_index(&self) -> usize {
        self.piece_index
    }

    async fn open_piece(&mut self) -> ShuffleResult<PieceStream> {
        let piece = &self.pieces[self.piece_index];
        let addr = piece.connect_addr();

        let client = match self.context.stream_client(&addr).await {
            Ok(v) => v,
            Err(e) => {
                return Err(ShuffleError::stream_open_failed(format!(
                    "connect {}: {}",
                    addr, e
                )))
            }
        };

        let req_id = Utils::req_id();
        let handle = client
            .open_stream(
                &self.shuffle_key,
                &piece.file_path,
                self.next_chunk,
                piece.file_length,
                req_id,
            )
            .await?;

        Ok(PieceStream {
            client,
            handle,
            req_id,
            seq_id: 0,
        })
    }

    async fn fetch_next(&mut self) -> ShuffleResult<BytesMut> {
        let stream = srpc::try_option_mut!(self.stream);
        let seq_id = stream.next_seq_id();
        let chunk = stream
            .client
            .fetch_chunk(&stream.handle, self.next_chunk, stream.req_id, seq_id)
            .await?;

        match &self.decompressor {
            None => Ok(chunk),
            // A codec failure is handled exactly like a fetch failure: the
            // piece is suspect.
            Some(d) => d.decode_all(&chunk),
        }
    }

    // Abandon the current piece and aim at the next replica. The next piece
    // is an independent copy, the scan restarts at chunk 0.
    fn fail_piece(&mut self) {
        self.piece_index += 1;
        self.next_chunk = 0;
        self.failures = 0;
        self.stream = None;
    }

    async fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let seq_id = stream.next_seq_id();
            stream
                .client
                .close_stream(&stream.handle, stream.req_id, seq_id)
                .await;
        }
    }
}
