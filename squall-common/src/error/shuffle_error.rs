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
use prost::{DecodeError, EncodeError};
use srpc::error::ErrorExt;
use srpc::io::IOError;
use srpc::CommonError;
use std::io;
use thiserror::Error;

// Kind codes the shuffle errors travel under. decode() must rebuild the
// variant matching the kind, a worker-side PBDecode stays a PBDecode on the
// client.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
pub enum ErrorKind {
    IO = 1,
    Timeout = 2,
    PBDecode = 3,
    PBEncode = 4,
    StreamOpenFailed = 5,
    ChunkFetchFailed = 6,
    BadMagic = 7,
    BadLength = 8,
    ChecksumMismatch = 9,
    FrameCorrupted = 10,
    InvalidArgument = 11,
    EpochExhausted = 12,
    ReaderClosed = 13,
    Unsupported = 14,
    ReaderDrained = 15,

    #[num_enum(default)]
    Common = 10000,
}

#[derive(Debug, Error)]
pub enum ShuffleError {
    #[error("{0}")]
    IO(#[from] io::Error),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("protobuf decode failed: {0}")]
    PBDecode(String),

    #[error("protobuf encode failed: {0}")]
    PBEncode(String),

    // Opening a chunk stream against one piece failed: transport failure,
    // unknown shuffle key or file, corrupt chunk metadata.
    #[error("stream open failed: {0}")]
    StreamOpenFailed(String),

    // Pulling one chunk failed mid stream.
    #[error("{0}")]
    ChunkFetchFailed(String),

    #[error("frame does not start with the magic prefix")]
    BadMagic,

    // A frame header carries impossible lengths or the input is truncated.
    #[error("bad frame length: {0}")]
    BadLength(String),

    #[error("{0}")]
    ChecksumMismatch(String),

    // The compressed payload cannot be decompressed to the declared size.
    #[error("frame corrupted: {0}")]
    FrameCorrupted(String),

    // Caller error, rejected at construction.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // All pieces were tried and none could serve the epoch.
    #[error("epoch exhausted: {0}")]
    EpochExhausted(String),

    // next() after close().
    #[error("reader has been closed")]
    ReaderClosed,

    // next() after the epoch was fully delivered.
    #[error("reader is drained, every chunk was already delivered")]
    ReaderDrained,

    #[error("{0} is not implemented")]
    Unsupported(String),

    #[error("{0}")]
    Common(String),
}

impl ShuffleError {
    pub fn common(msg: impl Into<String>) -> Self {
        Self::Common(msg.into())
    }

    pub fn stream_open_failed(cause: impl Into<String>) -> Self {
        Self::StreamOpenFailed(cause.into())
    }

    pub fn chunk_fetch_failed(chunk_index: i32, cause: impl AsRef<str>) -> Self {
        Self::ChunkFetchFailed(format!(
            "chunk {} fetch failed: {}",
            chunk_index,
            cause.as_ref()
        ))
    }

    pub fn bad_magic() -> Self {
        Self::BadMagic
    }

    pub fn bad_length(msg: impl Into<String>) -> Self {
        Self::BadLength(msg.into())
    }

    pub fn checksum_mismatch(expected: u32, actual: u32) -> Self {
        Self::ChecksumMismatch(format!(
            "frame checksum mismatch, expected {:#x}, actual {:#x}",
            expected, actual
        ))
    }

    pub fn frame_corrupted(msg: impl Into<String>) -> Self {
        Self::FrameCorrupted(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn epoch_exhausted(msg: impl Into<String>) -> Self {
        Self::EpochExhausted(msg.into())
    }

    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported(feature.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShuffleError::IO(_) => ErrorKind::IO,
            ShuffleError::Timeout(_) => ErrorKind::Timeout,
            ShuffleError::PBDecode(_) => ErrorKind::PBDecode,
            ShuffleError::PBEncode(_) => ErrorKind::PBEncode,
            ShuffleError::StreamOpenFailed(_) => ErrorKind::StreamOpenFailed,
            ShuffleError::ChunkFetchFailed(_) => ErrorKind::ChunkFetchFailed,
            ShuffleError::BadMagic => ErrorKind::BadMagic,
            ShuffleError::BadLength(_) => ErrorKind::BadLength,
            ShuffleError::ChecksumMismatch(_) => ErrorKind::ChecksumMismatch,
            ShuffleError::FrameCorrupted(_) => ErrorKind::FrameCorrupted,
            ShuffleError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ShuffleError::EpochExhausted(_) => ErrorKind::EpochExhausted,
            ShuffleError::ReaderClosed => ErrorKind::ReaderClosed,
            ShuffleError::ReaderDrained => ErrorKind::ReaderDrained,
            ShuffleError::Unsupported(_) => ErrorKind::Unsupported,
            ShuffleError::Common(_) => ErrorKind::Common,
        }
    }

    // The codec failure modes share the chunk-failure handling in the reader.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::BadMagic
                | ErrorKind::BadLength
                | ErrorKind::ChecksumMismatch
                | ErrorKind::FrameCorrupted
        )
    }
}

impl From<String> for ShuffleError {
    fn from(value: String) -> Self {
        Self::Common(value)
    }
}

impl From<CommonError> for ShuffleError {
    fn from(value: CommonError) -> Self {
        Self::Common(value.to_string())
    }
}

impl From<IOError> for ShuffleError {
    fn from(value: IOError) -> Self {
        match value {
            IOError::Io(e) => Self::IO(e),
            IOError::Timeout(msg) => Self::Timeout(msg),
            other => Self::IO(io::Error::other(other.to_string())),
        }
    }
}

impl From<DecodeError> for ShuffleError {
    fn from(value: DecodeError) -> Self {
        Self::PBDecode(value.to_string())
    }
}

impl From<EncodeError> for ShuffleError {
    fn from(value: EncodeError) -> Self {
        Self::PBEncode(value.to_string())
    }
}

impl ErrorExt for ShuffleError {
    fn kind_code(&self) -> i32 {
        self.kind().into()
    }

    // Every kind maps back to its own variant; the message payload is the
    // displayed text of the sending side.
    fn from_wire(kind: i32, message: String) -> Self {
        match ErrorKind::from(kind) {
            ErrorKind::IO => ShuffleError::IO(io::Error::other(message)),
            ErrorKind::Timeout => ShuffleError::Timeout(message),
            ErrorKind::PBDecode => ShuffleError::PBDecode(message),
            ErrorKind::PBEncode => ShuffleError::PBEncode(message),
            ErrorKind::StreamOpenFailed => ShuffleError::StreamOpenFailed(message),
            ErrorKind::ChunkFetchFailed => ShuffleError::ChunkFetchFailed(message),
            ErrorKind::BadMagic => ShuffleError::BadMagic,
            ErrorKind::BadLength => ShuffleError::BadLength(message),
            ErrorKind::ChecksumMismatch => ShuffleError::ChecksumMismatch(message),
            ErrorKind::FrameCorrupted => ShuffleError::FrameCorrupted(message),
            ErrorKind::InvalidArgument => ShuffleError::InvalidArgument(message),
            ErrorKind::EpochExhausted => ShuffleError::EpochExhausted(message),
            ErrorKind::ReaderClosed => ShuffleError::ReaderClosed,
            ErrorKind::ReaderDrained => ShuffleError::ReaderDrained,
            ErrorKind::Unsupported => ShuffleError::Unsupported(message),
            ErrorKind::Common => ShuffleError::Common(message),
        }
    }
}
