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

use crate::compress::{
    COMPRESSION_METHOD_RAW, DEFAULT_SEED, HEADER_LENGTH, MAGIC, MAGIC_LENGTH,
};
use bytes::BytesMut;
use lz4_flex::block;
use squall_common::conf::ClientConf;
use squall_common::error::ShuffleError;
use squall_common::ShuffleResult;
use xxhash_rust::xxh32::Xxh32;

/// Framed block decoder. Every failure mode is fatal for the block, the
/// caller handles it like a chunk-fetch failure.
pub struct Lz4Decompressor {
    max_original_size: usize,
}

impl Lz4Decompressor {
    pub fn new(conf: &ClientConf) -> Self {
        Self::with_limit(conf.max_frame_original_size)
    }

    pub fn with_limit(max_original_size: usize) -> Self {
        Self { max_original_size }
    }

    /// Decode one frame from the head of src. Returns the original bytes and
    /// the number of consumed input bytes.
    pub fn decode(&self, src: &[u8]) -> ShuffleResult<(BytesMut, usize)> {
        if src.len() < HEADER_LENGTH {
            return Err(ShuffleError::bad_length(format!(
                "Frame truncated, {} bytes cannot hold a {} byte header",
                src.len(),
                HEADER_LENGTH
            )));
        }

        if &src[..MAGIC_LENGTH] != MAGIC {
            return Err(ShuffleError::bad_magic());
        }

        let method = src[MAGIC_LENGTH] >> 7;
        let compressed_length = Self::read_int_le(src, MAGIC_LENGTH + 1) as usize;
        let original_length = Self::read_int_le(src, MAGIC_LENGTH + 5) as usize;
        let check = Self::read_int_le(src, MAGIC_LENGTH + 9);

        if original_length > self.max_original_size {
            return Err(ShuffleError::bad_length(format!(
                "Original length {} exceeds the limit {}",
                original_length, self.max_original_size
            )));
        }
        if compressed_length > block::get_maximum_output_size(self.max_original_size) {
            return Err(ShuffleError::bad_length(format!(
                "Compressed length {} exceeds the limit for {} original bytes",
                compressed_length, self.max_original_size
            )));
        }
        if src.len() < HEADER_LENGTH + compressed_length {
            return Err(ShuffleError::bad_length(format!(
                "Frame truncated, payload needs {} bytes, {} remain",
                compressed_length,
                src.len() - HEADER_LENGTH
            )));
        }

        let payload = &src[HEADER_LENGTH..HEADER_LENGTH + compressed_length];
        let output = if method == COMPRESSION_METHOD_RAW {
            if compressed_length != original_length {
                return Err(ShuffleError::bad_length(format!(
                    "Raw frame lengths disagree, compressed {} != original {}",
                    compressed_length, original_length
                )));
            }
            BytesMut::from(payload)
        } else {
            let mut out = BytesMut::zeroed(original_length);
            let written = block::decompress_into(payload, &mut out)
                .map_err(|e| ShuffleError::frame_corrupted(format!("lz4 decompress: {}", e)))?;
            if written != original_length {
                return Err(ShuffleError::frame_corrupted(format!(
                    "Decompressed {} bytes, header declared {}",
                    written, original_length
                )));
            }
            out
        };

        let mut hasher = Xxh32::new(DEFAULT_SEED);
        hasher.update(&output);
        let actual = hasher.digest();
        if actual != check {
            return Err(ShuffleError::checksum_mismatch(check, actual));
        }

        Ok((output, HEADER_LENGTH + compressed_length))
    }

    /// Decode a run of consecutive frames, e.g. one fetched chunk.
    pub fn decode_all(&self, src: &[u8]) -> ShuffleResult<BytesMut> {
        let mut out = BytesMut::with_capacity(src.len());
        let mut pos = 0;
        while pos < src.len() {
            let (block, consumed) = self.decode(&src[pos..])?;
            out.extend_from_slice(&block);
            pos += consumed;
        }
        Ok(out)
    }

    fn read_int_le(buf: &[u8], off: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&buf[off..off + 4]);
        u32::from_le_bytes(bytes)
    }
}
