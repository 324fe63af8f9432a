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
    compression_level, COMPRESSION_METHOD_CSS, COMPRESSION_METHOD_RAW, DEFAULT_SEED,
    HEADER_LENGTH, MAGIC, MAGIC_LENGTH,
};
use lz4_flex::block;
use squall_common::conf::ClientConf;
use xxhash_rust::xxh32::Xxh32;

/// Framed block encoder. The internal buffer is reused between blocks and
/// grows when an input cannot fit the worst-case LZ4 output. Single-owner,
/// callers serialize access.
pub struct Lz4Compressor {
    level: u8,
    test_mode: bool,
    buf: Vec<u8>,
    total_size: usize,
}

impl Lz4Compressor {
    pub fn new(conf: &ClientConf) -> Self {
        Self::with_block_size(conf.push_buffer_size, conf.compression_test_mode)
    }

    pub fn with_block_size(block_size: usize, test_mode: bool) -> Self {
        let mut compressor = Self {
            level: compression_level(block_size),
            test_mode,
            buf: Vec::new(),
            total_size: 0,
        };
        compressor.init_buffer(block_size);
        compressor
    }

    fn init_buffer(&mut self, size: usize) {
        self.buf = vec![0u8; HEADER_LENGTH + block::get_maximum_output_size(size)];
        self.buf[..MAGIC_LENGTH].copy_from_slice(MAGIC);
    }

    /// Encode one block. The result is available through compressed_data()
    /// until the next call.
    pub fn compress(&mut self, data: &[u8]) {
        let length = data.len();

        let mut hasher = Xxh32::new(DEFAULT_SEED);
        hasher.update(data);
        let check = hasher.digest();

        // lz4 worst case output is length + length / 255 + 16.
        if self.buf.len() - HEADER_LENGTH < length + length / 255 + 16 {
            self.init_buffer(length);
        }

        let compressed = block::compress_into(data, &mut self.buf[HEADER_LENGTH..]).ok();
        let (method, compressed_length) = match compressed {
            Some(n) if n < length && !self.test_mode => (COMPRESSION_METHOD_CSS, n),
            _ => {
                // Incompressible input or test mode, store the bytes verbatim.
                self.buf[HEADER_LENGTH..HEADER_LENGTH + length].copy_from_slice(data);
                (COMPRESSION_METHOD_RAW, length)
            }
        };

        self.buf[MAGIC_LENGTH] = (method << 7) | (self.level & 0x7F);
        Self::write_int_le(compressed_length as u32, &mut self.buf, MAGIC_LENGTH + 1);
        Self::write_int_le(length as u32, &mut self.buf, MAGIC_LENGTH + 5);
        Self::write_int_le(check, &mut self.buf, MAGIC_LENGTH + 9);

        self.total_size = HEADER_LENGTH + compressed_length;
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn compressed_data(&self) -> &[u8] {
        &self.buf[..self.total_size]
    }

    fn write_int_le(value: u32, buf: &mut [u8], off: usize) {
        buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }
}
