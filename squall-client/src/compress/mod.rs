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

//! Framed block codec. A frame is:
//!
//! ```text
//! offset 0  : 8 bytes  MAGIC
//! offset 8  : 1 byte   (method << 7) | (level & 0x7F)
//! offset 9  : 4 bytes  compressed_length (LE)
//! offset 13 : 4 bytes  original_length (LE)
//! offset 17 : 4 bytes  xxhash32(original bytes, DEFAULT_SEED) (LE)
//! offset 21 : payload
//! ```

mod lz4_compressor;
pub use self::lz4_compressor::Lz4Compressor;

mod lz4_decompressor;
pub use self::lz4_decompressor::Lz4Decompressor;

// Pinned to the lz4-java block stream constants so frames interoperate with
// workers running the stock Java codec.
pub const MAGIC: &[u8; 8] = b"LZ4Block";

pub const MAGIC_LENGTH: usize = 8;

// magic + method/level byte + compressed length + original length + checksum.
pub const HEADER_LENGTH: usize = MAGIC_LENGTH + 1 + 4 + 4 + 4;

pub const COMPRESSION_METHOD_RAW: u8 = 0;
pub const COMPRESSION_METHOD_CSS: u8 = 1;

pub const COMPRESSION_LEVEL_BASE: u32 = 10;

pub const DEFAULT_SEED: u32 = 0x9747B28C;

// Level is derived from the block size; blocks up to 1 << COMPRESSION_LEVEL_BASE
// map to level 0.
pub fn compression_level(block_size: usize) -> u8 {
    let size = (block_size.max(1) as u32).saturating_sub(1);
    let level = 32i32 - size.leading_zeros() as i32 - COMPRESSION_LEVEL_BASE as i32;
    level.max(0) as u8
}

#[cfg(test)]
mod tests {
    use crate::compress::compression_level;

    #[test]
    fn level_from_block_size() {
        assert_eq!(compression_level(1), 0);
        assert_eq!(compression_level(1024), 0);
        assert_eq!(compression_level(64 * 1024), 6);
        assert_eq!(compression_level(4 * 1024 * 1024), 12);
    }
}
