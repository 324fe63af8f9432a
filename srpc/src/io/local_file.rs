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

use crate::{err_box, CommonResult};
use bytes::BytesMut;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

// Positional reads over one local file. The handler side uses it to serve
// file segments; callers are expected to serialize access.
pub struct LocalFile {
    path: String,
    file: File,
    len: i64,
}

impl LocalFile {
    pub fn open(path: impl Into<String>) -> CommonResult<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let len = file.metadata()?.len() as i64;

        Ok(Self { path, file, len })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn len(&self) -> i64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // Read exactly len bytes starting at off.
    pub fn read_full(&mut self, off: i64, len: usize) -> CommonResult<BytesMut> {
        if off < 0 || off + len as i64 > self.len {
            return err_box!(
                "Read range [{}, {}) exceeds file {} length {}",
                off,
                off + len as i64,
                self.path,
                self.len
            );
        }

        self.file.seek(SeekFrom::Start(off as u64))?;
        let mut buf = BytesMut::zeroed(len);
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}
