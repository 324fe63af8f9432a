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

use bytes::{Buf, BufMut, BytesMut};
use std::fmt::{Display, Formatter};

/// A handler error crosses the rpc boundary as a kind code plus its display
/// message; the receiving side rebuilds the matching variant of its own
/// error type from exactly those two fields. Implementors therefore only
/// supply the kind mapping, the byte layout lives in [`WireError`].
pub trait ErrorExt: Display + Sized {
    fn kind_code(&self) -> i32;

    fn from_wire(kind: i32, message: String) -> Self;

    fn encode(&self) -> BytesMut {
        WireError::new(self.kind_code(), self.to_string()).to_bytes()
    }

    fn decode(bytes: BytesMut) -> Self {
        let wire = WireError::from_bytes(bytes);
        Self::from_wire(wire.kind, wire.message)
    }
}

/// On-wire form of a handler error: kind (4 bytes) + message length
/// (4 bytes) + message. Kind 0 is reserved for errors with no taxonomy.
#[derive(Debug)]
pub struct WireError {
    pub kind: i32,
    pub message: String,
}

impl WireError {
    pub fn new(kind: i32, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn to_bytes(&self) -> BytesMut {
        let msg = self.message.as_bytes();
        let mut bytes = BytesMut::with_capacity(8 + msg.len());
        bytes.put_i32(self.kind);
        bytes.put_u32(msg.len() as u32);
        bytes.put_slice(msg);
        bytes
    }

    // Tolerates truncated input, an unreadable error becomes kind 0 with
    // whatever text survived.
    pub fn from_bytes(mut bytes: BytesMut) -> Self {
        if bytes.len() < 8 {
            return Self::new(0, String::from_utf8_lossy(&bytes).to_string());
        }

        let kind = bytes.get_i32();
        let len = (bytes.get_u32() as usize).min(bytes.len());
        let message = String::from_utf8_lossy(&bytes[..len]).to_string();
        Self { kind, message }
    }
}

impl Display for WireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ErrorExt for WireError {
    fn kind_code(&self) -> i32 {
        self.kind
    }

    fn from_wire(kind: i32, message: String) -> Self {
        Self { kind, message }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::WireError;

    #[test]
    fn wire_round_trip() {
        let bytes = WireError::new(7, "bad replica").to_bytes();
        let back = WireError::from_bytes(bytes);
        assert_eq!(back.kind, 7);
        assert_eq!(back.message, "bad replica");
    }

    #[test]
    fn truncated_input() {
        let back = WireError::from_bytes(bytes::BytesMut::from("oops"));
        assert_eq!(back.kind, 0);
        assert_eq!(back.message, "oops");
    }
}
