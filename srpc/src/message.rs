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

//! Wire message of the transport. One head shape covers plain rpc and the
//! open/fetch/close stream exchanges:
//!
//! ```text
//! total_len   i32   bytes after this field
//! header_len  i32
//! code        i8    request family, e.g. ReadChunks
//! status      i8    request status (low nibble) | response status (high nibble)
//! req_id      i64   echoed by the reply
//! seq_id      i32   echoed by the reply
//! header      prost-encoded operation header
//! data        opaque payload; the error bytes on an error reply
//! ```

use crate::error::ErrorExt;
use crate::io::IOResult;
use crate::{err_box, CommonResult};
use bytes::{Buf, BufMut, BytesMut};
use log::error;
use num_enum::{FromPrimitive, IntoPrimitive};
use prost::Message as PMessage;

pub const MESSAGE_HEAD: i32 = 22;

pub const MAX_DATA_SIZE: i32 = 16 * 1024 * 1024;

pub const EMPTY_REQ_ID: i64 = -1;

pub const INIT_SEQ_ID: i32 = -1;

#[repr(i8)]
#[derive(Debug, Copy, Clone, PartialEq, IntoPrimitive, FromPrimitive)]
pub enum RequestStatus {
    #[num_enum(default)]
    Undefined = -1,

    Heartbeat = 0,

    Rpc = 1,

    Open = 2,     // stream registration
    Running = 3,  // chunk delivery
    Complete = 5, // stream release
}

#[repr(i8)]
#[derive(Debug, Copy, Clone, PartialEq, IntoPrimitive, FromPrimitive)]
pub enum ResponseStatus {
    #[num_enum(default)]
    Undefined = -1,

    Success = 0,
    Error = 1,
}

#[derive(Debug)]
pub struct Message {
    pub code: i8,
    pub req_status: RequestStatus,
    pub rep_status: ResponseStatus,
    pub req_id: i64,
    pub seq_id: i32,
    pub header: Option<BytesMut>,
    pub data: BytesMut,
}

impl Message {
    pub fn heartbeat() -> Message {
        Builder::new().request(RequestStatus::Heartbeat).build()
    }

    pub fn is_heartbeat(&self) -> bool {
        self.req_status == RequestStatus::Heartbeat
    }

    pub fn is_success(&self) -> bool {
        self.rep_status == ResponseStatus::Success
    }

    pub fn header_len(&self) -> usize {
        self.header.as_ref().map(|h| h.len()).unwrap_or(0)
    }

    // Successful reply carrying the given header and payload; the ids echo
    // the request so the client can match it back.
    pub fn reply_success(&self, header: Option<BytesMut>, data: BytesMut) -> Message {
        Message {
            code: self.code,
            req_status: self.req_status,
            rep_status: ResponseStatus::Success,
            req_id: self.req_id,
            seq_id: self.seq_id,
            header,
            data,
        }
    }

    pub fn reply_header<T: PMessage>(&self, header: T) -> Message {
        self.reply_success(Some(encode_proto(&header)), BytesMut::new())
    }

    pub fn reply_ok(&self) -> Message {
        self.reply_success(None, BytesMut::new())
    }

    pub fn reply_error<E: ErrorExt>(&self, err: &E) -> Message {
        Message {
            code: self.code,
            req_status: self.req_status,
            rep_status: ResponseStatus::Error,
            req_id: self.req_id,
            seq_id: self.seq_id,
            header: None,
            data: err.encode(),
        }
    }

    // Rebuild the handler's typed error from an error reply.
    pub fn check_error<E: ErrorExt>(&self) -> Result<(), E> {
        if self.is_success() {
            return Ok(());
        }

        Err(E::decode(BytesMut::from(&self.data[..])))
    }

    pub fn parse_header<T: PMessage + Default>(&self) -> CommonResult<T> {
        match &self.header {
            Some(bytes) => Ok(T::decode(&bytes[..])?),
            None => Ok(T::default()),
        }
    }

    fn status_byte(&self) -> i8 {
        self.req_status as i8 | ((self.rep_status as i8) << 4)
    }

    pub fn encode_head(&self, buf: &mut BytesMut) {
        let header_len = self.header_len() as i32;
        let data_len = self.data.len() as i32;

        buf.put_i32(header_len + data_len + MESSAGE_HEAD - 4);
        buf.put_i32(header_len);
        buf.put_i8(self.code);
        buf.put_i8(self.status_byte());
        buf.put_i64(self.req_id);
        buf.put_i32(self.seq_id);
    }

    // Parse the head fields out of a MESSAGE_HEAD sized buffer. Returns the
    // message shell plus the header and data section sizes still to read.
    pub fn decode_head(buf: &mut BytesMut) -> IOResult<(Message, usize, usize)> {
        let total_len = buf.get_i32();
        let header_len = buf.get_i32();
        let data_len = total_len - header_len - (MESSAGE_HEAD - 4);
        if header_len < 0 || data_len < 0 {
            return err_box!("Malformed head: header {}, total {}", header_len, total_len);
        }
        if data_len > MAX_DATA_SIZE {
            return err_box!("Data {} exceeds the {} byte limit", data_len, MAX_DATA_SIZE);
        }

        let code = buf.get_i8();
        let status = buf.get_i8();
        let msg = Message {
            code,
            req_status: RequestStatus::from(status & 0x0f),
            rep_status: ResponseStatus::from(status >> 4),
            req_id: buf.get_i64(),
            seq_id: buf.get_i32(),
            header: None,
            data: BytesMut::new(),
        };

        Ok((msg, header_len as usize, data_len as usize))
    }
}

fn encode_proto<T: PMessage>(header: &T) -> BytesMut {
    let mut bytes = BytesMut::with_capacity(header.encoded_len());
    if let Err(e) = header.encode(&mut bytes) {
        error!("proto encode {}", e);
    }
    bytes
}

pub struct Builder(Message);

impl Builder {
    pub fn new() -> Self {
        Self(Message {
            code: 0,
            req_status: RequestStatus::Undefined,
            rep_status: ResponseStatus::Undefined,
            req_id: EMPTY_REQ_ID,
            seq_id: INIT_SEQ_ID,
            header: None,
            data: BytesMut::new(),
        })
    }

    // A plain one-shot request with a fresh req_id.
    pub fn new_rpc<T: Into<i8>>(code: T) -> Self {
        Self::new()
            .code(code)
            .request(RequestStatus::Rpc)
            .req_id(crate::common::Utils::req_id())
    }

    pub fn code<T: Into<i8>>(mut self, code: T) -> Self {
        self.0.code = code.into();
        self
    }

    pub fn request(mut self, status: RequestStatus) -> Self {
        self.0.req_status = status;
        self
    }

    pub fn req_id(mut self, req_id: i64) -> Self {
        self.0.req_id = req_id;
        self
    }

    pub fn seq_id(mut self, seq_id: i32) -> Self {
        self.0.seq_id = seq_id;
        self
    }

    pub fn header(mut self, header: BytesMut) -> Self {
        self.0.header = Some(header);
        self
    }

    pub fn proto_header<T: PMessage>(mut self, header: T) -> Self {
        self.0.header = Some(encode_proto(&header));
        self
    }

    pub fn data(mut self, data: BytesMut) -> Self {
        self.0.data = data;
        self
    }

    pub fn build(self) -> Message {
        self.0
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
