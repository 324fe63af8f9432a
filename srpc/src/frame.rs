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

//! Message framing over tcp. One pair of read/write helpers carries both
//! the whole-stream [`RpcFrame`] and the split halves the duplex client
//! drives from two futures.

use crate::io::net::{ConnState, NetAddr};
use crate::io::IOResult;
use crate::message::{Message, MESSAGE_HEAD};
use crate::server::ServerConf;
use bytes::BytesMut;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;

// A full-duplex message channel.
pub trait Frame {
    fn send(&mut self, msg: &Message) -> impl Future<Output = IOResult<()>> + Send;

    // Ok(None) means the peer closed the connection cleanly.
    fn receive(&mut self) -> impl Future<Output = IOResult<Option<Message>>> + Send;

    fn conn_state(&self) -> ConnState;
}

async fn read_chunk<R>(io: &mut R, buf: &mut BytesMut, len: usize) -> IOResult<BytesMut>
where
    R: AsyncRead + Unpin,
{
    buf.resize(len, 0);
    let mut out = buf.split_to(len);
    io.read_exact(&mut out).await?;
    Ok(out)
}

// Read one message. Heartbeats are consumed here and never surface; a
// failure to read a fresh head is treated as the peer having closed.
async fn read_message<R>(io: &mut R, buf: &mut BytesMut) -> IOResult<Option<Message>>
where
    R: AsyncRead + Unpin,
{
    loop {
        let mut head = match read_chunk(io, buf, MESSAGE_HEAD as usize).await {
            Ok(v) => v,
            Err(_) => return Ok(None),
        };

        let (mut msg, header_len, data_len) = Message::decode_head(&mut head)?;
        if header_len > 0 {
            msg.header = Some(read_chunk(io, buf, header_len).await?);
        }
        if data_len > 0 {
            msg.data = read_chunk(io, buf, data_len).await?;
        }

        if msg.is_heartbeat() {
            continue;
        }
        return Ok(Some(msg));
    }
}

async fn write_message<W>(io: &mut W, buf: &mut BytesMut, msg: &Message) -> IOResult<()>
where
    W: AsyncWrite + Unpin,
{
    msg.encode_head(buf);
    io.write_all(&buf.split()).await?;

    if let Some(header) = &msg.header {
        io.write_all(header).await?;
    }
    if !msg.data.is_empty() {
        io.write_all(&msg.data).await?;
    }

    io.flush().await?;
    Ok(())
}

/// Frame over one owned tcp stream, used by the server side of a connection.
pub struct RpcFrame {
    io: TcpStream,
    buf: BytesMut,
}

impl RpcFrame {
    pub fn with_client(io: TcpStream, buffer_size: usize) -> Self {
        Self {
            io,
            buf: BytesMut::with_capacity(buffer_size),
        }
    }

    pub fn with_server(io: TcpStream, conf: &ServerConf) -> Self {
        Self::with_client(io, conf.buffer_size)
    }

    // Split into halves the client's writer and reader futures own.
    pub fn split(self) -> (ReadFrame, WriteFrame) {
        let capacity = self.buf.capacity();
        let (read, write) = tokio::io::split(self.io);
        (
            ReadFrame {
                io: read,
                buf: BytesMut::with_capacity(capacity),
            },
            WriteFrame {
                io: write,
                buf: self.buf,
            },
        )
    }
}

impl Frame for RpcFrame {
    async fn send(&mut self, msg: &Message) -> IOResult<()> {
        write_message(&mut self.io, &mut self.buf, msg).await
    }

    async fn receive(&mut self) -> IOResult<Option<Message>> {
        read_message(&mut self.io, &mut self.buf).await
    }

    fn conn_state(&self) -> ConnState {
        let fallback = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(0, 0, 0, 0), 0));
        ConnState {
            peer: NetAddr::from(self.io.peer_addr().unwrap_or(fallback)),
            local: NetAddr::from(self.io.local_addr().unwrap_or(fallback)),
        }
    }
}

pub struct ReadFrame {
    io: ReadHalf<TcpStream>,
    buf: BytesMut,
}

impl ReadFrame {
    pub async fn receive(&mut self) -> IOResult<Option<Message>> {
        read_message(&mut self.io, &mut self.buf).await
    }
}

pub struct WriteFrame {
    io: WriteHalf<TcpStream>,
    buf: BytesMut,
}

impl WriteFrame {
    pub async fn send(&mut self, msg: &Message) -> IOResult<()> {
        write_message(&mut self.io, &mut self.buf, msg).await
    }
}
