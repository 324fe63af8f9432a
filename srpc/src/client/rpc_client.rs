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

use crate::client::dispatch::{Envelope, PendingCalls};
use crate::client::{ClientConf, ClientState};
use crate::frame::{ReadFrame, RpcFrame, WriteFrame};
use crate::io::net::NetAddr;
use crate::io::{IOError, IOResult};
use crate::message::Message;
use crate::runtime::Runtime;
use log::warn;
use socket2::SockRef;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

/// Shareable handle to one connection. Clones push their requests into the
/// same queue; a writer future drains it onto the wire and a reader future
/// matches the replies back by req_id. A reader that holds the handle for a
/// whole stream therefore never blocks other readers on the same worker.
#[derive(Clone)]
pub struct RpcClient {
    sender: mpsc::Sender<Envelope>,
    state: Arc<ClientState>,
}

impl RpcClient {
    pub async fn connect(rt: &Runtime, addr: &NetAddr, conf: &ClientConf) -> IOResult<Self> {
        let stream = connect_with_retry(addr, conf).await?;
        let sock = SockRef::from(&stream);
        sock.set_nodelay(true)?;
        sock.set_keepalive(true)?;

        let local_addr = stream.local_addr()?.into();
        let state = Arc::new(ClientState::new(addr.clone(), local_addr));
        let (read_frame, write_frame) = RpcFrame::with_client(stream, conf.buffer_size).split();

        let calls = Arc::new(PendingCalls::new());
        let (sender, receiver) = mpsc::channel(conf.message_size);
        let idle = Duration::from_millis(conf.rpc_timeout_ms);

        rt.spawn(write_loop(
            state.clone(),
            calls.clone(),
            receiver,
            write_frame,
            idle,
            conf.close_idle,
        ));
        rt.spawn(read_loop(state.clone(), calls, read_frame, idle));

        Ok(Self { sender, state })
    }

    pub async fn rpc(&self, msg: Message) -> IOResult<Message> {
        let req_id = msg.req_id;
        let seq_id = msg.seq_id;

        let (tx, rx) = oneshot::channel();
        if self.sender.send(Envelope { msg, cb: tx }).await.is_err() {
            return Err(IOError::Closed(self.state.conn_info().to_string()));
        }

        let reply = match rx.await {
            Ok(res) => res?,
            Err(_) => return Err(IOError::Closed(self.state.conn_info().to_string())),
        };

        Self::verify_reply(req_id, seq_id, &reply)?;
        Ok(reply)
    }

    pub async fn timeout_rpc(&self, dur: Duration, msg: Message) -> IOResult<Message> {
        timeout(dur, self.rpc(msg)).await?
    }

    // The reply must echo the ids it answers.
    fn verify_reply(req_id: i64, seq_id: i32, reply: &Message) -> IOResult<()> {
        if reply.req_id != req_id {
            return Err(IOError::Protocol(format!(
                "reply req_id {} does not echo request {}",
                reply.req_id, req_id
            )));
        }
        if reply.seq_id != seq_id {
            return Err(IOError::Protocol(format!(
                "reply seq_id {} does not echo request {}",
                reply.seq_id, seq_id
            )));
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    pub fn is_active(&self) -> bool {
        !self.is_closed()
    }

    pub fn set_closed(&self) {
        self.state.set_closed()
    }

    pub fn remote_addr(&self) -> &NetAddr {
        &self.state.remote_addr
    }

    pub fn local_addr(&self) -> &NetAddr {
        &self.state.local_addr
    }
}

async fn connect_with_retry(addr: &NetAddr, conf: &ClientConf) -> IOResult<TcpStream> {
    let mut policy = conf.conn_retry_policy();
    let conn_timeout = Duration::from_millis(conf.conn_timeout_ms);
    let mut last_error = String::new();

    while policy.attempt().await {
        match timeout(conn_timeout, TcpStream::connect(addr.as_pair())).await {
            Ok(Ok(stream)) => return Ok(stream),

            Ok(Err(e)) => last_error = e.to_string(),
            Err(e) => last_error = e.to_string(),
        }
        warn!(
            "Failed to connect {} (attempt {}): {}",
            addr,
            policy.count(),
            last_error
        );
    }

    Err(IOError::ConnectFailed {
        addr: addr.to_string(),
        attempts: policy.count(),
        cause: last_error,
    })
}

// Drain the request queue onto the wire, registering each callback before
// its bytes leave. Idle windows emit heartbeats (or close the connection
// when close_idle is set).
async fn write_loop(
    state: Arc<ClientState>,
    calls: Arc<PendingCalls>,
    mut receiver: mpsc::Receiver<Envelope>,
    mut frame: WriteFrame,
    idle: Duration,
    close_idle: bool,
) {
    loop {
        let env = match timeout(idle, receiver.recv()).await {
            Ok(Some(env)) => env,

            // All senders are gone, the client was dropped.
            Ok(None) => {
                state.set_closed();
                break;
            }

            Err(_) => {
                if close_idle {
                    state.set_closed();
                    break;
                }
                if let Err(e) = frame.send(&Message::heartbeat()).await {
                    state.set_error(e);
                    break;
                }
                continue;
            }
        };

        // The caller may have timed out while queued.
        if env.cb.is_closed() {
            continue;
        }

        let req_id = env.msg.req_id;
        calls.register(req_id, env.cb);

        if let Err(e) = frame.send(&env.msg).await {
            if let Some(cb) = calls.take(req_id) {
                let _ = cb.send(Err(IOError::Closed(format!(
                    "send {} on {} failed: {}",
                    req_id,
                    state.conn_info(),
                    e
                ))));
            }
            state.set_error(e);
            break;
        }
    }

    let failed = calls.fail_all(state.conn_info());
    if failed > 0 {
        warn!(
            "Connection {} went down with {} requests in flight",
            state.conn_info(),
            failed
        );
    }
}

// Match replies back to their waiting callers.
async fn read_loop(
    state: Arc<ClientState>,
    calls: Arc<PendingCalls>,
    mut frame: ReadFrame,
    idle: Duration,
) {
    loop {
        let msg = match timeout(idle, frame.receive()).await {
            Ok(Ok(Some(msg))) => msg,

            Ok(Ok(None)) => {
                state.set_closed();
                break;
            }

            Ok(Err(e)) => {
                state.set_error(e);
                break;
            }

            // Quiet wire; only stop once the writer side saw the failure.
            Err(_) => {
                if state.is_closed() {
                    break;
                }
                continue;
            }
        };

        match calls.take(msg.req_id) {
            Some(cb) => {
                let _ = cb.send(Ok(msg));
            }
            None => warn!(
                "No caller waits for reply {} on {}",
                msg.req_id,
                state.conn_info()
            ),
        }
    }
}
