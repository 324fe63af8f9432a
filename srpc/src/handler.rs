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

use crate::error::ErrorExt;
use crate::frame::Frame;
use crate::io::net::ConnState;
use crate::io::IOResult;
use crate::message::Message;
use crate::runtime::Runtime;
use crate::server::ServerConf;
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

/// Server-side message processor. One handler is created per connection and
/// may keep per-connection state between messages, e.g. a stream cursor; it
/// runs on the blocking pool.
pub trait MessageHandler: Send + Sync + 'static {
    type Error: ErrorExt + Send + Sync;

    fn handle(&mut self, msg: &Message) -> Result<Message, Self::Error>;
}

/// Creates the per-connection handlers and owns whatever state they share,
/// e.g. the worker's file registry and stream table.
pub trait HandlerService: Send + Sync + 'static {
    type Item: MessageHandler;

    // Whether the handlers want to know who connected.
    fn has_conn_state(&self) -> bool {
        false
    }

    fn get_message_handler(&self, conn_state: Option<ConnState>) -> Self::Item;
}

/// Drives one accepted connection: receive, dispatch to the handler, send
/// the reply. A handler error becomes an error reply, never a dead
/// connection.
pub struct StreamHandler<F, M> {
    rt: Arc<Runtime>,
    frame: F,
    handler: Arc<Mutex<M>>,
    close_idle: bool,
    timeout: Duration,
}

impl<F: Frame, M: MessageHandler> StreamHandler<F, M> {
    pub fn new(rt: Arc<Runtime>, frame: F, handler: M, conf: &ServerConf) -> Self {
        StreamHandler {
            rt,
            frame,
            handler: Arc::new(Mutex::new(handler)),
            close_idle: conf.close_idle,
            timeout: Duration::from_millis(conf.timeout_ms),
        }
    }

    pub async fn run(&mut self) -> IOResult<()> {
        loop {
            let received = match timeout(self.timeout, self.frame.receive()).await {
                Ok(v) => v?,

                // Nothing arrived within the window.
                Err(_) if self.close_idle => return Ok(()),
                Err(_) => continue,
            };

            match received {
                None => return Ok(()),
                Some(request) => self.call(request).await?,
            }
        }
    }

    async fn call(&mut self, request: Message) -> IOResult<()> {
        let handler = self.handler.clone();
        let response = self
            .rt
            .spawn_blocking(move || {
                let mut handler = match handler.lock() {
                    Ok(v) => v,
                    Err(poison) => poison.into_inner(),
                };
                match handler.handle(&request) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("handler request {} error: {}", request.req_id, e);
                        request.reply_error(&e)
                    }
                }
            })
            .await?;

        self.frame.send(&response).await
    }
}
