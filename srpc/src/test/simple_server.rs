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

use crate::common::Utils;
use crate::error::WireError;
use crate::handler::{HandlerService, MessageHandler};
use crate::io::net::{self, ConnState, NetAddr};
use crate::message::Message;
use crate::server::{RpcServer, ServerConf};
use bytes::BytesMut;
use log::info;
use std::thread;

// Uppercases the request payload. The payload "fail" produces a handler
// error instead, so the client side of the error path can be exercised.
pub struct SimpleHandler;

impl MessageHandler for SimpleHandler {
    type Error = WireError;

    fn handle(&mut self, msg: &Message) -> Result<Message, WireError> {
        let request = String::from_utf8_lossy(&msg.data).to_string();
        if request == "fail" {
            return Err(WireError::new(0, "please retry"));
        }

        let response = request.to_uppercase();
        info!(
            "Handler req_id {}, request: {}, response: {}",
            msg.req_id, request, response
        );

        Ok(msg.reply_success(None, BytesMut::from(response.as_str())))
    }
}

pub struct SimpleService;

impl HandlerService for SimpleService {
    type Item = SimpleHandler;

    fn get_message_handler(&self, _: Option<ConnState>) -> Self::Item {
        SimpleHandler
    }
}

pub struct SimpleServer {
    server: RpcServer<SimpleService>,
}

impl SimpleServer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let conf = ServerConf::with_host(host, port);
        Self {
            server: RpcServer::new(conf, SimpleService),
        }
    }

    pub fn bind_addr(&self) -> &NetAddr {
        self.server.bind_addr()
    }

    // Run the server on its own thread, optionally after a delay; clients
    // bridge the startup window with connect retry.
    pub fn start(self, sleep_ms: u64) {
        thread::spawn(move || {
            if sleep_ms > 0 {
                Utils::sleep(sleep_ms)
            }
            self.server.block_on_start();
        });
    }
}

impl Default for SimpleServer {
    fn default() -> Self {
        Self::new(net::local_host(), net::free_port())
    }
}
