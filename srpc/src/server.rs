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

use crate::handler::{HandlerService, MessageHandler, StreamHandler};
use crate::frame::{Frame, RpcFrame};
use crate::io::net::{self, NetAddr};
use crate::runtime::Runtime;
use crate::CommonResult;
use log::{error, info};
use socket2::SockRef;
use std::sync::Arc;
use std::thread;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct ServerConf {
    pub name: String,

    pub io_threads: usize,
    pub worker_threads: usize,

    pub host: String,
    pub port: u16,
    pub buffer_size: usize,

    pub timeout_ms: u64,
    pub close_idle: bool,
}

impl ServerConf {
    pub fn with_host(host: impl Into<String>, port: u16) -> Self {
        let cpus = thread::available_parallelism().unwrap().get();
        ServerConf {
            name: "rpc-server".to_string(),
            io_threads: 32,
            worker_threads: cpus * 2,
            host: host.into(),
            port,
            buffer_size: 128 * 1024,
            timeout_ms: 120_000,
            close_idle: true,
        }
    }

    pub fn with_port(port: u16) -> Self {
        Self::with_host(net::local_host(), port)
    }

    pub fn bind_addr(&self) -> NetAddr {
        NetAddr::new(&self.host, self.port)
    }

    pub fn create_runtime(&self) -> Runtime {
        Runtime::new(&self.name, self.io_threads, self.worker_threads)
    }
}

impl Default for ServerConf {
    fn default() -> Self {
        Self::with_host(net::local_host(), net::free_port())
    }
}

/// Accept loop plus one [`StreamHandler`] per connection. Connection
/// failures are logged and scoped to their connection; the loop lives on.
pub struct RpcServer<S> {
    rt: Arc<Runtime>,
    service: S,
    conf: ServerConf,
    addr: NetAddr,
}

impl<S> RpcServer<S>
where
    S: HandlerService,
    S::Item: MessageHandler,
{
    pub fn new(conf: ServerConf, service: S) -> Self {
        let rt = Arc::new(conf.create_runtime());
        Self::with_rt(rt, conf, service)
    }

    pub fn with_rt(rt: Arc<Runtime>, conf: ServerConf, service: S) -> Self {
        let addr = conf.bind_addr();
        RpcServer {
            rt,
            service,
            conf,
            addr,
        }
    }

    // Run the accept loop on the server's own runtime, blocking the caller.
    pub fn block_on_start(&self) {
        self.rt.block_on(async {
            if let Err(e) = self.run().await {
                error!("Server [{}] failed: {}", self.conf.name, e);
            }
        })
    }

    pub async fn run(&self) -> CommonResult<()> {
        let listener = TcpListener::bind(self.addr.as_pair()).await?;
        info!(
            "Rpc server [{}] listening on {} ({} io threads, {} workers)",
            self.conf.name,
            self.addr,
            self.rt.io_threads(),
            self.rt.worker_threads()
        );

        loop {
            let (stream, peer) = listener.accept().await?;

            let sock = SockRef::from(&stream);
            sock.set_keepalive(true)?;
            sock.set_nodelay(true)?;

            let frame = RpcFrame::with_server(stream, &self.conf);
            let conn_state = if self.service.has_conn_state() {
                Some(frame.conn_state())
            } else {
                None
            };
            let handler = self.service.get_message_handler(conn_state);
            let mut stream_handler =
                StreamHandler::new(self.rt.clone(), frame, handler, &self.conf);

            let local = self.addr.clone();
            self.rt.spawn(async move {
                if let Err(e) = stream_handler.run().await {
                    error!("Connection [{} -> {}]: {}", peer, local, e);
                }
            });
        }
    }

    pub fn rt(&self) -> &Runtime {
        &self.rt
    }

    pub fn clone_rt(&self) -> Arc<Runtime> {
        self.rt.clone()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn bind_addr(&self) -> &NetAddr {
        &self.addr
    }
}
