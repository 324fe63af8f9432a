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

use bytes::BytesMut;
use srpc::client::{ClientConf, ClientFactory, RpcClient};
use srpc::error::WireError;
use srpc::io::net::NetAddr;
use srpc::message::Builder;
use srpc::runtime::Runtime;
use srpc::test::SimpleServer;
use srpc::CommonResult;
use std::sync::Arc;
use std::time::Duration;

fn start_server() -> NetAddr {
    let server = SimpleServer::default();
    let addr = server.bind_addr().clone();
    server.start(0);
    addr
}

#[test]
fn echo() -> CommonResult<()> {
    let addr = start_server();
    let conf = ClientConf::default();
    let rt = Arc::new(conf.create_runtime());

    rt.block_on(async {
        let client = RpcClient::connect(&rt, &addr, &conf).await?;

        let msg = Builder::new_rpc(1).data(BytesMut::from("abc")).build();
        let rep = client.rpc(msg).await?;
        assert!(rep.is_success());
        assert_eq!(&rep.data[..], b"ABC");

        let msg = Builder::new_rpc(1).data(BytesMut::from("xyz")).build();
        let rep = client.timeout_rpc(Duration::from_secs(10), msg).await?;
        assert_eq!(&rep.data[..], b"XYZ");

        Ok(())
    })
}

#[test]
fn handler_error() -> CommonResult<()> {
    let addr = start_server();
    let conf = ClientConf::default();
    let rt = Arc::new(conf.create_runtime());

    rt.block_on(async {
        let client = RpcClient::connect(&rt, &addr, &conf).await?;

        let msg = Builder::new_rpc(1).data(BytesMut::from("fail")).build();
        let rep = client.rpc(msg).await?;
        assert!(!rep.is_success());
        let err = rep.check_error::<WireError>().unwrap_err();
        assert!(err.message.contains("please retry"));

        // The connection survives a handler error.
        let msg = Builder::new_rpc(1).data(BytesMut::from("ok")).build();
        let rep = client.rpc(msg).await?;
        assert!(rep.is_success());
        assert_eq!(&rep.data[..], b"OK");

        Ok(())
    })
}

#[test]
fn factory_pool() -> CommonResult<()> {
    let addr = start_server();
    let rt = Arc::new(Runtime::single());
    let rt1 = rt.clone();

    rt.block_on(async move {
        let factory = ClientFactory::with_rt(ClientConf::default(), rt1);

        let c1 = factory.get(&addr).await?;
        let c2 = factory.get(&addr).await?;
        // The same pooled connection is handed out.
        assert_eq!(c1.local_addr(), c2.local_addr());

        c1.set_closed();
        assert!(c2.is_closed());

        // A new connection replaces the dead one.
        let c3 = factory.get(&addr).await?;
        assert_ne!(c1.local_addr(), c3.local_addr());
        assert!(c3.is_active());

        Ok(())
    })
}

#[test]
fn delayed_server_conn_retry() -> CommonResult<()> {
    let server = SimpleServer::default();
    let addr = server.bind_addr().clone();
    // The server starts late; the connect retry policy covers the gap.
    server.start(500);

    let mut conf = ClientConf::default();
    conf.conn_retry_max_times = 10;
    conf.conn_retry_wait_ms = 200;
    let rt = Arc::new(conf.create_runtime());

    rt.block_on(async {
        let client = RpcClient::connect(&rt, &addr, &conf).await?;
        let msg = Builder::new_rpc(1).data(BytesMut::from("late")).build();
        let rep = client.rpc(msg).await?;
        assert_eq!(&rep.data[..], b"LATE");
        Ok(())
    })
}
