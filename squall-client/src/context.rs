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

use crate::stream::StreamClient;
use squall_common::conf::ClientConf;
use squall_common::ShuffleResult;
use srpc::client::ClientFactory;
use srpc::io::net::NetAddr;
use srpc::runtime::Runtime;
use std::sync::Arc;

// Process-wide client state: the configuration plus the shared transport
// client pool. All epoch readers of one executor share a context.
pub struct ClientContext {
    pub conf: ClientConf,
    factory: ClientFactory,
}

impl ClientContext {
    pub fn new(conf: ClientConf) -> Arc<Self> {
        let factory = ClientFactory::new(conf.to_rpc_conf());
        Arc::new(Self { conf, factory })
    }

    pub fn with_rt(conf: ClientConf, rt: Arc<Runtime>) -> Arc<Self> {
        let factory = ClientFactory::with_rt(conf.to_rpc_conf(), rt);
        Arc::new(Self { conf, factory })
    }

    // A chunk-stream client for one worker, backed by the pooled connection.
    pub async fn stream_client(&self, addr: &NetAddr) -> ShuffleResult<StreamClient> {
        let client = self.factory.get(addr).await?;
        Ok(StreamClient::new(client, &self.conf))
    }

    pub fn remove_client(&self, addr: &NetAddr) {
        self.factory.remove(addr);
    }

    pub fn clone_runtime(&self) -> Arc<Runtime> {
        self.factory.clone_runtime()
    }

    pub fn rt(&self) -> &Runtime {
        self.factory.rt()
    }
}
