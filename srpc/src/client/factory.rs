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

use crate::client::{ClientConf, RpcClient};
use crate::io::net::NetAddr;
use crate::io::IOResult;
use crate::runtime::Runtime;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

// Round-robin slots of one worker address. A slot holds at most one live
// client; dead ones are replaced on the next get.
struct Slots {
    clients: Vec<Option<RpcClient>>,
    next: usize,
}

impl Slots {
    fn new(conn_size: usize) -> Self {
        Self {
            clients: vec![None; conn_size.max(1)],
            next: 0,
        }
    }

    fn pick(&mut self) -> usize {
        let slot = self.next;
        self.next = (self.next + 1) % self.clients.len();
        slot
    }
}

/// Process-wide client pool, shared by every epoch reader. Keyed by worker
/// address; each address multiplexes over conn_size connections.
pub struct ClientFactory {
    conf: ClientConf,
    rt: Arc<Runtime>,
    pools: DashMap<NetAddr, Arc<Mutex<Slots>>>,
}

impl ClientFactory {
    pub fn new(conf: ClientConf) -> Self {
        let rt = Arc::new(conf.create_runtime());
        Self::with_rt(conf, rt)
    }

    pub fn with_rt(conf: ClientConf, rt: Arc<Runtime>) -> Self {
        ClientFactory {
            conf,
            rt,
            pools: DashMap::new(),
        }
    }

    // An unpooled connection.
    pub async fn create(&self, addr: &NetAddr) -> IOResult<RpcClient> {
        RpcClient::connect(&self.rt, addr, &self.conf).await
    }

    // A pooled connection, replacing a dead one if needed. Two callers may
    // race past the first check and both connect; the second check keeps
    // exactly one of the connections in the slot.
    pub async fn get(&self, addr: &NetAddr) -> IOResult<RpcClient> {
        let pool = self
            .pools
            .entry(addr.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Slots::new(self.conf.conn_size))))
            .clone();

        let slot = {
            let mut slots = pool.lock().unwrap();
            let slot = slots.pick();
            if let Some(client) = &slots.clients[slot] {
                if client.is_active() {
                    return Ok(client.clone());
                }
            }
            slot
        };

        let client = self.create(addr).await?;
        let mut slots = pool.lock().unwrap();
        if let Some(exists) = &slots.clients[slot] {
            if exists.is_active() {
                return Ok(exists.clone());
            }
        }
        slots.clients[slot] = Some(client.clone());
        Ok(client)
    }

    pub fn remove(&self, addr: &NetAddr) {
        self.pools.remove(addr);
    }

    pub fn clone_runtime(&self) -> Arc<Runtime> {
        self.rt.clone()
    }

    pub fn rt(&self) -> &Runtime {
        &self.rt
    }
}

impl Default for ClientFactory {
    fn default() -> Self {
        Self::new(ClientConf::default())
    }
}
