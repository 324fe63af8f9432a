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

use crate::err_box;
use crate::io::IOResult;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::net::{SocketAddr, TcpListener};

/// Host and port of one rpc endpoint. This is what the committed-partition
/// metadata carries for a worker, and what the client pools key on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetAddr {
    pub host: String,
    pub port: u16,
}

impl NetAddr {
    pub fn new<T: Into<String>>(host: T, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn parse(addr: &str) -> IOResult<Self> {
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => Ok(Self::new(host, port.parse::<u16>()?)),
            _ => err_box!("Address {} should have the form host:port", addr),
        }
    }

    pub fn as_pair(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl Display for NetAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<SocketAddr> for NetAddr {
    fn from(value: SocketAddr) -> Self {
        Self::new(value.ip().to_string(), value.port())
    }
}

// Peer information of one accepted connection.
#[derive(Debug, Clone)]
pub struct ConnState {
    pub peer: NetAddr,
    pub local: NetAddr,
}

// Loopback works everywhere; a worker reachable from other machines sets
// its host explicitly through the server conf.
pub fn local_host() -> String {
    "127.0.0.1".to_string()
}

// Probe a free port by binding port 0 and reading back the assignment.
// The port is released again before use, which is racy in theory; clients
// cover the gap with connect retry.
pub fn free_port() -> u16 {
    TcpListener::bind(("127.0.0.1", 0))
        .and_then(|l| l.local_addr())
        .map(|addr| addr.port())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use crate::io::net::NetAddr;

    #[test]
    fn parse() {
        let addr = NetAddr::parse("worker-3:8999").unwrap();
        assert_eq!(addr.as_pair(), ("worker-3", 8999));

        assert!(NetAddr::parse("worker-3").is_err());
        assert!(NetAddr::parse(":8999").is_err());
        assert!(NetAddr::parse("worker-3:noport").is_err());
    }
}
