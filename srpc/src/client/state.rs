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

use crate::io::net::NetAddr;
use crate::io::IOError;
use std::sync::atomic::{AtomicI8, Ordering};
use std::sync::Mutex;

const NORMAL: i8 = 0;
const CLOSED: i8 = 1;
const ERRORED: i8 = 2;

/// Shared by every clone of one client and by its two io futures. A
/// connection leaves Normal exactly once: either closed on purpose (idle
/// timeout, peer shutdown) or errored, in which case the first error is
/// kept for whoever asks.
pub struct ClientState {
    pub remote_addr: NetAddr,
    pub local_addr: NetAddr,
    conn_info: String,
    state: AtomicI8,
    error: Mutex<Option<IOError>>,
}

impl ClientState {
    pub fn new(remote_addr: NetAddr, local_addr: NetAddr) -> Self {
        let conn_info = format!("[{} -> {}]", local_addr, remote_addr);
        Self {
            remote_addr,
            local_addr,
            conn_info,
            state: AtomicI8::new(NORMAL),
            error: Mutex::new(None),
        }
    }

    pub fn conn_info(&self) -> &str {
        &self.conn_info
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::SeqCst) != NORMAL
    }

    pub fn set_closed(&self) {
        let _ = self
            .state
            .compare_exchange(NORMAL, CLOSED, Ordering::SeqCst, Ordering::SeqCst);
    }

    pub fn has_error(&self) -> bool {
        self.state.load(Ordering::SeqCst) == ERRORED
    }

    pub fn set_error(&self, error: IOError) {
        let mut slot = self.error.lock().unwrap();
        if self.has_error() {
            return;
        }
        self.state.store(ERRORED, Ordering::SeqCst);
        let _ = slot.replace(error);
    }

    pub fn take_error(&self) -> Option<IOError> {
        if !self.has_error() {
            return None;
        }
        self.error.lock().unwrap().take()
    }
}
