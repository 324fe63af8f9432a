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

use crate::io::{IOError, IOResult};
use crate::message::Message;
use dashmap::DashMap;
use tokio::sync::oneshot;

// Completes the caller's wait once the reply (or the failure) is known.
pub(crate) type Callback = oneshot::Sender<IOResult<Message>>;

pub(crate) struct Envelope {
    pub msg: Message,
    pub cb: Callback,
}

/// The requests written to the wire whose replies have not come back yet,
/// keyed by req_id. Each entry is taken exactly once: by the reply, by a
/// send failure, or by the teardown sweep.
pub(crate) struct PendingCalls(DashMap<i64, Callback>);

impl PendingCalls {
    pub fn new() -> Self {
        Self(DashMap::new())
    }

    pub fn register(&self, req_id: i64, cb: Callback) {
        let _ = self.0.insert(req_id, cb);
    }

    pub fn take(&self, req_id: i64) -> Option<Callback> {
        self.0.remove(&req_id).map(|(_, cb)| cb)
    }

    // Fail everything still in flight; returns how many callers were woken.
    pub fn fail_all(&self, conn_info: &str) -> usize {
        let ids: Vec<i64> = self.0.iter().map(|e| *e.key()).collect();
        let mut failed = 0;

        for req_id in ids {
            if let Some(cb) = self.take(req_id) {
                let _ = cb.send(Err(IOError::Closed(conn_info.to_string())));
                failed += 1;
            }
        }

        failed
    }
}
