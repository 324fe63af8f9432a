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

use std::time::Duration;

/// Bounded attempts with a constant wait between them. The wait is not
/// adaptive on purpose: the layers above bound the total work (piece count,
/// fetch budget), so a flat pause is enough here.
#[derive(Debug, Clone)]
pub struct LimitedRetry {
    remaining: u32,
    wait: Duration,
    granted: u32,
}

impl LimitedRetry {
    // One initial attempt plus up to max_retry further ones.
    pub fn new(max_retry: u32, wait: Duration) -> Self {
        Self {
            remaining: max_retry.saturating_add(1),
            wait,
            granted: 0,
        }
    }

    // Grant the next attempt, sleeping first for every attempt after the
    // initial one. Returns false when the budget is spent.
    pub async fn attempt(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }

        if self.granted > 0 && !self.wait.is_zero() {
            tokio::time::sleep(self.wait).await;
        }
        self.remaining -= 1;
        self.granted += 1;
        true
    }

    pub fn count(&self) -> u32 {
        self.granted
    }
}

#[cfg(test)]
mod tests {
    use crate::io::LimitedRetry;
    use std::time::Duration;

    #[tokio::test]
    async fn budget() {
        let mut retry = LimitedRetry::new(2, Duration::ZERO);
        assert!(retry.attempt().await);
        assert!(retry.attempt().await);
        assert!(retry.attempt().await);
        assert!(!retry.attempt().await);
        assert_eq!(retry.count(), 3);
    }
}
