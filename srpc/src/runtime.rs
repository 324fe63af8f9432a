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

use std::future::Future;
use std::thread;
use std::time::Duration;
use tokio::runtime::Builder;

pub type JoinHandle<T> = tokio::task::JoinHandle<T>;

/// Named tokio runtime shared by the transport clients and servers of one
/// process. io_threads drives the reactor workers, worker_threads caps the
/// blocking pool the message handlers run on.
#[derive(Debug)]
pub struct Runtime {
    inner: tokio::runtime::Runtime,
    name: String,
    io_threads: usize,
    worker_threads: usize,
}

impl Runtime {
    pub fn new<T: AsRef<str>>(name: T, io_threads: usize, worker_threads: usize) -> Self {
        let mut builder = Builder::new_multi_thread();
        builder
            .worker_threads(io_threads)
            .thread_keep_alive(Duration::from_secs(6 * 3600))
            .thread_name(name.as_ref())
            .enable_all();
        if worker_threads > 0 {
            builder.max_blocking_threads(worker_threads);
        }

        Runtime {
            inner: builder.build().unwrap(),
            name: name.as_ref().to_string(),
            io_threads,
            worker_threads,
        }
    }

    pub fn default(name: &str) -> Self {
        let workers = 2 * thread::available_parallelism().unwrap().get();
        Self::new(name, 32, workers.max(4))
    }

    pub fn single() -> Self {
        Self::new("single", 1, 1)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn io_threads(&self) -> usize {
        self.io_threads
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.inner.spawn(task)
    }

    pub fn block_on<F>(&self, task: F) -> F::Output
    where
        F: Future,
    {
        self.inner.block_on(task)
    }

    pub fn spawn_blocking<F, R>(&self, task: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.inner.spawn_blocking(task)
    }
}
