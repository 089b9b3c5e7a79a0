// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use lazy_static::lazy_static;
use std::future::Future;
use tokio::task::JoinHandle;

use crate::config;

lazy_static! {
    static ref RUNTIME: tokio::runtime::Runtime = {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(config::TOKIO_WORKER_THREADS)
            .max_blocking_threads(config::TOKIO_MAX_BLOCKING_THREADS)
            .thread_name("wallet-bridge")
            .build()
            .unwrap()
    };
}

/// Execute async code synchronously.
///
/// The host app and the page's legacy `send` call expect synchronous answers, but the pipeline is
/// async. Must not be called from inside the runtime.
pub fn block_on<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}

/// Run a future in the background, eg. fire-and-forget requests.
pub fn spawn<T>(future: T) -> JoinHandle<T::Output>
where
    T: Future + Send + 'static,
    T::Output: Send + 'static,
{
    RUNTIME.spawn(future)
}
