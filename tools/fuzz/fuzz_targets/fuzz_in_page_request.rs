// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![no_main]

use std::time::Duration;

use lazy_static::lazy_static;
use libfuzzer_sys::fuzz_target;

use wallet_bridge_core::{InPageProvider, SyncOptions};
use wallet_bridge_tools_lib::{tool_provider, DEFAULT_RPC_URL};

lazy_static! {
    static ref RUNTIME: tokio::runtime::Runtime = {
        let cores = std::thread::available_parallelism().expect("can query cores");
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .max_blocking_threads(cores.into())
            .build()
            .unwrap()
    };

    static ref PROVIDER: InPageProvider = {
        let sync_options = SyncOptions::builder()
            .address("0x0000000000000000000000000000000000000001")
            .network_version("1")
            .build();
        tool_provider(DEFAULT_RPC_URL, sync_options).expect("valid url")
    };
}

// Signing requests wait for an approval that never comes.
const TIMEOUT: Duration = Duration::from_millis(100);

fuzz_target!(|raw_request: String| {
    let _ = RUNTIME.block_on(async {
        tokio::time::timeout(TIMEOUT, PROVIDER.in_page_request_async(raw_request)).await
    });
});
