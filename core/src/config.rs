// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

// Thread pools
// The bridge runs inside a host app, keep the footprint low.
pub const TOKIO_WORKER_THREADS: usize = 1;
pub const TOKIO_MAX_BLOCKING_THREADS: usize = 8;

// In-page provider
pub const MAX_JSONRPC_REQUEST_SIZE_BYTES: usize = 1000000;
pub const MAX_JSONRPC_RESPONSE_SIZE_BYTES: usize = 1000000;
/// Nodes reject requests without an id with "invalid json request".
pub const DEFAULT_REQUEST_ID: u64 = 1;
/// Request id of the `net_listening` probe behind `is_connected`.
pub const CONNECTIVITY_PROBE_REQUEST_ID: u64 = 9999999999;

// Transport
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
