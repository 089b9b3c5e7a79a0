// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

extern crate lazy_static;

// These are public, because they're used by the dev server
pub mod async_runtime;
pub mod config;
pub mod in_page_provider;
pub mod protocols;

mod error;

pub use crate::{
    async_runtime::block_on,
    error::Error,
    in_page_provider::{
        CallbackRegistry, CompletionHandler, InPageProvider, InPageProviderArgs,
        JsonRpcRequest, JsonRpcResponse, RequestId, SyncOptions,
    },
    protocols::eth::{extract_credentials, Credentials, WalletHook, WalletHooksI},
};
