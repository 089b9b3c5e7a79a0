// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use wallet_bridge_core::{
    InPageProvider, InPageProviderArgs, RequestId, SyncOptions, WalletHook, WalletHooksI,
};

/// Local node that dev tools talk to by default.
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Logs approval requests instead of showing UI. Requests stay pending until they're completed
/// with `InPageProvider::execute_callback`.
#[derive(Debug)]
pub struct WalletHooksMock {
    accounts: Vec<String>,
    approve_enable: bool,
}

impl WalletHooksMock {
    // We don't want to create the mock by accident with `Default::default`.
    #[allow(clippy::new_without_default)]
    pub fn new(accounts: Vec<String>) -> Self {
        Self {
            accounts,
            approve_enable: true,
        }
    }

    pub fn rejecting_enable(mut self) -> Self {
        self.approve_enable = false;
        self
    }
}

impl WalletHooksI for WalletHooksMock {
    fn get_accounts(&self) -> Vec<String> {
        self.accounts.clone()
    }

    fn request_approval(&self, id: RequestId, hook: WalletHook, params: serde_json::Value) {
        log::info!("Approval requested for '{hook}' with id '{id}': {params}")
    }

    fn supports(&self, _: WalletHook) -> bool {
        true
    }

    fn enable(&self) -> bool {
        log::debug!("Enable requested, approving: {}", self.approve_enable);
        self.approve_enable
    }
}

/// Provider wired to the mock hooks.
pub fn tool_provider(
    rpc_url: &str,
    sync_options: SyncOptions,
) -> anyhow::Result<InPageProvider> {
    let wallet_hooks = Box::new(WalletHooksMock::new(sync_options.accounts()));
    let args = InPageProviderArgs::builder()
        .rpc_url(rpc_url)
        .wallet_hooks(wallet_hooks)
        .sync_options(sync_options)
        .build();
    Ok(InPageProvider::new(args)?)
}

/// Decode a hex encoded response from `InPageProvider::in_page_request` for logging.
pub fn decode_response(response_hex: &str) -> anyhow::Result<String> {
    let response = hex::decode(response_hex)?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}
