// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod engine;
mod rpc_provider;
mod subproviders;
mod url_credentials;

pub use engine::{Next, ProviderEngine, Subprovider};
pub use rpc_provider::RpcTransport;
#[cfg(test)]
pub(crate) use subproviders::WalletHooksMock;
pub use subproviders::{
    CacheSubprovider, FilterSubprovider, HookedWalletSubprovider, SubscriptionsSubprovider,
    WalletHook, WalletHooksI,
};
pub use url_credentials::{extract_credentials, Credentials};

#[cfg(test)]
pub(crate) use engine::test_util::MockNode;
