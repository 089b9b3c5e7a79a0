// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod cache;
mod filters;
mod hooked_wallet;
mod subscriptions;

pub use cache::CacheSubprovider;
pub use filters::FilterSubprovider;
#[cfg(test)]
pub(crate) use hooked_wallet::test_util::WalletHooksMock;
pub use hooked_wallet::{HookedWalletSubprovider, WalletHook, WalletHooksI};
pub use subscriptions::SubscriptionsSubprovider;
