// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;

use crate::{
    in_page_provider::JsonRpcRequest,
    protocols::eth::engine::{Next, Subprovider},
    Error,
};

/// Keeps track of the node-side filters installed through this provider, so that uninstalling an
/// unknown filter doesn't need a round trip.
#[derive(Debug, Default)]
pub struct FilterSubprovider {
    installed: Mutex<HashSet<String>>,
}

impl FilterSubprovider {
    pub fn new() -> Self {
        Default::default()
    }

    fn remember(&self, filter_id: &str) -> Result<(), Error> {
        let mut installed = self.installed.lock()?;
        installed.insert(filter_id.to_lowercase());
        Ok(())
    }

    /// Returns whether the filter was known.
    fn forget(&self, filter_id: &str) -> Result<bool, Error> {
        let mut installed = self.installed.lock()?;
        Ok(installed.remove(&filter_id.to_lowercase()))
    }

    pub fn installed_count(&self) -> Result<usize, Error> {
        let installed = self.installed.lock()?;
        Ok(installed.len())
    }
}

#[async_trait]
impl Subprovider for FilterSubprovider {
    async fn handle_request(
        &self,
        request: &JsonRpcRequest,
        next: Next<'_>,
    ) -> Result<serde_json::Value, Error> {
        match request.method.as_str() {
            "eth_newFilter" | "eth_newBlockFilter" | "eth_newPendingTransactionFilter" => {
                let filter_id = next.run(request).await?;
                if let Some(filter_id) = filter_id.as_str() {
                    self.remember(filter_id)?;
                }
                Ok(filter_id)
            }
            "eth_uninstallFilter" => {
                let filter_id = request
                    .params
                    .get(0)
                    .and_then(|id| id.as_str())
                    .unwrap_or_default();
                if self.forget(filter_id)? {
                    next.run(request).await
                } else {
                    Ok(serde_json::Value::Bool(false))
                }
            }
            _ => next.run(request).await,
        }
    }
}
