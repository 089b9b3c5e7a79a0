// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use lazy_static::lazy_static;

use crate::{
    in_page_provider::JsonRpcRequest,
    protocols::eth::engine::{Next, Subprovider},
    Error,
};

/// Remembers answers that can't change for the same params.
#[derive(Debug, Default)]
pub struct CacheSubprovider {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl CacheSubprovider {
    pub fn new() -> Self {
        Default::default()
    }

    fn lookup(&self, key: &str) -> Result<Option<serde_json::Value>, Error> {
        let entries = self.entries.lock()?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: String, value: serde_json::Value) -> Result<(), Error> {
        let mut entries = self.entries.lock()?;
        entries.insert(key, value);
        Ok(())
    }
}

#[async_trait]
impl Subprovider for CacheSubprovider {
    async fn handle_request(
        &self,
        request: &JsonRpcRequest,
        next: Next<'_>,
    ) -> Result<serde_json::Value, Error> {
        if !PERMA_CACHED_METHODS.contains(request.method.as_str()) {
            return next.run(request).await;
        }
        let key = cache_key(request);
        if let Some(value) = self.lookup(&key)? {
            return Ok(value);
        }
        let value = next.run(request).await?;
        // Null means not found (yet), eg. a pending transaction's receipt.
        if !value.is_null() {
            self.store(key, value.clone())?;
        }
        Ok(value)
    }
}

fn cache_key(request: &JsonRpcRequest) -> String {
    format!("{}:{}", request.method, request.params)
}

lazy_static! {
    // Keyed by block or transaction hash, so the answer is final once it's non-null.
    static ref PERMA_CACHED_METHODS: HashSet<&'static str> = [
        "eth_getBlockByHash",
        "eth_getBlockTransactionCountByHash",
        "eth_getTransactionByBlockHashAndIndex",
        "eth_getTransactionByHash",
        "eth_getTransactionReceipt",
        "eth_getUncleByBlockHashAndIndex",
        "eth_getUncleCountByBlockHash",
    ]
    .into();
}
