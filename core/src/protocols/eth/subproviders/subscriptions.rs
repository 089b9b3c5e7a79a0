// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use crate::{
    in_page_provider::{InPageErrorCode, JsonRpcRequest},
    protocols::eth::engine::{Next, Subprovider},
    Error,
};

/// Push subscriptions need a persistent connection, which the HTTP transport doesn't have.
/// Pages fall back to polling with filters when these fail.
#[derive(Debug, Default)]
pub struct SubscriptionsSubprovider {}

impl SubscriptionsSubprovider {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Subprovider for SubscriptionsSubprovider {
    async fn handle_request(
        &self,
        request: &JsonRpcRequest,
        next: Next<'_>,
    ) -> Result<serde_json::Value, Error> {
        match request.method.as_str() {
            "eth_subscribe" | "eth_unsubscribe" => Err(Error::JsonRpc {
                code: InPageErrorCode::UnsupportedMethod.into(),
                message: format!(
                    "Subscriptions are not supported over HTTP: '{}'",
                    request.method
                ),
            }),
            _ => next.run(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use jsonrpsee::types::error::ErrorCode;
    use serde_json::json;

    use super::*;
    use crate::{
        async_runtime as rt,
        protocols::eth::{engine::test_util::MockNode, ProviderEngine},
    };

    #[test]
    fn rejects_subscriptions_without_hitting_node() {
        let node = MockNode::new().answer("eth_subscribe", json!("0x1"));
        let seen = node.seen_requests();
        let mut engine = ProviderEngine::new();
        engine.add_provider(SubscriptionsSubprovider::new());
        engine.add_provider(node);

        let request = JsonRpcRequest::new(1u64, "eth_subscribe", json!(["newHeads"]));
        let result = rt::block_on(engine.send_async(&request));

        assert!(
            matches!(result, Err(Error::JsonRpc { code, .. }) if code == ErrorCode::ServerError(4200))
        );
        assert!(seen.lock().unwrap().is_empty());
    }
}
