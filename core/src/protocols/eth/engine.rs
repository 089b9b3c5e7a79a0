// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::{
    in_page_provider::{InPageErrorCode, JsonRpcRequest},
    protocols::eth::RpcTransport,
    Error,
};

/// A stage of the provider pipeline. A stage either answers the request or passes it on with
/// `next.run(request)`.
#[async_trait]
pub trait Subprovider: Debug + Send + Sync {
    async fn handle_request(
        &self,
        request: &JsonRpcRequest,
        next: Next<'_>,
    ) -> Result<serde_json::Value, Error>;

    /// The network transport if this stage talks to a node.
    fn transport(&self) -> Option<&RpcTransport> {
        None
    }
}

/// The stages after the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Box<dyn Subprovider>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(stages: &'a [Box<dyn Subprovider>]) -> Self {
        Self { stages }
    }

    pub async fn run(self, request: &JsonRpcRequest) -> Result<serde_json::Value, Error> {
        match self.stages.split_first() {
            Some((stage, stages)) => stage.handle_request(request, Next { stages }).await,
            // Must return 4200 for unsupported method for Ethereum
            // https://github.com/ethereum/EIPs/blob/master/EIPS/eip-1193.md#supported-rpc-methods
            None => Err(Error::JsonRpc {
                code: InPageErrorCode::UnsupportedMethod.into(),
                message: format!("This method is not supported: '{}'", request.method),
            }),
        }
    }
}

/// Ordered chain of subproviders, the last one is normally the network transport.
#[derive(Debug, Default)]
pub struct ProviderEngine {
    stages: Vec<Box<dyn Subprovider>>,
}

impl ProviderEngine {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn add_provider(&mut self, stage: impl Subprovider + 'static) {
        self.stages.push(Box::new(stage));
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the request through the pipeline.
    pub async fn send_async(
        &self,
        request: &JsonRpcRequest,
    ) -> Result<serde_json::Value, Error> {
        let result = Next::new(&self.stages).run(request).await;
        match &result {
            Err(error) if !error.is_json_rpc() => {
                log::error!("Pipeline error for '{}': {}", request.method, error)
            }
            Err(error) => log::debug!("'{}' answered with {}", request.method, error),
            Ok(_) => (),
        }
        result
    }

    /// The first stage that can talk to a node.
    pub fn transport(&self) -> Option<&RpcTransport> {
        self.stages.iter().find_map(|stage| stage.transport())
    }

    /// Point the last stage at a new node.
    pub fn set_host(&self, host: &str) -> Result<(), Error> {
        let transport = self
            .stages
            .last()
            .and_then(|stage| stage.transport())
            .ok_or_else(|| Error::Fatal {
                error: "The last pipeline stage is not a network transport".into(),
            })?;
        transport.set_host(host)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use super::*;

    /// Terminating stage with canned answers that records the requests it sees.
    #[derive(Debug, Default)]
    pub(crate) struct MockNode {
        answers: HashMap<String, serde_json::Value>,
        pub(crate) seen: Arc<Mutex<Vec<JsonRpcRequest>>>,
    }

    impl MockNode {
        pub(crate) fn new() -> Self {
            Default::default()
        }

        pub(crate) fn answer(mut self, method: &str, result: serde_json::Value) -> Self {
            self.answers.insert(method.into(), result);
            self
        }

        pub(crate) fn seen_requests(&self) -> Arc<Mutex<Vec<JsonRpcRequest>>> {
            self.seen.clone()
        }
    }

    #[async_trait]
    impl Subprovider for MockNode {
        async fn handle_request(
            &self,
            request: &JsonRpcRequest,
            next: Next<'_>,
        ) -> Result<serde_json::Value, Error> {
            self.seen.lock().unwrap().push(request.clone());
            match self.answers.get(&request.method) {
                Some(result) => Ok(result.clone()),
                None => next.run(request).await,
            }
        }
    }
}
