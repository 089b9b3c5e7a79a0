// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::{
    async_runtime as rt, config,
    in_page_provider::{
        CallbackRegistry, CompletionHandler, InPageErrorCode, JsonRpcRequest,
        JsonRpcResponse, RequestId, SyncOptions,
    },
    protocols::eth::{
        CacheSubprovider, FilterSubprovider, HookedWalletSubprovider, ProviderEngine,
        RpcTransport, SubscriptionsSubprovider, WalletHooksI,
    },
    Error,
};

#[derive(Debug, TypedBuilder)]
pub struct InPageProviderArgs {
    /// The node endpoint. May carry `user:password@` for basic auth.
    #[builder(setter(into))]
    pub rpc_url: String,
    pub wallet_hooks: Box<dyn WalletHooksI>,
    #[builder(default)]
    pub sync_options: SyncOptions,
}

/// Ethereum provider exposed to the page.
///
/// Account and network queries are answered from the sync options, signing requests go to the
/// host application through the wallet hooks, everything else goes to the node.
#[derive(Debug)]
pub struct InPageProvider {
    engine: Arc<ProviderEngine>,
    callbacks: Arc<CallbackRegistry>,
    wallet_hooks: Arc<dyn WalletHooksI>,
    sync_options: RwLock<SyncOptions>,
}

impl InPageProvider {
    pub fn new(args: InPageProviderArgs) -> Result<Self, Error> {
        let InPageProviderArgs {
            rpc_url,
            wallet_hooks,
            sync_options,
        } = args;
        let wallet_hooks: Arc<dyn WalletHooksI> = wallet_hooks.into();
        let callbacks = Arc::new(CallbackRegistry::new());

        let mut engine = ProviderEngine::new();
        engine.add_provider(CacheSubprovider::new());
        engine.add_provider(SubscriptionsSubprovider::new());
        engine.add_provider(FilterSubprovider::new());
        engine.add_provider(HookedWalletSubprovider::new(
            wallet_hooks.clone(),
            callbacks.clone(),
        ));
        engine.add_provider(RpcTransport::new(&rpc_url)?);

        Ok(Self::with_engine(engine, wallet_hooks, callbacks, sync_options))
    }

    /// Wrap a custom pipeline. The callback registry must be the one the pipeline's hooked wallet
    /// registers into.
    pub fn with_engine(
        engine: ProviderEngine,
        wallet_hooks: Arc<dyn WalletHooksI>,
        callbacks: Arc<CallbackRegistry>,
        sync_options: SyncOptions,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            callbacks,
            wallet_hooks,
            sync_options: RwLock::new(sync_options),
        }
    }

    pub fn sync_options(&self) -> Result<SyncOptions, Error> {
        let sync_options = self.sync_options.read()?;
        Ok(sync_options.clone())
    }

    /// Replace the sync options, eg. when the user switched accounts or networks.
    pub fn set_sync_options(&self, sync_options: SyncOptions) -> Result<(), Error> {
        let mut current = self.sync_options.write()?;
        *current = sync_options;
        Ok(())
    }

    /// Defer the answer to a request until the host calls `execute_callback` with the same id.
    /// Returns the handler that was pending under the id, if any. It won't be called.
    pub fn add_callback(
        &self,
        id: RequestId,
        handler: CompletionHandler,
    ) -> Result<Option<CompletionHandler>, Error> {
        self.callbacks.register(id, handler)
    }

    /// Deliver the host's decision for a deferred request.
    pub fn execute_callback(
        &self,
        id: &RequestId,
        error: Option<String>,
        value: serde_json::Value,
    ) -> Result<(), Error> {
        self.callbacks.complete(id, error, value)
    }

    /// Answer a request synchronously from local state. Only a few methods support this.
    pub fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, Error> {
        let sync_options = self.sync_options()?;
        let result = match request.method.as_str() {
            "eth_accounts" => to_value(sync_options.accounts())?,
            "eth_coinbase" => to_value(sync_options.address)?,
            "eth_uninstallFilter" => {
                self.uninstall_filter_in_background(request.clone());
                serde_json::Value::Bool(true)
            }
            "net_version" => to_value(sync_options.network_version)?,
            "net_listening" => serde_json::Value::Bool(self.probe_listening(request)),
            method => {
                return Err(Error::UnsupportedSyncMethod {
                    method: method.into(),
                })
            }
        };
        Ok(JsonRpcResponse::result(request.id.clone(), result))
    }

    fn uninstall_filter_in_background(&self, request: JsonRpcRequest) {
        let engine = self.engine.clone();
        let request = request.with_default_id();
        rt::spawn(async move {
            if let Err(err) = engine.send_async(&request).await {
                log::warn!("Failed to uninstall filter: {err}");
            }
        });
    }

    /// Any failure means not listening.
    fn probe_listening(&self, request: &JsonRpcRequest) -> bool {
        let transport = match self.engine.transport() {
            Some(transport) => transport,
            None => return false,
        };
        match transport.proxy_rpc_request("net_listening", request_params(request)) {
            Ok(serde_json::Value::Bool(listening)) => listening,
            Ok(_) => true,
            Err(err) => {
                log::debug!("net_listening probe failed: {err}");
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        let request = JsonRpcRequest::new(
            config::CONNECTIVITY_PROBE_REQUEST_ID,
            "net_listening",
            serde_json::Value::Array(Vec::new()),
        );
        self.send(&request)
            .ok()
            .and_then(|response| response.result_value().and_then(|v| v.as_bool()))
            .unwrap_or(false)
    }

    /// Resolve a request. JSON-RPC errors are returned as error responses, other errors are
    /// returned as errors.
    pub async fn send_async(
        &self,
        request: JsonRpcRequest,
    ) -> Result<JsonRpcResponse, Error> {
        let result = match request.method.as_str() {
            "net_version" => self
                .sync_options()
                .and_then(|options| to_value(options.network_version)),
            "eth_requestAccounts" => self
                .sync_options()
                .and_then(|options| to_value(options.accounts())),
            "eth_chainId" => self
                .sync_options()
                .and_then(|options| options.hex_chain_id())
                .and_then(|chain_id| to_value(chain_id)),
            _ => {
                let request = request.with_default_id();
                let result = self.engine.send_async(&request).await;
                return response_from_result(request.id, result);
            }
        };
        response_from_result(request.id, result)
    }

    /// Resolve a request to its bare result.
    pub fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, Error> {
        rt::block_on(self.request_async(method, params))
    }

    pub async fn request_async(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, Error> {
        let request = JsonRpcRequest {
            id: None,
            jsonrpc: Default::default(),
            method: method.into(),
            params,
        };
        self.send_async(request).await?.into_result()
    }

    /// Point the network transport at a new node.
    pub fn set_host(&self, host: &str) -> Result<(), Error> {
        self.engine.set_host(host)
    }

    /// Ask the user to connect the page. Resolves to the accounts exposed to the page.
    pub fn enable(&self) -> Result<Vec<String>, Error> {
        if self.wallet_hooks.enable() {
            Ok(self.sync_options()?.accounts())
        } else {
            Err(InPageErrorCode::UserRejected.into())
        }
    }

    /// Handle a raw JSON-RPC request from the page script and return the serialized response
    /// hex encoded.
    pub fn in_page_request(&self, raw_request: String) -> Result<String, Error> {
        rt::block_on(self.in_page_request_async(raw_request))
    }

    pub async fn in_page_request_async(&self, raw_request: String) -> Result<String, Error> {
        // We can only return JSON RPC message with error if we can parse the message,
        // because we need the request id for that.
        if raw_request.as_bytes().len() > config::MAX_JSONRPC_REQUEST_SIZE_BYTES {
            return Err(invalid_raw_request());
        }
        let request: JsonRpcRequest =
            serde_json::from_str(&raw_request).map_err(|_| invalid_raw_request())?;
        let id = request.id.clone();
        let mut response = serde_json::to_string(&self.send_async(request).await?)?;
        if response.as_bytes().len() > config::MAX_JSONRPC_RESPONSE_SIZE_BYTES {
            let too_large = Error::JsonRpc {
                code: InPageErrorCode::InternalError.into(),
                message: "Response is too large".into(),
            };
            response = serde_json::to_string(&JsonRpcResponse::from_error(id, too_large)?)?;
        }
        // Prevent reflected XSS by passing the result as hexadecimal utf-8 bytes to JS.
        Ok(hex::encode(response.as_bytes()))
    }
}

fn response_from_result(
    id: Option<RequestId>,
    result: Result<serde_json::Value, Error>,
) -> Result<JsonRpcResponse, Error> {
    match result {
        Ok(value) => Ok(JsonRpcResponse::result(id, value)),
        Err(error) => JsonRpcResponse::from_error(id, error),
    }
}

fn request_params(request: &JsonRpcRequest) -> serde_json::Value {
    match &request.params {
        serde_json::Value::Null => serde_json::Value::Array(Vec::new()),
        params => params.clone(),
    }
}

fn to_value(val: impl Serialize) -> Result<serde_json::Value, Error> {
    serde_json::to_value(val).map_err(|_err| Error::Fatal {
        error: "Failed to serialize json value".into(),
    })
}

fn invalid_raw_request() -> Error {
    Error::Retriable {
        error: "Could not parse JSON-RPC request".into(),
    }
}
