// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use strum_macros::EnumIter;
use tokio::sync::oneshot;

use crate::{
    in_page_provider::{
        CallbackRegistry, CompletionHandler, InPageErrorCode, JsonRpcRequest, RequestId,
    },
    protocols::eth::engine::{Next, Subprovider},
    Error,
};

/// Operations that the host application approves and performs on behalf of the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum WalletHook {
    /// `eth_sendTransaction`: sign and submit.
    ProcessTransaction,
    /// `eth_signTransaction`: sign only.
    SignTransaction,
    /// `eth_sign`
    SignMessage,
    /// `personal_sign`
    SignPersonalMessage,
    /// `eth_signTypedData`, `eth_signTypedData_v3`, `eth_signTypedData_v4`
    SignTypedMessage,
}

impl WalletHook {
    pub fn for_method(method: &str) -> Option<Self> {
        match method {
            "eth_sendTransaction" => Some(Self::ProcessTransaction),
            "eth_signTransaction" => Some(Self::SignTransaction),
            "eth_sign" => Some(Self::SignMessage),
            "personal_sign" => Some(Self::SignPersonalMessage),
            "eth_signTypedData" | "eth_signTypedData_v3" | "eth_signTypedData_v4" => {
                Some(Self::SignTypedMessage)
            }
            _ => None,
        }
    }
}

/// Callbacks into the host wallet application.
pub trait WalletHooksI: Send + Sync + Debug {
    /// Addresses exposed to the page.
    fn get_accounts(&self) -> Vec<String>;

    /// Ask the user to approve the request through the UI.
    ///
    /// Must not block. The host completes the request later with
    /// `InPageProvider::execute_callback` using the same id: the signature or transaction hash as
    /// value on success, an error message if the user rejected or the operation failed.
    fn request_approval(&self, id: RequestId, hook: WalletHook, params: serde_json::Value);

    /// Whether the wallet implements the hook. Every wallet must at least process transactions.
    fn supports(&self, hook: WalletHook) -> bool {
        hook == WalletHook::ProcessTransaction
    }

    /// Ask the user to connect the page to the wallet. Returns whether the user approved.
    fn enable(&self) -> bool;
}

/// Answers account queries from the wallet and hands signing requests to the host application.
#[derive(Debug)]
pub struct HookedWalletSubprovider {
    hooks: Arc<dyn WalletHooksI>,
    callbacks: Arc<CallbackRegistry>,
}

impl HookedWalletSubprovider {
    pub fn new(hooks: Arc<dyn WalletHooksI>, callbacks: Arc<CallbackRegistry>) -> Self {
        Self { hooks, callbacks }
    }

    async fn approve(
        &self,
        request: &JsonRpcRequest,
        hook: WalletHook,
    ) -> Result<serde_json::Value, Error> {
        if !self.hooks.supports(hook) {
            return Err(Error::JsonRpc {
                code: InPageErrorCode::UnsupportedMethod.into(),
                message: format!("This method is not supported: '{}'", request.method),
            });
        }

        let id = request.id.clone().unwrap_or_default();
        let (sender, receiver) = oneshot::channel();
        let handler = CompletionHandler::plain(move |error, value| {
            let outcome = match error {
                Some(message) if !message.is_empty() => Err(message),
                _ => Ok(value),
            };
            // The page request may have been dropped in the meantime.
            let _ = sender.send(outcome);
        });
        let displaced = self.callbacks.register(id.clone(), handler)?;
        // Dropping the earlier handler closes its channel, so its request fails instead of
        // waiting forever.
        drop(displaced);

        log::debug!("Requesting '{hook}' approval for request id '{id}'");
        self.hooks.request_approval(id, hook, request.params.clone());

        match receiver.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(Error::JsonRpc {
                code: InPageErrorCode::UserRejected.into(),
                message,
            }),
            Err(_) => Err(Error::JsonRpc {
                code: InPageErrorCode::InternalError.into(),
                message: "Request was superseded by another request with the same id".into(),
            }),
        }
    }
}

#[async_trait]
impl Subprovider for HookedWalletSubprovider {
    async fn handle_request(
        &self,
        request: &JsonRpcRequest,
        next: Next<'_>,
    ) -> Result<serde_json::Value, Error> {
        match request.method.as_str() {
            "eth_accounts" => Ok(self.hooks.get_accounts().into()),
            "eth_coinbase" => Ok(self
                .hooks
                .get_accounts()
                .into_iter()
                .next()
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null)),
            method => match WalletHook::for_method(method) {
                Some(hook) => self.approve(request, hook).await,
                None => next.run(request).await,
            },
        }
    }
}
