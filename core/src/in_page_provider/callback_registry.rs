// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Mutex,
};

use jsonrpsee::types::TwoPointZero;
use serde::{Deserialize, Serialize};

use crate::{in_page_provider::RequestId, Error};

/// Error-first completion: `(error, value)`.
pub type PlainHandler = Box<dyn FnOnce(Option<String>, serde_json::Value) + Send>;
/// JSON-RPC completion: `(error_envelope, success_envelope)`, exactly one of them is set.
pub type RpcHandler = Box<dyn FnOnce(Option<RpcEnvelope>, Option<RpcEnvelope>) + Send>;

/// How a pending request wants to be told about its outcome.
pub enum CompletionHandler {
    Plain(PlainHandler),
    Rpc(RpcHandler),
}

impl CompletionHandler {
    pub fn plain(
        handler: impl FnOnce(Option<String>, serde_json::Value) + Send + 'static,
    ) -> Self {
        Self::Plain(Box::new(handler))
    }

    pub fn rpc(
        handler: impl FnOnce(Option<RpcEnvelope>, Option<RpcEnvelope>) + Send + 'static,
    ) -> Self {
        Self::Rpc(Box::new(handler))
    }

    fn invoke(self, id: RequestId, error: Option<String>, value: serde_json::Value) {
        match self {
            Self::Plain(handler) => handler(error, value),
            Self::Rpc(handler) => {
                // An empty message means success, same as no message.
                let error = error.filter(|message| !message.is_empty());
                let is_error = error.is_some();
                let envelope = RpcEnvelope {
                    id,
                    jsonrpc: TwoPointZero,
                    result: value,
                    error: EnvelopeError { message: error },
                };
                if is_error {
                    handler(Some(envelope), None)
                } else {
                    handler(None, Some(envelope))
                }
            }
        }
    }
}

impl Debug for CompletionHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("CompletionHandler::Plain"),
            Self::Rpc(_) => f.write_str("CompletionHandler::Rpc"),
        }
    }
}

/// Response handed to RPC-style handlers. Carries both `result` and `error` so that the same
/// completion call satisfies raw-value and JSON-RPC callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    pub id: RequestId,
    pub jsonrpc: TwoPointZero,
    pub result: serde_json::Value,
    pub error: EnvelopeError,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub message: Option<String>,
}

/// Pending requests waiting for the host application to decide their outcome.
///
/// The id is the only state shared between the page's request and the host's approval UI.
/// Entries have no timeout, an id that is never completed stays until the registry is dropped.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    pending: Mutex<HashMap<RequestId, CompletionHandler>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Store the handler under the id.
    ///
    /// If the id is already pending, the previous handler is displaced and returned. The registry
    /// never invokes a displaced handler.
    pub fn register(
        &self,
        id: RequestId,
        handler: CompletionHandler,
    ) -> Result<Option<CompletionHandler>, Error> {
        let mut pending = self.pending.lock()?;
        let displaced = pending.insert(id.clone(), handler);
        if displaced.is_some() {
            log::warn!("Request id '{id}' was registered while pending, dropping the earlier handler");
        }
        Ok(displaced)
    }

    /// Deliver the outcome to the handler registered under the id and forget the id.
    ///
    /// The entry is removed before the handler runs, so it is gone even if the handler panics.
    pub fn complete(
        &self,
        id: &RequestId,
        error: Option<String>,
        value: serde_json::Value,
    ) -> Result<(), Error> {
        log::debug!(
            "executing callback: \nid: {id}\nvalue: {value}\nerror: {}\n",
            error.as_deref().unwrap_or("none")
        );
        let handler = {
            let mut pending = self.pending.lock()?;
            pending.remove(id)
        };
        let handler = handler.ok_or_else(|| Error::UnknownRequestId { id: id.to_string() })?;
        handler.invoke(id.clone(), error, value);
        Ok(())
    }

    pub fn is_pending(&self, id: &RequestId) -> Result<bool, Error> {
        let pending = self.pending.lock()?;
        Ok(pending.contains_key(id))
    }

    pub fn len(&self) -> Result<usize, Error> {
        let pending = self.pending.lock()?;
        Ok(pending.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        panic::{self, AssertUnwindSafe},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use anyhow::Result;
    use serde_json::json;

    use super::*;

    type Calls<T> = Arc<Mutex<Vec<T>>>;

    fn recording_plain() -> (CompletionHandler, Calls<(Option<String>, serde_json::Value)>) {
        let calls: Calls<_> = Default::default();
        let sink = calls.clone();
        let handler = CompletionHandler::plain(move |error, value| {
            sink.lock().unwrap().push((error, value));
        });
        (handler, calls)
    }

    fn recording_rpc() -> (
        CompletionHandler,
        Calls<(Option<RpcEnvelope>, Option<RpcEnvelope>)>,
    ) {
        let calls: Calls<_> = Default::default();
        let sink = calls.clone();
        let handler = CompletionHandler::rpc(move |error, response| {
            sink.lock().unwrap().push((error, response));
        });
        (handler, calls)
    }

    #[test]
    fn completes_exactly_once_and_forgets_id() -> Result<()> {
        let registry = CallbackRegistry::new();
        let id = RequestId::from(7u64);
        let counter = Arc::new(AtomicUsize::new(0));
        let handler_counter = counter.clone();
        registry.register(
            id.clone(),
            CompletionHandler::plain(move |_, _| {
                handler_counter.fetch_add(1, Ordering::SeqCst);
            }),
        )?;
        assert!(registry.is_pending(&id)?);

        registry.complete(&id, None, json!("0xabc"))?;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!registry.is_pending(&id)?);
        assert!(registry.is_empty()?);

        // Second completion is rejected and the handler doesn't run again.
        let result = registry.complete(&id, None, json!("0xabc"));
        assert!(matches!(result, Err(Error::UnknownRequestId { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        Ok(())
    }

    #[test]
    fn plain_handler_gets_arguments_verbatim() -> Result<()> {
        let registry = CallbackRegistry::new();
        let (handler, calls) = recording_plain();
        registry.register("tx-1".into(), handler)?;

        registry.complete(&"tx-1".into(), Some("denied".into()), json!({"a": 1}))?;

        let calls = calls.lock().unwrap();
        assert_eq!(*calls, vec![(Some("denied".to_string()), json!({"a": 1}))]);
        Ok(())
    }

    #[test]
    fn rpc_handler_success_goes_to_response_channel() -> Result<()> {
        let registry = CallbackRegistry::new();
        let (handler, calls) = recording_rpc();
        registry.register(5u64.into(), handler)?;

        registry.complete(&5u64.into(), None, json!("0xdeadbeef"))?;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (error, response) = calls[0].clone();
        assert_eq!(error, None);
        let response = serde_json::to_value(response)?;
        assert_eq!(
            response,
            json!({"id": 5, "jsonrpc": "2.0", "result": "0xdeadbeef", "error": {"message": null}})
        );
        Ok(())
    }

    #[test]
    fn rpc_handler_error_goes_to_error_channel() -> Result<()> {
        let registry = CallbackRegistry::new();
        let (handler, calls) = recording_rpc();
        registry.register(5u64.into(), handler)?;

        registry.complete(&5u64.into(), Some("boom".into()), serde_json::Value::Null)?;

        let calls = calls.lock().unwrap();
        let (error, response) = calls[0].clone();
        assert_eq!(response, None);
        let error = serde_json::to_value(error)?;
        assert_eq!(
            error,
            json!({"id": 5, "jsonrpc": "2.0", "result": null, "error": {"message": "boom"}})
        );
        Ok(())
    }

    #[test]
    fn rpc_handler_empty_error_is_success() -> Result<()> {
        let registry = CallbackRegistry::new();
        let (handler, calls) = recording_rpc();
        registry.register(1u64.into(), handler)?;

        registry.complete(&1u64.into(), Some("".into()), json!("0xsig"))?;

        let calls = calls.lock().unwrap();
        let (error, response) = calls[0].clone();
        assert_eq!(error, None);
        let response = serde_json::to_value(response)?;
        assert_eq!(
            response,
            json!({"id": 1, "jsonrpc": "2.0", "result": "0xsig", "error": {"message": null}})
        );
        Ok(())
    }

    #[test]
    fn plain_handler_gets_empty_error_verbatim() -> Result<()> {
        let registry = CallbackRegistry::new();
        let (handler, calls) = recording_plain();
        registry.register(2u64.into(), handler)?;

        registry.complete(&2u64.into(), Some("".into()), json!("0xsig"))?;

        let calls = calls.lock().unwrap();
        assert_eq!(*calls, vec![(Some("".to_string()), json!("0xsig"))]);
        Ok(())
    }

    #[test]
    fn completing_unknown_id_fails() {
        let registry = CallbackRegistry::new();
        let result = registry.complete(&"nope".into(), None, json!(true));
        assert_eq!(
            result,
            Err(Error::UnknownRequestId { id: "nope".into() })
        );
    }

    #[test]
    fn reregistering_displaces_earlier_handler() -> Result<()> {
        let registry = CallbackRegistry::new();
        let (first, first_calls) = recording_plain();
        let (second, second_calls) = recording_plain();

        assert!(registry.register(1u64.into(), first)?.is_none());
        let displaced = registry.register(1u64.into(), second)?;
        assert!(matches!(displaced, Some(CompletionHandler::Plain(_))));
        drop(displaced);

        registry.complete(&1u64.into(), None, json!(1))?;

        assert!(first_calls.lock().unwrap().is_empty());
        assert_eq!(second_calls.lock().unwrap().len(), 1);
        assert_eq!(registry.len()?, 0);
        Ok(())
    }

    #[test]
    fn entry_is_removed_even_if_handler_panics() -> Result<()> {
        let registry = CallbackRegistry::new();
        registry.register(
            9u64.into(),
            CompletionHandler::plain(|_, _| panic!("handler failed")),
        )?;

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            registry.complete(&9u64.into(), None, json!(null))
        }));

        assert!(result.is_err());
        assert!(!registry.is_pending(&9u64.into())?);
        Ok(())
    }
}
