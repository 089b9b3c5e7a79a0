// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt::{Display, Formatter};

use jsonrpsee::types::{ErrorObject, ErrorObjectOwned, TwoPointZero};
use serde::{Deserialize, Serialize};

use crate::{config, Error};

/// JSON-RPC request id as sent by the page. Opaque to the bridge.
///
/// Numbers are kept as sent, negative and fractional ids included.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    Str(String),
}

impl RequestId {
    /// Zero and empty ids are treated as missing by the page scripts we serve.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestId::Number(n) => n.as_u64() == Some(0),
            RequestId::Str(s) => s.is_empty(),
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        RequestId::Number(config::DEFAULT_REQUEST_ID.into())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        RequestId::Number(value.into())
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Number(value.into())
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::Str(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId::Str(value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub jsonrpc: TwoPointZero,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    pub fn new(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: serde_json::Value,
    ) -> Self {
        Self {
            id: Some(id.into()),
            jsonrpc: TwoPointZero,
            method: method.into(),
            params,
        }
    }

    /// Substitute the default id if the request has none, as the node would reject it.
    pub fn with_default_id(mut self) -> Self {
        let missing = self.id.as_ref().map_or(true, RequestId::is_empty);
        if missing {
            self.id = Some(RequestId::default());
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ResponsePayload {
    #[serde(rename = "result")]
    Result(serde_json::Value),
    #[serde(rename = "error")]
    Error(ErrorObjectOwned),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub id: Option<RequestId>,
    pub jsonrpc: TwoPointZero,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    pub fn result(id: Option<RequestId>, result: serde_json::Value) -> Self {
        Self {
            id,
            jsonrpc: TwoPointZero,
            payload: ResponsePayload::Result(result),
        }
    }

    /// Build an error response. Fails with the passed error if it can't be expressed in
    /// JSON-RPC.
    pub fn from_error(id: Option<RequestId>, error: Error) -> Result<Self, Error> {
        match error {
            Error::JsonRpc { code, message } => {
                // We need to select a data type even though data is none, <String>
                let data: Option<String> = None;
                let error_object = ErrorObject::owned(code.code(), message, data);
                Ok(Self {
                    id,
                    jsonrpc: TwoPointZero,
                    payload: ResponsePayload::Error(error_object),
                })
            }
            error => Err(error),
        }
    }

    pub fn result_value(&self) -> Option<&serde_json::Value> {
        match &self.payload {
            ResponsePayload::Result(value) => Some(value),
            ResponsePayload::Error(_) => None,
        }
    }

    /// Unwrap the result or turn the error object into an error.
    pub fn into_result(self) -> Result<serde_json::Value, Error> {
        match self.payload {
            ResponsePayload::Result(value) => Ok(value),
            ResponsePayload::Error(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use jsonrpsee::types::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn parses_request_without_id_or_params() -> Result<()> {
        let req: JsonRpcRequest = serde_json::from_str(r#"{"method":"eth_chainId"}"#)?;
        assert_eq!(req.id, None);
        assert_eq!(req.params, serde_json::Value::Null);
        Ok(())
    }

    #[test]
    fn parses_string_and_number_ids() -> Result<()> {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"id":"abc","jsonrpc":"2.0","method":"x"}"#)?;
        assert_eq!(req.id, Some(RequestId::from("abc")));
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"id":7,"jsonrpc":"2.0","method":"x"}"#)?;
        assert_eq!(req.id, Some(RequestId::from(7u64)));
        Ok(())
    }

    #[test]
    fn parses_negative_and_fractional_ids() -> Result<()> {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"id":-1,"jsonrpc":"2.0","method":"x"}"#)?;
        assert_eq!(req.id, Some(RequestId::from(-1i64)));
        assert_eq!(req.id.as_ref().map(ToString::to_string), Some("-1".into()));

        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"id":1.5,"jsonrpc":"2.0","method":"x"}"#)?;
        let id = req.id.expect("has id");
        assert!(!id.is_empty());
        assert_eq!(serde_json::to_value(&id)?, json!(1.5));
        Ok(())
    }

    #[test]
    fn default_id_replaces_missing_and_empty_ids() {
        let mut req = JsonRpcRequest::new(0u64, "eth_blockNumber", json!([]));
        assert_eq!(req.clone().with_default_id().id, Some(RequestId::from(1u64)));

        req.id = Some("".into());
        assert_eq!(req.clone().with_default_id().id, Some(RequestId::from(1u64)));

        req.id = None;
        assert_eq!(req.clone().with_default_id().id, Some(RequestId::from(1u64)));

        req.id = Some(42u64.into());
        assert_eq!(req.with_default_id().id, Some(RequestId::from(42u64)));
    }

    #[test]
    fn result_response_keeps_null_result() -> Result<()> {
        let response = JsonRpcResponse::result(Some(3u64.into()), serde_json::Value::Null);
        let value = serde_json::to_value(&response)?;
        assert_eq!(value, json!({"id": 3, "jsonrpc": "2.0", "result": null}));
        Ok(())
    }

    #[test]
    fn json_rpc_error_becomes_error_response() -> Result<()> {
        let error = Error::JsonRpc {
            code: ErrorCode::ServerError(-32000),
            message: "boom".into(),
        };
        let response = JsonRpcResponse::from_error(Some(1u64.into()), error)?;
        let value = serde_json::to_value(&response)?;
        assert_eq!(value["error"]["code"], json!(-32000));
        assert_eq!(value["error"]["message"], json!("boom"));
        assert!(value.get("result").is_none());
        Ok(())
    }

    #[test]
    fn other_errors_are_not_responses() {
        let error = Error::Fatal {
            error: "oops".into(),
        };
        let result = JsonRpcResponse::from_error(None, error.clone());
        assert_eq!(result.unwrap_err(), error);
    }
}
