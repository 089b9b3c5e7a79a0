// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ethers::providers::RpcError;
use jsonrpsee::types::{error::ErrorCode as JsonrpseeErrorCode, ErrorObject};

use crate::in_page_provider::InPageErrorCode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Jsonrpc error code: {code} message:\n {message}")]
    JsonRpc {
        code: JsonrpseeErrorCode,
        message: String,
    },
    /// The operation resulted in an error, but it can be retried.
    #[error("Retriable Error: '{error}'")]
    Retriable { error: String },
    /// A runtime invariant violation.
    #[error("Fatal Error: '{error}'")]
    Fatal { error: String },
    /// An error where the message can be presented directly to the user.
    #[error("{explanation}")]
    User { explanation: String },
    /// Synchronous calls can only be answered from local state.
    #[error(
        "The injected provider does not support synchronous methods like {method} without a callback parameter."
    )]
    UnsupportedSyncMethod { method: String },
    /// Completion was requested for an id that is not pending, either because it was never
    /// registered or because it was completed already.
    #[error("No pending request with id '{id}'")]
    UnknownRequestId { id: String },
}

impl Error {
    /// Whether the error can be sent to the page as a JSON-RPC error response.
    pub fn is_json_rpc(&self) -> bool {
        matches!(self, Error::JsonRpc { .. })
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Error::Fatal {
            error: err.to_string(),
        }
    }
}

impl From<InPageErrorCode> for Error {
    fn from(code: InPageErrorCode) -> Self {
        let code: JsonrpseeErrorCode = code.into();
        Error::JsonRpc {
            code,
            message: code.to_string(),
        }
    }
}

impl From<ErrorObject<'static>> for Error {
    fn from(error: ErrorObject) -> Self {
        let message = error.message();
        Error::JsonRpc {
            code: error.code().into(),
            message: message.into(),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Retriable {
            // Error is opaque, ok to log.
            error: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Intentionally opaque as the request URL may contain credentials.
        let error = if err.is_builder() {
            "Failed to build HTTP client"
        } else {
            "HTTP request error"
        };
        Error::Retriable {
            error: error.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Fatal {
            error: format!("JSON serialization error: {err}"),
        }
    }
}

impl From<ethers::providers::ProviderError> for Error {
    fn from(err: ethers::providers::ProviderError) -> Self {
        (&err).into()
    }
}

impl From<&ethers::providers::ProviderError> for Error {
    fn from(err: &ethers::providers::ProviderError) -> Self {
        use ethers::providers::ProviderError;
        match err {
            ProviderError::JsonRpcClientError(error) => error
                .as_error_response()
                .map(|e| e.into())
                .unwrap_or_else(|| Self::Retriable {
                    error: error.to_string(),
                }),
            ProviderError::EnsError(message) => Self::User {
                explanation: message.clone(),
            },
            err => Self::Retriable {
                error: err.to_string(),
            },
        }
    }
}

impl From<&ethers::providers::JsonRpcError> for Error {
    fn from(err: &ethers::providers::JsonRpcError) -> Self {
        match i32::try_from(err.code) {
            Ok(code) => Self::JsonRpc {
                code: code.into(),
                message: err.message.clone(),
            },
            Err(_) => Self::Retriable {
                error: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_sync_method_names_method() {
        let err = Error::UnsupportedSyncMethod {
            method: "eth_foo".into(),
        };
        assert!(err.to_string().contains("eth_foo"));
    }

    #[test]
    fn node_error_keeps_code() {
        let node_error = ethers::providers::JsonRpcError {
            code: -32000,
            message: "execution reverted".into(),
            data: None,
        };
        let err: Error = (&node_error).into();
        assert_eq!(
            err,
            Error::JsonRpc {
                code: JsonrpseeErrorCode::ServerError(-32000),
                message: "execution reverted".into()
            }
        );
    }

    #[test]
    fn out_of_range_node_error_is_retriable() {
        let node_error = ethers::providers::JsonRpcError {
            code: i64::MAX,
            message: "weird".into(),
            data: None,
        };
        let err: Error = (&node_error).into();
        assert!(matches!(err, Error::Retriable { .. }));
    }
}
