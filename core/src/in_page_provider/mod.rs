// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod callback_registry;
mod error_code;
mod json_rpc;
mod provider;
mod sync_options;

pub use callback_registry::{
    CallbackRegistry, CompletionHandler, EnvelopeError, PlainHandler, RpcEnvelope, RpcHandler,
};
pub use error_code::InPageErrorCode;
pub use json_rpc::{JsonRpcRequest, JsonRpcResponse, RequestId, ResponsePayload};
pub use provider::{InPageProvider, InPageProviderArgs};
pub use sync_options::SyncOptions;
