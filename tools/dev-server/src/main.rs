// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{env, sync::Arc};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use dotenv::dotenv;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use wallet_bridge_core::{async_runtime, InPageProvider, RequestId, SyncOptions};
use wallet_bridge_tools_lib::{decode_response, tool_provider, DEFAULT_RPC_URL};

const STATIC_FOLDER: &str = "./static";
const ADDRESS: &str = "127.0.0.1:8080";

/// Wallet Bridge Dev Server
///
/// Serves the static directory at `http://localhost:8080/`, handles in-page requests at
/// `http://localhost:8080/backend` and completes pending approvals at
/// `http://localhost:8080/callback`.
///
/// Configured from the environment or `.env`: `RPC_URL`, `ADDRESS` and `NETWORK_VERSION`.
fn main() -> anyhow::Result<()> {
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.into());
    let sync_options = SyncOptions {
        address: env::var("ADDRESS").ok(),
        network_version: env::var("NETWORK_VERSION").ok(),
    };
    let provider = Arc::new(tool_provider(&rpc_url, sync_options)?);

    async_runtime::block_on(run_server(provider))
}

async fn run_server(provider: Arc<InPageProvider>) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/backend", post(backend))
        .route("/callback", post(callback))
        .fallback_service(ServeDir::new(STATIC_FOLDER))
        .layer(TraceLayer::new_for_http())
        .with_state(provider);

    log::info!("Listening on http://{ADDRESS}");
    axum::Server::bind(&ADDRESS.parse()?)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn backend(
    State(provider): State<Arc<InPageProvider>>,
    req_body: String,
) -> impl IntoResponse {
    // Signing requests only resolve once `/callback` is called.
    match provider.in_page_request_async(req_body).await {
        Ok(response_hex) => {
            if let Ok(response) = decode_response(&response_hex) {
                log::debug!("In-page response: '{response}'");
            }
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain")],
                response_hex,
            )
        }
        Err(err) => {
            log::error!("Error processing in page request: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "".to_string(),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    id: RequestId,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    value: serde_json::Value,
}

async fn callback(
    State(provider): State<Arc<InPageProvider>>,
    Json(params): Json<CallbackParams>,
) -> impl IntoResponse {
    let CallbackParams { id, error, value } = params;
    match provider.execute_callback(&id, error, value) {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            log::warn!("Error executing callback: {err}");
            StatusCode::NOT_FOUND
        }
    }
}
