// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{fmt::Debug, sync::RwLock};

use async_trait::async_trait;
use ethers::providers::{Authorization, Http, Provider};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use url::Url;

use crate::{
    async_runtime as rt, config,
    in_page_provider::JsonRpcRequest,
    protocols::eth::{
        engine::{Next, Subprovider},
        url_credentials::{extract_credentials, Credentials},
    },
    Error,
};

#[derive(Clone, Debug)]
struct Endpoint {
    url: Url,
    credentials: Option<Credentials>,
    provider: Provider<Http>,
}

impl Endpoint {
    fn new(rpc_url: &str, fallback_credentials: Option<Credentials>) -> Result<Self, Error> {
        let credentials = extract_credentials(rpc_url).or(fallback_credentials);
        let mut url = Url::parse(rpc_url)?;
        // Credentials go into the auth header, not the request line.
        let _ = url.set_username("");
        let _ = url.set_password(None);
        let provider = http_provider(url.clone(), credentials.as_ref())?;
        Ok(Self {
            url,
            credentials,
            provider,
        })
    }
}

/// Terminating stage of the pipeline that forwards requests to a node over HTTP.
#[derive(Debug)]
pub struct RpcTransport {
    endpoint: RwLock<Endpoint>,
}

impl RpcTransport {
    /// Basic auth is configured if the URL has `user:password@` after the scheme.
    pub fn new(rpc_url: &str) -> Result<Self, Error> {
        let endpoint = Endpoint::new(rpc_url, None)?;
        Ok(Self {
            endpoint: RwLock::new(endpoint),
        })
    }

    /// Point the transport at a new node. Credentials are kept unless the new URL has its own.
    pub fn set_host(&self, host: &str) -> Result<(), Error> {
        let mut endpoint = self.endpoint.write()?;
        let new_endpoint = Endpoint::new(host, endpoint.credentials.clone())?;
        log::info!("Switching RPC endpoint to '{}'", new_endpoint.url);
        *endpoint = new_endpoint;
        Ok(())
    }

    pub fn endpoint(&self) -> Result<Url, Error> {
        let endpoint = self.endpoint.read()?;
        Ok(endpoint.url.clone())
    }

    pub fn has_credentials(&self) -> Result<bool, Error> {
        let endpoint = self.endpoint.read()?;
        Ok(endpoint.credentials.is_some())
    }

    fn provider(&self) -> Result<Provider<Http>, Error> {
        let endpoint = self.endpoint.read()?;
        Ok(endpoint.provider.clone())
    }

    /// Proxy an Ethereum RPC request to the node.
    pub fn proxy_rpc_request<T>(
        &self,
        method: &str,
        params: T,
    ) -> Result<serde_json::Value, Error>
    where
        T: Debug + Serialize + Send + Sync,
    {
        rt::block_on(self.proxy_rpc_request_async(method, params))
    }

    pub async fn proxy_rpc_request_async<T>(
        &self,
        method: &str,
        params: T,
    ) -> Result<serde_json::Value, Error>
    where
        T: Debug + Serialize + Send + Sync,
    {
        let provider = self.provider()?;
        // Need to make type concrete and convert error
        let res: serde_json::Value = provider.request(method, params).await?;
        Ok(res)
    }
}

#[async_trait]
impl Subprovider for RpcTransport {
    async fn handle_request(
        &self,
        request: &JsonRpcRequest,
        _: Next<'_>,
    ) -> Result<serde_json::Value, Error> {
        // Some nodes reject `"params": null`.
        let params = match &request.params {
            serde_json::Value::Null => serde_json::Value::Array(Vec::new()),
            params => params.clone(),
        };
        self.proxy_rpc_request_async(&request.method, params).await
    }

    fn transport(&self) -> Option<&RpcTransport> {
        Some(self)
    }
}

fn http_provider(
    url: Url,
    credentials: Option<&Credentials>,
) -> Result<Provider<Http>, Error> {
    let mut headers = HeaderMap::new();
    if let Some(credentials) = credentials {
        let auth = Authorization::basic(credentials.username(), credentials.password());
        let mut value =
            HeaderValue::from_str(&auth.to_string()).map_err(|_| Error::Fatal {
                error: "Invalid basic auth header".into(),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config::HTTP_REQUEST_TIMEOUT)
        .build()?;
    Ok(Provider::new(Http::new_with_client(url, client)))
}
