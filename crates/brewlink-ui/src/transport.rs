//! Single-endpoint JSON transport to the controller.
//!
//! # Design
//! - One POST per call to `{root_url}api`; no retries, no coalescing, no state between calls.
//! - Failures come back as [`TransportError`]; nothing panics past this boundary.
//! - [`Transport`] is the seam stores depend on, so tests and other hosts can swap it.

use async_trait::async_trait;
use brewlink_api_models::{API_PATH, ApiResult, Command};
use serde_json::Value;

use crate::error::TransportResult;
#[cfg(not(target_arch = "wasm32"))]
use crate::error::TransportError;

/// Sends one command to the controller and returns its result envelope.
#[async_trait(?Send)]
pub trait Transport {
    /// Root URL the transport posts to (`{root_url}api`).
    fn root_url(&self) -> &str;

    /// Issue exactly one request carrying `command` and `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TransportError`] on network failure or when the body
    /// is not a result envelope.
    async fn send(&self, command: Command, payload: Option<Value>) -> TransportResult<ApiResult>;
}

/// HTTP transport for the controller's command endpoint.
#[derive(Clone, Debug)]
pub struct WebConn {
    root_url: String,
    #[cfg(not(target_arch = "wasm32"))]
    client: reqwest::Client,
}

impl WebConn {
    /// Endpoint URL for `root_url`, which is used verbatim as a prefix.
    #[must_use]
    pub fn endpoint_for(root_url: &str) -> String {
        format!("{root_url}{API_PATH}")
    }

    /// Endpoint URL this connection posts to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        Self::endpoint_for(&self.root_url)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl WebConn {
    /// Create a connection with a default HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] when the HTTP client cannot be built.
    pub fn new(root_url: impl Into<String>) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| TransportError::Client {
                detail: err.to_string(),
            })?;
        Ok(Self::with_client(root_url, client))
    }

    /// Create a connection around a preconfigured client (timeouts, proxies).
    #[must_use]
    pub fn with_client(root_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            root_url: root_url.into(),
            client,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl Transport for WebConn {
    fn root_url(&self) -> &str {
        &self.root_url
    }

    async fn send(&self, command: Command, payload: Option<Value>) -> TransportResult<ApiResult> {
        let url = self.endpoint();
        let request = brewlink_api_models::ApiRequest::new(command, payload);
        tracing::debug!(%command, %url, "sending controller command");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(%command, error = %err, "controller request failed");
                TransportError::Network {
                    command,
                    detail: err.to_string(),
                }
            })?;

        response.json::<ApiResult>().await.map_err(|err| {
            tracing::warn!(%command, error = %err, "controller response was not an envelope");
            TransportError::Decode {
                command,
                detail: err.to_string(),
            }
        })
    }
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use async_trait::async_trait;
    use brewlink_api_models::{ApiRequest, ApiResult, Command};
    use gloo_net::http::Request;
    use serde_json::Value;
    use web_sys::{RequestCache, RequestCredentials, RequestMode};

    use super::{Transport, WebConn};
    use crate::error::{TransportError, TransportResult};

    impl WebConn {
        /// Create a connection backed by the browser `fetch` API.
        ///
        /// # Errors
        ///
        /// Never fails in the browser; the signature matches the native constructor.
        pub fn new(root_url: impl Into<String>) -> TransportResult<Self> {
            Ok(Self {
                root_url: root_url.into(),
            })
        }
    }

    #[async_trait(?Send)]
    impl Transport for WebConn {
        fn root_url(&self) -> &str {
            &self.root_url
        }

        async fn send(
            &self,
            command: Command,
            payload: Option<Value>,
        ) -> TransportResult<ApiResult> {
            let url = self.endpoint();
            let network = |err: gloo_net::Error| {
                tracing::warn!(%command, error = %err, "controller request failed");
                TransportError::Network {
                    command,
                    detail: err.to_string(),
                }
            };
            tracing::debug!(%command, %url, "sending controller command");

            let response = Request::post(&url)
                .mode(RequestMode::Cors)
                .cache(RequestCache::NoCache)
                .credentials(RequestCredentials::Omit)
                .json(&ApiRequest::new(command, payload))
                .map_err(network)?
                .send()
                .await
                .map_err(network)?;

            response.json::<ApiResult>().await.map_err(|err| {
                tracing::warn!(%command, error = %err, "controller response was not an envelope");
                TransportError::Decode {
                    command,
                    detail: err.to_string(),
                }
            })
        }
    }
}
