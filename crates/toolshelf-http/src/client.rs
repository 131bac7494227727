//! HTTP client for the toolshelf REST API.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use toolshelf_core::error::{Error, ProtocolError, TransportError};
use toolshelf_core::{ApiUrl, Result};

use crate::endpoints::ErrorResponse;

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: ApiUrl,
    /// Per-request deadline. `None` waits as long as the transport does.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_url: ApiUrl) -> Self {
        Self {
            api_url,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Thin JSON-over-HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("toolshelf/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| TransportError::Http {
            message: format!("failed to build HTTP client: {}", e),
        })?;

        Ok(Self { client, config })
    }

    /// Returns the API base URL this client is configured for.
    pub fn api_url(&self) -> &ApiUrl {
        &self.config.api_url
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.config.api_url.endpoint(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.config.api_url.endpoint(path))
    }

    /// Attach a bearer token.
    pub(crate) fn bearer(request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {}", token))
    }

    /// Send `request` and decode a 2xx JSON body.
    ///
    /// Non-2xx responses are turned into errors by `on_status`, which gets the
    /// status code and the backend's message (if any).
    #[instrument(skip_all, fields(api = %self.config.api_url))]
    pub(crate) async fn execute<R>(
        &self,
        request: RequestBuilder,
        on_status: impl FnOnce(u16, Option<String>) -> Error,
    ) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        trace!(status = %status, "API response");

        if !status.is_success() {
            let message = Self::error_message(response).await;
            debug!(status = status.as_u16(), "API request failed");
            return Err(on_status(status.as_u16(), message));
        }

        response.json::<R>().await.map_err(|e| {
            if e.is_decode() {
                Error::Protocol(ProtocolError::new(
                    Some(status.as_u16()),
                    format!("unexpected response body: {}", e),
                ))
            } else {
                self.map_transport(e)
            }
        })
    }

    async fn error_message(response: Response) -> Option<String> {
        response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(ErrorResponse::describe)
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        let transport = if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: self
                    .config
                    .timeout
                    .map(|t| t.as_millis() as u64)
                    .unwrap_or(0),
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        };
        Error::Transport(transport)
    }
}

/// Fallback mapping for statuses that have no endpoint-specific meaning.
pub(crate) fn unexpected_status(status: u16, message: Option<String>) -> Error {
    Error::Protocol(ProtocolError::new(
        Some(status),
        message.unwrap_or_else(|| "unexpected status".to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let api = ApiUrl::new("https://tools.example.com").unwrap();
        let client = ApiClient::new(ClientConfig::new(api.clone())).unwrap();
        assert_eq!(client.api_url(), &api);
    }

    #[test]
    fn unexpected_status_keeps_code() {
        let err = unexpected_status(503, None);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.kind(), toolshelf_core::ErrorKind::Protocol);
    }
}
