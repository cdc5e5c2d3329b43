//! HTTP progression source.

use std::time::Duration;

use tracing::{debug, warn};

use super::envelope::Endpoint;
use crate::config::SourceConfig;
use crate::core::{ProgressionSource, SourceError};
use crate::progression::ProgressionSnapshot;

/// Polls one of the backend's progression endpoints over HTTP.
///
/// The client keeps cookies so a session established by the page (or by a
/// login request made through [`HttpProgressionSource::client`]) is reused.
#[derive(Debug, Clone)]
pub struct HttpProgressionSource {
    client: reqwest::Client,
    url: String,
    endpoint: Endpoint,
    timeout: Duration,
}

impl HttpProgressionSource {
    /// Build a source from configuration.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .cookie_store(true)
            .user_agent(concat!("arkalia-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Build a source around an existing client.
    pub fn with_client(client: reqwest::Client, config: &SourceConfig) -> Self {
        Self {
            client,
            url: config.url(),
            endpoint: config.endpoint,
            timeout: config.connect_timeout,
        }
    }

    /// The polled URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn get(&self) -> Result<ProgressionSnapshot, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "progression fetch rejected");
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        debug!(url = %self.url, bytes = body.len(), "progression fetched");
        self.endpoint.decode(&body)
    }

    // reqwest does not report which limit fired; the configured one is
    // the only one this source sets.
    fn map_error(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

impl ProgressionSource for HttpProgressionSource {
    async fn fetch(&self) -> Result<ProgressionSnapshot, SourceError> {
        self.get().await
    }

    fn describe(&self) -> String {
        format!("http {}", self.url)
    }
}
