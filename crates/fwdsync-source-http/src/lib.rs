// # HTTP Domain Source
//
// This crate provides the HTTP-based domain list source for fwdsync.
//
// ## Behavior
//
// - One GET per fetch, no retries
// - Fixed request timeout (default 10 seconds)
// - Non-2xx status, transport errors and timeouts become `Error::SourceFetch`
// - The body is split into lines (`\n` or `\r\n`); lines are returned
//   untouched, blank ones included

use async_trait::async_trait;
use fwdsync_core::config::SourceConfig;
use fwdsync_core::traits::DomainSource;
use fwdsync_core::{Error, Result};
use std::time::Duration;

/// Default request timeout for the domain list
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP domain list source
#[derive(Debug, Clone)]
pub struct HttpDomainSource {
    /// URL of the newline-separated domain list
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpDomainSource {
    /// Create a new HTTP source with the default timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP source with a custom timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a source from configuration
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        config.validate()?;
        Self::with_timeout(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// URL this source fetches from
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DomainSource for HttpDomainSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::source_fetch(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::source_fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::source_fetch(format!("Failed to read response: {}", e)))?;

        tracing::debug!(
            "Fetched {} bytes from {}",
            body.len(),
            self.url
        );

        Ok(body.lines().map(str::to_string).collect())
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
