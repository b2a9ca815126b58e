//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Browser-like user agent; scholar mirrors refuse obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    accepts_invalid_certs: bool,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str) -> Result<Self, reqwest::Error> {
        Self::build(user_agent, false)
    }

    /// Client for scholar mirrors, which often serve self-signed certificates.
    ///
    /// Certificate checks are skipped, so use it for mirror traffic only.
    pub fn for_mirrors(user_agent: &str) -> Result<Self, reqwest::Error> {
        Self::build(user_agent, true)
    }

    fn build(user_agent: &str, accepts_invalid_certs: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(accepts_invalid_certs)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            accepts_invalid_certs,
        })
    }

    /// Whether TLS certificate verification is disabled
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accepts_invalid_certs
    }

    /// Fetch a page as text, mapping non-success statuses to an error
    pub async fn get_text(&self, url: &str) -> Result<String, crate::providers::ProviderError> {
        use crate::providers::ProviderError;

        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(format!("{} returned status: {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to read response body: {}", e)))
    }
}
