//! Citation providers with a trait-based architecture.
//!
//! This module defines the [`Provider`] trait that every literature source
//! implements. Live providers scrape an external site; the [`MockProvider`]
//! synthesizes plausible records and serves as the degraded fallback.
//!
//! # Feature Flags
//!
//! Live providers can be disabled at compile time using Cargo features:
//!
//! - `google_scholar` - Enable the Google Scholar mirror provider (default: enabled)
//! - `cnki` - Enable the CNKI provider (default: enabled)
//!
//! The mock provider is always compiled in.
//!
//! # Runtime Selection
//!
//! Which providers take part in a search is decided once at startup by
//! [`ProviderRegistry::from_config`]: with the crawler disabled every source is
//! served by mock data, otherwise live providers are used with their mirror
//! chains and optional mock degradation.

#[cfg(feature = "source-cnki")]
mod cnki;
mod extract;
#[cfg(feature = "source-google_scholar")]
mod google_scholar;
pub mod mock;
mod registry;

#[cfg(feature = "source-cnki")]
pub use cnki::CnkiProvider;
#[cfg(feature = "source-google_scholar")]
pub use google_scholar::GoogleScholarProvider;
pub use mock::MockProvider;
pub use registry::ProviderRegistry;

use async_trait::async_trait;
use std::time::Duration;

use crate::models::{Citation, DataSource};

/// Maximum number of records a single provider call returns
pub const MAX_RESULTS_PER_CALL: usize = 10;

/// Timeout for plain HTTP + parse providers
pub const LIGHTWEIGHT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for slow providers (mirrors, browser-backed pages)
pub const HEAVYWEIGHT_TIMEOUT: Duration = Duration::from_secs(30);

/// The Provider trait defines the interface for all citation sources.
///
/// # Implementing a New Provider
///
/// 1. Create a new struct that implements `Provider`
/// 2. Return at most [`MAX_RESULTS_PER_CALL`] citations from `fetch`
/// 3. Skip records without a title instead of failing the whole call
/// 4. Register it in [`ProviderRegistry::from_config`]
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this provider (e.g. "cnki")
    fn id(&self) -> &str;

    /// Human-readable name of this provider
    fn name(&self) -> &str;

    /// Tag stamped on every citation this provider produces
    fn data_source(&self) -> DataSource;

    /// Time budget for a single `fetch`
    fn timeout(&self) -> Duration {
        LIGHTWEIGHT_TIMEOUT
    }

    /// Fetch citations matching the keywords. Must tolerate an empty keyword list.
    async fn fetch(&self, keywords: &[String]) -> Result<Vec<Citation>, ProviderError>;
}

/// Errors that can occur when fetching from a provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The call did not finish within its time budget
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered but yielded no records where some were expected
    #[error("No results from {0}")]
    Empty(String),

    /// The remote site answered with an error status
    #[error("API error: {0}")]
    Api(String),

    /// The provider is misconfigured
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

impl ProviderError {
    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Network(_) => "network",
            ProviderError::Parse(_) => "parse",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Empty(_) => "empty",
            ProviderError::Api(_) => "api",
            ProviderError::Config(_) => "config",
        }
    }
}
