//! Startup-time assembly of the providers that take part in a search.

use std::sync::Arc;

use crate::config::Config;
use crate::models::DataSource;
use crate::search::ResilientProviderCall;
#[cfg(any(feature = "source-google_scholar", feature = "source-cnki"))]
use crate::utils::{HttpClient, RateLimiter};

#[cfg(feature = "source-cnki")]
use super::CnkiProvider;
#[cfg(feature = "source-google_scholar")]
use super::GoogleScholarProvider;
use super::{MockProvider, Provider, ProviderError};

/// The ordered set of resilient provider calls a search fans out to
///
/// Order is significant: merged results follow registration order before
/// they are ranked.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    calls: Vec<Arc<ResilientProviderCall>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// Build the providers described by the configuration.
    ///
    /// With the crawler disabled every source is served from mock data.
    /// Otherwise each live source gets its own rate limiter, its mirror chain
    /// and, where configured, mock degradation.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        let seed = config.crawler.mock_seed;

        if !config.crawler.enabled {
            tracing::info!("crawler disabled, serving mock data only");
            registry.register(ResilientProviderCall::new(Arc::new(MockProvider::from_seed(
                DataSource::GoogleScholar,
                seed,
            ))));
            registry.register(ResilientProviderCall::new(Arc::new(MockProvider::from_seed(
                DataSource::Cnki,
                seed.map(|s| s.wrapping_add(1)),
            ))));
            return Ok(registry);
        }

        #[cfg(feature = "source-google_scholar")]
        {
            let client = scholar_client(config)?;
            let scholar = &config.google_scholar;
            let timeout = scholar.timeout();

            let mut chain = scholar.mirror_chain().into_iter().map(|mirror| -> Arc<dyn Provider> {
                Arc::new(GoogleScholarProvider::new(Arc::clone(&client), mirror).with_timeout(timeout))
            });

            if let Some(primary) = chain.next() {
                let mut call = ResilientProviderCall::new(primary)
                    .with_rate_limiter(provider_limiter(config)?)
                    .with_fallbacks(chain.collect());
                if scholar.mock_fallback {
                    call = call.with_degradation(Arc::new(MockProvider::from_seed(
                        DataSource::GoogleScholar,
                        seed,
                    )));
                }
                registry.register(call);
            }
        }

        #[cfg(feature = "source-cnki")]
        {
            let cnki = &config.cnki;
            let provider = CnkiProvider::with_base_url(cnki_client(config)?, cnki.base_url.clone())
                .with_timeout(cnki.timeout());

            let mut call = ResilientProviderCall::new(Arc::new(provider))
                .with_rate_limiter(provider_limiter(config)?);
            if cnki.mock_fallback {
                call = call.with_degradation(Arc::new(MockProvider::from_seed(DataSource::Cnki, seed)));
            }
            registry.register(call);
        }

        if registry.is_empty() {
            tracing::warn!("crawler enabled but no live provider is compiled in");
        }
        Ok(registry)
    }

    /// Register a resilient provider call
    pub fn register(&mut self, call: ResilientProviderCall) {
        self.calls.push(Arc::new(call));
    }

    /// All registered calls, in registration order
    pub fn calls(&self) -> &[Arc<ResilientProviderCall>] {
        &self.calls
    }

    /// Identifiers of the primary providers, in registration order
    pub fn ids(&self) -> Vec<String> {
        self.calls.iter().map(|c| c.provider_id().to_string()).collect()
    }

    /// Get the number of registered providers
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Each live provider gets its own bucket at the configured rate
#[cfg(any(feature = "source-google_scholar", feature = "source-cnki"))]
fn provider_limiter(config: &Config) -> Result<RateLimiter, ProviderError> {
    RateLimiter::per_second(config.crawler.rate_limit)
        .map_err(|e| ProviderError::Config(e.to_string()))
}

/// Mirrors often carry self-signed certificates, so Scholar skips TLS checks
#[cfg(feature = "source-google_scholar")]
fn scholar_client(config: &Config) -> Result<Arc<HttpClient>, ProviderError> {
    HttpClient::for_mirrors(&config.crawler.user_agent)
        .map(Arc::new)
        .map_err(|e| ProviderError::Config(format!("HTTP client: {}", e)))
}

#[cfg(feature = "source-cnki")]
fn cnki_client(config: &Config) -> Result<Arc<HttpClient>, ProviderError> {
    HttpClient::with_user_agent(&config.crawler.user_agent)
        .map(Arc::new)
        .map_err(|e| ProviderError::Config(format!("HTTP client: {}", e)))
}
