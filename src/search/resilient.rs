//! Timeout, mirror fallback and mock degradation around a single provider.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::models::Citation;
use crate::providers::{Provider, ProviderError};
use crate::utils::{first_success, ChainResult, RateLimiter};

/// Which step of the chain produced the citations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The primary provider answered
    Primary,
    /// The fallback at this chain position answered (1 is the first fallback)
    Fallback(usize),
    /// Every live attempt failed; mock data was served
    Degraded,
    /// Every attempt failed and nothing could be served
    Empty,
}

/// A provider call that never fails.
///
/// Attempts are evaluated in order: the primary provider, then each fallback
/// (typically alternate mirrors of the same site), then the optional
/// degradation provider. A call acquires one rate-limiter permit up front;
/// every live attempt then runs under the primary's time budget.
#[derive(Debug, Clone)]
pub struct ResilientProviderCall {
    chain: Vec<Arc<dyn Provider>>,
    limiter: Option<RateLimiter>,
    degradation: Option<Arc<dyn Provider>>,
    timeout: Duration,
}

impl ResilientProviderCall {
    pub fn new(primary: Arc<dyn Provider>) -> Self {
        let timeout = primary.timeout();
        Self {
            chain: vec![primary],
            limiter: None,
            degradation: None,
            timeout,
        }
    }

    /// Gate each call on this limiter
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Append alternate providers tried, in order, when the primary fails
    pub fn with_fallbacks(mut self, fallbacks: Vec<Arc<dyn Provider>>) -> Self {
        self.chain.extend(fallbacks);
        self
    }

    /// Serve this provider's data when the whole chain fails
    pub fn with_degradation(mut self, provider: Arc<dyn Provider>) -> Self {
        self.degradation = Some(provider);
        self
    }

    /// Override the per-attempt time budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Identifier of the primary provider
    pub fn provider_id(&self) -> &str {
        self.chain[0].id()
    }

    /// Human-readable name of the primary provider
    pub fn provider_name(&self) -> &str {
        self.chain[0].name()
    }

    /// Number of live attempts: primary plus fallbacks
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    pub fn has_degradation(&self) -> bool {
        self.degradation.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch citations, returning an empty list if everything fails
    pub async fn call(&self, keywords: &[String]) -> Vec<Citation> {
        self.call_detailed(keywords).await.1
    }

    /// Like [`call`](Self::call), also reporting which step answered
    pub async fn call_detailed(&self, keywords: &[String]) -> (CallOutcome, Vec<Citation>) {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        let chain = first_success(self.chain.iter(), |index, provider| async move {
            let result = self.attempt(&**provider, keywords, self.timeout).await;
            if let Err(err) = &result {
                warn!(
                    provider = provider.id(),
                    provider_name = provider.name(),
                    attempt = index,
                    kind = err.kind(),
                    error = %err,
                    "provider attempt failed"
                );
            }
            result
        })
        .await;

        match chain {
            ChainResult::Success { index: 0, value, .. } => (CallOutcome::Primary, value),
            ChainResult::Success {
                index,
                value,
                failures,
            } => {
                info!(
                    provider = self.provider_id(),
                    fallback = index,
                    failed_attempts = failures.len(),
                    "fallback provider answered"
                );
                (CallOutcome::Fallback(index), value)
            }
            ChainResult::Exhausted(failures) => self.degrade(keywords, failures.len()).await,
        }
    }

    async fn degrade(&self, keywords: &[String], failed_attempts: usize) -> (CallOutcome, Vec<Citation>) {
        let Some(provider) = &self.degradation else {
            warn!(
                provider = self.provider_id(),
                failed_attempts, "all attempts failed, returning no citations"
            );
            return (CallOutcome::Empty, Vec::new());
        };

        warn!(
            provider = self.provider_id(),
            failed_attempts, "all attempts failed, degrading to mock data"
        );

        let budget = provider.timeout();
        match tokio::time::timeout(budget, provider.fetch(keywords)).await {
            Ok(Ok(citations)) => (CallOutcome::Degraded, citations),
            Ok(Err(err)) => {
                warn!(provider = provider.id(), error = %err, "degradation provider failed");
                (CallOutcome::Empty, Vec::new())
            }
            Err(_) => {
                warn!(provider = provider.id(), ?budget, "degradation provider timed out");
                (CallOutcome::Empty, Vec::new())
            }
        }
    }

    async fn attempt(
        &self,
        provider: &dyn Provider,
        keywords: &[String],
        budget: Duration,
    ) -> Result<Vec<Citation>, ProviderError> {
        debug!(provider = provider.id(), ?budget, "fetching");
        match tokio::time::timeout(budget, provider.fetch(keywords)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(budget)),
        }
    }
}
