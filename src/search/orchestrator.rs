//! Concurrent fan-out to every registered provider under a global deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::models::{Citation, SearchFailure, SearchResult};
use crate::providers::ProviderRegistry;
use crate::utils::extract_keywords;

use super::{RelevanceScorer, SearchError};

/// Reported when the global deadline cuts the search short
pub const DEADLINE_MESSAGE: &str = "搜索超时，请稍后重试或使用更具体的关键词";

/// Reported when the search completed without any citation
pub const NO_RESULTS_MESSAGE: &str = "搜索完成，但未找到相关文献。建议尝试其他关键词。";

/// Reported for unexpected internal failures; the cause is only logged
pub const INTERNAL_FAILURE_MESSAGE: &str = "搜索失败，请稍后重试";

fn found_message(count: usize) -> String {
    format!("搜索成功，找到 {} 条相关文献", count)
}

/// Runs one search request end to end.
///
/// # Pipeline
///
/// 1. Extract keywords from the query (an empty list is allowed)
/// 2. Spawn one task per registered provider call
/// 3. Join every task, bounded by the global deadline
/// 4. Merge results in registration order
/// 5. Score, sort and truncate with the [`RelevanceScorer`]
///
/// Provider failures never surface here: each call degrades on its own. The
/// only failure a caller sees is the deadline (or an internal fault), reported
/// as `success = false` with no citations.
#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    registry: ProviderRegistry,
    scorer: RelevanceScorer,
    global_deadline: Duration,
}

impl SearchOrchestrator {
    pub fn new(registry: ProviderRegistry, global_deadline: Duration) -> Self {
        Self {
            registry,
            scorer: RelevanceScorer::default(),
            global_deadline,
        }
    }

    /// Build providers and deadline from configuration
    pub fn from_config(config: &Config) -> Result<Self, SearchError> {
        let registry = ProviderRegistry::from_config(config)?;
        info!(
            providers = ?registry.ids(),
            deadline_secs = config.search.global_deadline_secs,
            "search orchestrator ready"
        );
        Ok(Self::new(registry, config.search.global_deadline()))
    }

    /// Replace the scorer (for a fixed current year, mostly)
    pub fn with_scorer(mut self, scorer: RelevanceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn global_deadline(&self) -> Duration {
        self.global_deadline
    }

    /// Run a search. Never fails; failures are described by the result.
    pub async fn search(&self, query: &str) -> SearchResult {
        let started = Instant::now();
        let keywords = extract_keywords(query);
        info!(query, ?keywords, "search started");

        let result = match self.gather(&keywords).await {
            Ok(merged) => {
                debug!(merged = merged.len(), "providers settled, ranking");
                let ranked = self.scorer.rank(merged, &keywords);
                let message = if ranked.is_empty() {
                    NO_RESULTS_MESSAGE.to_string()
                } else {
                    found_message(ranked.len())
                };
                SearchResult::completed(message, keywords, ranked, started.elapsed())
            }
            Err(SearchError::DeadlineExceeded(deadline)) => {
                warn!(?deadline, "search deadline exceeded, discarding outstanding providers");
                SearchResult::failed(
                    SearchFailure::DeadlineExceeded,
                    DEADLINE_MESSAGE,
                    keywords,
                    started.elapsed(),
                )
            }
            Err(err) => {
                error!(error = %err, "search failed");
                SearchResult::failed(
                    SearchFailure::Internal,
                    INTERNAL_FAILURE_MESSAGE,
                    keywords,
                    started.elapsed(),
                )
            }
        };

        info!(
            success = result.success,
            citations = result.citations.len(),
            duration_ms = result.duration_ms(),
            "search finished"
        );
        result
    }

    /// Fan out to every provider and merge in registration order
    async fn gather(&self, keywords: &[String]) -> Result<Vec<Citation>, SearchError> {
        let keywords: Arc<[String]> = Arc::from(keywords);

        let mut handles: Vec<_> = self
            .registry
            .calls()
            .iter()
            .map(|call| {
                let call = Arc::clone(call);
                let keywords = Arc::clone(&keywords);
                tokio::spawn(async move { call.call(&keywords).await })
            })
            .collect();

        let joined = tokio::time::timeout(self.global_deadline, join_all(handles.iter_mut())).await;

        let Ok(outcomes) = joined else {
            for handle in &handles {
                handle.abort();
            }
            return Err(SearchError::DeadlineExceeded(self.global_deadline));
        };

        let mut merged = Vec::new();
        for (call, outcome) in self.registry.calls().iter().zip(outcomes) {
            let citations = outcome.map_err(|e| SearchError::TaskFailed(e.to_string()))?;
            debug!(provider = call.provider_id(), count = citations.len(), "provider settled");
            merged.extend(citations);
        }
        Ok(merged)
    }
}
