//! Search orchestration: resilient provider calls, concurrent fan-out and
//! relevance ranking.

mod orchestrator;
mod resilient;
mod scoring;

pub use orchestrator::{
    SearchOrchestrator, DEADLINE_MESSAGE, INTERNAL_FAILURE_MESSAGE, NO_RESULTS_MESSAGE,
};
pub use resilient::{CallOutcome, ResilientProviderCall};
pub use scoring::RelevanceScorer;

use std::time::Duration;

use crate::providers::ProviderError;

/// Errors raised while running a search
///
/// None of these reach the caller as an `Err`: the orchestrator turns them
/// into a failed [`SearchResult`](crate::models::SearchResult).
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The whole request ran past its global deadline
    #[error("search exceeded the global deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// A provider task panicked or was cancelled
    #[error("provider task failed: {0}")]
    TaskFailed(String),

    /// Providers could not be assembled
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
