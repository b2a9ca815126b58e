//! Search request and response models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Citation;

/// Maximum query length in characters
pub const MAX_QUERY_CHARS: usize = 500;

/// Maximum number of keywords carried in a result
pub const MAX_KEYWORDS: usize = 5;

/// Maximum number of citations carried in a result
pub const MAX_CITATIONS: usize = 10;

/// Reasons a query is rejected before it reaches the search core
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Query is empty or whitespace only
    #[error("搜索内容不能为空")]
    Blank,

    /// Query exceeds the maximum length
    #[error("搜索内容不能超过{max}个字符 (got {len})")]
    TooLong { len: usize, max: usize },
}

/// Incoming search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text description of what to look for
    pub query: String,
}

impl SearchRequest {
    /// Create a new search request
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// Check the query is non-blank and at most [`MAX_QUERY_CHARS`] characters
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.query.trim().is_empty() {
            return Err(ValidationError::Blank);
        }

        let len = self.query.chars().count();
        if len > MAX_QUERY_CHARS {
            return Err(ValidationError::TooLong {
                len,
                max: MAX_QUERY_CHARS,
            });
        }

        Ok(())
    }
}

/// Why a search ended without completing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
    /// The global deadline cut the search short
    DeadlineExceeded,
    /// A provider task panicked or was cancelled
    Internal,
}

/// Outcome of one search request
///
/// Constructed once per request and not modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Whether the search completed within its deadline
    pub success: bool,

    /// Human-readable summary
    pub message: String,

    /// Extracted keywords, in extraction order
    pub keywords: Vec<String>,

    /// Ranked citations, highest relevance first
    pub citations: Vec<Citation>,

    /// Elapsed time in milliseconds
    #[serde(with = "duration_millis")]
    pub duration: Duration,

    /// Set when `success` is false; not part of the wire format
    #[serde(skip)]
    pub failure: Option<SearchFailure>,
}

impl SearchResult {
    /// A completed search
    pub fn completed(
        message: impl Into<String>,
        keywords: Vec<String>,
        citations: Vec<Citation>,
        duration: Duration,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            keywords,
            citations,
            duration,
            failure: None,
        }
    }

    /// A failed search; failures never carry citations
    pub fn failed(
        failure: SearchFailure,
        message: impl Into<String>,
        keywords: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            keywords,
            citations: Vec::new(),
            duration,
            failure: Some(failure),
        }
    }

    /// True when the search failed for an internal reason rather than the deadline
    pub fn is_internal_failure(&self) -> bool {
        self.failure == Some(SearchFailure::Internal)
    }

    /// Elapsed time in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Liveness payload served on the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl HealthStatus {
    /// A healthy status stamped with the current time
    pub fn up(service: impl Into<String>) -> Self {
        Self {
            status: "UP".to_string(),
            service: service.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
