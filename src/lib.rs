//! # Citation Search
//!
//! Answers a free-text research query with a short, ranked list of citations
//! gathered concurrently from several literature sources.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Citation, SearchRequest, SearchResult)
//! - [`providers`]: Literature sources behind the [`Provider`] trait, plus mock data
//! - [`search`]: Resilient provider calls, fan-out under a global deadline, relevance ranking
//! - [`api`]: HTTP endpoints
//! - [`utils`]: HTTP client, keyword extraction, rate limiting and other utilities
//! - [`config`]: Configuration management
//!
//! ## Example
//!
//! ```no_run
//! use citation_search::{config::Config, SearchOrchestrator};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = SearchOrchestrator::from_config(&Config::default())?;
//! let result = orchestrator.search("机器学习在医疗中的应用").await;
//! println!("{}: {} citations", result.message, result.citations.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod models;
pub mod providers;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use models::{Citation, SearchResult};
pub use providers::{Provider, ProviderRegistry};
pub use search::SearchOrchestrator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
