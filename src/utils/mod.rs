//! Utility modules supporting the search core.
//!
//! - [`extract_keywords`]: Turn a free-text query into at most five search keywords
//! - [`translate_to_english`]: Glossary translation of common Chinese research terms
//! - [`RateLimiter`]: Shared token-bucket throttle, one per provider
//! - [`HttpClient`]: HTTP client with browser-like defaults
//! - [`first_success`]: Evaluate an ordered strategy chain, first success wins
//!
//! # Keyword extraction
//!
//! ```rust
//! use citation_search::utils::extract_keywords;
//!
//! let keywords = extract_keywords("深度学习, 图像识别 的 研究");
//! assert_eq!(keywords, vec!["深度学习", "图像识别", "研究"]);
//! ```
//!
//! # Rate limiting
//!
//! ```rust,no_run
//! use citation_search::utils::RateLimiter;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // One request every 2.5 seconds
//! let limiter = RateLimiter::per_second(0.4)?;
//! limiter.acquire().await;
//! # Ok(())
//! # }
//! ```

mod fallback;
mod http;
mod keywords;
mod rate_limit;

pub use fallback::{first_success, ChainResult};
pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use keywords::{extract_keywords, is_stop_word, translate_to_english};
pub use rate_limit::{RateLimitError, RateLimiter};
