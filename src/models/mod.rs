//! Core data models for citations and search operations.

mod citation;
mod search;

pub use citation::{
    current_year, split_authors, truncate_abstract, Citation, CitationBuilder, DataSource,
    MAX_ABSTRACT_CHARS, UNKNOWN_AUTHOR,
};
pub use search::{
    HealthStatus, SearchFailure, SearchRequest, SearchResult, ValidationError, MAX_CITATIONS,
    MAX_KEYWORDS, MAX_QUERY_CHARS,
};
