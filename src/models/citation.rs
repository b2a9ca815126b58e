//! Citation model representing one literature record from any provider.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum abstract length kept on a citation (in characters)
pub const MAX_ABSTRACT_CHARS: usize = 300;

/// Placeholder used when no author could be extracted
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// The provider that produced a citation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSource {
    GoogleScholar,
    Cnki,
    Mock,
    #[serde(untagged)]
    Other(String),
}

impl DataSource {
    /// Returns the display name of the data source
    pub fn name(&self) -> &str {
        match self {
            DataSource::GoogleScholar => "Google Scholar",
            DataSource::Cnki => "CNKI",
            DataSource::Mock => "Mock",
            DataSource::Other(s) => s,
        }
    }

    /// Returns the wire tag of the data source
    pub fn id(&self) -> &str {
        match self {
            DataSource::GoogleScholar => "google-scholar",
            DataSource::Cnki => "cnki",
            DataSource::Mock => "mock",
            DataSource::Other(s) => s,
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A literature record produced during a single search request
///
/// Citations are created by a provider, scored exactly once by the
/// relevance scorer and then returned to the caller. They are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Title (never empty)
    pub title: String,

    /// Ordered author names, serialized as a comma-separated string
    #[serde(
        serialize_with = "serialize_authors",
        deserialize_with = "deserialize_authors"
    )]
    pub authors: Vec<String>,

    /// Publication year
    pub year: i32,

    /// Journal, conference or other venue
    pub source: String,

    /// Abstract or snippet, at most [`MAX_ABSTRACT_CHARS`] characters
    pub abstract_text: String,

    /// Number of times this work has been cited
    pub citation_count: u32,

    /// Which provider produced this record
    pub data_source: DataSource,

    /// Relevance in `[0, 100]`, `None` until scored
    pub relevance_score: Option<f64>,

    /// Link to the record (may be a canonical site URL)
    pub url: String,
}

impl Citation {
    /// Create a new citation with required fields
    pub fn new(title: String, url: String, data_source: DataSource) -> Self {
        Self {
            title,
            authors: vec![UNKNOWN_AUTHOR.to_string()],
            year: current_year(),
            source: String::new(),
            abstract_text: String::new(),
            citation_count: 0,
            data_source,
            relevance_score: None,
            url,
        }
    }

    /// Authors joined the way they appear on the wire
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }
}

fn serialize_authors<S: Serializer>(authors: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&authors.join(", "))
}

fn deserialize_authors<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(split_authors(&raw))
}

/// Split an author line on commas (ASCII and full-width) and semicolons
pub fn split_authors(raw: &str) -> Vec<String> {
    let authors: Vec<String> = raw
        .split([',', '，', ';', '；'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    if authors.is_empty() {
        vec![UNKNOWN_AUTHOR.to_string()]
    } else {
        authors
    }
}

/// Truncate an abstract to [`MAX_ABSTRACT_CHARS`], marking the cut with "..."
pub fn truncate_abstract(text: &str) -> String {
    if text.chars().count() > MAX_ABSTRACT_CHARS {
        let kept: String = text.chars().take(MAX_ABSTRACT_CHARS - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

/// The current calendar year in local time
pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

/// Builder for constructing Citation objects
#[derive(Debug, Clone)]
pub struct CitationBuilder {
    citation: Citation,
}

impl CitationBuilder {
    /// Create a new builder with required fields
    pub fn new(title: impl Into<String>, url: impl Into<String>, data_source: DataSource) -> Self {
        Self {
            citation: Citation::new(title.into(), url.into(), data_source),
        }
    }

    /// Set authors from a raw author line
    pub fn authors(mut self, authors: &str) -> Self {
        self.citation.authors = split_authors(authors);
        self
    }

    /// Set authors from an already split list
    pub fn author_list(mut self, authors: Vec<String>) -> Self {
        if !authors.is_empty() {
            self.citation.authors = authors;
        }
        self
    }

    /// Set publication year
    pub fn year(mut self, year: i32) -> Self {
        self.citation.year = year;
        self
    }

    /// Set venue
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.citation.source = source.into();
        self
    }

    /// Set abstract, truncating it to the bounded length
    pub fn abstract_text(mut self, abstract_text: &str) -> Self {
        self.citation.abstract_text = truncate_abstract(abstract_text.trim());
        self
    }

    /// Set citation count
    pub fn citation_count(mut self, count: u32) -> Self {
        self.citation.citation_count = count;
        self
    }

    /// Build the Citation
    pub fn build(self) -> Citation {
        self.citation
    }
}
