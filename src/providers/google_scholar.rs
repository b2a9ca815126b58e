//! Google Scholar provider, served through a mirror site.
//!
//! Google Scholar has no public API and blocks direct scraping, so requests go
//! to one of several mirrors that proxy the original result pages. Each
//! mirror is a separate provider instance; the registry chains them so that a
//! failing mirror hands over to the next one.

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{current_year, Citation, CitationBuilder, DataSource};
use crate::providers::extract::{find_number, find_year, first_match, first_records, first_text, strip_years};
use crate::providers::{Provider, ProviderError, HEAVYWEIGHT_TIMEOUT, MAX_RESULTS_PER_CALL};
use crate::utils::HttpClient;

const RECORD_SELECTORS: &[&str] = &["div.gs_ri", "div.gs_r"];
const TITLE_LINK_SELECTORS: &[&str] = &["h3.gs_rt a", ".gs_rt a"];
const TITLE_SELECTORS: &[&str] = &["h3.gs_rt a", ".gs_rt a", ".gs_rt"];
const AUTHOR_LINE_SELECTORS: &[&str] = &["div.gs_a", ".gs_a"];
const ABSTRACT_SELECTORS: &[&str] = &["div.gs_rs", ".gs_rs"];
const FOOTER_LINK_SELECTORS: &str = ".gs_fl a";

const DEFAULT_VENUE: &str = "Google Scholar";
const NO_ABSTRACT: &str = "No abstract available.";

/// Footer link labels that carry the citation count
const CITED_BY_MARKERS: &[&str] = &["Cited by", "引用", "被引"];

/// Google Scholar results from a single mirror
#[derive(Debug, Clone)]
pub struct GoogleScholarProvider {
    client: Arc<HttpClient>,
    mirror: String,
    timeout: Duration,
}

impl GoogleScholarProvider {
    pub fn new(client: Arc<HttpClient>, mirror: impl Into<String>) -> Self {
        Self {
            client,
            mirror: mirror.into().trim_end_matches('/').to_string(),
            timeout: HEAVYWEIGHT_TIMEOUT,
        }
    }

    /// Override the per-call time budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL of the mirror this instance talks to
    pub fn mirror(&self) -> &str {
        &self.mirror
    }

    fn search_url(&self, keywords: &[String]) -> String {
        let query = keywords
            .iter()
            .map(|k| urlencoding::encode(k).into_owned())
            .collect::<Vec<_>>()
            .join("+");
        format!("{}/scholar?hl=en&q={}", self.mirror, query)
    }

    /// Parse a result page into at most [`MAX_RESULTS_PER_CALL`] citations
    pub fn parse_results(&self, html: &str) -> Vec<Citation> {
        let document = Html::parse_document(html);

        first_records(&document, RECORD_SELECTORS)
            .iter()
            .filter_map(|record| {
                let citation = self.parse_record(record);
                if citation.is_none() {
                    tracing::debug!(mirror = %self.mirror, "skipping result without title");
                }
                citation
            })
            .take(MAX_RESULTS_PER_CALL)
            .collect()
    }

    fn parse_record(&self, record: &ElementRef) -> Option<Citation> {
        let title = first_text(record, TITLE_SELECTORS)?;

        let url = first_match(record, TITLE_LINK_SELECTORS)
            .and_then(|link| link.value().attr("href"))
            .map(|href| self.absolute_url(href))
            .unwrap_or_else(|| format!("{}/", self.mirror));

        let (authors, venue, year) = match first_text(record, AUTHOR_LINE_SELECTORS) {
            Some(line) => parse_author_line(&line),
            None => (String::new(), DEFAULT_VENUE.to_string(), current_year()),
        };

        let abstract_text =
            first_text(record, ABSTRACT_SELECTORS).unwrap_or_else(|| NO_ABSTRACT.to_string());

        Some(
            CitationBuilder::new(title, url, DataSource::GoogleScholar)
                .authors(&authors)
                .year(year)
                .source(venue)
                .abstract_text(&abstract_text)
                .citation_count(cited_by(record))
                .build(),
        )
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            return href.to_string();
        }
        url::Url::parse(&format!("{}/", self.mirror))
            .and_then(|base| base.join(href))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}/", self.mirror))
    }
}

/// Split a `"authors - venue, year - host"` line into its parts
fn parse_author_line(line: &str) -> (String, String, i32) {
    let mut parts = line.split(" - ");
    let authors = parts.next().unwrap_or_default().trim().to_string();

    match parts.next().map(str::trim) {
        Some(venue_and_year) => match find_year(venue_and_year) {
            Some(year) => {
                let venue = strip_years(venue_and_year);
                let venue = venue.trim().trim_end_matches([',', '，']).trim();
                let venue = if venue.is_empty() { DEFAULT_VENUE } else { venue };
                (authors, venue.to_string(), year)
            }
            None => (authors, venue_and_year.to_string(), current_year()),
        },
        None => (authors, DEFAULT_VENUE.to_string(), current_year()),
    }
}

fn cited_by(record: &ElementRef) -> u32 {
    let Ok(selector) = scraper::Selector::parse(FOOTER_LINK_SELECTORS) else {
        return 0;
    };
    record
        .select(&selector)
        .map(|link| link.text().collect::<String>())
        .find(|text| CITED_BY_MARKERS.iter().any(|m| text.contains(m)))
        .and_then(|text| find_number(&text))
        .unwrap_or(0)
}

#[async_trait]
impl Provider for GoogleScholarProvider {
    fn id(&self) -> &str {
        "google_scholar"
    }

    fn name(&self) -> &str {
        "Google Scholar"
    }

    fn data_source(&self) -> DataSource {
        DataSource::GoogleScholar
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, keywords: &[String]) -> Result<Vec<Citation>, ProviderError> {
        let url = self.search_url(keywords);
        tracing::debug!(%url, "querying Google Scholar mirror");

        let html = self.client.get_text(&url).await?;
        let citations = self.parse_results(&html);

        if citations.is_empty() {
            return Err(ProviderError::Empty(format!("Google Scholar mirror {}", self.mirror)));
        }

        tracing::info!(mirror = %self.mirror, count = citations.len(), "Google Scholar returned citations");
        Ok(citations)
    }
}
