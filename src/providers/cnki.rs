//! CNKI (China National Knowledge Infrastructure) provider.
//!
//! CNKI has no public search API. The result page is fetched over plain HTTP
//! and scraped; the table layout changes often, so every field is looked up
//! through several alternative selectors.

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{current_year, Citation, CitationBuilder, DataSource};
use crate::providers::extract::{
    element_text, find_number, find_year, first_match, first_records, first_text,
};
use crate::providers::{Provider, ProviderError, LIGHTWEIGHT_TIMEOUT, MAX_RESULTS_PER_CALL};
use crate::utils::HttpClient;

/// Default CNKI site root
pub const CNKI_BASE_URL: &str = "https://kns.cnki.net";

const RECORD_SELECTORS: &[&str] = &[
    "table.result-table-list tbody tr",
    "tr.odd, tr.even",
    ".GridTableContent tbody tr",
    ".search-list .item",
];
const TITLE_SELECTORS: &[&str] = &["a.fz14", "td.name a", "a[href*=detail]"];
const AUTHOR_SELECTORS: &[&str] = &["td.author", "a[href*=author]"];
const DATE_SELECTORS: &[&str] = &["td.date"];
const VENUE_SELECTORS: &[&str] = &["td.source", "a[href*=journal]"];
const ABSTRACT_SELECTORS: &[&str] = &["td.abstract", "span.abstract"];
const QUOTE_SELECTORS: &[&str] = &["td.quote", "span.quote"];
const LINK_SELECTORS: &[&str] = &["a[href]"];

const UNKNOWN_AUTHORS: &str = "未知作者";
const UNKNOWN_VENUE: &str = "未知来源";
const DEFAULT_ABSTRACT: &str = "本文对相关主题进行了研究和分析。";

/// CNKI search results
#[derive(Debug, Clone)]
pub struct CnkiProvider {
    client: Arc<HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl CnkiProvider {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self::with_base_url(client, CNKI_BASE_URL)
    }

    /// Point the provider at another site root (a mirror or a test server)
    pub fn with_base_url(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: LIGHTWEIGHT_TIMEOUT,
        }
    }

    /// Override the per-call time budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn search_url(&self, keywords: &[String]) -> String {
        format!(
            "{}/kns8/defaultresult/index?kw={}&korder=SU",
            self.base_url,
            urlencoding::encode(&keywords.join(" "))
        )
    }

    /// Parse a result page into at most [`MAX_RESULTS_PER_CALL`] citations
    pub fn parse_results(&self, html: &str) -> Vec<Citation> {
        let document = Html::parse_document(html);
        let records = first_records(&document, RECORD_SELECTORS);

        if records.is_empty() {
            tracing::warn!("no CNKI result rows found; page layout may have changed or login is required");
        }

        records
            .iter()
            .filter_map(|record| self.parse_record(record))
            .take(MAX_RESULTS_PER_CALL)
            .collect()
    }

    fn parse_record(&self, record: &ElementRef) -> Option<Citation> {
        let title = first_text(record, TITLE_SELECTORS)?;

        let authors =
            first_text(record, AUTHOR_SELECTORS).unwrap_or_else(|| UNKNOWN_AUTHORS.to_string());
        let year = first_text(record, DATE_SELECTORS)
            .and_then(|date| find_year(&date))
            .or_else(|| find_year(&element_text(record)))
            .unwrap_or_else(current_year);
        let venue =
            first_text(record, VENUE_SELECTORS).unwrap_or_else(|| UNKNOWN_VENUE.to_string());
        let abstract_text =
            first_text(record, ABSTRACT_SELECTORS).unwrap_or_else(|| DEFAULT_ABSTRACT.to_string());
        let citation_count = first_text(record, QUOTE_SELECTORS)
            .and_then(|quote| find_number(&quote))
            .unwrap_or(0);

        Some(
            CitationBuilder::new(title, self.record_url(record), DataSource::Cnki)
                .authors(&authors)
                .year(year)
                .source(venue)
                .abstract_text(&abstract_text)
                .citation_count(citation_count)
                .build(),
        )
    }

    fn record_url(&self, record: &ElementRef) -> String {
        let href = first_match(record, LINK_SELECTORS).and_then(|link| link.value().attr("href"));
        match href {
            Some(href) if href.starts_with("http") => href.to_string(),
            Some(href) if href.starts_with('/') => format!("{}{}", self.base_url, href),
            _ => format!("{}/", self.base_url),
        }
    }
}

#[async_trait]
impl Provider for CnkiProvider {
    fn id(&self) -> &str {
        "cnki"
    }

    fn name(&self) -> &str {
        "CNKI"
    }

    fn data_source(&self) -> DataSource {
        DataSource::Cnki
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, keywords: &[String]) -> Result<Vec<Citation>, ProviderError> {
        let url = self.search_url(keywords);
        tracing::debug!(%url, "querying CNKI");

        let html = self.client.get_text(&url).await?;
        let citations = self.parse_results(&html);

        tracing::info!(count = citations.len(), "CNKI returned citations");
        Ok(citations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html><body>
    <table class="result-table-list"><tbody>
      <tr>
        <td class="name"><a class="fz14" href="/kcms/detail/detail.aspx?id=1">机器学习在医疗诊断中的应用研究</a></td>
        <td class="author">张伟; 李明</td>
        <td class="source"><a href="/journal/1">计算机学报</a></td>
        <td class="date">2022-05-13</td>
        <td class="quote">36</td>
      </tr>
      <tr>
        <td class="name"><a href="https://kns.cnki.net/kcms/detail/2">深度学习综述</a></td>
        <td>发表于 2016 年</td>
      </tr>
      <tr>
        <td class="author">无标题</td>
      </tr>
    </tbody></table>
    </body></html>
    "#;

    fn provider(base: &str) -> CnkiProvider {
        CnkiProvider::with_base_url(Arc::new(HttpClient::new().unwrap()), base)
    }

    #[test]
    fn test_parse_results() {
        let citations = provider(CNKI_BASE_URL).parse_results(PAGE);
        assert_eq!(citations.len(), 2);

        let first = &citations[0];
        assert_eq!(first.title, "机器学习在医疗诊断中的应用研究");
        assert_eq!(first.authors, vec!["张伟", "李明"]);
        assert_eq!(first.source, "计算机学报");
        assert_eq!(first.year, 2022);
        assert_eq!(first.citation_count, 36);
        assert_eq!(first.url, "https://kns.cnki.net/kcms/detail/detail.aspx?id=1");
        assert_eq!(first.abstract_text, DEFAULT_ABSTRACT);
        assert_eq!(first.data_source, DataSource::Cnki);

        let second = &citations[1];
        assert_eq!(second.title, "深度学习综述");
        assert_eq!(second.year, 2016);
        assert_eq!(second.authors, vec![UNKNOWN_AUTHORS]);
        assert_eq!(second.source, UNKNOWN_VENUE);
        assert_eq!(second.citation_count, 0);
        assert_eq!(second.url, "https://kns.cnki.net/kcms/detail/2");
    }

    #[test]
    fn test_alternative_row_layout_and_truncation() {
        let long_abstract = "研究".repeat(200);
        let page = format!(
            r#"<table><tbody><tr class="odd"><td><a href="detail?x=1">题目</a></td><td><span class="abstract">{}</span></td></tr></tbody></table>"#,
            long_abstract
        );
        let citations = provider(CNKI_BASE_URL).parse_results(&page);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].abstract_text.chars().count(), 300);
        assert_eq!(citations[0].url, "https://kns.cnki.net/");
        assert_eq!(citations[0].year, current_year());
    }

    #[test]
    fn test_row_counts_are_not_years() {
        let page = r#"<table class="result-table-list"><tbody><tr>
            <td class="name"><a href="/kcms/detail/3">知识图谱构建方法</a></td>
            <td>下载 1500 次</td>
        </tr></tbody></table>"#;
        let citations = provider(CNKI_BASE_URL).parse_results(page);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].year, current_year());
    }

    #[test]
    fn test_search_url() {
        let url = provider(CNKI_BASE_URL).search_url(&["机器学习".to_string(), "医疗".to_string()]);
        assert!(url.starts_with("https://kns.cnki.net/kns8/defaultresult/index?kw="));
        assert!(url.contains("%20"));
        assert!(url.ends_with("&korder=SU"));
    }

    #[tokio::test]
    async fn test_fetch_empty_page_is_ok() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/kns8/defaultresult/index")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("<html><body>请登录</body></html>")
            .create_async()
            .await;

        let citations = provider(&server.url()).fetch(&["医疗".to_string()]).await.unwrap();
        assert!(citations.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_parses_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/kns8/defaultresult/index")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(PAGE)
            .create_async()
            .await;

        let citations = provider(&server.url()).fetch(&["机器学习".to_string()]).await.unwrap();
        assert_eq!(citations.len(), 2);
        assert!(citations[0].url.starts_with(&server.url()));
    }
}
