//! Integration tests for the search pipeline.
//!
//! Providers are replaced by in-process test doubles or pointed at local
//! mockito servers, so no test touches the network.

use async_trait::async_trait;
use citation_search::config::Config;
use citation_search::models::{Citation, CitationBuilder, DataSource, SearchFailure, MAX_CITATIONS};
use citation_search::providers::{MockProvider, Provider, ProviderError, ProviderRegistry};
use citation_search::search::{
    ResilientProviderCall, SearchOrchestrator, DEADLINE_MESSAGE, NO_RESULTS_MESSAGE,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Waits `delay`, then either answers with `count` citations or fails
#[derive(Debug)]
struct DelayedProvider {
    id: &'static str,
    delay: Duration,
    timeout: Duration,
    outcome: Option<usize>,
    finished: AtomicBool,
}

impl DelayedProvider {
    fn succeeding(id: &'static str, count: usize) -> Arc<Self> {
        Self::build(id, Duration::ZERO, Duration::from_secs(30), Some(count))
    }

    fn failing(id: &'static str) -> Arc<Self> {
        Self::build(id, Duration::ZERO, Duration::from_secs(30), None)
    }

    /// Always runs past its own time budget
    fn hanging(id: &'static str) -> Arc<Self> {
        Self::build(id, Duration::from_secs(10), Duration::from_millis(50), Some(5))
    }

    fn slow(id: &'static str, delay: Duration) -> Arc<Self> {
        Self::build(id, delay, Duration::from_secs(30), Some(5))
    }

    fn build(id: &'static str, delay: Duration, timeout: Duration, outcome: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            id,
            delay,
            timeout,
            outcome,
            finished: AtomicBool::new(false),
        })
    }

    fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for DelayedProvider {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.id
    }

    fn data_source(&self) -> DataSource {
        DataSource::Other(self.id.to_string())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, _keywords: &[String]) -> Result<Vec<Citation>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);

        let Some(count) = self.outcome else {
            return Err(ProviderError::Network(format!("{} unreachable", self.id)));
        };

        Ok((0..count)
            .map(|i| {
                CitationBuilder::new(
                    format!("{} paper {}", self.id, i),
                    format!("https://{}.example/{}", self.id, i),
                    self.data_source(),
                )
                .citation_count(i as u32 * 40)
                .year(2000 + i as i32)
                .build()
            })
            .collect())
    }
}

fn registry(calls: Vec<ResilientProviderCall>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for call in calls {
        registry.register(call);
    }
    registry
}

fn assert_ranked(citations: &[Citation]) {
    assert!(citations.len() <= MAX_CITATIONS);
    let scores: Vec<f64> = citations
        .iter()
        .map(|c| c.relevance_score.expect("ranked citations carry a score"))
        .collect();
    assert!(scores.iter().all(|s| (0.0..=100.0).contains(s)));
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn timed_out_provider_does_not_hide_the_other() {
    let orchestrator = SearchOrchestrator::new(
        registry(vec![
            ResilientProviderCall::new(DelayedProvider::hanging("slow")),
            ResilientProviderCall::new(DelayedProvider::succeeding("fast", 5)),
        ]),
        Duration::from_secs(5),
    );

    let result = orchestrator.search("machine learning").await;

    assert!(result.success);
    assert_eq!(result.citations.len(), 5);
    assert!(result.citations.iter().all(|c| c.url.starts_with("https://fast.example/")));
    assert_eq!(result.message, "搜索成功，找到 5 条相关文献");
    assert_ranked(&result.citations);
}

#[tokio::test]
async fn all_providers_failing_without_mock_is_an_empty_success() {
    let orchestrator = SearchOrchestrator::new(
        registry(vec![
            ResilientProviderCall::new(DelayedProvider::failing("a")),
            ResilientProviderCall::new(DelayedProvider::hanging("b")),
        ]),
        Duration::from_secs(5),
    );

    let result = orchestrator.search("深度学习 综述").await;

    assert!(result.success);
    assert!(result.citations.is_empty());
    assert_eq!(result.message, NO_RESULTS_MESSAGE);
    assert_eq!(result.keywords, vec!["深度学习", "综述"]);
}

#[tokio::test]
async fn global_deadline_cuts_search_short() {
    let first = DelayedProvider::slow("first", Duration::from_millis(600));
    let second = DelayedProvider::slow("second", Duration::from_millis(600));
    let deadline = Duration::from_millis(150);

    let orchestrator = SearchOrchestrator::new(
        registry(vec![
            ResilientProviderCall::new(first.clone()),
            ResilientProviderCall::new(second.clone()),
        ]),
        deadline,
    );

    let started = Instant::now();
    let result = orchestrator.search("neural networks").await;
    let elapsed = started.elapsed();

    assert!(!result.success);
    assert!(result.citations.is_empty());
    assert_eq!(result.message, DEADLINE_MESSAGE);
    assert_eq!(result.failure, Some(SearchFailure::DeadlineExceeded));
    assert!(elapsed >= deadline);
    assert!(elapsed < deadline + Duration::from_millis(200), "returned after {elapsed:?}");

    // Outstanding provider tasks are aborted, not left running.
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(!first.finished());
    assert!(!second.finished());
}

#[tokio::test]
async fn failed_provider_degrades_to_mock_data() {
    let orchestrator = SearchOrchestrator::new(
        registry(vec![
            ResilientProviderCall::new(DelayedProvider::failing("cnki-down"))
                .with_degradation(Arc::new(MockProvider::seeded(DataSource::Cnki, 9))),
            ResilientProviderCall::new(DelayedProvider::failing("scholar-down")),
        ]),
        Duration::from_secs(5),
    );

    let result = orchestrator.search("机器学习在医疗中的应用").await;

    assert!(result.success);
    assert_eq!(result.citations.len(), 5);
    assert!(result.citations.iter().all(|c| c.data_source == DataSource::Cnki));
    assert_ranked(&result.citations);
}

#[tokio::test]
async fn merged_results_are_ranked_and_truncated() {
    let orchestrator = SearchOrchestrator::new(
        registry(vec![
            ResilientProviderCall::new(DelayedProvider::succeeding("alpha", 8)),
            ResilientProviderCall::new(DelayedProvider::succeeding("beta", 8)),
        ]),
        Duration::from_secs(5),
    );

    let result = orchestrator.search("alpha, paper!").await;

    assert!(result.success);
    assert_eq!(result.keywords, vec!["alpha", "paper"]);
    assert_eq!(result.citations.len(), MAX_CITATIONS);
    assert_ranked(&result.citations);
    // Titles matching both keywords outrank those matching one.
    assert!(result.citations[0].title.starts_with("alpha"));
}

#[tokio::test]
async fn mock_only_configuration_is_reproducible() {
    let mut config = Config::default();
    config.crawler.mock_seed = Some(2024);

    let first = SearchOrchestrator::from_config(&config).unwrap().search("数据挖掘").await;
    let second = SearchOrchestrator::from_config(&config).unwrap().search("数据挖掘").await;

    assert!(first.success);
    assert_eq!(first.citations.len(), MAX_CITATIONS);
    assert_eq!(first.citations, second.citations);
    assert_ranked(&first.citations);
}

const SCHOLAR_PAGE: &str = r#"
<html><body>
  <div class="gs_r"><div class="gs_ri">
    <h3 class="gs_rt"><a href="https://example.org/a">Machine learning for medical diagnosis</a></h3>
    <div class="gs_a">A Author, B Author - Medical Journal, 2022 - example.org</div>
    <div class="gs_rs">We study machine learning in hospitals.</div>
    <div class="gs_fl"><a href="/scholar?cites=1">Cited by 120</a></div>
  </div></div>
  <div class="gs_r"><div class="gs_ri">
    <h3 class="gs_rt"><a href="https://example.org/b">Learning representations</a></h3>
    <div class="gs_a">C Author - Proceedings, 2012 - example.org</div>
  </div></div>
</body></html>
"#;

#[tokio::test]
async fn live_registry_falls_back_across_mirrors() {
    let mut broken = mockito::Server::new_async().await;
    let broken_mock = broken
        .mock("GET", "/scholar")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let mut captcha = mockito::Server::new_async().await;
    let captcha_mock = captcha
        .mock("GET", "/scholar")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("<html><body>Please show you're not a robot</body></html>")
        .create_async()
        .await;

    let mut healthy = mockito::Server::new_async().await;
    let healthy_mock = healthy
        .mock("GET", "/scholar")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(SCHOLAR_PAGE)
        .create_async()
        .await;

    let mut cnki = mockito::Server::new_async().await;
    cnki.mock("GET", "/kns8/defaultresult/index")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("<html><body>请登录</body></html>")
        .create_async()
        .await;

    let mut config = Config::default();
    config.crawler.enabled = true;
    config.crawler.rate_limit = 100.0;
    config.google_scholar.mirror_url = broken.url();
    config.google_scholar.fallback_mirrors = vec![captcha.url(), healthy.url()];
    config.cnki.base_url = cnki.url();
    config.search.global_deadline_secs = 20;

    let orchestrator = SearchOrchestrator::from_config(&config).unwrap();
    assert_eq!(orchestrator.registry().ids(), vec!["google_scholar", "cnki"]);

    let result = orchestrator.search("machine learning").await;

    assert!(result.success);
    assert_eq!(result.citations.len(), 2);
    assert_eq!(result.citations[0].title, "Machine learning for medical diagnosis");
    assert_eq!(result.citations[0].citation_count, 120);
    assert!(result
        .citations
        .iter()
        .all(|c| c.data_source == DataSource::GoogleScholar));
    assert_ranked(&result.citations);

    broken_mock.assert_async().await;
    captcha_mock.assert_async().await;
    healthy_mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_searches_share_one_orchestrator() {
    let orchestrator = Arc::new(SearchOrchestrator::new(
        registry(vec![ResilientProviderCall::new(DelayedProvider::succeeding("shared", 3))]),
        Duration::from_secs(5),
    ));

    let handles: Vec<_> = ["graph theory", "图神经网络", "quantum computing"]
        .into_iter()
        .map(|query| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.search(query).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.success);
        assert_eq!(result.citations.len(), 3);
    }
}
