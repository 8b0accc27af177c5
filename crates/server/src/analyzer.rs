//! Analysis orchestrator.
//!
//! Drives one request through the pipeline:
//!
//! ```text
//! RECEIVED -> VALIDATED -> CACHE_HIT
//!                       -> CACHE_MISS -> FETCHING -> PROMPTING -> MODEL_CALLING -> CACHED
//! ```
//!
//! Any stage may fail, which ends the request. Concurrent misses for the same
//! address share a single in-flight computation. That computation runs on its
//! own task, so a caller going away does not cancel upstream work.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use siteintel_client::{NormalizedUrl, PageSource, ReportModel, build_prompt, check_resolved, is_allowed, normalize};
use siteintel_core::{AnalysisResult, Error, ResultCache};
use tokio::sync::Mutex;

type Pending = Shared<BoxFuture<'static, Result<Arc<AnalysisResult>, Error>>>;

/// Outcome of a successful analysis.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Whether the result was served from the cache.
    pub cached: bool,
    pub data: Arc<AnalysisResult>,
}

/// End-to-end analysis pipeline with its cache and collaborators injected.
#[derive(Clone)]
pub struct Analyzer {
    source: Arc<dyn PageSource>,
    model: Arc<dyn ReportModel>,
    cache: Arc<ResultCache>,
    in_flight: Arc<Mutex<HashMap<String, Pending>>>,
    resolve_dns: bool,
}

impl Analyzer {
    pub fn new(source: Arc<dyn PageSource>, model: Arc<dyn ReportModel>, cache: Arc<ResultCache>) -> Self {
        Self { source, model, cache, in_flight: Arc::new(Mutex::new(HashMap::new())), resolve_dns: false }
    }

    /// Also resolve hostnames and reject private/reserved answers.
    pub fn with_resolve_dns(mut self, enabled: bool) -> Self {
        self.resolve_dns = enabled;
        self
    }

    #[cfg(test)]
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Analyze the site at `raw_url`.
    pub async fn analyze(&self, raw_url: &str) -> Result<Analysis, Error> {
        let url = self.validate(raw_url).await?;
        let key = url.as_str().to_string();

        if let Some(data) = self.cache.get(&key).await {
            tracing::debug!("cache hit for {}", key);
            return Ok(Analysis { cached: true, data });
        }

        let pending = {
            let mut in_flight = self.in_flight.lock().await;

            // A computation may have finished between the first lookup and taking the lock.
            if let Some(data) = self.cache.get(&key).await {
                tracing::debug!("cache hit for {}", key);
                return Ok(Analysis { cached: true, data });
            }

            match in_flight.get(&key) {
                Some(pending) => {
                    tracing::debug!("joining in-flight analysis for {}", key);
                    pending.clone()
                }
                None => {
                    let pending = self.spawn_pipeline(url, key.clone());
                    in_flight.insert(key.clone(), pending.clone());
                    pending
                }
            }
        };

        let data = pending.await?;
        Ok(Analysis { cached: false, data })
    }

    async fn validate(&self, raw_url: &str) -> Result<NormalizedUrl, Error> {
        let url = normalize(raw_url)?;

        if !is_allowed(&url) {
            return Err(Error::UrlNotAllowed(url.host_str().to_string()));
        }

        if self.resolve_dns {
            check_resolved(&url).await?;
        }

        Ok(url)
    }

    fn spawn_pipeline(&self, url: NormalizedUrl, key: String) -> Pending {
        let source = self.source.clone();
        let model = self.model.clone();
        let cache = self.cache.clone();
        let in_flight = self.in_flight.clone();

        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = run_pipeline(source.as_ref(), model.as_ref(), &url).await.map(Arc::new);
            if let Ok(data) = &result {
                cache.set(task_key.clone(), data.clone()).await;
            }
            in_flight.lock().await.remove(&task_key);
            result
        });

        let in_flight = self.in_flight.clone();
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    in_flight.lock().await.remove(&key);
                    Err(Error::Internal(format!("analysis task failed: {e}")))
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Fetch, prompt and invoke the model for one address.
async fn run_pipeline(
    source: &dyn PageSource, model: &dyn ReportModel, url: &NormalizedUrl,
) -> Result<AnalysisResult, Error> {
    let start = Instant::now();

    let page = source.fetch_page(url).await.inspect_err(|e| {
        tracing::warn!(url = %url, error = %e, timeout = e.is_timeout(), "fetch failed");
    })?;

    let prompt = build_prompt(url, &page.body);

    let result = model.analyze(&prompt).await.inspect_err(|e| {
        tracing::warn!(url = %url, error = %e, timeout = e.is_timeout(), "model call failed");
    })?;

    tracing::info!(
        url = %url,
        title = result.report().site.title.as_deref().unwrap_or("-"),
        fetch_ms = page.fetch_ms,
        truncated = page.truncated,
        total_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );

    Ok(result)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use siteintel_client::{PageContent, Prompt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub(crate) const HTML: &str = "<html><head><title>Example Domain</title></head><body>Hi</body></html>";

    /// Page source returning fixed HTML.
    pub(crate) struct StaticPage {
        pub calls: AtomicUsize,
        pub delay: Duration,
    }

    impl StaticPage {
        pub fn new() -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), delay: Duration::ZERO })
        }

        pub fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), delay })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageSource for StaticPage {
        async fn fetch_page(&self, url: &NormalizedUrl) -> Result<PageContent, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(PageContent { final_url: url.as_url().clone(), body: HTML.to_string(), truncated: false, fetch_ms: 1 })
        }
    }

    /// Page source that always fails.
    pub(crate) struct FailingPage;

    #[async_trait]
    impl PageSource for FailingPage {
        async fn fetch_page(&self, _url: &NormalizedUrl) -> Result<PageContent, Error> {
            Err(Error::HttpError { status: 503, reason: "Service Unavailable".into() })
        }
    }

    /// Model double returning canned content, parsed like the real client.
    pub(crate) struct ScriptedModel {
        pub calls: AtomicUsize,
        pub content: String,
        pub last_prompt: std::sync::Mutex<Option<Prompt>>,
    }

    impl ScriptedModel {
        pub fn returning(content: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                content: content.to_string(),
                last_prompt: std::sync::Mutex::new(None),
            })
        }

        pub fn valid() -> Arc<Self> {
            Self::returning(
                r#"{"site":{"url":"https://example.com/","title":"Example Domain","description":null,"language":"en"},
                    "frameworks":[],"cms":null,"traffic_estimate":{"monthly_visits_range":"1M-5M","confidence":"low"},
                    "summary":"Reserved illustrative domain.","recommendations":["Add a meta description"]}"#,
            )
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReportModel for ScriptedModel {
        async fn analyze(&self, prompt: &Prompt) -> Result<AnalysisResult, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.clone());
            siteintel_client::model::parse_report(&self.content)
        }
    }

    fn analyzer(source: Arc<dyn PageSource>, model: Arc<dyn ReportModel>) -> Analyzer {
        Analyzer::new(source, model, Arc::new(ResultCache::default()))
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let page = StaticPage::new();
        let model = ScriptedModel::valid();
        let analyzer = analyzer(page.clone(), model.clone());

        let first = analyzer.analyze("example.com").await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.data.report().site.title.as_deref(), Some("Example Domain"));

        let second = analyzer.analyze("https://EXAMPLE.com/#top").await.unwrap();
        assert!(second.cached);
        assert_eq!(first.data, second.data);

        assert_eq!(page.calls(), 1);
        assert_eq!(model.calls(), 1);
        assert!(analyzer.cache().contains_raw("https://example.com/").await);
    }

    #[tokio::test]
    async fn test_prompt_carries_address_and_page() {
        let model = ScriptedModel::valid();
        let analyzer = analyzer(StaticPage::new(), model.clone());
        analyzer.analyze("example.com").await.unwrap();

        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.user().content.contains("https://example.com/"));
        assert!(prompt.user().content.contains(HTML));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_work() {
        let page = StaticPage::new();
        let analyzer = analyzer(page.clone(), ScriptedModel::valid());

        let err = analyzer.analyze("").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        let err = analyzer.analyze("ftp://example.com").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert_eq!(page.calls(), 0);
    }

    #[tokio::test]
    async fn test_internal_host_rejected_before_work() {
        let page = StaticPage::new();
        let analyzer = analyzer(page.clone(), ScriptedModel::valid());

        for input in ["localhost", "127.0.0.1", "0.0.0.0", "a.local", "b.internal", "c.localhost"] {
            let err = analyzer.analyze(input).await.unwrap_err();
            assert!(matches!(err, Error::UrlNotAllowed(_)), "{input} should be rejected");
        }
        assert_eq!(page.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_dns_blocks_private_literal() {
        let page = StaticPage::new();
        let analyzer = analyzer(page.clone(), ScriptedModel::valid()).with_resolve_dns(true);

        let err = analyzer.analyze("http://10.0.0.8/").await.unwrap_err();
        assert!(matches!(err, Error::UrlNotAllowed(_)));
        assert_eq!(page.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_short_circuits() {
        let model = ScriptedModel::valid();
        let analyzer = analyzer(Arc::new(FailingPage), model.clone());

        let err = analyzer.analyze("example.com").await.unwrap_err();
        assert!(matches!(err, Error::HttpError { status: 503, .. }));
        assert_eq!(model.calls(), 0);
        assert!(analyzer.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_output_not_cached() {
        let page = StaticPage::new();
        let model = ScriptedModel::returning("I could not analyze this site.");
        let analyzer = analyzer(page.clone(), model.clone());

        let err = analyzer.analyze("example.com").await.unwrap_err();
        assert!(matches!(err, Error::ModelMalformed(_)));
        assert!(analyzer.cache().is_empty().await);

        analyzer.analyze("example.com").await.unwrap_err();
        assert_eq!(page.calls(), 2);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let page = StaticPage::slow(Duration::from_millis(100));
        let model = ScriptedModel::valid();
        let analyzer = analyzer(page.clone(), model.clone());

        let results = futures::future::join_all((0..8).map(|_| analyzer.analyze("example.com"))).await;

        for result in &results {
            let analysis = result.as_ref().unwrap();
            assert!(!analysis.cached);
        }
        assert_eq!(page.calls(), 1);
        assert_eq!(model.calls(), 1);
        assert!(analyzer.in_flight.lock().await.is_empty());

        assert!(analyzer.analyze("example.com").await.unwrap().cached);
    }

    #[tokio::test]
    async fn test_distinct_addresses_not_coalesced() {
        let page = StaticPage::slow(Duration::from_millis(20));
        let analyzer = analyzer(page.clone(), ScriptedModel::valid());

        let (a, b) = tokio::join!(analyzer.analyze("example.com"), analyzer.analyze("example.org"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(page.calls(), 2);
        assert_eq!(analyzer.cache().len().await, 2);
    }
}
