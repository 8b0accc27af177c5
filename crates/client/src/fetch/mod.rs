//! Page retrieval with address normalization and safety filtering.
//!
//! ### Address Normalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Safety Gates
//! - Deny loopback/internal hostnames (`localhost`, `*.local`, `*.internal`, ...)
//! - Optionally resolve DNS and validate all A/AAAA answers are public.
//!
//! ### Retrieval
//! - Single GET, redirects followed (max 5)
//! - Hard wall-clock timeout covering connect, headers and body (default 15s)
//! - Body clipped to a character budget (default 800,000), never rejected

pub mod ssrf;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use ssrf::{SsrfError, check_resolved, is_allowed, validate_ip};
pub use url::{NormalizedUrl, UrlError, normalize};

use siteintel_core::Error;

/// Accept header sent with every page request.
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "siteintel/0.1 (+analysis bot)")
    pub user_agent: String,

    /// Maximum page length in characters before clipping (default: 800,000)
    pub max_chars: usize,

    /// Whole-request timeout (default: 15s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "siteintel/0.1 (+analysis bot)".to_string(),
            max_chars: 800_000,
            timeout: Duration::from_millis(15_000),
            max_redirects: 5,
        }
    }
}

impl From<&siteintel_core::AppConfig> for FetchConfig {
    fn from(config: &siteintel_core::AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_chars: config.max_content_chars,
            timeout: config.fetch_timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// Retrieved page text, possibly clipped.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// The final URL after redirects
    pub final_url: reqwest::Url,
    /// Page body as text, at most `max_chars` characters
    pub body: String,
    /// Whether the body was clipped
    pub truncated: bool,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Anything that can retrieve page content for a normalized address.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &NormalizedUrl) -> Result<PageContent, Error>;
}

/// Clip `text` to its first `max_chars` characters.
///
/// Returns the (possibly shortened) text and whether anything was removed.
pub fn clip_to_chars(mut text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            (text, true)
        }
        None => (text, false),
    }
}

/// HTTP page client.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fetch a page body as text, clipped to the configured length.
    ///
    /// Dropping the returned future or hitting the timeout aborts the
    /// underlying transfer.
    pub async fn fetch(&self, url: &NormalizedUrl) -> Result<PageContent, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let final_url = response.url().clone();

        let text = response.text().await.map_err(|e| self.classify(e))?;
        let (body, truncated) = clip_to_chars(text, self.config.max_chars);

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes, truncated={})",
            url,
            final_url,
            fetch_ms,
            body.len(),
            truncated
        );

        Ok(PageContent { final_url, body, truncated, fetch_ms })
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(format!("no complete response within {:?}", self.config.timeout))
        } else {
            Error::FetchFailed(format!("network error: {}", err))
        }
    }
}

#[async_trait]
impl PageSource for FetchClient {
    async fn fetch_page(&self, url: &NormalizedUrl) -> Result<PageContent, Error> {
        self.fetch(url).await
    }
}
