//! News metadata API client with exponential backoff retry logic.
//!
//! Article metadata (URL, publication date, byline, headline) comes from a
//! Guardian-style content search API. Result pages are walked sequentially and
//! every page request goes through [`RetryFetch`].
//!
//! # Architecture
//!
//! - [`FetchAsync`]: Core trait for "GET this URL, give me the body"
//! - [`HttpFetch`]: `reqwest` implementation; any non-success status is an error
//! - [`RetryFetch`]: Decorator that adds retry logic to any `FetchAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 3 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay
//!
//! Only the metadata API is retried. Article pages are fetched once (see
//! [`crate::scrapers::article`]).

use crate::config::PipelineConfig;
use crate::models::{ArticleMeta, SearchEnvelope};
use crate::utils::truncate_for_log;
use chrono::NaiveDate;
use rand::{Rng, rng};
use reqwest::Client;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Trait for fetching a URL asynchronously.
pub trait FetchAsync {
    /// The type of response returned for a successful fetch.
    type Response;

    /// Fetch `url`, returning the response or an error if the request failed.
    async fn fetch(&self, url: &Url) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchAsync`] implementation.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    /// Wrap `inner`, retrying up to `max_retries` times.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher to wrap
    /// * `max_retries` - Retry attempts after the first failure
    /// * `base_delay` - Delay before the first retry (doubles each attempt, capped at 30s)
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(31) as u32;
        let delay = self.base_delay.saturating_mul(1u32 << shift);
        delay.min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    type Response = T::Response;

    #[instrument(level = "debug", skip_all, fields(path = %url.path()))]
    async fn fetch(&self, url: &Url) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// [`FetchAsync`] over a shared `reqwest` client.
#[derive(Debug)]
pub struct HttpFetch<'a> {
    pub client: &'a Client,
}

impl<'a> FetchAsync for HttpFetch<'a> {
    type Response = String;

    async fn fetch(&self, url: &Url) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        // reqwest errors carry the request URL, which includes the api-key
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = resp.status();
        let body = resp.text().await.map_err(reqwest::Error::without_url)?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(elapsed_ms = dt.as_millis(), %status, "API call failed");
            return Err(format!(
                "news API returned {}: {}",
                status,
                truncate_for_log(&body, 200)
            )
            .into());
        }
        debug!(elapsed_ms = dt.as_millis(), bytes = body.len(), "API call succeeded");
        Ok(body)
    }
}

/// One decoded page of search results.
#[derive(Debug)]
pub struct SearchPage {
    /// Total hits across all pages.
    pub total: u64,
    /// Number of result pages the API reports.
    pub pages: u32,
    pub current_page: u32,
    pub articles: Vec<ArticleMeta>,
}

/// Build the search URL for result page `page` (1-based).
///
/// The `search` endpoint is resolved under `cfg.api_base_url`; a base with a
/// path (`https://proxy.example/guardian`) keeps it, trailing `/` or not.
///
/// # Arguments
///
/// * `from` / `to` - Optional inclusive publication date bounds
/// * `api_key` - Sent as the `api-key` query parameter
///
/// # Errors
///
/// Returns an error if the base URL does not parse.
pub fn search_url(
    cfg: &PipelineConfig,
    query: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    api_key: &str,
    page: u32,
) -> Result<Url, Box<dyn Error>> {
    let mut base = Url::parse(&cfg.api_base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base.join("search")?;
    let page = page.to_string();
    let page_size = cfg.page_size.to_string();
    {
        let mut qp = url.query_pairs_mut();
        qp.append_pair("q", query);
        if let Some(from) = from {
            qp.append_pair("from-date", &from.format("%Y-%m-%d").to_string());
        }
        if let Some(to) = to {
            qp.append_pair("to-date", &to.format("%Y-%m-%d").to_string());
        }
        qp.append_pair("page", &page)
            .append_pair("page-size", &page_size)
            .append_pair("show-fields", "byline,headline")
            .append_pair("order-by", "oldest")
            .append_pair("api-key", api_key);
    }
    Ok(url)
}

/// Decode a search response body.
///
/// # Errors
///
/// Returns an error for malformed JSON or when the API reports a status
/// other than `"ok"`.
pub fn parse_search_response(json: &str) -> Result<SearchPage, Box<dyn Error>> {
    let envelope: SearchEnvelope = serde_json::from_str(json)?;
    let response = envelope.response;
    if response.status != "ok" {
        return Err(format!(
            "news API status {:?}: {}",
            response.status,
            response.message.unwrap_or_default()
        )
        .into());
    }

    Ok(SearchPage {
        total: response.total,
        pages: response.pages,
        current_page: response.currentPage,
        articles: response.results.into_iter().map(ArticleMeta::from).collect(),
    })
}

/// Walk the search results for `query`, one page at a time.
///
/// Stops after `min(pages reported by the API, cfg.max_pages)` pages. Results
/// are de-duplicated by URL, keeping the first occurrence.
#[instrument(level = "info", skip(fetcher, cfg, api_key))]
pub async fn collect_metadata<F>(
    fetcher: &F,
    cfg: &PipelineConfig,
    query: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    api_key: &str,
) -> Result<Vec<ArticleMeta>, Box<dyn Error>>
where
    F: FetchAsync<Response = String>,
{
    let mut seen = HashSet::new();
    let mut metas = Vec::new();
    let mut page = 1u32;

    loop {
        let url = search_url(cfg, query, from, to, api_key, page)?;
        let body = fetcher.fetch(&url).await?;
        let search_page = parse_search_response(&body)?;
        debug!(
            page = search_page.current_page,
            pages = search_page.pages,
            total = search_page.total,
            results = search_page.articles.len(),
            "Decoded search page"
        );

        let last_page = search_page.pages.min(cfg.max_pages);
        for meta in search_page.articles {
            if seen.insert(meta.url.clone()) {
                metas.push(meta);
            }
        }

        if page >= last_page {
            break;
        }
        page += 1;
    }

    info!(count = metas.len(), pages = page, "Collected article metadata");
    Ok(metas)
}

/// High-level entry point: fetch all metadata over HTTP with retry.
#[instrument(level = "info", skip_all, fields(%query))]
pub async fn fetch_metadata(
    client: &Client,
    cfg: &PipelineConfig,
    query: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    api_key: &str,
) -> Result<Vec<ArticleMeta>, Box<dyn Error>> {
    let t0 = Instant::now();
    let api = RetryFetch::new(HttpFetch { client }, 3, StdDuration::from_secs(1));
    let res = collect_metadata(&api, cfg, query, from, to, api_key).await;
    let dt = t0.elapsed();

    match &res {
        Ok(metas) => info!(
            elapsed_ms_total = dt.as_millis(),
            count = metas.len(),
            "fetch_metadata succeeded"
        ),
        Err(e) => error!(elapsed_ms_total = dt.as_millis(), error = %e, "fetch_metadata failed"),
    }
    res
}
