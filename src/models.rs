//! Data models for article metadata, scraped articles and their sentiment.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`ArticleMeta`]: One search result from the news metadata API
//! - [`Article`]: One row of the article table, metadata plus scraped body
//! - [`ArticleSentiment`]: Lexicon join result for a single article
//! - [`DailySentiment`]: Per-day aggregate used for the chart
//! - [`SearchEnvelope`] and friends: the raw API wire format
//!
//! The wire types use camelCase field names to match the API's JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Article metadata as returned by the news API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleMeta {
    /// Canonical web URL of the article page.
    pub url: String,
    /// Publication timestamp (UTC).
    pub published: DateTime<Utc>,
    /// Byline, when the API provides a non-blank one.
    pub author: Option<String>,
    /// Headline of the article.
    pub title: String,
    /// Editorial section, e.g. "World news".
    pub section: Option<String>,
}

/// One row of the article table.
///
/// `body` is `None` when the page was disallowed by robots.txt, returned a
/// non-200 status, failed to download, or had no text under the selector.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    pub url: String,
    pub published: DateTime<Utc>,
    pub author: Option<String>,
    pub title: String,
    pub section: Option<String>,
    pub body: Option<String>,
}

impl Article {
    /// Build the article row from its metadata and the scraped body, if any.
    pub fn from_meta(meta: ArticleMeta, body: Option<String>) -> Self {
        Self {
            url: meta.url,
            published: meta.published,
            author: meta.author,
            title: meta.title,
            section: meta.section,
            body,
        }
    }

    /// Calendar day (UTC) the article was published on.
    pub fn date(&self) -> NaiveDate {
        self.published.date_naive()
    }
}

/// Result of joining an article's tokens against the lexicon.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleSentiment {
    pub url: String,
    pub date: NaiveDate,
    pub title: String,
    /// Tokens in the body.
    pub total_tokens: usize,
    /// Tokens found in the lexicon.
    pub matched_tokens: usize,
    /// Matched tokens with a positive value.
    pub positive: usize,
    /// Matched tokens with a negative value.
    pub negative: usize,
    /// Mean lexicon value of matched tokens; `None` without body or matches.
    pub score: Option<f64>,
}

/// Mean sentiment of all scored articles published on one day.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub mean_sentiment: f64,
    pub article_count: usize,
}

/// Top-level search response: `{"response": {...}}`.
#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub response: SearchResponse,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub currentPage: u32,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub webUrl: String,
    pub webPublicationDate: DateTime<Utc>,
    pub webTitle: String,
    #[serde(default)]
    pub sectionName: Option<String>,
    #[serde(default)]
    pub fields: Option<SearchFields>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchFields {
    #[serde(default)]
    pub byline: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
}

impl From<SearchResult> for ArticleMeta {
    fn from(result: SearchResult) -> Self {
        let fields = result.fields.unwrap_or_default();
        let title = fields
            .headline
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(result.webTitle);
        let author = fields
            .byline
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        ArticleMeta {
            url: result.webUrl,
            published: result.webPublicationDate,
            author,
            title,
            section: result.sectionName,
        }
    }
}
