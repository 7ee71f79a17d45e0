//! Article page scraping.
//!
//! Metadata from the news API only carries URLs; body text is scraped from the
//! article pages themselves. See [`article`] for the fetch-and-extract loop.
//!
//! Scrapers use:
//! - Strictly sequential fetching with a fixed pause between requests
//! - A robots.txt check before every page
//! - Graceful error handling (failed fetches are logged and kept as a missing body)

pub mod article;
