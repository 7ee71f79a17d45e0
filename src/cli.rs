//! Command-line interface definitions for News Sentiment.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also be supplied through an environment variable. Options
//! left unset fall back to the YAML config file (see [`crate::config`]) and
//! then to built-in defaults.

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the News Sentiment application.
///
/// # Examples
///
/// ```sh
/// # Articles about a topic over one month
/// news_sentiment -q "climate" --from-date 2024-01-01 --to-date 2024-01-31
///
/// # With a custom lexicon and a slower crawl
/// news_sentiment -q "elections" --lexicon ./afinn.tsv --delay-ms 2000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search query sent to the news API
    #[arg(short, long)]
    pub query: String,

    /// Only include articles published on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from_date: Option<NaiveDate>,

    /// Only include articles published on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to_date: Option<NaiveDate>,

    /// News API key
    #[arg(long, env = "GUARDIAN_API_KEY")]
    pub api_key: String,

    /// Output directory for JSON reports and the chart
    #[arg(short, long, env = "NEWS_SENTIMENT_OUTPUT_DIR", default_value = "./output")]
    pub output_dir: String,

    /// Optional path to a config.yaml file
    #[arg(short, long, env = "NEWS_SENTIMENT_CONFIG")]
    pub config: Option<String>,

    /// Sentiment lexicon file (`word<TAB>score` per line)
    #[arg(long, env = "NEWS_SENTIMENT_LEXICON")]
    pub lexicon: Option<String>,

    /// CSS selector used to pull body text out of article pages
    #[arg(long)]
    pub selector: Option<String>,

    /// Delay between page requests, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Maximum number of API result pages to walk
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Number of results per API page
    #[arg(long)]
    pub page_size: Option<u32>,
}
