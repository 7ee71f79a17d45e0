//! # News Sentiment
//!
//! An ad hoc analysis pipeline. It looks up news articles through a metadata
//! API, scrapes the article pages that robots.txt permits, scores their text
//! against a sentiment lexicon, and charts the mean sentiment per day.
//!
//! ## Usage
//!
//! ```sh
//! GUARDIAN_API_KEY=... news_sentiment -q "climate change" --from-date 2024-01-01 -o ./output
//! ```
//!
//! ## Pipeline
//!
//! 1. **Metadata**: Search the news API (sequential pages, retried with backoff)
//! 2. **Permission**: Check robots.txt for each article's site
//! 3. **Scraping**: Fetch each page in turn with a fixed delay; non-200 means no body
//! 4. **Scoring**: Tokenise the body and join the tokens against the lexicon
//! 5. **Aggregation**: Mean article score per publication day
//! 6. **Output**: JSON reports plus an SVG chart

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod api;
mod cli;
mod config;
mod models;
mod outputs;
mod robots;
mod scrapers;
mod sentiment;
mod utils;

use cli::Cli;
use config::load_config;
use outputs::{json, plot};
use robots::RobotsCache;
use sentiment::{Lexicon, score_article};
use utils::{ensure_writable_dir, slugify};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_sentiment starting up");

    let args = Cli::parse();
    debug!(query = %args.query, ?args.from_date, ?args.to_date, %args.output_dir, "Parsed CLI arguments");

    let cfg = load_config(args.config.as_deref()).await?.apply_cli(&args);
    debug!(?cfg, "Effective pipeline config");

    if let (Some(from), Some(to)) = (args.from_date, args.to_date) {
        if from > to {
            error!(%from, %to, "--from-date is after --to-date");
            return Err("--from-date must not be after --to-date".into());
        }
    }

    // Fail before any network traffic if the output can't be written
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = reqwest::Client::builder()
        .user_agent(cfg.user_agent.clone())
        .timeout(Duration::from_secs(30))
        .build()?;

    // ---- Metadata ----
    let metas = api::fetch_metadata(
        &client,
        &cfg,
        &args.query,
        args.from_date,
        args.to_date,
        &args.api_key,
    )
    .await?;

    if metas.is_empty() {
        warn!(query = %args.query, "News API returned no articles; nothing to do");
        return Ok(());
    }

    // ---- Lexicon ----
    let lexicon = match &cfg.lexicon_path {
        Some(path) => Lexicon::load(path).await?,
        None => {
            info!("Using built-in sentiment lexicon");
            Lexicon::builtin()
        }
    };
    if lexicon.is_empty() {
        warn!("Sentiment lexicon is empty; no article will be scored");
    }

    // ---- Permission check + scraping ----
    let mut robots = RobotsCache::new(client.clone(), cfg.user_agent.clone());
    let articles = scrapers::article::fetch_articles(&client, metas, &cfg, &mut robots).await?;

    // ---- Scoring + aggregation ----
    let sentiments: Vec<_> = articles
        .iter()
        .map(|article| score_article(article, &lexicon))
        .collect();
    let scored = sentiments.iter().filter(|s| s.score.is_some()).count();
    info!(total = sentiments.len(), scored, "Scored articles");

    let daily = aggregate::daily_sentiment(&sentiments);

    // ---- Output ----
    let slug = slugify(&args.query);
    let paths = json::write_report(&args.output_dir, &slug, &articles, &sentiments, &daily).await?;
    info!(
        articles = %paths.articles.display(),
        sentiment = %paths.sentiment.display(),
        daily = %paths.daily.display(),
        "JSON reports written"
    );

    if daily.is_empty() {
        warn!("No article could be scored; skipping chart");
    } else {
        let chart_path = Path::new(&args.output_dir).join(format!("{slug}_daily.svg"));
        let title = format!("Mean daily sentiment: {}", args.query);
        if let Err(e) = plot::plot_daily(&chart_path, &title, &daily) {
            error!(path = %chart_path.display(), error = %e, "Failed to draw chart");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = articles.len(),
        with_body = articles.iter().filter(|a| a.body.is_some()).count(),
        scored,
        days = daily.len(),
        "Execution complete"
    );

    Ok(())
}
