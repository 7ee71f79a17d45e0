//! JSON report files.
//!
//! Each run writes three pretty-printed files named after the query slug:
//! the article table (one row per article, missing bodies as `null`), the
//! per-article lexicon join, and the per-day aggregate.

use crate::models::{Article, ArticleSentiment, DailySentiment};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Paths of the files written by [`write_report`].
#[derive(Debug)]
pub struct ReportPaths {
    pub articles: PathBuf,
    pub sentiment: PathBuf,
    pub daily: PathBuf,
}

/// Write the three JSON reports into `output_dir`, creating it if needed.
#[instrument(level = "info", skip_all, fields(%output_dir, %slug))]
pub async fn write_report(
    output_dir: &str,
    slug: &str,
    articles: &[Article],
    sentiments: &[ArticleSentiment],
    daily: &[DailySentiment],
) -> Result<ReportPaths, Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let dir = Path::new(output_dir);
    let paths = ReportPaths {
        articles: dir.join(format!("{slug}_articles.json")),
        sentiment: dir.join(format!("{slug}_sentiment.json")),
        daily: dir.join(format!("{slug}_daily.json")),
    };

    write_json(&paths.articles, articles).await?;
    write_json(&paths.sentiment, sentiments).await?;
    write_json(&paths.daily, daily).await?;
    Ok(paths)
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[tokio::test]
    async fn test_write_report_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let out = out.to_str().unwrap();

        let articles = vec![Article {
            url: "https://example.com/a".to_string(),
            published: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            author: Some("A. Writer".to_string()),
            title: "Title".to_string(),
            section: None,
            body: None,
        }];
        let daily = vec![DailySentiment {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            mean_sentiment: 0.25,
            article_count: 1,
        }];

        let paths = write_report(out, "climate", &articles, &[], &daily)
            .await
            .unwrap();

        assert!(paths.articles.ends_with("climate_articles.json"));
        let written: Vec<Article> =
            serde_json::from_str(&std::fs::read_to_string(&paths.articles).unwrap()).unwrap();
        assert_eq!(written, articles);

        let sentiment = std::fs::read_to_string(&paths.sentiment).unwrap();
        assert_eq!(sentiment.trim(), "[]");

        let written: Vec<DailySentiment> =
            serde_json::from_str(&std::fs::read_to_string(&paths.daily).unwrap()).unwrap();
        assert_eq!(written, daily);
    }
}
