//! Per-day aggregation of article sentiment.

use crate::models::{ArticleSentiment, DailySentiment};
use itertools::Itertools;
use tracing::{debug, instrument};

/// Group scored articles by publication day (UTC), oldest first.
///
/// Articles without a score (missing body, or no lexicon match) are left out,
/// so a day appears only if at least one of its articles was scored.
#[instrument(level = "info", skip_all, fields(articles = sentiments.len()))]
pub fn daily_sentiment(sentiments: &[ArticleSentiment]) -> Vec<DailySentiment> {
    let daily: Vec<DailySentiment> = sentiments
        .iter()
        .filter_map(|s| s.score.map(|score| (s.date, score)))
        .into_group_map()
        .into_iter()
        .map(|(date, scores)| DailySentiment {
            date,
            mean_sentiment: scores.iter().sum::<f64>() / scores.len() as f64,
            article_count: scores.len(),
        })
        .sorted_by_key(|d| d.date)
        .collect();

    debug!(days = daily.len(), "Aggregated daily sentiment");
    daily
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sentiment(day: u32, score: Option<f64>) -> ArticleSentiment {
        ArticleSentiment {
            url: format!("https://example.com/{day}"),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            title: "t".to_string(),
            total_tokens: 10,
            matched_tokens: usize::from(score.is_some()),
            positive: 0,
            negative: 0,
            score,
        }
    }

    #[test]
    fn test_daily_mean_and_count() {
        let daily = daily_sentiment(&[
            sentiment(3, Some(1.0)),
            sentiment(1, Some(-2.0)),
            sentiment(3, Some(2.0)),
            sentiment(3, None),
            sentiment(1, Some(0.0)),
        ]);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(daily[0].mean_sentiment, -1.0);
        assert_eq!(daily[0].article_count, 2);
        assert_eq!(daily[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(daily[1].mean_sentiment, 1.5);
        assert_eq!(daily[1].article_count, 2);
    }

    #[test]
    fn test_day_without_scores_is_absent() {
        let daily = daily_sentiment(&[sentiment(2, None), sentiment(4, Some(3.0))]);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn test_empty_input() {
        assert!(daily_sentiment(&[]).is_empty());
    }
}
