//! SVG chart of mean sentiment per day.

use crate::models::DailySentiment;
use chrono::Duration;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Draw `daily` as a line chart with point markers and a zero baseline.
///
/// The x axis is days since the first date in `daily`, labelled as dates.
///
/// # Errors
///
/// Fails when `daily` is empty or the SVG cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), days = daily.len()))]
pub fn plot_daily(path: &Path, title: &str, daily: &[DailySentiment]) -> Result<(), Box<dyn Error>> {
    let (Some(first), Some(last)) = (daily.first(), daily.last()) else {
        return Err("no daily sentiment to plot".into());
    };
    let first = first.date;
    let span = (last.date - first).num_days().max(1);
    let (y_min, y_max) = y_range(daily);

    let root = SVGBackend::new(path, (960, 540)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0i64..span, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Publication date")
        .y_desc("Mean sentiment")
        .x_labels(8)
        .x_label_formatter(&|d| (first + Duration::days(*d)).format("%Y-%m-%d").to_string())
        .draw()?;

    let points: Vec<(i64, f64)> = daily
        .iter()
        .map(|d| ((d.date - first).num_days(), d.mean_sentiment))
        .collect();

    chart.draw_series(LineSeries::new([(0, 0.0), (span, 0.0)], BLACK.mix(0.3)))?;
    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
    )?;

    root.present()?;
    info!("Wrote sentiment chart");
    Ok(())
}

/// Vertical range covering all values and zero, with some headroom.
fn y_range(daily: &[DailySentiment]) -> (f64, f64) {
    let (lo, hi) = daily
        .iter()
        .map(|d| d.mean_sentiment)
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.1).max(0.5);
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32, mean: f64) -> DailySentiment {
        DailySentiment {
            date: NaiveDate::from_ymd_opt(2024, 2, d).unwrap(),
            mean_sentiment: mean,
            article_count: 1,
        }
    }

    #[test]
    fn test_y_range_includes_zero() {
        assert_eq!(y_range(&[day(1, 1.0), day(2, 2.0)]), (-0.5, 2.5));
        let (lo, hi) = y_range(&[day(1, -4.0), day(2, 1.0)]);
        assert!(lo < -4.0 && hi > 1.0);
    }

    #[test]
    fn test_plot_daily_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.svg");

        plot_daily(&path, "climate", &[day(1, -1.2), day(3, 0.4), day(7, 1.1)]).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("climate"));
    }

    #[test]
    fn test_plot_daily_single_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.svg");
        plot_daily(&path, "one day", &[day(5, 0.0)]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_plot_daily_empty_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        assert!(plot_daily(&path, "none", &[]).is_err());
        assert!(!path.exists());
    }
}
