//! Output generation for JSON reports and the daily sentiment chart.
//!
//! # Submodules
//!
//! - [`json`]: Writes the article table, per-article sentiment and daily aggregate
//! - [`plot`]: Renders the daily aggregate as an SVG line chart
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── climate-change_articles.json
//! ├── climate-change_sentiment.json
//! ├── climate-change_daily.json
//! └── climate-change_daily.svg
//! ```

pub mod json;
pub mod plot;
