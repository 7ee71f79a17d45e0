//! Pipeline settings loaded from an optional YAML file.
//!
//! Every key is optional; missing keys take the defaults below. Flags given on
//! the command line win over the file.
//!
//! ```yaml
//! api_base_url: https://content.guardianapis.com
//! page_size: 50
//! max_pages: 2
//! selector: "div.article-body-commercial-selector p"
//! delay_ms: 1000
//! user_agent: news_sentiment/0.1.0
//! lexicon_path: ./afinn.tsv
//! ```

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::{debug, info, instrument};

/// Default CSS selector for article body paragraphs.
pub const DEFAULT_SELECTOR: &str = "div.article-body-commercial-selector p";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base URL of the news metadata API.
    pub api_base_url: String,
    /// Results requested per API page.
    pub page_size: u32,
    /// Upper bound on API pages walked per run.
    pub max_pages: u32,
    /// CSS selector matched against each article page.
    pub selector: String,
    /// Fixed pause between page requests.
    pub delay_ms: u64,
    /// User agent sent with every request and matched against robots.txt.
    pub user_agent: String,
    /// Lexicon file; the built-in lexicon is used when unset.
    pub lexicon_path: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://content.guardianapis.com".to_string(),
            page_size: 50,
            max_pages: 1,
            selector: DEFAULT_SELECTOR.to_string(),
            delay_ms: 1000,
            user_agent: format!("news_sentiment/{}", env!("CARGO_PKG_VERSION")),
            lexicon_path: None,
        }
    }
}

impl PipelineConfig {
    /// Override file/default values with any flag present on the command line.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(selector) = &cli.selector {
            self.selector = selector.clone();
        }
        if let Some(delay) = cli.delay_ms {
            self.delay_ms = delay;
        }
        if let Some(max_pages) = cli.max_pages {
            self.max_pages = max_pages;
        }
        if let Some(page_size) = cli.page_size {
            self.page_size = page_size;
        }
        if let Some(lexicon) = &cli.lexicon {
            self.lexicon_path = Some(lexicon.clone());
        }
        self
    }
}

/// Load the pipeline config from `path`, or return defaults when no path is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML for
/// [`PipelineConfig`].
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<PipelineConfig, Box<dyn Error>> {
    let Some(path) = path else {
        debug!("No config file given; using defaults");
        return Ok(PipelineConfig::default());
    };

    let raw = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&raw)?;
    info!(path, "Loaded configuration");
    Ok(config)
}

fn parse_config(raw: &str) -> Result<PipelineConfig, Box<dyn Error>> {
    if raw.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}
