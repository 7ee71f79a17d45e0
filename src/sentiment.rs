//! Lexicon-based sentiment scoring.
//!
//! Text is tokenised into lowercase words, and the words are inner-joined
//! against a lexicon of word → integer value. A lexicon file has one entry per
//! line, `word<TAB>value`. The value is an integer (AFINN style, −5..=5) or a
//! `positive`/`negative` label (Bing style, mapped to ±1).
//!
//! An article's score is the mean value of its matched tokens.

use crate::models::{Article, ArticleSentiment};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument, warn};

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}\p{N}]+)*").expect("static word regex")
});

/// Split `text` into lowercase word tokens.
///
/// Punctuation is dropped, internal apostrophes are kept (`don't`), and curly
/// apostrophes are normalised to `'`.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().replace('’', "'"))
        .collect()
}

/// Word → sentiment value table.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    values: HashMap<String, i32>,
}

impl Lexicon {
    /// Small general-purpose AFINN-style lexicon shipped with the binary.
    pub fn builtin() -> Self {
        let values = BUILTIN
            .iter()
            .map(|(word, value)| (word.to_string(), *value))
            .collect();
        Self { values }
    }

    /// Parse lexicon text.
    ///
    /// Blank lines and lines starting with `#` are ignored. The value is the
    /// last tab- or whitespace-separated field. Multi-word entries (`can't
    /// stand`) are skipped, since [`tokenize`] only ever yields single words.
    ///
    /// # Errors
    ///
    /// A line without a value, with an empty word, or with a value that is
    /// neither an integer nor `positive`/`negative` fails with its line number.
    pub fn parse(text: &str) -> Result<Self, Box<dyn Error>> {
        let mut values = HashMap::new();
        let mut skipped = 0usize;
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let split = line.rsplit_once('\t').or_else(|| line.rsplit_once(char::is_whitespace));
            let Some((word, value)) = split else {
                return Err(format!("lexicon line {}: expected `word<TAB>value`", idx + 1).into());
            };
            let word = word.trim().to_lowercase();
            if word.is_empty() {
                return Err(format!("lexicon line {}: empty word", idx + 1).into());
            }
            let value = parse_value(value.trim())
                .ok_or_else(|| format!("lexicon line {}: bad value {:?}", idx + 1, value.trim()))?;
            if word.split_whitespace().nth(1).is_some() {
                skipped += 1;
                continue;
            }
            values.insert(word, value);
        }
        if skipped > 0 {
            warn!(skipped, "Skipped multi-word lexicon entries");
        }
        Ok(Self { values })
    }

    /// Load a lexicon from a file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let lexicon = Self::parse(&text)?;
        info!(entries = lexicon.len(), "Loaded sentiment lexicon");
        Ok(lexicon)
    }

    /// Value for a single lowercase token, if the lexicon has it.
    pub fn get(&self, word: &str) -> Option<i32> {
        self.values.get(word).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when the lexicon has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_value(raw: &str) -> Option<i32> {
    match raw.to_ascii_lowercase().as_str() {
        "positive" => Some(1),
        "negative" => Some(-1),
        other => other.parse().ok(),
    }
}

/// Join an article's body tokens against `lexicon`.
pub fn score_article(article: &Article, lexicon: &Lexicon) -> ArticleSentiment {
    let tokens = article.body.as_deref().map(tokenize).unwrap_or_default();
    let matched: Vec<i32> = tokens.iter().filter_map(|t| lexicon.get(t)).collect();

    let score = if matched.is_empty() {
        None
    } else {
        Some(matched.iter().map(|v| f64::from(*v)).sum::<f64>() / matched.len() as f64)
    };

    ArticleSentiment {
        url: article.url.clone(),
        date: article.date(),
        title: article.title.clone(),
        total_tokens: tokens.len(),
        matched_tokens: matched.len(),
        positive: matched.iter().filter(|v| **v > 0).count(),
        negative: matched.iter().filter(|v| **v < 0).count(),
        score,
    }
}

#[rustfmt::skip]
const BUILTIN: &[(&str, i32)] = &[
    ("abandon", -2), ("abandoned", -2), ("abuse", -3), ("abused", -3),
    ("accident", -2), ("accidents", -2), ("accuse", -2), ("accused", -2),
    ("achievement", 2), ("admire", 3), ("afraid", -2), ("agree", 1),
    ("alarm", -2), ("alarming", -2), ("amazing", 4), ("anger", -3),
    ("angry", -3), ("anxious", -2), ("applaud", 2), ("arrest", -2),
    ("arrested", -3), ("attack", -1), ("attacks", -1), ("awesome", 4),
    ("bad", -3), ("ban", -2), ("banned", -2), ("beautiful", 3),
    ("benefit", 2), ("benefits", 2), ("best", 3), ("better", 2),
    ("blame", -2), ("blamed", -2), ("bless", 2), ("boost", 1),
    ("brave", 2), ("breakthrough", 3), ("brilliant", 4), ("broken", -1),
    ("calm", 2), ("care", 2), ("catastrophe", -3), ("catastrophic", -4),
    ("celebrate", 3), ("chaos", -2), ("cheer", 2), ("clash", -2),
    ("collapse", -2), ("comfort", 2), ("concern", -2), ("concerned", -2),
    ("condemn", -2), ("confident", 2), ("conflict", -2), ("corrupt", -3),
    ("corruption", -3), ("crash", -2), ("crime", -3), ("crisis", -3),
    ("critical", -2), ("criticism", -2), ("cruel", -3), ("cut", -1),
    ("damage", -3), ("danger", -2), ("dangerous", -2), ("dead", -3),
    ("death", -2), ("deaths", -2), ("debt", -2), ("defeat", -2),
    ("delight", 3), ("deny", -2), ("destroy", -3), ("destroyed", -3),
    ("devastating", -2), ("die", -3), ("died", -3), ("disaster", -2),
    ("dispute", -2), ("doubt", -1), ("drop", -1), ("easy", 1),
    ("effective", 2), ("emergency", -2), ("encourage", 2), ("enjoy", 2),
    ("error", -2), ("excellent", 3), ("excited", 3), ("fail", -2),
    ("failed", -2), ("failure", -2), ("fair", 2), ("fake", -3),
    ("fear", -2), ("fears", -2), ("fight", -1), ("fine", 2),
    ("fire", -2), ("flood", -2), ("fraud", -4), ("free", 1),
    ("fun", 4), ("good", 3), ("great", 3), ("grief", -2),
    ("growth", 2), ("guilty", -3), ("happy", 3), ("harm", -2),
    ("hate", -3), ("heal", 2), ("help", 2), ("hope", 2),
    ("hopeful", 2), ("hurt", -2), ("illegal", -3), ("improve", 2),
    ("improved", 2), ("injured", -2), ("injury", -2), ("inspire", 2),
    ("innovative", 2), ("joy", 3), ("kill", -3), ("killed", -3),
    ("killing", -3), ("kind", 2), ("lack", -2), ("lie", -2),
    ("lose", -3), ("loss", -3), ("losses", -3), ("lost", -3),
    ("love", 3), ("lucky", 3), ("misleading", -3), ("murder", -2),
    ("nice", 3), ("no", -1), ("outrage", -3), ("pain", -2),
    ("panic", -3), ("peace", 2), ("perfect", 3), ("pleased", 3),
    ("poor", -2), ("positive", 2), ("poverty", -1), ("praise", 3),
    ("problem", -2), ("problems", -2), ("progress", 2), ("protect", 1),
    ("protest", -2), ("proud", 2), ("recession", -2), ("recover", 2),
    ("recovery", 2), ("relief", 1), ("rescue", 2), ("resign", -1),
    ("risk", -2), ("risks", -2), ("safe", 1), ("safety", 1),
    ("scandal", -3), ("shock", -2), ("shortage", -2), ("sick", -2),
    ("strong", 2), ("success", 2), ("successful", 3), ("suffer", -2),
    ("support", 2), ("supports", 2), ("terrible", -3), ("terror", -3),
    ("thank", 2), ("threat", -2), ("threaten", -2), ("tragedy", -2),
    ("tragic", -2), ("trouble", -2), ("trust", 1), ("ugly", -3),
    ("unfair", -2), ("victim", -3), ("victims", -3), ("victory", 3),
    ("violence", -3), ("war", -2), ("warn", -2), ("warning", -3),
    ("weak", -2), ("welcome", 2), ("win", 4), ("winner", 4),
    ("wins", 4), ("won", 3), ("worried", -3), ("worry", -3),
    ("worse", -3), ("worst", -3), ("wrong", -2), ("yes", 1),
];
