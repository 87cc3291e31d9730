//! Headline sentiment: lexicon polarity per headline, net-count aggregate.
//!
//! Headlines live in `<dir>/<TICKER>.json` as an array of
//! `{ "title": ..., "description": ... }`. Each headline's title and
//! description are scored together; only the most recent few are used.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tickercast_core::data::{DataError, SentimentProvider};
use tickercast_core::Sentiment;

/// Headlines considered per ticker.
pub const DEFAULT_HEADLINE_LIMIT: usize = 5;

/// Normalization constant for the compound score, `s / sqrt(s^2 + alpha)`.
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Scaling applied to a word following a negator.
const NEGATION_SCALAR: f64 = -0.74;

const NEGATORS: &[&str] = &[
    "not", "no", "never", "without", "cannot", "can't", "won't", "isn't", "aren't", "doesn't",
    "don't", "didn't", "wasn't", "nor", "neither",
];

const LEXICON: &[(&str, f64)] = &[
    ("beat", 1.8),
    ("beats", 1.8),
    ("boost", 1.7),
    ("boosts", 1.7),
    ("bullish", 2.3),
    ("gain", 1.9),
    ("gains", 1.9),
    ("good", 1.9),
    ("great", 3.1),
    ("growth", 1.8),
    ("high", 0.8),
    ("improve", 1.9),
    ("improved", 2.1),
    ("innovative", 2.0),
    ("jump", 1.2),
    ("jumps", 1.2),
    ("outperform", 2.0),
    ("profit", 1.9),
    ("profits", 1.9),
    ("rally", 1.8),
    ("record", 1.3),
    ("rise", 1.2),
    ("rises", 1.2),
    ("soar", 2.2),
    ("soars", 2.2),
    ("strong", 2.3),
    ("success", 2.7),
    ("surge", 1.9),
    ("surges", 1.9),
    ("upgrade", 1.8),
    ("win", 2.8),
    ("wins", 2.7),
    ("bad", -2.5),
    ("bankrupt", -2.6),
    ("bankruptcy", -2.6),
    ("bearish", -2.2),
    ("collapse", -2.5),
    ("concern", -1.4),
    ("concerns", -1.4),
    ("crash", -2.7),
    ("cut", -1.1),
    ("cuts", -1.1),
    ("decline", -1.6),
    ("declines", -1.6),
    ("downgrade", -1.9),
    ("drop", -1.1),
    ("drops", -1.1),
    ("fail", -2.5),
    ("fails", -2.3),
    ("fall", -1.5),
    ("falls", -1.5),
    ("fraud", -2.8),
    ("lawsuit", -1.8),
    ("loss", -1.9),
    ("losses", -1.9),
    ("miss", -1.5),
    ("misses", -1.5),
    ("plunge", -2.3),
    ("plunges", -2.3),
    ("poor", -2.1),
    ("recall", -1.2),
    ("risk", -1.1),
    ("slump", -2.0),
    ("weak", -1.9),
    ("worst", -3.1),
];

/// One news item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Headline {
    pub fn new(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_string),
        }
    }

    fn text(&self) -> String {
        match &self.description {
            Some(d) => format!("{} {}", self.title, d),
            None => self.title.clone(),
        }
    }
}

/// Word-lexicon polarity scorer.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    lexicon: HashMap<&'static str, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
        }
    }
}

impl LexiconScorer {
    /// Compound polarity in [-1, 1]. Empty or unscored text is 0.
    pub fn compound(&self, text: &str) -> f64 {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|t| {
                t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                    .to_lowercase()
            })
            .filter(|t| !t.is_empty())
            .collect();

        let mut sum = 0.0;
        for (i, token) in tokens.iter().enumerate() {
            let Some(&valence) = self.lexicon.get(token.as_str()) else {
                continue;
            };
            let negated = i > 0 && NEGATORS.iter().any(|n| *n == tokens[i - 1]);
            sum += if negated { valence * NEGATION_SCALAR } else { valence };
        }

        if sum == 0.0 {
            return 0.0;
        }
        (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
    }

    pub fn classify(&self, text: &str) -> Sentiment {
        Sentiment::from_compound(self.compound(text))
    }
}

enum Source {
    Directory(PathBuf),
    Memory(HashMap<String, Vec<Headline>>),
}

/// `SentimentProvider` over stored headlines.
///
/// A ticker with no headlines is neutral.
pub struct HeadlineSentiment {
    source: Source,
    scorer: LexiconScorer,
    limit: usize,
}

impl HeadlineSentiment {
    /// Read `<dir>/<TICKER>.json` on each request.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Directory(dir.into()),
            scorer: LexiconScorer::default(),
            limit: DEFAULT_HEADLINE_LIMIT,
        }
    }

    pub fn from_headlines(headlines: HashMap<String, Vec<Headline>>) -> Self {
        Self {
            source: Source::Memory(headlines),
            scorer: LexiconScorer::default(),
            limit: DEFAULT_HEADLINE_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn headlines(&self, ticker: &str) -> Result<Vec<Headline>, DataError> {
        match &self.source {
            Source::Memory(map) => Ok(map.get(ticker).cloned().unwrap_or_default()),
            Source::Directory(dir) => {
                let path = dir.join(format!("{ticker}.json"));
                if !path.exists() {
                    return Ok(Vec::new());
                }
                let json = fs::read_to_string(&path)
                    .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
                serde_json::from_str(&json).map_err(|e| DataError::Malformed {
                    source_name: path.display().to_string(),
                    line: e.line(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Label for each considered headline, in order.
    pub fn classify(&self, ticker: &str) -> Result<Vec<Sentiment>, DataError> {
        Ok(self
            .headlines(ticker)?
            .iter()
            .take(self.limit)
            .map(|h| self.scorer.classify(&h.text()))
            .collect())
    }
}

impl SentimentProvider for HeadlineSentiment {
    fn name(&self) -> &str {
        "headlines"
    }

    fn aggregate(&self, ticker: &str) -> Result<String, DataError> {
        let labels = self.classify(ticker)?;
        let aggregate = Sentiment::aggregate(labels.iter().copied());
        debug!(ticker, headlines = labels.len(), sentiment = %aggregate, "aggregated headline sentiment");
        Ok(aggregate.to_string())
    }
}
