//! News sentiment labels.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Parse a provider label. Anything other than positive/negative/neutral
    /// (case-insensitive) is treated as neutral.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            other => {
                warn!(label = other, "unrecognized sentiment label, treating as neutral");
                Sentiment::Neutral
            }
        }
    }

    /// Label a compound polarity score in [-1, 1].
    pub fn from_compound(score: f64) -> Self {
        if score >= 0.05 {
            Sentiment::Positive
        } else if score <= -0.05 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// +1, -1 or 0.
    pub fn polarity(self) -> i32 {
        match self {
            Sentiment::Positive => 1,
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
        }
    }

    /// Net label count: more positives than negatives is positive, and so on.
    pub fn aggregate<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Sentiment>,
    {
        let net: i32 = labels.into_iter().map(Sentiment::polarity).sum();
        match net.signum() {
            1 => Sentiment::Positive,
            -1 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_parse() {
        assert_eq!(Sentiment::from_label("positive"), Sentiment::Positive);
        assert_eq!(Sentiment::from_label(" Negative "), Sentiment::Negative);
        assert_eq!(Sentiment::from_label("NEUTRAL"), Sentiment::Neutral);
    }

    #[test]
    fn unknown_label_is_neutral() {
        assert_eq!(Sentiment::from_label("unknown"), Sentiment::Neutral);
        assert_eq!(Sentiment::from_label(""), Sentiment::Neutral);
    }

    #[test]
    fn compound_thresholds() {
        assert_eq!(Sentiment::from_compound(0.05), Sentiment::Positive);
        assert_eq!(Sentiment::from_compound(0.049), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(-0.05), Sentiment::Negative);
        assert_eq!(Sentiment::from_compound(0.0), Sentiment::Neutral);
    }

    #[test]
    fn aggregate_by_net_count() {
        use Sentiment::*;
        assert_eq!(Sentiment::aggregate([Positive, Positive, Negative]), Positive);
        assert_eq!(Sentiment::aggregate([Positive, Negative, Neutral]), Neutral);
        assert_eq!(Sentiment::aggregate([Negative, Neutral, Neutral]), Negative);
        assert_eq!(Sentiment::aggregate(Vec::new()), Neutral);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sentiment::Positive).unwrap(), "\"positive\"");
    }
}
