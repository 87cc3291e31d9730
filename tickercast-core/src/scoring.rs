//! Recommendation scoring.
//!
//! An additive score over five signals:
//!
//! | signal            | contribution                                        |
//! |-------------------|-----------------------------------------------------|
//! | predicted change  | +/-2.0 beyond the threshold, else 50 x change        |
//! | RSI               | +1.0 oversold, -1.0 overbought                      |
//! | MACD histogram    | +0.5 positive, -0.5 negative                        |
//! | sentiment         | +1.0 positive, -1.0 negative                        |
//! | volatility        | high volatility without an extreme move: x0.7 total |
//!
//! `score >= buy_cutoff` is Buy, `score <= sell_cutoff` is Sell, else Hold.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::forecast::ForecastResult;
use crate::indicators::{NEUTRAL_MACD_HIST, NEUTRAL_RSI};
use crate::sentiment::Sentiment;

pub const PREDICTED_CHANGE: &str = "predicted_change";
pub const RSI: &str = "rsi";
pub const MACD: &str = "macd";
pub const SENTIMENT: &str = "sentiment";
pub const VOLATILITY_DAMPENING: &str = "volatility_dampening";

/// Which forecast point the predicted change is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePoint {
    /// First forecast point.
    NextStep,
    /// Last forecast point.
    #[default]
    HorizonEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    /// Fractional move treated as decisive (0.02 = 2%).
    pub price_change_threshold: f64,
    /// Contribution of a decisive move.
    pub price_weight: f64,
    /// Multiplier applied to sub-threshold moves.
    pub price_slope: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub rsi_weight: f64,
    pub macd_weight: f64,
    pub sentiment_weight: f64,
    /// Annualized volatility above which the score is dampened.
    pub volatility_ceiling: f64,
    pub dampening_factor: f64,
    /// A move of at least `extreme_multiple x price_change_threshold` is
    /// never dampened.
    pub extreme_multiple: f64,
    pub buy_cutoff: f64,
    pub sell_cutoff: f64,
    pub reference: ReferencePoint,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            price_change_threshold: 0.02,
            price_weight: 2.0,
            price_slope: 50.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            rsi_weight: 1.0,
            macd_weight: 0.5,
            sentiment_weight: 1.0,
            volatility_ceiling: 0.6,
            dampening_factor: 0.7,
            extreme_multiple: 2.0,
            buy_cutoff: 1.5,
            sell_cutoff: -1.5,
            reference: ReferencePoint::HorizonEnd,
        }
    }
}

impl ScoringThresholds {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.price_change_threshold.is_nan() || self.price_change_threshold <= 0.0 {
            return Err(EngineError::InvalidParameter {
                name: "scoring.price_change_threshold",
                reason: format!("must be positive, got {}", self.price_change_threshold),
            });
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(EngineError::InvalidParameter {
                name: "scoring.rsi_oversold",
                reason: format!(
                    "must be below rsi_overbought ({} >= {})",
                    self.rsi_oversold, self.rsi_overbought
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.dampening_factor) {
            return Err(EngineError::InvalidParameter {
                name: "scoring.dampening_factor",
                reason: format!("must be in [0, 1], got {}", self.dampening_factor),
            });
        }
        if self.sell_cutoff >= self.buy_cutoff {
            return Err(EngineError::InvalidParameter {
                name: "scoring.sell_cutoff",
                reason: format!(
                    "must be below buy_cutoff ({} >= {})",
                    self.sell_cutoff, self.buy_cutoff
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Buy => "Buy",
            Recommendation::Sell => "Sell",
            Recommendation::Hold => "Hold",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDecision {
    pub label: Recommendation,
    pub score: f64,
    /// Signal name to contribution. The dampening entry is the adjustment
    /// applied to the raw sum (zero when not applied).
    pub components: BTreeMap<String, f64>,
    pub rationale: Vec<String>,
}

/// Signals the scorer consumes, already reduced to their latest values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub current_price: f64,
    pub volatility: f64,
    pub rsi: f64,
    pub macd_hist: f64,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationScorer {
    thresholds: ScoringThresholds,
}

impl RecommendationScorer {
    pub fn new(thresholds: ScoringThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ScoringThresholds {
        &self.thresholds
    }

    /// Fractional change from `current_price` to the reference forecast
    /// point. `None` when either side is unusable.
    pub fn predicted_change(&self, forecast: &ForecastResult, current_price: f64) -> Option<f64> {
        let reference = match self.thresholds.reference {
            ReferencePoint::NextStep => forecast.first(),
            ReferencePoint::HorizonEnd => forecast.last(),
        }?;
        let target = reference.predicted_close;
        if !(current_price.is_finite() && current_price > 0.0 && target.is_finite()) {
            return None;
        }
        Some((target - current_price) / current_price)
    }

    pub fn score(&self, forecast: &ForecastResult, signals: &Signals) -> RecommendationDecision {
        let t = &self.thresholds;
        let mut components = BTreeMap::new();
        let mut rationale = Vec::new();

        let change = self.predicted_change(forecast, signals.current_price);
        let price_term = match change {
            Some(d) if d > t.price_change_threshold => {
                rationale.push(format!("forecast {:+.2}% beyond threshold", d * 100.0));
                t.price_weight
            }
            Some(d) if d < -t.price_change_threshold => {
                rationale.push(format!("forecast {:+.2}% beyond threshold", d * 100.0));
                -t.price_weight
            }
            Some(d) => {
                rationale.push(format!("forecast {:+.2}% within threshold", d * 100.0));
                let cap = t.price_weight.abs();
                (t.price_slope * d).clamp(-cap, cap)
            }
            None => {
                rationale.push("no usable price reference; forecast ignored".to_string());
                0.0
            }
        };
        components.insert(PREDICTED_CHANGE.to_string(), price_term);

        let rsi = if signals.rsi.is_finite() { signals.rsi } else { NEUTRAL_RSI };
        let rsi_term = if rsi < t.rsi_oversold {
            rationale.push(format!("RSI {rsi:.1} oversold"));
            t.rsi_weight
        } else if rsi > t.rsi_overbought {
            rationale.push(format!("RSI {rsi:.1} overbought"));
            -t.rsi_weight
        } else {
            0.0
        };
        components.insert(RSI.to_string(), rsi_term);

        let hist = if signals.macd_hist.is_finite() {
            signals.macd_hist
        } else {
            NEUTRAL_MACD_HIST
        };
        let macd_term = if hist > 0.0 {
            rationale.push("MACD histogram positive".to_string());
            t.macd_weight
        } else if hist < 0.0 {
            rationale.push("MACD histogram negative".to_string());
            -t.macd_weight
        } else {
            0.0
        };
        components.insert(MACD.to_string(), macd_term);

        let sentiment_term = f64::from(signals.sentiment.polarity()) * t.sentiment_weight;
        if signals.sentiment != Sentiment::Neutral {
            rationale.push(format!("news sentiment {}", signals.sentiment));
        }
        components.insert(SENTIMENT.to_string(), sentiment_term);

        let raw = price_term + rsi_term + macd_term + sentiment_term;

        let volatility = if signals.volatility.is_finite() {
            signals.volatility
        } else {
            0.0
        };
        let extreme = change.is_some_and(|d| d.abs() >= t.extreme_multiple * t.price_change_threshold);
        let adjustment = if volatility > t.volatility_ceiling && !extreme {
            rationale.push(format!(
                "volatility {:.0}% above ceiling; conviction scaled by {}",
                volatility * 100.0,
                t.dampening_factor
            ));
            raw * t.dampening_factor - raw
        } else {
            0.0
        };
        components.insert(VOLATILITY_DAMPENING.to_string(), adjustment);

        let score = raw + adjustment;
        let label = if score >= t.buy_cutoff {
            Recommendation::Buy
        } else if score <= t.sell_cutoff {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        };

        RecommendationDecision {
            label,
            score,
            components,
            rationale,
        }
    }
}
