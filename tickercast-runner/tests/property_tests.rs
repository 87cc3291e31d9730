//! Property tests for runner invariants.
//!
//! Uses proptest to verify:
//! 1. Headline compound scores stay in [-1, 1] for arbitrary text
//! 2. Aggregated sentiment follows the net label count
//! 3. History periods always return the trailing bars
//! 4. Cache keys are stable and collision-free across distinct inputs

use std::collections::HashMap;
use std::fs;

use chrono::NaiveDate;
use proptest::prelude::*;
use tickercast_core::data::{DataFetcher, HistoryPeriod, SentimentProvider};
use tickercast_core::Sentiment;
use tickercast_runner::{CacheKey, CsvHistory, Headline, HeadlineSentiment, LexiconScorer};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_word() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "shares", "soar", "plunge", "not", "strong", "weak", "record", "loss", "the", "company",
        "quarter", "never", "good", "bad", "crash", "rally",
    ])
    .prop_map(str::to_string)
}

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_word(), 0..30).prop_map(|words| words.join(" "))
}

fn arb_period() -> impl Strategy<Value = HistoryPeriod> {
    prop::sample::select(vec![
        HistoryPeriod::OneMonth,
        HistoryPeriod::ThreeMonths,
        HistoryPeriod::SixMonths,
        HistoryPeriod::OneYear,
        HistoryPeriod::Max,
    ])
}

// ── 1–2. Sentiment ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn compound_is_bounded(text in arb_text()) {
        let score = LexiconScorer::default().compound(&text);
        prop_assert!((-1.0..=1.0).contains(&score), "score {} for {:?}", score, text);
    }

    #[test]
    fn aggregate_matches_net_count(texts in prop::collection::vec(arb_text(), 0..5)) {
        let scorer = LexiconScorer::default();
        let net: i32 = texts.iter().map(|t| scorer.classify(t).polarity()).sum();
        let expected = match net.signum() {
            1 => Sentiment::Positive,
            -1 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        };

        let headlines = texts.iter().map(|t| Headline::new(t.clone(), None)).collect();
        let provider = HeadlineSentiment::from_headlines(HashMap::from([("T".to_string(), headlines)]));
        prop_assert_eq!(provider.aggregate("T").unwrap(), expected.to_string());
    }
}

// ── 3. History periods ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn period_returns_trailing_bars(n in 1usize..300, period in arb_period()) {
        let dir = tempfile::tempdir().unwrap();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut csv = String::from("date,open,high,low,close,volume\n");
        for i in 0..n {
            let d = start + chrono::Duration::days(i as i64);
            let c = 50.0 + i as f64;
            csv.push_str(&format!("{d},{c},{},{},{c},1\n", c + 1.0, c - 1.0));
        }
        fs::write(dir.path().join("P.csv"), csv).unwrap();

        let series = CsvHistory::new(dir.path()).get_history("P", period).unwrap();
        let expected = period.trading_days().map_or(n, |days| days.min(n));
        prop_assert_eq!(series.len(), expected);
        prop_assert_eq!(series.last().unwrap().date, start + chrono::Duration::days(n as i64 - 1));
    }
}

// ── 4. Cache keys ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn cache_key_digest_is_stable(ticker in "[A-Z]{1,5}", offset in 0i64..3650, horizon in 1usize..60) {
        let date = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + chrono::Duration::days(offset);
        let a = CacheKey::new(ticker.clone(), date, horizon);
        let b = CacheKey::new(ticker.clone(), date, horizon);
        prop_assert_eq!(a.digest(), b.digest());
        prop_assert_ne!(a.digest(), CacheKey::new(ticker, date, horizon + 1).digest());
    }
}
