//! Criterion benchmarks for Tickercast hot paths.
//!
//! Benchmarks:
//! 1. Indicator computation (RSI + MACD) over growing histories
//! 2. Volatility estimation
//! 3. Recursive forecasting through the AR and linear-trend predictors
//! 4. AR model fitting

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tickercast_core::forecast::{default_features, feature_matrix, ForecastContext, MinMaxScaler};
use tickercast_core::indicators::IndicatorCalculator;
use tickercast_core::predictor::{AutoregressivePredictor, LinearTrendPredictor};
use tickercast_core::volatility::VolatilityEstimator;
use tickercast_core::{Engine, EngineParams, PriceBar, PriceSeries};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.01;
            let open = close - 0.3;
            PriceBar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                close + 1.5,
                open - 1.5,
                close,
                1_000_000 + (i as u64 % 500_000),
            )
        })
        .collect();
    PriceSeries::new("BENCH", bars).unwrap()
}

// ── 1–2. Indicators and volatility ───────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let calc = IndicatorCalculator::default();
    let estimator = VolatilityEstimator::default();
    for n in [252usize, 1260, 5000] {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::new("rsi_macd", n), &series, |b, s| {
            b.iter(|| calc.compute(black_box(s)))
        });
        group.bench_with_input(BenchmarkId::new("volatility", n), &series, |b, s| {
            b.iter(|| estimator.estimate(black_box(s)))
        });
    }
    group.finish();
}

// ── 3. Forecasting ───────────────────────────────────────────────────

fn bench_forecast(c: &mut Criterion) {
    let series = make_series(1260);
    let raw = feature_matrix(series.bars(), &default_features());
    let scaler = MinMaxScaler::fit(raw.view()).unwrap();
    let scaled = scaler.transform(raw.view()).unwrap();
    let ar = AutoregressivePredictor::fit(scaled.view(), 5, "bench").unwrap();

    let mut group = c.benchmark_group("forecast");
    for horizon in [5usize, 30] {
        let ctx = Arc::new(ForecastContext::with_predictor(Arc::new(ar.clone())));
        ctx.install_scaler(series.symbol(), scaler.clone());
        let engine = Engine::with_context(EngineParams::default(), ctx).unwrap();
        group.bench_with_input(BenchmarkId::new("autoregressive", horizon), &horizon, |b, &h| {
            b.iter(|| engine.forecast(black_box(&series), h).unwrap())
        });

        let ctx = Arc::new(ForecastContext::with_predictor(Arc::new(LinearTrendPredictor::new())));
        let engine = Engine::with_context(EngineParams::default(), ctx).unwrap();
        group.bench_with_input(BenchmarkId::new("linear_trend", horizon), &horizon, |b, &h| {
            b.iter(|| engine.forecast(black_box(&series), h).unwrap())
        });
    }
    group.finish();
}

// ── 4. Training ──────────────────────────────────────────────────────

fn bench_fit(c: &mut Criterion) {
    let series = make_series(5000);
    let raw = feature_matrix(series.bars(), &default_features());
    let scaled = MinMaxScaler::fit(raw.view())
        .unwrap()
        .transform(raw.view())
        .unwrap();
    c.bench_function("ar_fit_order_5_5000_rows", |b| {
        b.iter(|| AutoregressivePredictor::fit(black_box(scaled.view()), 5, "bench").unwrap())
    });
}

criterion_group!(benches, bench_indicators, bench_forecast, bench_fit);
criterion_main!(benches);
