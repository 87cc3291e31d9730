//! Tickercast CLI — analyze, indicators and train commands over CSV files.
//!
//! Commands:
//! - `analyze` — forecast and recommend Buy/Sell/Hold for one or more tickers
//! - `indicators` — latest RSI, MACD and volatility per ticker
//! - `train` — fit an AR model on a ticker's history and save the artifact
//!
//! Results are written to stdout as JSON; logs go to stderr (`RUST_LOG`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tickercast_core::data::{DataFetcher, HistoryPeriod};
use tickercast_runner::{
    train_autoregressive, Analyzer, CsvHistory, EngineConfig, ForecastCache, HeadlineSentiment,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tickercast",
    about = "Tickercast CLI — price forecasts and Buy/Sell/Hold recommendations"
)]
struct Cli {
    /// Engine config (TOML). Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding <TICKER>.csv price histories.
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast and score tickers.
    Analyze {
        /// Tickers to analyze (e.g., AAPL MSFT).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// History period: 1mo, 3mo, 6mo, 1y, 2y, 5y or max.
        #[arg(long, default_value = "1y")]
        period: HistoryPeriod,

        /// Forecast horizon in business days. Defaults to the config value.
        #[arg(long)]
        horizon: Option<usize>,

        /// Directory holding <TICKER>.json headline files.
        #[arg(long)]
        headlines: Option<PathBuf>,

        /// Persist forecasts here and reuse them for the same trading day.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Analyze tickers one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Print the latest indicator readings.
    Indicators {
        #[arg(required = true)]
        tickers: Vec<String>,

        #[arg(long, default_value = "1y")]
        period: HistoryPeriod,
    },
    /// Train an AR model on one ticker and save the artifact.
    Train {
        ticker: String,

        #[arg(long, default_value = "max")]
        period: HistoryPeriod,

        /// Artifact output path. Defaults to models/<TICKER>.json.
        #[arg(long)]
        output: Option<PathBuf>,

        /// AR order. Defaults to the config value.
        #[arg(long)]
        order: Option<usize>,

        /// Model version tag. Derived from the data when omitted.
        #[arg(long)]
        model_version: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            tickers,
            period,
            horizon,
            headlines,
            cache_dir,
            sequential,
        } => run_analyze(
            &config,
            &cli.data_dir,
            &tickers,
            period,
            horizon,
            headlines,
            cache_dir,
            sequential,
        ),
        Commands::Indicators { tickers, period } => {
            run_indicators(&config, &cli.data_dir, &tickers, period)
        }
        Commands::Train {
            ticker,
            period,
            output,
            order,
            model_version,
        } => run_train(&config, &cli.data_dir, &ticker, period, output, order, model_version),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{json}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    config: &EngineConfig,
    data_dir: &Path,
    tickers: &[String],
    period: HistoryPeriod,
    horizon: Option<usize>,
    headlines: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    sequential: bool,
) -> Result<()> {
    let engine = config.build_engine().context("building engine")?;
    let horizon = horizon.unwrap_or_else(|| engine.default_horizon());

    let mut analyzer = Analyzer::new(engine, Box::new(CsvHistory::new(data_dir)))
        .with_parallelism(!sequential);
    if let Some(dir) = headlines {
        analyzer = analyzer.with_sentiment(Box::new(HeadlineSentiment::from_dir(dir)));
    }
    if let Some(dir) = cache_dir {
        // separate namespace per configuration
        let fingerprint = config.fingerprint()?;
        let dir = dir.join(&fingerprint[..16]);
        let cache = ForecastCache::persistent(&dir)
            .with_context(|| format!("opening forecast cache {}", dir.display()))?;
        analyzer = analyzer.with_cache(cache);
    }

    let reports = analyzer.analyze_many(tickers, period, horizon);
    print_json(&reports)?;

    let mut failed = false;
    for report in &reports {
        if let Some(err) = &report.error {
            eprintln!("Error for {}: {err}", report.ticker);
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_indicators(
    config: &EngineConfig,
    data_dir: &Path,
    tickers: &[String],
    period: HistoryPeriod,
) -> Result<()> {
    let engine = config.build_engine().context("building engine")?;
    let analyzer = Analyzer::new(engine, Box::new(CsvHistory::new(data_dir)));

    let snapshots = tickers
        .iter()
        .map(|ticker| analyzer.indicators(ticker, period))
        .collect::<Result<Vec<_>, _>>()?;
    print_json(&snapshots)
}

fn run_train(
    config: &EngineConfig,
    data_dir: &Path,
    ticker: &str,
    period: HistoryPeriod,
    output: Option<PathBuf>,
    order: Option<usize>,
    model_version: Option<String>,
) -> Result<()> {
    let series = CsvHistory::new(data_dir)
        .get_history(ticker, period)
        .with_context(|| format!("loading history for {ticker}"))?;

    let mut params = config.training_params();
    if let Some(order) = order {
        params.order = order;
    }
    params.version = model_version;

    let artifact = train_autoregressive(&series, &params)
        .with_context(|| format!("training model for {ticker}"))?;
    let output = output.unwrap_or_else(|| PathBuf::from("models").join(format!("{ticker}.json")));
    artifact
        .save(&output)
        .with_context(|| format!("saving artifact to {}", output.display()))?;

    info!(ticker, version = %artifact.version, path = %output.display(), "model artifact saved");
    print_json(&serde_json::json!({
        "symbol": artifact.symbol,
        "version": artifact.version,
        "trained_on": artifact.trained_on,
        "bars": series.len(),
        "order": artifact.model.order(),
        "path": output,
    }))
}
