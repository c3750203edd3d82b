//! Market regime classifier CLI.
//!
//! # Usage
//!
//! ```bash
//! # Label a price history and write the regime series
//! regime-forecast classify --data data/BTC-USD.csv --output results/BTC-USD.csv
//!
//! # Project tomorrow's regime for +1.5% and -3% moves
//! regime-forecast forecast --data data/BTC-USD.csv --change 1.5 --change -3
//!
//! # Current regime for every file in a directory
//! regime-forecast scan --data-dir data
//!
//! # Check a price history before classifying it
//! regime-forecast validate --data data/ETH-USD.csv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use regime_forecast::data::write_regimes;
use regime_forecast::regime::{run_batch, ForecastExtender, RegimeLabel, RegimeSummary};
use regime_forecast::{AppConfig, SeriesValidator};

const SEPARATOR: &str = "============================================================";

/// Trend/volatility regime classifier.
#[derive(Parser)]
#[command(name = "regime-forecast")]
#[command(about = "Classify market regimes and forecast tomorrow's regime")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Label every bar of a price history
    Classify {
        /// Price history (CSV or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Write the labelled series (CSV or Parquet)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project tomorrow's regime for hypothetical moves
    Forecast {
        /// Price history (CSV or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Hypothetical next-day return in percent (repeatable)
        #[arg(long, allow_negative_numbers = true, default_values_t = vec![0.0])]
        change: Vec<f64>,

        /// Print forecasts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Current regime for every price file in a directory
    Scan {
        /// Directory of price files, one ticker per file
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Check a price history for gaps, stale quotes and bad ticks
    Validate {
        /// Price history (CSV or Parquet)
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Print the regime definitions
    Regimes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_ref())
        .context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("regime_forecast={}", config.logging.level).parse()?),
        )
        .init();

    match cli.command {
        Commands::Classify { data, output, json } => cmd_classify(&config, data, output, json),
        Commands::Forecast { data, change, json } => cmd_forecast(&config, data, change, json),
        Commands::Scan { data_dir } => cmd_scan(&config, data_dir),
        Commands::Validate { data } => cmd_validate(&config, data),
        Commands::Regimes => {
            cmd_regimes();
            Ok(())
        }
    }
}

fn cmd_classify(
    config: &AppConfig,
    data: PathBuf,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let prices = config
        .loader()
        .load(&data)
        .with_context(|| format!("Failed to load {}", data.display()))?;
    let returns = prices.returns();
    let run = config.pipeline()?.run_detailed(&prices, &returns)?;
    let summary = RegimeSummary::from_run(&run);

    if let Some(path) = output {
        write_regimes(&run, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", SEPARATOR);
        print!("{}", summary.report());
        println!("{}", SEPARATOR);
    }
    Ok(())
}

fn cmd_forecast(config: &AppConfig, data: PathBuf, changes: Vec<f64>, json: bool) -> Result<()> {
    let prices = config
        .loader()
        .load(&data)
        .with_context(|| format!("Failed to load {}", data.display()))?;
    let returns = prices.returns();
    let pipeline = config.pipeline()?;

    let current = pipeline
        .run(&prices, &returns)?
        .last()
        .unwrap_or(RegimeLabel::Unknown);
    let fractions: Vec<f64> = changes.iter().map(|c| c / 100.0).collect();
    let forecasts = ForecastExtender::new(pipeline).forecast_scenarios(&prices, &returns, &fractions)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forecasts)?);
        return Ok(());
    }

    if let Some(last) = prices.last() {
        println!("{} {}: {:.2}", prices.ticker(), last.date, last.close);
    }
    println!("Current Regime: {} ({})", current, current.code());
    println!("{}", SEPARATOR);
    for f in &forecasts {
        println!(
            "{} {:>+7.2}% -> {:>12.2}  Regime {:>2}: {}",
            f.date,
            f.hypothetical_return * 100.0,
            f.price,
            f.regime.code(),
            f.regime
        );
    }
    Ok(())
}

fn cmd_scan(config: &AppConfig, data_dir: PathBuf) -> Result<()> {
    let loader = config.loader();
    let files = loader
        .available_files(&data_dir)
        .with_context(|| format!("Failed to list {}", data_dir.display()))?;
    info!("Found {} price files in {}", files.len(), data_dir.display());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut assets = Vec::with_capacity(files.len());
    for path in &files {
        pb.set_message(path.display().to_string());
        assets.push(
            loader
                .load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
        );
        pb.inc(1);
    }
    pb.finish_and_clear();

    let results = run_batch(&config.pipeline()?, &assets);

    println!("{}", SEPARATOR);
    for result in &results {
        match (&result.outcome, result.summary()) {
            (Ok(_), Some(summary)) => println!(
                "{:<12} Regime {:>2}: {}",
                result.ticker,
                summary.current.code(),
                summary.current
            ),
            (Err(e), _) => println!("{:<12} error: {}", result.ticker, e),
            _ => {}
        }
    }
    println!("{}", SEPARATOR);
    Ok(())
}

fn cmd_validate(config: &AppConfig, data: PathBuf) -> Result<()> {
    let prices = config
        .loader()
        .load(&data)
        .with_context(|| format!("Failed to load {}", data.display()))?;
    let report = SeriesValidator::new(config.windows)
        .with_config(config.integrity.clone())
        .validate(&prices);

    println!("{}", report.summary());
    for check in &report.checks {
        let mark = if check.passed { "PASS" } else { "FAIL" };
        println!("  [{}] {}: {}", mark, check.name, check.message);
        if let Some(details) = &check.details {
            println!("         {}", details);
        }
    }

    if !report.all_passed() {
        anyhow::bail!("{} checks failed", report.failed_checks().len());
    }
    Ok(())
}

fn cmd_regimes() {
    println!("Regime Definitions");
    println!("{}", SEPARATOR);
    for label in RegimeLabel::ALL.into_iter().filter(RegimeLabel::is_known) {
        println!("Regime {}: {}", label.code(), label.description());
    }
}
