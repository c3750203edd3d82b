//! Labelled regime output.
//!
//! Writes one row per bar: `date, price, return, regime, regime_code`,
//! as CSV or Parquet depending on the output extension.

use std::fs;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::regime::{RegimeLabel, RegimeRun};

use super::loader::{FileFormat, LoaderError};

/// Build the output frame for a run.
pub fn regime_frame(run: &RegimeRun) -> Result<DataFrame, LoaderError> {
    let dates: Vec<String> = run.dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    let labels = run.labels.labels();
    let descriptions: Vec<&str> = labels.iter().map(RegimeLabel::description).collect();
    let codes: Vec<i32> = labels.iter().map(RegimeLabel::code).collect();

    let df = DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new("price".into(), run.prices.clone()),
        Column::new("return".into(), run.returns.clone()),
        Column::new("regime".into(), descriptions),
        Column::new("regime_code".into(), codes),
    ])?;
    Ok(df)
}

/// Write a run to `path`, creating parent directories.
pub fn write_regimes(run: &RegimeRun, path: &Path) -> Result<(), LoaderError> {
    let format = FileFormat::from_path(path)
        .ok_or_else(|| LoaderError::UnsupportedFormat(path.display().to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut df = regime_frame(run)?;
    let file = fs::File::create(path)?;
    match format {
        FileFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(&mut df)?;
        }
        FileFormat::Parquet => {
            ParquetWriter::new(file).finish(&mut df)?;
        }
    }

    info!(ticker = %run.ticker, rows = df.height(), "Wrote regimes to {}", path.display());
    Ok(())
}
