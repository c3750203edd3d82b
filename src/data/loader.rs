//! Price history loader for CSV and Parquet files.
//!
//! Each file holds one asset, named by its file stem (`BTC-USD.csv` loads
//! as ticker `BTC-USD`). Files need a date column formatted `YYYY-MM-DD`
//! (anything after the first ten characters is ignored, so timestamps with
//! a time part load too) and a numeric close column. Rows with a missing
//! date or close are skipped.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{PriceSeries, SeriesError};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Series error: {0}")]
    Series(#[from] SeriesError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported on-disk formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()?
            .to_str()?
            .to_ascii_lowercase()
            .as_str()
        {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Loads daily closes into [`PriceSeries`].
#[derive(Debug, Clone)]
pub struct PriceLoader {
    date_column: String,
    price_column: String,
}

impl Default for PriceLoader {
    fn default() -> Self {
        Self::new("date", "close")
    }
}

impl PriceLoader {
    pub fn new(date_column: &str, price_column: &str) -> Self {
        Self {
            date_column: date_column.to_string(),
            price_column: price_column.to_string(),
        }
    }

    /// Load one asset from a CSV or Parquet file.
    pub fn load(&self, path: &Path) -> Result<PriceSeries, LoaderError> {
        let ticker = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let lf = self.scan(path)?;

        let df = lf
            .select([
                col(self.date_column.as_str())
                    .cast(DataType::String)
                    .alias("date"),
                col(self.price_column.as_str())
                    .cast(DataType::Float64)
                    .alias("close"),
            ])
            .collect()?;

        self.dataframe_to_series(&ticker, &df)
    }

    /// Load every CSV/Parquet file in `dir`, sorted by file name.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<PriceSeries>, LoaderError> {
        let files = self.available_files(dir)?;
        files.iter().map(|path| self.load(path)).collect()
    }

    /// List loadable files in `dir`.
    pub fn available_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
        if !dir.is_dir() {
            return Err(LoaderError::FileNotFound(dir.display().to_string()));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && FileFormat::from_path(&path).is_some() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn scan(&self, path: &Path) -> Result<LazyFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }

        let lf = match FileFormat::from_path(path) {
            Some(FileFormat::Csv) => LazyCsvReader::new(path).with_has_header(true).finish()?,
            Some(FileFormat::Parquet) => {
                LazyFrame::scan_parquet(path, ScanArgsParquet::default())?
            }
            None => {
                return Err(LoaderError::UnsupportedFormat(
                    path.display().to_string(),
                ))
            }
        };
        Ok(lf)
    }

    fn dataframe_to_series(&self, ticker: &str, df: &DataFrame) -> Result<PriceSeries, LoaderError> {
        let dates_col = df.column("date")?.str()?;
        let closes_col = df.column("close")?.f64()?;

        let mut dates = Vec::with_capacity(df.height());
        let mut closes = Vec::with_capacity(df.height());
        let mut skipped = 0usize;

        for (row, (date, close)) in dates_col.into_iter().zip(closes_col.into_iter()).enumerate() {
            let (date, close) = match (date, close) {
                (Some(d), Some(c)) if !c.is_nan() => (d, c),
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            let date = NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d")
                .map_err(|e| {
                    LoaderError::InvalidData(format!("row {}: invalid date {:?}: {}", row, date, e))
                })?;
            dates.push(date);
            closes.push(close);
        }

        if skipped > 0 {
            warn!(ticker, skipped, "Skipped rows with missing date or close");
        }
        debug!(ticker, rows = dates.len(), "Loaded price history");

        Ok(PriceSeries::new(ticker, dates, closes)?)
    }
}
