//! Core series types for regime classification.
//!
//! Prices and returns are daily, dated series. The pipeline windows over
//! positional index, so these types only guarantee ordering and positivity;
//! calendar gaps are reported by the integrity checker instead.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Series is empty")]
    Empty,

    #[error("Dates must be strictly increasing: {previous} followed by {next}")]
    NonIncreasingDates { previous: NaiveDate, next: NaiveDate },

    #[error("Invalid price {price} on {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("Length mismatch: {dates} dates, {values} values")]
    LengthMismatch { dates: usize, values: usize },
}

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closing prices for one asset.
///
/// Dates are strictly increasing and every price is positive and finite.
/// An empty series is representable; the pipeline rejects it at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from aligned date and price vectors.
    pub fn new(
        ticker: impl Into<String>,
        dates: Vec<NaiveDate>,
        prices: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        if dates.len() != prices.len() {
            return Err(SeriesError::LengthMismatch {
                dates: dates.len(),
                values: prices.len(),
            });
        }
        check_increasing(&dates)?;

        for (&date, &price) in dates.iter().zip(&prices) {
            if !price.is_finite() || price <= 0.0 {
                return Err(SeriesError::InvalidPrice { date, price });
            }
        }

        Ok(Self {
            ticker: ticker.into(),
            dates,
            prices,
        })
    }

    /// Build a series from individual bars.
    pub fn from_bars(ticker: impl Into<String>, bars: &[PriceBar]) -> Result<Self, SeriesError> {
        let dates = bars.iter().map(|b| b.date).collect();
        let prices = bars.iter().map(|b| b.close).collect();
        Self::new(ticker, dates, prices)
    }

    /// An empty series for `ticker`.
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            dates: Vec::new(),
            prices: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<PriceBar> {
        Some(PriceBar {
            date: *self.dates.last()?,
            close: *self.prices.last()?,
        })
    }

    /// Iterate bars in date order.
    pub fn bars(&self) -> impl Iterator<Item = PriceBar> + '_ {
        self.dates
            .iter()
            .zip(&self.prices)
            .map(|(&date, &close)| PriceBar { date, close })
    }

    /// Simple percentage changes, NaN at position 0.
    pub fn returns(&self) -> ReturnSeries {
        let mut returns = Vec::with_capacity(self.prices.len());
        if !self.prices.is_empty() {
            returns.push(f64::NAN);
        }
        returns.extend(self.prices.windows(2).map(|w| w[1] / w[0] - 1.0));

        ReturnSeries {
            dates: self.dates.clone(),
            returns,
        }
    }

    /// Copy of this series with one extra bar dated the day after the last.
    pub fn with_next_bar(&self, price: f64) -> Result<Self, SeriesError> {
        let last = self.last().ok_or(SeriesError::Empty)?;
        let date = last.date + Duration::days(1);
        if !price.is_finite() || price <= 0.0 {
            return Err(SeriesError::InvalidPrice { date, price });
        }

        let mut extended = self.clone();
        extended.dates.push(date);
        extended.prices.push(price);
        Ok(extended)
    }
}

/// Daily simple returns aligned with a price series.
///
/// Values may be NaN wherever the return is undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    returns: Vec<f64>,
}

impl ReturnSeries {
    /// Build a return series supplied from outside the crate.
    pub fn new(dates: Vec<NaiveDate>, returns: Vec<f64>) -> Result<Self, SeriesError> {
        if dates.len() != returns.len() {
            return Err(SeriesError::LengthMismatch {
                dates: dates.len(),
                values: returns.len(),
            });
        }
        check_increasing(&dates)?;
        Ok(Self { dates, returns })
    }

    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            returns: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.returns
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.returns.last().copied()
    }
}

fn check_increasing(dates: &[NaiveDate]) -> Result<(), SeriesError> {
    match dates.windows(2).find(|w| w[1] <= w[0]) {
        Some(w) => Err(SeriesError::NonIncreasingDates {
            previous: w[0],
            next: w[1],
        }),
        None => Ok(()),
    }
}
