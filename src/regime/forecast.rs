//! Next-day regime projection.
//!
//! Appends one synthetic bar to a copy of the series and reruns the whole
//! pipeline. The volatility threshold is a whole-series scalar, so the run
//! is never incremental.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::data::{PriceSeries, ReturnSeries};

use super::classifier::RegimeLabel;
use super::pipeline::{check_aligned, RegimeError, RegimePipeline};

/// Projected regime for one hypothetical move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    /// Date of the synthetic bar.
    pub date: NaiveDate,
    /// Synthetic close.
    pub price: f64,
    /// Hypothetical simple return, as a fraction.
    pub hypothetical_return: f64,
    pub regime: RegimeLabel,
}

/// What-if projection over a regime pipeline.
#[derive(Debug, Clone)]
pub struct ForecastExtender {
    pipeline: RegimePipeline,
}

impl ForecastExtender {
    pub fn new(pipeline: RegimePipeline) -> Self {
        Self { pipeline }
    }

    /// Project the regime if the next close moves by `hypothetical_return`
    /// (a fraction, 0.01 = +1%).
    ///
    /// `returns` must align with `prices`; the extended returns are
    /// recomputed from the extended prices.
    pub fn forecast_next(
        &self,
        prices: &PriceSeries,
        returns: &ReturnSeries,
        hypothetical_return: f64,
    ) -> Result<Forecast, RegimeError> {
        let last = prices.last().ok_or_else(|| {
            RegimeError::InsufficientData(format!(
                "price series for {} is empty",
                prices.ticker()
            ))
        })?;
        check_aligned(prices, returns)?;
        if !hypothetical_return.is_finite() || hypothetical_return <= -1.0 {
            return Err(RegimeError::InvalidHypotheticalReturn(hypothetical_return));
        }

        let price = last.close * (1.0 + hypothetical_return);
        let extended = prices
            .with_next_bar(price)
            .map_err(|_| RegimeError::InvalidHypotheticalReturn(hypothetical_return))?;
        let extended_returns = extended.returns();

        let labels = self.pipeline.run(&extended, &extended_returns)?;
        let regime = labels.last().unwrap_or(RegimeLabel::Unknown);

        debug!(
            ticker = prices.ticker(),
            hypothetical_return,
            price,
            regime = %regime,
            "Projected next regime"
        );

        Ok(Forecast {
            date: last.date + chrono::Duration::days(1),
            price,
            hypothetical_return,
            regime,
        })
    }

    /// Project several independent hypothetical moves, in input order.
    pub fn forecast_scenarios(
        &self,
        prices: &PriceSeries,
        returns: &ReturnSeries,
        hypothetical_returns: &[f64],
    ) -> Result<Vec<Forecast>, RegimeError> {
        hypothetical_returns
            .par_iter()
            .map(|&r| self.forecast_next(prices, returns, r))
            .collect()
    }
}
