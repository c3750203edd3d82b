//! Trend/volatility market regime classification.
//!
//! Each daily bar is labelled by where its price sits against a short and a
//! long moving average, and by whether short-window annualized volatility is
//! above the series-wide average volatility. A what-if step projects the
//! label for a hypothetical next-day move.

pub mod config;
pub mod data;
pub mod regime;
pub mod stats;
pub mod validation;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use data::{PriceBar, PriceLoader, PriceSeries, ReturnSeries, SeriesError};
pub use regime::{
    Forecast, ForecastExtender, RegimeError, RegimeLabel, RegimeLabelSeries, RegimePipeline,
    RegimeRun, RegimeSummary, WindowParameters,
};
pub use stats::VolatilityEstimator;
pub use validation::{IntegrityReport, SeriesValidator};

/// Label every bar of `prices`.
///
/// `returns` must carry the same dates as `prices`. Fails on empty or
/// misaligned input or invalid windows; warm-up bars are `Unknown`.
pub fn compute_regimes(
    prices: &PriceSeries,
    returns: &ReturnSeries,
    params: &WindowParameters,
) -> Result<RegimeLabelSeries, RegimeError> {
    RegimePipeline::new(*params)?.run(prices, returns)
}

/// Project tomorrow's regime if the price moves by
/// `hypothetical_return_percent` percent (1.5 = +1.5%).
pub fn forecast_next_regime(
    prices: &PriceSeries,
    returns: &ReturnSeries,
    params: &WindowParameters,
    hypothetical_return_percent: f64,
) -> Result<RegimeLabel, RegimeError> {
    let pipeline = RegimePipeline::new(*params)?;
    let forecast = ForecastExtender::new(pipeline).forecast_next(
        prices,
        returns,
        hypothetical_return_percent / 100.0,
    )?;
    Ok(forecast.regime)
}
