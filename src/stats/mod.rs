//! Rolling statistics module.
//!
//! Trailing-window moving averages and annualized volatility used by the
//! regime pipeline.

pub mod rolling;

pub use rolling::{
    annualized_volatility, nan_mean, rolling_mean, VolatilityEstimator, ANNUALIZATION_DAYS,
};
