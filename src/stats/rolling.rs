//! Trailing window statistics over positional series.
//!
//! Every output has the input's length. Positions without a full window are
//! NaN, and a NaN anywhere inside a window propagates to that window's
//! output. A return series derived from prices starts with NaN, so its first
//! defined volatility sits at index `window`, not `window - 1`.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Periods per year used to annualize daily volatility.
pub const ANNUALIZATION_DAYS: f64 = 365.0;

/// Standard deviation estimator for volatility windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityEstimator {
    /// Divisor n - 1. A window of one value is undefined.
    #[default]
    Sample,
    /// Divisor n.
    Population,
}

impl VolatilityEstimator {
    fn std_dev(self, window: &[f64]) -> f64 {
        match self {
            Self::Sample => window.iter().std_dev(),
            Self::Population => window.iter().population_std_dev(),
        }
    }
}

/// Trailing simple moving average.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().mean())
}

/// Trailing standard deviation of returns scaled by sqrt(365).
pub fn annualized_volatility(
    returns: &[f64],
    window: usize,
    estimator: VolatilityEstimator,
) -> Vec<f64> {
    let scale = ANNUALIZATION_DAYS.sqrt();
    rolling_apply(returns, window, |w| estimator.std_dev(w) * scale)
}

/// Mean of the defined entries; NaN when there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).mean()
}

fn rolling_apply<F>(values: &[f64], window: usize, stat: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                f64::NAN
            } else {
                stat(&values[i + 1 - window..=i])
            }
        })
        .collect()
}
