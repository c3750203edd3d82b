//! Full-series regime pipeline.
//!
//! Moving averages, short-window volatility and the global volatility
//! threshold are recomputed from scratch on every run. Nothing is carried
//! between runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{PriceSeries, ReturnSeries};
use crate::stats::{annualized_volatility, nan_mean, rolling_mean, VolatilityEstimator};

use super::classifier::{RegimeClassifier, RegimeLabelSeries};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegimeError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid window parameters: {0}")]
    InvalidWindowParameters(String),

    #[error("Length mismatch: {prices} prices but {returns} returns")]
    LengthMismatch { prices: usize, returns: usize },

    #[error("Misaligned series at bar {index}: price dated {price_date}, return dated {return_date}")]
    Misaligned {
        index: usize,
        price_date: NaiveDate,
        return_date: NaiveDate,
    },

    #[error("Invalid hypothetical return {0}: must be finite and greater than -100%")]
    InvalidHypotheticalReturn(f64),
}

/// Window sizes, in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParameters {
    /// Short moving average.
    pub ma_short_window: usize,
    /// Long moving average. Must exceed the short one.
    pub ma_long_window: usize,
    /// Volatility window compared against the threshold.
    pub vol_short_window: usize,
    /// Volatility window averaged into the global threshold.
    pub avg_vol_window: usize,
}

impl Default for WindowParameters {
    fn default() -> Self {
        Self {
            ma_short_window: 21,
            ma_long_window: 88,
            vol_short_window: 21,
            avg_vol_window: 365,
        }
    }
}

impl WindowParameters {
    pub fn validate(&self) -> Result<(), RegimeError> {
        let windows = [
            ("ma_short_window", self.ma_short_window),
            ("ma_long_window", self.ma_long_window),
            ("vol_short_window", self.vol_short_window),
            ("avg_vol_window", self.avg_vol_window),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(RegimeError::InvalidWindowParameters(format!(
                "{} must be positive",
                name
            )));
        }

        if self.ma_short_window >= self.ma_long_window {
            return Err(RegimeError::InvalidWindowParameters(format!(
                "ma_short_window ({}) must be less than ma_long_window ({})",
                self.ma_short_window, self.ma_long_window
            )));
        }

        Ok(())
    }

    /// Largest window, which bounds the warm-up period.
    pub fn max_window(&self) -> usize {
        self.ma_short_window
            .max(self.ma_long_window)
            .max(self.vol_short_window)
            .max(self.avg_vol_window)
    }
}

/// Require `returns` to carry the same dates as `prices`, bar for bar.
pub(crate) fn check_aligned(
    prices: &PriceSeries,
    returns: &ReturnSeries,
) -> Result<(), RegimeError> {
    if prices.len() != returns.len() {
        return Err(RegimeError::LengthMismatch {
            prices: prices.len(),
            returns: returns.len(),
        });
    }

    match prices
        .dates()
        .iter()
        .zip(returns.dates())
        .position(|(p, r)| p != r)
    {
        Some(index) => Err(RegimeError::Misaligned {
            index,
            price_date: prices.dates()[index],
            return_date: returns.dates()[index],
        }),
        None => Ok(()),
    }
}

/// Intermediate series and labels of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RegimeRun {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    pub returns: Vec<f64>,
    pub ma_short: Vec<f64>,
    pub ma_long: Vec<f64>,
    pub vol_short: Vec<f64>,
    /// Mean of the long-window volatility; NaN when none is defined.
    pub avg_vol_threshold: f64,
    pub labels: RegimeLabelSeries,
}

/// Regime pipeline over complete price and return series.
#[derive(Debug, Clone)]
pub struct RegimePipeline {
    params: WindowParameters,
    estimator: VolatilityEstimator,
}

impl RegimePipeline {
    /// Create a pipeline, rejecting invalid windows.
    pub fn new(params: WindowParameters) -> Result<Self, RegimeError> {
        params.validate()?;
        Ok(Self {
            params,
            estimator: VolatilityEstimator::default(),
        })
    }

    /// Set the volatility estimator.
    pub fn with_estimator(mut self, estimator: VolatilityEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn params(&self) -> &WindowParameters {
        &self.params
    }

    pub fn estimator(&self) -> VolatilityEstimator {
        self.estimator
    }

    /// Label every bar.
    pub fn run(
        &self,
        prices: &PriceSeries,
        returns: &ReturnSeries,
    ) -> Result<RegimeLabelSeries, RegimeError> {
        Ok(self.run_detailed(prices, returns)?.labels)
    }

    /// Label every bar, keeping the intermediate series.
    pub fn run_detailed(
        &self,
        prices: &PriceSeries,
        returns: &ReturnSeries,
    ) -> Result<RegimeRun, RegimeError> {
        if prices.is_empty() {
            return Err(RegimeError::InsufficientData(format!(
                "price series for {} is empty",
                prices.ticker()
            )));
        }
        check_aligned(prices, returns)?;

        let p = prices.prices();
        let r = returns.values();

        let ma_short = rolling_mean(p, self.params.ma_short_window);
        let ma_long = rolling_mean(p, self.params.ma_long_window);
        let vol_short = annualized_volatility(r, self.params.vol_short_window, self.estimator);
        let avg_vol_threshold = nan_mean(&annualized_volatility(
            r,
            self.params.avg_vol_window,
            self.estimator,
        ));

        if avg_vol_threshold.is_nan() {
            warn!(
                ticker = prices.ticker(),
                bars = p.len(),
                avg_vol_window = self.params.avg_vol_window,
                "No defined long-window volatility; all bars bucketed below average"
            );
        }

        let classifier = RegimeClassifier::new(avg_vol_threshold);
        let labels = classifier.classify_series(p, &ma_short, &ma_long, &vol_short);

        debug!(
            ticker = prices.ticker(),
            bars = p.len(),
            avg_vol_threshold,
            "Regime pipeline complete"
        );

        Ok(RegimeRun {
            ticker: prices.ticker().to_string(),
            dates: prices.dates().to_vec(),
            prices: p.to_vec(),
            returns: r.to_vec(),
            ma_short,
            ma_long,
            vol_short,
            avg_vol_threshold,
            labels: RegimeLabelSeries::new(prices.dates().to_vec(), labels),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::RegimeLabel;
    use chrono::Duration;

    fn series(prices: Vec<f64>) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..prices.len() as i64).map(|i| start + Duration::days(i)).collect();
        PriceSeries::new("TEST", dates, prices).unwrap()
    }

    fn rising_ramp(n: usize) -> PriceSeries {
        series(
            (0..n)
                .map(|i| 100.0 + i as f64 + 0.25 * (i as f64).sin())
                .collect(),
        )
    }

    #[test]
    fn test_default_windows() {
        let params = WindowParameters::default();
        assert_eq!(params.ma_short_window, 21);
        assert_eq!(params.ma_long_window, 88);
        assert_eq!(params.vol_short_window, 21);
        assert_eq!(params.avg_vol_window, 365);
        assert_eq!(params.max_window(), 365);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_windows() {
        let zero = WindowParameters {
            vol_short_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            RegimePipeline::new(zero),
            Err(RegimeError::InvalidWindowParameters(_))
        ));

        let inverted = WindowParameters {
            ma_short_window: 88,
            ma_long_window: 21,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(RegimeError::InvalidWindowParameters(_))
        ));

        let equal = WindowParameters {
            ma_short_window: 30,
            ma_long_window: 30,
            ..Default::default()
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn test_rising_series_warms_up_then_bull() {
        let prices = rising_ramp(400);
        let returns = prices.returns();
        let pipeline = RegimePipeline::new(WindowParameters::default()).unwrap();
        let labels = pipeline.run(&prices, &returns).unwrap();

        assert_eq!(labels.len(), 400);
        for (i, label) in labels.labels().iter().enumerate() {
            if i < 87 {
                assert_eq!(*label, RegimeLabel::Unknown, "index {}", i);
            } else {
                assert!(
                    matches!(
                        label,
                        RegimeLabel::AboveAvgVolBullTrend | RegimeLabel::BelowAvgVolBullTrend
                    ),
                    "index {} got {:?}",
                    i,
                    label
                );
            }
        }
    }

    #[test]
    fn test_run_is_idempotent() {
        let prices = rising_ramp(200);
        let returns = prices.returns();
        let params = WindowParameters {
            ma_short_window: 5,
            ma_long_window: 20,
            vol_short_window: 5,
            avg_vol_window: 30,
        };
        let pipeline = RegimePipeline::new(params).unwrap();

        let first = pipeline.run(&prices, &returns).unwrap();
        let second = pipeline.run(&prices, &returns).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        let pipeline = RegimePipeline::new(WindowParameters::default()).unwrap();
        let prices = PriceSeries::empty("EMPTY");
        let err = pipeline.run(&prices, &ReturnSeries::empty()).unwrap_err();
        assert!(matches!(err, RegimeError::InsufficientData(_)));
    }

    #[test]
    fn test_length_mismatch() {
        let pipeline = RegimePipeline::new(WindowParameters::default()).unwrap();
        let prices = rising_ramp(10);
        let short = rising_ramp(9).returns();
        assert_eq!(
            pipeline.run(&prices, &short).unwrap_err(),
            RegimeError::LengthMismatch {
                prices: 10,
                returns: 9
            }
        );
    }

    #[test]
    fn test_shifted_returns_are_rejected() {
        let pipeline = RegimePipeline::new(WindowParameters::default()).unwrap();
        let prices = rising_ramp(10);
        let shifted = ReturnSeries::new(
            prices.dates().iter().map(|d| *d + Duration::days(1000)).collect(),
            prices.returns().values().to_vec(),
        )
        .unwrap();

        match pipeline.run(&prices, &shifted).unwrap_err() {
            RegimeError::Misaligned {
                index,
                price_date,
                return_date,
            } => {
                assert_eq!(index, 0);
                assert_eq!(price_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
                assert_eq!(return_date, price_date + Duration::days(1000));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_short_series_degrades_to_unknown() {
        let pipeline = RegimePipeline::new(WindowParameters::default()).unwrap();
        let prices = rising_ramp(50);
        let run = pipeline.run_detailed(&prices, &prices.returns()).unwrap();

        assert!(run.avg_vol_threshold.is_nan());
        assert!(run.labels.labels().iter().all(|l| *l == RegimeLabel::Unknown));
    }

    #[test]
    fn test_flat_series_is_sideways() {
        let params = WindowParameters {
            ma_short_window: 3,
            ma_long_window: 5,
            vol_short_window: 3,
            avg_vol_window: 5,
        };
        let pipeline = RegimePipeline::new(params).unwrap();
        let prices = series(vec![50.0; 20]);
        let labels = pipeline.run(&prices, &prices.returns()).unwrap();

        // price equals both averages and volatility equals the threshold
        for label in &labels.labels()[5..] {
            assert_eq!(*label, RegimeLabel::BelowAvgVolSideways);
        }
    }

    #[test]
    fn test_threshold_is_global_mean() {
        let params = WindowParameters {
            ma_short_window: 2,
            ma_long_window: 3,
            vol_short_window: 2,
            avg_vol_window: 3,
        };
        let pipeline = RegimePipeline::new(params).unwrap();
        let prices = series(vec![10.0, 11.0, 10.0, 12.0, 11.0, 13.0]);
        let returns = prices.returns();
        let run = pipeline.run_detailed(&prices, &returns).unwrap();

        let expected = nan_mean(&annualized_volatility(
            returns.values(),
            3,
            VolatilityEstimator::Sample,
        ));
        assert_eq!(run.avg_vol_threshold.to_bits(), expected.to_bits());
        assert_eq!(run.ma_short.len(), 6);
        assert_eq!(run.vol_short.len(), 6);
    }
}
