//! Integrity checks for daily price series.
//!
//! Validates:
//! - Length (enough bars to leave the warm-up period)
//! - Calendar gaps (windows count bars, not days)
//! - Flat runs (stale quotes repeating one price)
//! - Return outliers (single-day moves beyond a limit)

use serde::{Deserialize, Serialize};

use crate::data::PriceSeries;
use crate::regime::WindowParameters;

/// Result of a single validation check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Integrity report for one series.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub ticker: String,
    pub bars: usize,
    pub checks: Vec<CheckResult>,
}

impl IntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        format!(
            "{} ({} bars): {}/{} checks passed",
            self.ticker,
            self.bars,
            passed,
            self.checks.len()
        )
    }
}

/// Thresholds for the integrity checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// Largest allowed distance between consecutive dates, in days.
    pub max_gap_days: i64,
    /// Longest allowed run of bars sharing one close.
    pub max_flat_run: usize,
    /// Largest allowed absolute single-day return.
    pub max_abs_return: f64,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            max_gap_days: 4,
            max_flat_run: 5,
            max_abs_return: 0.5,
        }
    }
}

/// Validator for price series integrity.
pub struct SeriesValidator {
    windows: WindowParameters,
    config: IntegrityConfig,
}

impl SeriesValidator {
    pub fn new(windows: WindowParameters) -> Self {
        Self {
            windows,
            config: IntegrityConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IntegrityConfig) -> Self {
        self.config = config;
        self
    }

    /// Run all checks.
    pub fn validate(&self, series: &PriceSeries) -> IntegrityReport {
        IntegrityReport {
            ticker: series.ticker().to_string(),
            bars: series.len(),
            checks: vec![
                self.check_length(series),
                self.check_calendar_gaps(series),
                self.check_flat_runs(series),
                self.check_return_outliers(series),
            ],
        }
    }

    fn check_length(&self, series: &PriceSeries) -> CheckResult {
        let required = self.windows.max_window() + 1;
        if series.len() >= required {
            CheckResult::pass(
                "length",
                &format!("{} bars (>= {} required)", series.len(), required),
            )
        } else {
            CheckResult::fail(
                "length",
                &format!("{} bars, fewer than {} required", series.len(), required),
                Some("every bar stays in the warm-up period or has no volatility threshold".into()),
            )
        }
    }

    fn check_calendar_gaps(&self, series: &PriceSeries) -> CheckResult {
        let gaps: Vec<String> = series
            .dates()
            .windows(2)
            .filter(|w| (w[1] - w[0]).num_days() > self.config.max_gap_days)
            .map(|w| format!("{} -> {}", w[0], w[1]))
            .collect();

        if gaps.is_empty() {
            CheckResult::pass("calendar_gaps", "No calendar gaps")
        } else {
            CheckResult::fail(
                "calendar_gaps",
                &format!(
                    "{} gaps longer than {} days",
                    gaps.len(),
                    self.config.max_gap_days
                ),
                Some(gaps.into_iter().take(5).collect::<Vec<_>>().join(", ")),
            )
        }
    }

    fn check_flat_runs(&self, series: &PriceSeries) -> CheckResult {
        let mut longest = series.len().min(1);
        let mut current = 1usize;
        for w in series.prices().windows(2) {
            if w[0] == w[1] {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 1;
            }
        }

        if longest <= self.config.max_flat_run {
            CheckResult::pass(
                "flat_runs",
                &format!("Longest unchanged run: {} bars", longest),
            )
        } else {
            CheckResult::fail(
                "flat_runs",
                &format!(
                    "Price unchanged for {} consecutive bars (max {})",
                    longest, self.config.max_flat_run
                ),
                None,
            )
        }
    }

    fn check_return_outliers(&self, series: &PriceSeries) -> CheckResult {
        let returns = series.returns();
        let outliers: Vec<String> = series
            .dates()
            .iter()
            .zip(returns.values())
            .filter(|(_, r)| r.abs() > self.config.max_abs_return)
            .map(|(d, r)| format!("{}: {:+.1}%", d, r * 100.0))
            .collect();

        if outliers.is_empty() {
            CheckResult::pass("return_outliers", "No extreme daily returns")
        } else {
            CheckResult::fail(
                "return_outliers",
                &format!(
                    "{} daily returns beyond {:.0}%",
                    outliers.len(),
                    self.config.max_abs_return * 100.0
                ),
                Some(outliers.into_iter().take(5).collect::<Vec<_>>().join(", ")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn small_windows() -> WindowParameters {
        WindowParameters {
            ma_short_window: 2,
            ma_long_window: 4,
            vol_short_window: 2,
            avg_vol_window: 8,
        }
    }

    fn series_on(offsets: &[i64], prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = offsets.iter().map(|&o| start + Duration::days(o)).collect();
        PriceSeries::new("CHK", dates, prices.to_vec()).unwrap()
    }

    #[test]
    fn test_clean_series_passes() {
        let offsets: Vec<i64> = (0..10).collect();
        let prices: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let report = SeriesValidator::new(small_windows()).validate(&series_on(&offsets, &prices));

        assert!(report.all_passed(), "{:?}", report.failed_checks());
        assert_eq!(report.summary(), "CHK (10 bars): 4/4 checks passed");
    }

    #[test]
    fn test_detects_problems() {
        let offsets = [0, 1, 2, 10, 11, 12, 13, 14];
        let prices = [100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 300.0];
        let report = SeriesValidator::new(small_windows()).validate(&series_on(&offsets, &prices));

        let failed: Vec<&str> = report.failed_checks().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            failed,
            vec!["length", "calendar_gaps", "flat_runs", "return_outliers"]
        );
        let gap = &report.checks[1];
        assert_eq!(gap.details.as_deref(), Some("2024-01-03 -> 2024-01-11"));
    }

    #[test]
    fn test_flat_run_counts_bars() {
        let offsets: Vec<i64> = (0..9).collect();
        let prices = [90.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 101.0];
        let series = series_on(&offsets, &prices);

        let strict = IntegrityConfig {
            max_flat_run: 6,
            ..Default::default()
        };
        let check = SeriesValidator::new(small_windows())
            .with_config(strict)
            .check_flat_runs(&series);
        assert!(!check.passed);
        assert_eq!(check.message, "Price unchanged for 7 consecutive bars (max 6)");

        let loose = IntegrityConfig {
            max_flat_run: 7,
            ..Default::default()
        };
        let check = SeriesValidator::new(small_windows())
            .with_config(loose)
            .check_flat_runs(&series);
        assert!(check.passed);
        assert_eq!(check.message, "Longest unchanged run: 7 bars");
    }

    #[test]
    fn test_no_repeats_is_one_bar_run() {
        let offsets: Vec<i64> = (0..4).collect();
        let series = series_on(&offsets, &[1.0, 2.0, 3.0, 4.0]);
        let tight = IntegrityConfig {
            max_flat_run: 1,
            ..Default::default()
        };
        let check = SeriesValidator::new(small_windows())
            .with_config(tight)
            .check_flat_runs(&series);
        assert!(check.passed);
    }

    #[test]
    fn test_check_result() {
        let pass = CheckResult::pass("test", "passed");
        assert!(pass.passed);

        let fail = CheckResult::fail("test", "failed", Some("details".to_string()));
        assert!(!fail.passed);
        assert_eq!(fail.details, Some("details".to_string()));
    }
}
