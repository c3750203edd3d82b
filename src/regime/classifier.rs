//! Market regime classifier.
//!
//! Combines price position against two moving averages with short-window
//! volatility against a global threshold.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trend direction of a classified bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    /// Price strictly above both moving averages.
    Bull,
    /// Anything that is neither bull nor bear, including ties.
    Sideways,
    /// Price strictly below both moving averages.
    Bear,
}

/// Market regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegimeLabel {
    /// Warm-up or missing statistics.
    Unknown,
    AboveAvgVolBullTrend,
    BelowAvgVolBullTrend,
    AboveAvgVolSideways,
    BelowAvgVolSideways,
    AboveAvgVolBearTrend,
    BelowAvgVolBearTrend,
}

impl RegimeLabel {
    /// Every label, `Unknown` first, then in display-code order.
    pub const ALL: [RegimeLabel; 7] = [
        Self::Unknown,
        Self::AboveAvgVolBullTrend,
        Self::BelowAvgVolBullTrend,
        Self::AboveAvgVolSideways,
        Self::BelowAvgVolSideways,
        Self::AboveAvgVolBearTrend,
        Self::BelowAvgVolBearTrend,
    ];

    fn from_parts(trend: Trend, above_avg_vol: bool) -> Self {
        match (trend, above_avg_vol) {
            (Trend::Bull, true) => Self::AboveAvgVolBullTrend,
            (Trend::Bull, false) => Self::BelowAvgVolBullTrend,
            (Trend::Sideways, true) => Self::AboveAvgVolSideways,
            (Trend::Sideways, false) => Self::BelowAvgVolSideways,
            (Trend::Bear, true) => Self::AboveAvgVolBearTrend,
            (Trend::Bear, false) => Self::BelowAvgVolBearTrend,
        }
    }

    /// Integer code used by the legacy display table.
    pub fn code(&self) -> i32 {
        match self {
            Self::Unknown => -1,
            Self::AboveAvgVolBullTrend => 1,
            Self::BelowAvgVolBullTrend => 2,
            Self::AboveAvgVolSideways => 3,
            Self::BelowAvgVolSideways => 4,
            Self::AboveAvgVolBearTrend => 5,
            Self::BelowAvgVolBearTrend => 6,
        }
    }

    /// Label for an integer code, `None` if no label uses it.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.code() == code)
    }

    /// Description of the regime.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::AboveAvgVolBullTrend => "Above Avg Vol Bull Trend",
            Self::BelowAvgVolBullTrend => "Below Avg Vol Bull Trend",
            Self::AboveAvgVolSideways => "Above Avg Vol Sideways",
            Self::BelowAvgVolSideways => "Below Avg Vol Sideways",
            Self::AboveAvgVolBearTrend => "Above Avg Vol Bear Trend",
            Self::BelowAvgVolBearTrend => "Below Avg Vol Bear Trend",
        }
    }

    /// Trend component, `None` for `Unknown`.
    pub fn trend(&self) -> Option<Trend> {
        match self {
            Self::Unknown => None,
            Self::AboveAvgVolBullTrend | Self::BelowAvgVolBullTrend => Some(Trend::Bull),
            Self::AboveAvgVolSideways | Self::BelowAvgVolSideways => Some(Trend::Sideways),
            Self::AboveAvgVolBearTrend | Self::BelowAvgVolBearTrend => Some(Trend::Bear),
        }
    }

    /// True for the three above-average-volatility labels.
    pub fn is_above_avg_vol(&self) -> bool {
        matches!(
            self,
            Self::AboveAvgVolBullTrend | Self::AboveAvgVolSideways | Self::AboveAvgVolBearTrend
        )
    }

    /// False only for `Unknown`.
    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Classify one bar.
///
/// Inequalities are strict: a price equal to either average is sideways.
/// A NaN threshold compares false, so every defined bar is then "below".
pub fn classify(
    price: f64,
    ma_short: f64,
    ma_long: f64,
    vol_short: f64,
    avg_vol_threshold: f64,
) -> RegimeLabel {
    if ma_short.is_nan() || ma_long.is_nan() || vol_short.is_nan() {
        return RegimeLabel::Unknown;
    }

    let trend = if price > ma_short && price > ma_long {
        Trend::Bull
    } else if price < ma_short && price < ma_long {
        Trend::Bear
    } else {
        Trend::Sideways
    };

    RegimeLabel::from_parts(trend, vol_short > avg_vol_threshold)
}

/// Per-bar classifier bound to one run's volatility threshold.
#[derive(Debug, Clone, Copy)]
pub struct RegimeClassifier {
    avg_vol_threshold: f64,
}

impl RegimeClassifier {
    pub fn new(avg_vol_threshold: f64) -> Self {
        Self { avg_vol_threshold }
    }

    pub fn avg_vol_threshold(&self) -> f64 {
        self.avg_vol_threshold
    }

    pub fn classify(&self, price: f64, ma_short: f64, ma_long: f64, vol_short: f64) -> RegimeLabel {
        classify(price, ma_short, ma_long, vol_short, self.avg_vol_threshold)
    }

    /// Classify aligned slices element-wise.
    ///
    /// Slices must share one length; the shortest bounds the output.
    pub fn classify_series(
        &self,
        prices: &[f64],
        ma_short: &[f64],
        ma_long: &[f64],
        vol_short: &[f64],
    ) -> Vec<RegimeLabel> {
        prices
            .iter()
            .zip(ma_short)
            .zip(ma_long)
            .zip(vol_short)
            .map(|(((&p, &s), &l), &v)| self.classify(p, s, l, v))
            .collect()
    }
}

/// One label per input bar, aligned by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeLabelSeries {
    dates: Vec<NaiveDate>,
    labels: Vec<RegimeLabel>,
}

impl RegimeLabelSeries {
    pub(crate) fn new(dates: Vec<NaiveDate>, labels: Vec<RegimeLabel>) -> Self {
        debug_assert_eq!(dates.len(), labels.len());
        Self { dates, labels }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn labels(&self) -> &[RegimeLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<RegimeLabel> {
        self.labels.get(index).copied()
    }

    pub fn last(&self) -> Option<RegimeLabel> {
        self.labels.last().copied()
    }

    /// Display codes, one per bar.
    pub fn codes(&self) -> Vec<i32> {
        self.labels.iter().map(RegimeLabel::code).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, RegimeLabel)> + '_ {
        self.dates.iter().copied().zip(self.labels.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for label in RegimeLabel::ALL {
            assert_eq!(RegimeLabel::from_code(label.code()), Some(label));
        }
        assert_eq!(RegimeLabel::from_code(0), None);
        assert_eq!(RegimeLabel::from_code(7), None);
        assert_eq!(RegimeLabel::Unknown.code(), -1);
    }

    #[test]
    fn test_undefined_inputs_are_unknown() {
        assert_eq!(classify(10.0, f64::NAN, 9.0, 0.5, 0.4), RegimeLabel::Unknown);
        assert_eq!(classify(10.0, 9.0, f64::NAN, 0.5, 0.4), RegimeLabel::Unknown);
        assert_eq!(classify(10.0, 9.0, 8.0, f64::NAN, 0.4), RegimeLabel::Unknown);
    }

    #[test]
    fn test_bull_bear_sideways() {
        assert_eq!(classify(10.0, 9.0, 8.0, 0.5, 0.4), RegimeLabel::AboveAvgVolBullTrend);
        assert_eq!(classify(10.0, 9.0, 8.0, 0.3, 0.4), RegimeLabel::BelowAvgVolBullTrend);
        assert_eq!(classify(7.0, 9.0, 8.0, 0.5, 0.4), RegimeLabel::AboveAvgVolBearTrend);
        assert_eq!(classify(7.0, 9.0, 8.0, 0.3, 0.4), RegimeLabel::BelowAvgVolBearTrend);
        assert_eq!(classify(8.5, 9.0, 8.0, 0.5, 0.4), RegimeLabel::AboveAvgVolSideways);
        assert_eq!(classify(8.5, 8.0, 9.0, 0.3, 0.4), RegimeLabel::BelowAvgVolSideways);
    }

    #[test]
    fn test_ties_fall_into_sideways() {
        let label = classify(10.0, 10.0, 10.0, 0.5, 0.4);
        assert_eq!(label, RegimeLabel::AboveAvgVolSideways);

        let label = classify(10.0, 10.0, 9.0, 0.3, 0.4);
        assert_eq!(label.trend(), Some(Trend::Sideways));

        // vol equal to threshold is not above it
        assert_eq!(classify(10.0, 9.0, 8.0, 0.4, 0.4), RegimeLabel::BelowAvgVolBullTrend);
    }

    #[test]
    fn test_nan_threshold_buckets_below() {
        assert_eq!(classify(10.0, 9.0, 8.0, 0.5, f64::NAN), RegimeLabel::BelowAvgVolBullTrend);
    }

    #[test]
    fn test_trend_partition_is_exclusive() {
        let grid = [7.0, 8.0, 8.5, 9.0, 10.0];
        for &price in &grid {
            for &short in &grid {
                for &long in &grid {
                    let bull = price > short && price > long;
                    let bear = price < short && price < long;
                    let label = classify(price, short, long, 0.5, 0.4);
                    let expected = match (bull, bear) {
                        (true, false) => Trend::Bull,
                        (false, true) => Trend::Bear,
                        _ => Trend::Sideways,
                    };
                    assert_eq!(label.trend(), Some(expected));
                    assert_eq!(label, classify(price, short, long, 0.5, 0.4));
                }
            }
        }
    }

    #[test]
    fn test_classify_series_matches_scalar() {
        let classifier = RegimeClassifier::new(0.4);
        let labels = classifier.classify_series(
            &[10.0, 7.0, 8.5],
            &[9.0, 9.0, f64::NAN],
            &[8.0, 8.0, 8.0],
            &[0.5, 0.3, 0.5],
        );
        assert_eq!(
            labels,
            vec![
                RegimeLabel::AboveAvgVolBullTrend,
                RegimeLabel::BelowAvgVolBearTrend,
                RegimeLabel::Unknown,
            ]
        );
    }

    #[test]
    fn test_display_uses_description() {
        assert_eq!(
            RegimeLabel::BelowAvgVolSideways.to_string(),
            "Below Avg Vol Sideways"
        );
        assert!(RegimeLabel::AboveAvgVolBearTrend.is_above_avg_vol());
        assert!(!RegimeLabel::Unknown.is_known());
    }
}
