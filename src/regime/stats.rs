//! Regime distribution statistics over a finished run.

use serde::Serialize;

use crate::stats::nan_mean;

use super::classifier::RegimeLabel;
use super::pipeline::RegimeRun;

/// Statistics for a regime.
#[derive(Debug, Clone, Serialize)]
pub struct RegimeStat {
    pub regime: RegimeLabel,
    pub code: i32,
    pub days: usize,
    pub pct_of_total: f64,
    /// Mean daily simple return on days in this regime.
    pub avg_return: f64,
    /// Mean short-window annualized volatility on days in this regime.
    pub avg_volatility: f64,
}

/// Summary of one labelled series.
#[derive(Debug, Clone, Serialize)]
pub struct RegimeSummary {
    pub ticker: String,
    pub total_days: usize,
    /// Label changes between consecutive classified bars.
    pub transitions: usize,
    pub current: RegimeLabel,
    pub avg_vol_threshold: f64,
    /// Observed regimes in display-code order.
    pub stats: Vec<RegimeStat>,
}

impl RegimeSummary {
    pub fn from_run(run: &RegimeRun) -> Self {
        let labels = run.labels.labels();
        let total_days = labels.len();

        let stats = RegimeLabel::ALL
            .into_iter()
            .filter_map(|regime| {
                let idx: Vec<usize> = labels
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| **l == regime)
                    .map(|(i, _)| i)
                    .collect();
                if idx.is_empty() {
                    return None;
                }

                let returns: Vec<f64> = idx.iter().map(|&i| run.returns[i]).collect();
                let vols: Vec<f64> = idx.iter().map(|&i| run.vol_short[i]).collect();

                Some(RegimeStat {
                    regime,
                    code: regime.code(),
                    days: idx.len(),
                    pct_of_total: idx.len() as f64 / total_days as f64 * 100.0,
                    avg_return: nan_mean(&returns),
                    avg_volatility: nan_mean(&vols),
                })
            })
            .collect();

        let known: Vec<RegimeLabel> = labels.iter().copied().filter(RegimeLabel::is_known).collect();
        let transitions = known.windows(2).filter(|w| w[0] != w[1]).count();

        Self {
            ticker: run.ticker.clone(),
            total_days,
            transitions,
            current: run.labels.last().unwrap_or(RegimeLabel::Unknown),
            avg_vol_threshold: run.avg_vol_threshold,
            stats,
        }
    }

    pub fn get(&self, regime: RegimeLabel) -> Option<&RegimeStat> {
        self.stats.iter().find(|s| s.regime == regime)
    }

    /// Generate a summary report.
    pub fn report(&self) -> String {
        let mut out = format!(
            "{} ({} days)\n\
             Current Regime: {} ({})\n\
             Avg Vol Threshold: {:.2}%\n\
             Transitions: {}\n\n",
            self.ticker,
            self.total_days,
            self.current,
            self.current.code(),
            self.avg_vol_threshold * 100.0,
            self.transitions
        );

        for stat in &self.stats {
            out.push_str(&format!(
                "  {:>2}  {:<26} {:>6} days ({:>5.1}%)  avg ret {:>7.3}%  avg vol {:>6.1}%\n",
                stat.code,
                stat.regime.description(),
                stat.days,
                stat.pct_of_total,
                stat.avg_return * 100.0,
                stat.avg_volatility * 100.0
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PriceSeries;
    use crate::regime::{RegimePipeline, WindowParameters};
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn run_for(prices: Vec<f64>) -> RegimeRun {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let dates = (0..prices.len() as i64).map(|i| start + Duration::days(i)).collect();
        let series = PriceSeries::new("STAT", dates, prices).unwrap();
        let pipeline = RegimePipeline::new(WindowParameters {
            ma_short_window: 3,
            ma_long_window: 6,
            vol_short_window: 3,
            avg_vol_window: 6,
        })
        .unwrap();
        pipeline.run_detailed(&series, &series.returns()).unwrap()
    }

    #[test]
    fn test_stats_cover_every_day() {
        let prices: Vec<f64> = (0..60)
            .map(|i| 100.0 + 10.0 * (i as f64 / 6.0).sin())
            .collect();
        let summary = RegimeSummary::from_run(&run_for(prices));

        assert_eq!(summary.total_days, 60);
        assert_eq!(summary.stats.iter().map(|s| s.days).sum::<usize>(), 60);
        assert_relative_eq!(
            summary.stats.iter().map(|s| s.pct_of_total).sum::<f64>(),
            100.0,
            epsilon = 1e-9
        );
        // warm-up bars
        assert_eq!(summary.get(RegimeLabel::Unknown).map(|s| s.days), Some(5));
        assert!(summary.transitions > 0);
    }

    #[test]
    fn test_stats_are_in_code_order() {
        let prices: Vec<f64> = (0..80)
            .map(|i| 100.0 + 10.0 * (i as f64 / 5.0).sin())
            .collect();
        let summary = RegimeSummary::from_run(&run_for(prices));
        let codes: Vec<i32> = summary.stats.iter().map(|s| s.code).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn test_steady_trend_ends_bull() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + 2.0 * i as f64).collect();
        let summary = RegimeSummary::from_run(&run_for(prices));

        assert_eq!(summary.current.trend(), Some(crate::regime::Trend::Bull));
        assert!(summary.report().contains("STAT (40 days)"));
    }
}
