//! Independent regime runs over many assets.
//!
//! Each asset is its own pipeline run with no shared state, so runs fan out
//! over the rayon pool and are joined in input order.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::PriceSeries;

use super::pipeline::{RegimeError, RegimePipeline, RegimeRun};
use super::stats::RegimeSummary;

/// Outcome of one asset's run.
#[derive(Debug)]
pub struct AssetRegimes {
    pub ticker: String,
    pub outcome: Result<(RegimeRun, RegimeSummary), RegimeError>,
}

impl AssetRegimes {
    pub fn summary(&self) -> Option<&RegimeSummary> {
        self.outcome.as_ref().ok().map(|(_, summary)| summary)
    }
}

/// Run the pipeline over every asset in parallel.
pub fn run_batch(pipeline: &RegimePipeline, assets: &[PriceSeries]) -> Vec<AssetRegimes> {
    info!("Classifying {} assets", assets.len());

    assets
        .par_iter()
        .map(|prices| {
            let returns = prices.returns();
            let outcome = pipeline.run_detailed(prices, &returns).map(|run| {
                let summary = RegimeSummary::from_run(&run);
                (run, summary)
            });

            match &outcome {
                Ok((_, summary)) => info!(
                    ticker = prices.ticker(),
                    current = %summary.current,
                    "Classified {} bars",
                    summary.total_days
                ),
                Err(e) => warn!(ticker = prices.ticker(), "Regime run failed: {}", e),
            }

            AssetRegimes {
                ticker: prices.ticker().to_string(),
                outcome,
            }
        })
        .collect()
}
