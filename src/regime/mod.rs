//! Market regime classification module.
//!
//! Labels each bar by trend and volatility:
//! - Bull: price above both moving averages
//! - Bear: price below both moving averages
//! - Sideways: anything else
//!
//! Each trend is split by whether short-window volatility is above the
//! series-wide average volatility.

pub mod batch;
pub mod classifier;
pub mod forecast;
pub mod pipeline;
pub mod stats;

pub use batch::{run_batch, AssetRegimes};
pub use classifier::{classify, RegimeClassifier, RegimeLabel, RegimeLabelSeries, Trend};
pub use forecast::{Forecast, ForecastExtender};
pub use pipeline::{RegimeError, RegimePipeline, RegimeRun, WindowParameters};
pub use stats::{RegimeStat, RegimeSummary};
