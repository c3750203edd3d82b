pub mod loader;
pub mod types;
pub mod writer;

pub use loader::{FileFormat, LoaderError, PriceLoader};
pub use types::{PriceBar, PriceSeries, ReturnSeries, SeriesError};
pub use writer::{regime_frame, write_regimes};
