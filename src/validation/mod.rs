//! Validation module for price history.
//!
//! Integrity checks run before classification so that calendar gaps, stale
//! quotes and bad ticks are visible instead of silently shaping the regimes.

pub mod integrity;

pub use integrity::{CheckResult, IntegrityConfig, IntegrityReport, SeriesValidator};
