//! Configuration management.
//!
//! A TOML file with every section optional:
//!
//! ```toml
//! [windows]
//! ma_short_window = 21
//! ma_long_window = 88
//! vol_short_window = 21
//! avg_vol_window = 365
//!
//! [volatility]
//! estimator = "sample"
//!
//! [data]
//! date_column = "date"
//! price_column = "close"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::PriceLoader;
use crate::regime::{RegimeError, RegimePipeline, WindowParameters};
use crate::stats::VolatilityEstimator;
use crate::validation::IntegrityConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] RegimeError),
}

/// Volatility configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    pub estimator: VolatilityEstimator,
}

/// Input column configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub date_column: String,
    pub price_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            price_column: "close".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub windows: WindowParameters,
    pub volatility: VolatilityConfig,
    pub data: DataConfig,
    pub integrity: IntegrityConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load and validate configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), RegimeError> {
        self.windows.validate()
    }

    /// Pipeline configured from this file.
    pub fn pipeline(&self) -> Result<RegimePipeline, RegimeError> {
        Ok(RegimePipeline::new(self.windows)?.with_estimator(self.volatility.estimator))
    }

    /// Loader configured from this file.
    pub fn loader(&self) -> PriceLoader {
        PriceLoader::new(&self.data.date_column, &self.data.price_column)
    }
}
