// Analysis settings, loaded from a JSON file or taken from defaults
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::analysis::price_series::TRADING_DAYS;
use crate::analysis::OperationArgs;
use crate::data::date_range::{DateRangeResolver, DEFAULT_DAYS_FROM_NOW};
use crate::error::{EngineError, Result};
use crate::indicators::macd::{DEFAULT_HIGH, DEFAULT_LOW};
use crate::indicators::DEFAULT_MOVING_DAYS;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Window used when no date input is given at all.
    pub default_days_from_now: u32,
    /// Default look-back for `daily_std`/`volatility`.
    pub trading_days: usize,
    /// Default risk-free rate handed to `alpha`/`sharpe_ratio`.
    pub risk_free_rate: f64,
    pub moving_days: usize,
    pub macd_low: usize,
    pub macd_high: usize,
    pub macd_exp: usize,
    pub csv_delimiter: String, // Should be char, but JSON string is easier
    pub date_format: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            default_days_from_now: DEFAULT_DAYS_FROM_NOW,
            trading_days: TRADING_DAYS,
            risk_free_rate: 0.0,
            moving_days: DEFAULT_MOVING_DAYS,
            macd_low: DEFAULT_LOW,
            macd_high: DEFAULT_HIGH,
            macd_exp: 0,
            csv_delimiter: ",".to_string(),
            date_format: shared::utils::DATE_FORMAT.to_string(),
        }
    }
}

impl AnalysisSettings {
    /// Reads settings from a JSON file; absent keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("Failed to read settings '{}': {}", path.display(), e))
        })?;
        let settings: AnalysisSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        tracing::info!(path = %path.display(), "Loaded analysis settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.csv_delimiter.len() != 1 {
            return Err(EngineError::ConfigError(format!(
                "csv_delimiter must be a single byte, got '{}'",
                self.csv_delimiter
            )));
        }
        if self.trading_days == 0 {
            return Err(EngineError::ConfigError("trading_days must be positive".to_string()));
        }
        if self.macd_low >= self.macd_high {
            return Err(EngineError::ConfigError(format!(
                "macd_low ({}) must be below macd_high ({})",
                self.macd_low, self.macd_high
            )));
        }
        Ok(())
    }

    pub fn delimiter(&self) -> u8 {
        self.csv_delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    pub fn date_range_resolver(&self) -> DateRangeResolver {
        DateRangeResolver::new(self.default_days_from_now)
    }

    /// Operation arguments pre-filled with the configured defaults.
    pub fn operation_args<'a>(&self) -> OperationArgs<'a> {
        OperationArgs::new()
            .with_periods(self.trading_days)
            .with_risk_free_rate(self.risk_free_rate)
    }
}
