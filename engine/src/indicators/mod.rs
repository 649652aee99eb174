// Technical indicators module
pub mod candlestick;
pub mod ema;
pub mod macd;
pub mod sma;

pub use candlestick::Candlestick;
pub use ema::ExponentialMovingAverage;
pub use macd::Macd;
pub use sma::MovingAverage;

use serde_json::Value;
use shared::models::{ChartData, ChartDescriptor, PriceSeries, TimeSeries};

use crate::error::{EngineError, Result};

/// Default window for the moving averages.
pub const DEFAULT_MOVING_DAYS: usize = 21;

/// Style options forwarded untouched to the chart renderer.
pub type ChartOptions = serde_json::Map<String, Value>;

// Common trait for all indicators. `result` is recomputed on every call, and
// `plot` calls `result` again.
pub trait Indicator: Send + Sync {
    type Output;

    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    fn result(&self) -> Result<Self::Output>;
    fn plot(&self, options: ChartOptions) -> Result<ChartDescriptor>;
}

/// Rejects series shorter than two full windows.
pub(crate) fn ensure_enough_rows(indicator: &str, data: &PriceSeries, moving_days: usize) -> Result<()> {
    if moving_days == 0 {
        return Err(EngineError::InvalidPeriod(indicator.to_string()));
    }
    let required = 2 * moving_days;
    if data.len() < required {
        tracing::warn!(indicator, required, available = data.len(), "Data too short for indicator");
        return Err(EngineError::InsufficientData {
            indicator: indicator.to_string(),
            required,
            available: data.len(),
        });
    }
    Ok(())
}

pub(crate) fn line_chart(name: &str, series: TimeSeries, options: ChartOptions) -> ChartDescriptor {
    ChartDescriptor {
        name: name.to_string(),
        x: series.dates,
        data: ChartData::Scatter { y: series.values },
        options,
    }
}

pub(crate) fn symbol_of(data: &PriceSeries) -> &str {
    data.symbol().unwrap_or_default()
}
