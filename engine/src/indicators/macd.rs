// Moving Average Convergence Divergence
use super::{line_chart, symbol_of, ChartOptions, ExponentialMovingAverage, Indicator};
use crate::analysis::stats;
use crate::error::Result;
use serde_json::Value;
use shared::models::{ChartDescriptor, PriceSeries, TimeSeries};

pub const DEFAULT_LOW: usize = 12;
pub const DEFAULT_HIGH: usize = 24;

/// `EMA(low) - EMA(high)`, optionally smoothed by a non-adjusted EWMA of span
/// `exp` (no smoothing when `exp == 0`). Needs `2 * max(low, high)` rows.
pub struct Macd<'a> {
    data: &'a PriceSeries,
    name: String,
    low: usize,
    high: usize,
    exp: usize,
}

impl<'a> Macd<'a> {
    pub fn new(data: &'a PriceSeries, low: usize, high: usize, exp: usize) -> Self {
        Self {
            name: format!("{}_MACD({})", symbol_of(data), exp),
            data,
            low,
            high,
            exp,
        }
    }

    pub fn with_defaults(data: &'a PriceSeries) -> Self {
        Self::new(data, DEFAULT_LOW, DEFAULT_HIGH, 0)
    }
}

impl<'a> Indicator for Macd<'a> {
    type Output = TimeSeries;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "low": self.low, "high": self.high, "exp": self.exp })
    }

    fn result(&self) -> Result<TimeSeries> {
        let fast = ExponentialMovingAverage::new(self.data, self.low).result()?;
        let slow = ExponentialMovingAverage::new(self.data, self.high).result()?;

        let macd: Vec<f64> = fast
            .values
            .iter()
            .zip(&slow.values)
            .map(|(f, s)| f - s)
            .collect();

        let values = if self.exp == 0 {
            macd
        } else {
            stats::ewm_mean(&macd, self.exp, 0)
        };
        Ok(TimeSeries::new(fast.dates, values))
    }

    fn plot(&self, options: ChartOptions) -> Result<ChartDescriptor> {
        Ok(line_chart(&self.name, self.result()?, options))
    }
}
