// Simple moving average of Close
use super::{ensure_enough_rows, line_chart, symbol_of, ChartOptions, Indicator, DEFAULT_MOVING_DAYS};
use crate::analysis::stats;
use crate::error::Result;
use serde_json::Value;
use shared::models::{ChartDescriptor, PriceSeries, TimeSeries};

pub struct MovingAverage<'a> {
    data: &'a PriceSeries,
    name: String,
    moving_days: usize,
}

impl<'a> MovingAverage<'a> {
    pub fn new(data: &'a PriceSeries, moving_days: usize) -> Self {
        Self {
            name: format!("{}_MA({})", symbol_of(data), moving_days),
            data,
            moving_days,
        }
    }

    pub fn with_default_window(data: &'a PriceSeries) -> Self {
        Self::new(data, DEFAULT_MOVING_DAYS)
    }

    pub fn moving_days(&self) -> usize {
        self.moving_days
    }
}

impl<'a> Indicator for MovingAverage<'a> {
    type Output = TimeSeries;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "moving_days": self.moving_days })
    }

    /// Rolling mean over `moving_days`; the first `moving_days - 1` values are NaN.
    /// Requires at least two full windows of data.
    fn result(&self) -> Result<TimeSeries> {
        ensure_enough_rows(&self.name, self.data, self.moving_days)?;
        let values = stats::rolling_mean(&self.data.closes(), self.moving_days);
        Ok(TimeSeries::new(self.data.dates(), values))
    }

    fn plot(&self, options: ChartOptions) -> Result<ChartDescriptor> {
        Ok(line_chart(&self.name, self.result()?, options))
    }
}
