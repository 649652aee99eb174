// Exponential Moving Average (EMA) indicator implementation
use super::{ensure_enough_rows, line_chart, symbol_of, ChartOptions, Indicator, DEFAULT_MOVING_DAYS};
use crate::analysis::stats;
use crate::error::Result;
use serde_json::Value;
use shared::models::{ChartDescriptor, PriceSeries, TimeSeries};

/// Non-adjusted EWMA of Close with span `moving_days`:
/// `alpha = 2 / (moving_days + 1)`, seeded with the first close,
/// `ema[t] = alpha * close[t] + (1 - alpha) * ema[t - 1]`.
/// The first `moving_days - 1` outputs are NaN.
pub struct ExponentialMovingAverage<'a> {
    data: &'a PriceSeries,
    name: String,
    moving_days: usize,
}

impl<'a> ExponentialMovingAverage<'a> {
    pub fn new(data: &'a PriceSeries, moving_days: usize) -> Self {
        Self {
            name: format!("{}_EMA({})", symbol_of(data), moving_days),
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

impl<'a> Indicator for ExponentialMovingAverage<'a> {
    type Output = TimeSeries;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "moving_days": self.moving_days })
    }

    fn result(&self) -> Result<TimeSeries> {
        ensure_enough_rows(&self.name, self.data, self.moving_days)?;
        let values = stats::ewm_mean(&self.data.closes(), self.moving_days, self.moving_days);
        Ok(TimeSeries::new(self.data.dates(), values))
    }

    fn plot(&self, options: ChartOptions) -> Result<ChartDescriptor> {
        Ok(line_chart(&self.name, self.result()?, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stats::assert_f64_vec_eq;
    use crate::error::EngineError;
    use crate::indicators::test_support::{rising, series};

    #[test]
    fn test_ema_calculation() {
        let data = series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let ema = ExponentialMovingAverage::new(&data, 3); // alpha = 0.5
        let results = ema.result().unwrap();
        // Expected:
        // running: 10.0, 10.5, 11.25, 12.125, 13.0625, 14.03125
        // first two hidden until three observations are in
        assert_f64_vec_eq(
            &results.values,
            &[f64::NAN, f64::NAN, 11.25, 12.125, 13.0625, 14.03125],
        );
    }

    #[test]
    fn test_ema_insufficient_data() {
        let data = rising(41);
        let result = ExponentialMovingAverage::with_default_window(&data).result();
        assert!(matches!(
            result,
            Err(EngineError::InsufficientData { required: 42, available: 41, .. })
        ));
    }

    #[test]
    fn test_ema_tracks_constant_series() {
        let data = series(&[7.0; 8]);
        let results = ExponentialMovingAverage::new(&data, 4).result().unwrap();
        assert!(results.values[..3].iter().all(|v| v.is_nan()));
        assert!(results.values[3..].iter().all(|v| (*v - 7.0).abs() < 1e-12));
    }

    #[test]
    fn test_ema_plot_recomputes_result() {
        let data = rising(10);
        let ema = ExponentialMovingAverage::new(&data, 5);
        let chart = ema.plot(ChartOptions::new()).unwrap();
        assert_eq!(chart.name, "VNM_EMA(5)");
        let again = ema.plot(ChartOptions::new()).unwrap();
        assert_eq!(format!("{:?}", chart.data), format!("{:?}", again.data));
    }
}
