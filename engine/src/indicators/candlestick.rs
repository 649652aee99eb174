// Candlestick: the price table itself, plotted as OHLC bars.
use super::{symbol_of, ChartOptions, Indicator};
use crate::error::Result;
use serde_json::Value;
use shared::models::{ChartData, ChartDescriptor, PriceBar, PriceSeries};

pub struct Candlestick<'a> {
    data: &'a PriceSeries,
    name: String,
}

impl<'a> Candlestick<'a> {
    pub fn new(data: &'a PriceSeries) -> Self {
        Self {
            name: format!("{} Price", symbol_of(data)),
            data,
        }
    }
}

impl<'a> Indicator for Candlestick<'a> {
    type Output = &'a PriceSeries;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({})
    }

    fn result(&self) -> Result<&'a PriceSeries> {
        Ok(self.data)
    }

    fn plot(&self, options: ChartOptions) -> Result<ChartDescriptor> {
        let data = self.result()?;
        let column = |f: fn(&PriceBar) -> f64| -> Vec<f64> { data.bars().iter().map(f).collect() };
        Ok(ChartDescriptor {
            name: self.name.clone(),
            x: data.dates(),
            data: ChartData::Candlestick {
                open: column(|b| b.open),
                high: column(|b| b.high),
                low: column(|b| b.low),
                close: column(|b| b.close),
            },
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::series;

    #[test]
    fn test_result_is_input_table() {
        let data = series(&[10.0, 11.0]);
        let candles = Candlestick::new(&data);
        assert!(std::ptr::eq(candles.result().unwrap(), &data));
    }

    #[test]
    fn test_plot_describes_ohlc() {
        let data = series(&[10.0, 11.0]);
        let mut options = ChartOptions::new();
        options.insert("increasing_line_color".to_string(), "green".into());
        let chart = Candlestick::new(&data).plot(options).unwrap();

        assert_eq!(chart.name, "VNM Price");
        assert_eq!(chart.kind(), "candlestick");
        assert_eq!(chart.x, data.dates());
        assert_eq!(chart.options["increasing_line_color"], "green");
        match chart.data {
            ChartData::Candlestick { open, high, low, close } => {
                assert_eq!(open, vec![9.5, 10.5]);
                assert_eq!(high, vec![11.0, 12.0]);
                assert_eq!(low, vec![9.0, 10.0]);
                assert_eq!(close, vec![10.0, 11.0]);
            }
            other => panic!("expected candlestick data, got {:?}", other),
        }
    }
}
