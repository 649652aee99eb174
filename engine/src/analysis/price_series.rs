// Single-symbol metrics over one price table.
use chrono::{Datelike, Months, NaiveDate};
use shared::models::{Column, PriceBar, PriceSeries, TimeSeries};
use std::collections::{BTreeMap, HashMap};

use super::stats;
use crate::error::{EngineError, Result};

/// Trading days in a year, the default look-back for volatility metrics.
pub const TRADING_DAYS: usize = 252;

/// Market regime threshold on the trailing two-month return.
const MARKET_REGIME_THRESHOLD: f64 = 0.2;
const MARKET_REGIME_MONTHS: u32 = 2;

/// Computes return, risk and support/resistance metrics for one symbol.
///
/// Borrows the table it was built from and never mutates it. Every metric is
/// recomputed on each call.
#[derive(Debug, Clone, Copy)]
pub struct PriceSeriesAnalyzer<'a> {
    data: &'a PriceSeries,
}

impl<'a> PriceSeriesAnalyzer<'a> {
    pub fn new(data: &'a PriceSeries) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &'a PriceSeries {
        self.data
    }

    fn max_periods(&self) -> usize {
        self.data.len()
    }

    pub fn close(&self) -> TimeSeries {
        TimeSeries::new(self.data.dates(), self.data.closes())
    }

    /// Day-over-day percent change of Close; the first value is NaN.
    pub fn close_pct_change(&self) -> TimeSeries {
        TimeSeries::new(self.data.dates(), stats::pct_change(&self.data.closes()))
    }

    pub fn last_close(&self) -> f64 {
        self.data.last().map_or(f64::NAN, |b| b.close)
    }

    pub fn last_high(&self) -> f64 {
        self.data.last().map_or(f64::NAN, |b| b.high)
    }

    pub fn last_low(&self) -> f64 {
        self.data.last().map_or(f64::NAN, |b| b.low)
    }

    pub fn pivot_point(&self) -> f64 {
        (self.last_close() + self.last_high() + self.last_low()) / 3.0
    }

    pub fn resistance(&self, level: u8) -> Result<f64> {
        let pivot = self.pivot_point();
        let (high, low) = (self.last_high(), self.last_low());
        match level {
            1 => Ok(2.0 * pivot - low),
            2 => Ok(pivot + (high - low)),
            3 => Ok(high + 2.0 * (pivot - low)),
            _ => Err(EngineError::InvalidLevel(level)),
        }
    }

    pub fn support(&self, level: u8) -> Result<f64> {
        let pivot = self.pivot_point();
        let (high, low) = (self.last_high(), self.last_low());
        match level {
            1 => Ok(2.0 * pivot - high),
            2 => Ok(pivot - (high - low)),
            3 => Ok(low - 2.0 * (high - pivot)),
            _ => Err(EngineError::InvalidLevel(level)),
        }
    }

    /// `(last_close - first_close) / first_close` by position. NaN when empty.
    pub fn port_return(bars: &[PriceBar]) -> f64 {
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => (last.close - first.close) / first.close,
            _ => f64::NAN,
        }
    }

    /// Growth of one unit: running product of `1 + daily change`.
    /// Starts at the second row since the first change is undefined.
    pub fn cumulative_returns(&self) -> TimeSeries {
        let changes = self.close_pct_change();
        let mut growth = 1.0;
        let (dates, values): (Vec<NaiveDate>, Vec<f64>) = changes
            .iter()
            .skip(1)
            .map(|(date, change)| {
                if !change.is_nan() {
                    growth *= 1.0 + change;
                }
                (date, growth)
            })
            .unzip();
        TimeSeries::new(dates, values)
    }

    /// Rows in the calendar month of the last row and the `months - 1` months before it.
    ///
    /// The cutoff is a month end: for a last row on 2024-06-14 and `months = 2`
    /// the window starts after 2024-04-30.
    fn trailing_months(&self, months: u32) -> &'a [PriceBar] {
        let data = self.data;
        match data.last() {
            Some(last) => {
                let cutoff = last
                    .date
                    .with_day(1)
                    .and_then(|first| first.checked_sub_months(Months::new(months.saturating_sub(1))))
                    .and_then(|first| first.pred_opt())
                    .unwrap_or(NaiveDate::MIN);
                data.after(cutoff)
            }
            None => data.bars(),
        }
    }

    pub fn is_bear_market(&self) -> bool {
        Self::port_return(self.trailing_months(MARKET_REGIME_MONTHS)) <= -MARKET_REGIME_THRESHOLD
    }

    pub fn is_bull_market(&self) -> bool {
        Self::port_return(self.trailing_months(MARKET_REGIME_MONTHS)) >= MARKET_REGIME_THRESHOLD
    }

    /// Standard deviation of the last `min(periods, rows)` daily changes.
    pub fn daily_std(&self, periods: usize) -> f64 {
        let changes = self.close_pct_change().values;
        let window = periods.min(self.max_periods());
        stats::sample_std(&changes[changes.len() - window..])
    }

    pub fn annualized_volatility(&self) -> f64 {
        self.daily_std(TRADING_DAYS) * (TRADING_DAYS as f64).sqrt()
    }

    /// Rolling standard deviation of Close over `w = min(periods, rows)` rows,
    /// scaled by `1 / sqrt(w)`. The first `w - 1` values are NaN.
    pub fn volatility(&self, periods: usize) -> TimeSeries {
        let window = periods.min(self.max_periods());
        let scale = (window as f64).sqrt();
        let values = stats::rolling_std(&self.data.closes(), window)
            .into_iter()
            .map(|v| v / scale)
            .collect();
        TimeSeries::new(self.data.dates(), values)
    }

    /// Pearson correlation of each numeric column against `other`, over the
    /// dates both tables have.
    pub fn corr_with(&self, other: &PriceSeries) -> BTreeMap<Column, f64> {
        let other_by_date: HashMap<NaiveDate, &PriceBar> =
            other.bars().iter().map(|b| (b.date, b)).collect();
        let pairs: Vec<(&PriceBar, &PriceBar)> = self
            .data
            .bars()
            .iter()
            .filter_map(|b| other_by_date.get(&b.date).map(|o| (b, *o)))
            .collect();

        Column::NUMERIC
            .iter()
            .map(|&column| {
                let (xs, ys): (Vec<f64>, Vec<f64>) = pairs
                    .iter()
                    .filter_map(|(a, b)| Some((column.numeric_value(a)?, column.numeric_value(b)?)))
                    .unzip();
                (column, stats::pearson(&xs, &ys))
            })
            .collect()
    }

    /// Coefficient of variation of Close.
    pub fn cv(&self) -> f64 {
        let closes = self.data.closes();
        stats::sample_std(&closes) / stats::mean(&closes)
    }

    /// Quartile coefficient of dispersion of Close.
    pub fn qcd(&self) -> f64 {
        let closes = self.data.closes();
        let q1 = stats::quantile(&closes, 0.25);
        let q3 = stats::quantile(&closes, 0.75);
        (q3 - q1) / (q3 + q1)
    }

    /// `cov(own change, index change) / var(index change)`, covariance taken
    /// over the dates both series share.
    pub fn beta(&self, index: &PriceSeries) -> f64 {
        let own = self.close_pct_change();
        let index_change = PriceSeriesAnalyzer::new(index).close_pct_change();

        let index_by_date: HashMap<NaiveDate, f64> = index_change.iter().collect();
        let (xs, ys): (Vec<f64>, Vec<f64>) = own
            .iter()
            .filter_map(|(date, change)| index_by_date.get(&date).map(|i| (change, *i)))
            .unzip();

        stats::covariance(&xs, &ys) / stats::sample_var(&index_change.values)
    }

    /// CAPM alpha against `index`. `risk_free_rate_percent` is a percentage:
    /// pass `5.0` for 5%.
    pub fn alpha(&self, index: &PriceSeries, risk_free_rate_percent: f64) -> f64 {
        let r_f = risk_free_rate_percent / 100.0;
        let r_m = Self::port_return(index.bars());
        let beta = self.beta(index);
        let r = Self::port_return(self.data.bars());

        r - r_f - beta * (r_m - r_f)
    }

    /// `(last cumulative return - risk_free_rate) / std(cumulative returns)`.
    /// Unlike `alpha`, the rate is used as given, not as a percentage.
    pub fn sharpe_ratio(&self, risk_free_rate: f64) -> f64 {
        let cumulative = self.cumulative_returns();
        let last = cumulative.last_value().unwrap_or(f64::NAN);
        (last - risk_free_rate) / stats::sample_std(&cumulative.values)
    }
}
