use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use crate::utils::{self, dmy_date, dmy_dates};

/// One daily OHLCV row of a price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(rename = "Date", with = "dmy_date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Currency")]
    pub currency: String,
    /// Symbol identifier, e.g. "VNM".
    pub name: String,
}

/// Columns of the validated price table contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Open,
    Close,
    Low,
    High,
    Volume,
    Currency,
    #[serde(rename = "name")]
    Name,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Open,
        Column::Close,
        Column::Low,
        Column::High,
        Column::Volume,
        Column::Currency,
        Column::Name,
    ];

    pub const NUMERIC: [Column; 5] = [
        Column::Open,
        Column::Close,
        Column::Low,
        Column::High,
        Column::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Open => "Open",
            Column::Close => "Close",
            Column::Low => "Low",
            Column::High => "High",
            Column::Volume => "Volume",
            Column::Currency => "Currency",
            Column::Name => "name",
        }
    }

    /// Value of a numeric column for one row, `None` for the string columns.
    pub fn numeric_value(&self, bar: &PriceBar) -> Option<f64> {
        match self {
            Column::Open => Some(bar.open),
            Column::Close => Some(bar.close),
            Column::Low => Some(bar.low),
            Column::High => Some(bar.high),
            Column::Volume => Some(bar.volume as f64),
            Column::Currency | Column::Name => None,
        }
    }

    /// Textual value of this column for one row, used as a grouping key.
    pub fn key_for(&self, bar: &PriceBar) -> String {
        match self {
            Column::Currency => bar.currency.clone(),
            Column::Name => bar.name.clone(),
            Column::Volume => bar.volume.to_string(),
            _ => self.numeric_value(bar).map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow!("Column '{}' not in price table", s))
    }
}

/// A date-ordered price table. Built with `new` it holds one row per date;
/// `with_repeated_dates` keeps every row for tables that mix symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Orders rows by date and drops repeated trading days, keeping the first occurrence.
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Self { bars }
    }

    /// Orders rows by date, keeping rows that share a date in their input order.
    pub fn with_repeated_dates(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Symbol of the series, taken from the first row.
    pub fn symbol(&self) -> Option<&str> {
        self.bars.first().map(|b| b.name.as_str())
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Rows dated strictly after `date`.
    pub fn after(&self, date: NaiveDate) -> &[PriceBar] {
        let start = self.bars.partition_point(|b| b.date <= date);
        &self.bars[start..]
    }

    /// Copy of the rows within `[from, to]`, both inclusive.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> PriceSeries {
        Self {
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= from && b.date <= to)
                .cloned()
                .collect(),
        }
    }
}

impl From<Vec<PriceBar>> for PriceSeries {
    fn from(bars: Vec<PriceBar>) -> Self {
        Self::new(bars)
    }
}

/// A price table mixing several symbols. Rows keep their insertion order and
/// each symbol may have its own gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPriceSeries {
    bars: Vec<PriceBar>,
}

impl GroupPriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    /// Concatenates single-symbol tables into one group table.
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = PriceSeries>,
    {
        Self {
            bars: series.into_iter().flat_map(|s| s.bars).collect(),
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Distinct symbol names in first-seen order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = Vec::new();
        for bar in &self.bars {
            if !symbols.contains(&bar.name.as_str()) {
                symbols.push(&bar.name);
            }
        }
        symbols
    }

    /// Rows of one symbol as a standalone series.
    pub fn series_for(&self, symbol: &str) -> PriceSeries {
        PriceSeries::new(
            self.bars
                .iter()
                .filter(|b| b.name == symbol)
                .cloned()
                .collect(),
        )
    }

    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> GroupPriceSeries {
        Self {
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= from && b.date <= to)
                .cloned()
                .collect(),
        }
    }
}

impl From<PriceSeries> for GroupPriceSeries {
    fn from(series: PriceSeries) -> Self {
        Self { bars: series.bars }
    }
}

/// A derived, date-indexed numeric column. Undefined points are NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(with = "dmy_dates")]
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len(), "index and values differ in length");
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

impl Index<usize> for TimeSeries {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

/// Resolved `(from, to)` window, both inclusive, in `DD/MM/YYYY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: String,
    to: String,
}

impl DateRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn as_tuple(&self) -> (&str, &str) {
        (&self.from, &self.to)
    }

    /// Parses both bounds with `format` (usually `utils::DATE_FORMAT`).
    pub fn parse_bounds(&self, format: &str) -> anyhow::Result<(NaiveDate, NaiveDate)> {
        Ok((
            utils::parse_date_with(&self.from, format)?,
            utils::parse_date_with(&self.to, format)?,
        ))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Series carried by a chart descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartData {
    Candlestick {
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
    },
    Scatter {
        y: Vec<f64>,
    },
}

/// Renderer-agnostic description of one chart trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub name: String,
    #[serde(with = "dmy_dates")]
    pub x: Vec<NaiveDate>,
    #[serde(flatten)]
    pub data: ChartData,
    /// Style options passed through untouched to the renderer.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl ChartDescriptor {
    pub fn kind(&self) -> &'static str {
        match self.data {
            ChartData::Candlestick { .. } => "candlestick",
            ChartData::Scatter { .. } => "scatter",
        }
    }
}
