// Per-key partitions of a multi-symbol price table
use chrono::NaiveDate;
use serde::Serialize;
use shared::models::{Column, GroupPriceSeries, PriceBar, PriceSeries};
use shared::utils::dmy_date;
use std::collections::BTreeMap;

use crate::analysis::stats;

/// Price tables keyed by a grouping column value (the symbol name by default).
/// Each partition is an independent, date-ordered `PriceSeries`.
#[derive(Debug, Clone, Default)]
pub struct MarketDataStore {
    data: BTreeMap<String, PriceSeries>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        MarketDataStore {
            data: BTreeMap::new(),
        }
    }

    /// Splits `group` on the values of `column`.
    ///
    /// Symbol partitions hold one row per date. Partitions on any other column
    /// keep every row, so several symbols may share a date inside one partition.
    pub fn partition(group: &GroupPriceSeries, column: Column) -> Self {
        let mut buckets: BTreeMap<String, Vec<PriceBar>> = BTreeMap::new();
        for bar in group.bars() {
            buckets.entry(column.key_for(bar)).or_default().push(bar.clone());
        }

        let mut store = Self::new();
        for (key, bars) in buckets {
            if column == Column::Name {
                store.add_bars(&key, bars);
            } else {
                store.data.insert(key, PriceSeries::with_repeated_dates(bars));
            }
        }
        tracing::debug!(%column, partitions = store.len(), rows = group.len(), "Partitioned price table");
        store
    }

    /// Merges rows into the partition for `key`, keeping dates ordered and unique.
    pub fn add_bars(&mut self, key: &str, new_bars: Vec<PriceBar>) {
        let mut bars = self
            .data
            .remove(key)
            .map(|s| s.bars().to_vec())
            .unwrap_or_default();
        bars.extend(new_bars);
        self.data.insert(key.to_string(), PriceSeries::new(bars));
    }

    pub fn get_series(&self, key: &str) -> Option<&PriceSeries> {
        self.data.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PriceSeries)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Descriptive statistics of Close for every partition.
    pub fn summary(&self) -> BTreeMap<String, SeriesSummary> {
        self.data
            .iter()
            .map(|(key, series)| (key.clone(), SeriesSummary::of(&series.closes())))
            .collect()
    }
}

/// count/mean/std/min/quartiles/max of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
}

impl SeriesSummary {
    pub fn of(values: &[f64]) -> Self {
        let defined: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        Self {
            count: defined.len(),
            mean: stats::mean(&defined),
            std: stats::sample_std(&defined),
            min: stats::quantile(&defined, 0.0),
            q25: stats::quantile(&defined, 0.25),
            median: stats::quantile(&defined, 0.5),
            q75: stats::quantile(&defined, 0.75),
            max: stats::quantile(&defined, 1.0),
        }
    }
}

/// One date of the equal-weight aggregate: column sums across symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioBar {
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
    /// Number of symbols that traded on this date.
    pub symbols: usize,
}

/// Sums every numeric column per date across all rows of `group`.
pub fn portfolio(group: &GroupPriceSeries) -> Vec<PortfolioBar> {
    let mut by_date: BTreeMap<NaiveDate, PortfolioBar> = BTreeMap::new();
    for bar in group.bars() {
        let entry = by_date.entry(bar.date).or_insert(PortfolioBar {
            date: bar.date,
            open: 0.0,
            close: 0.0,
            low: 0.0,
            high: 0.0,
            volume: 0,
            symbols: 0,
        });
        entry.open += bar.open;
        entry.close += bar.close;
        entry.low += bar.low;
        entry.high += bar.high;
        entry.volume += bar.volume;
        entry.symbols += 1;
    }
    by_date.into_values().collect()
}
