// Broadcasting single-symbol operations across every partition of a group table.
use serde::Serialize;
use shared::models::{Column, GroupPriceSeries, PriceSeries, TimeSeries};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::price_series::{PriceSeriesAnalyzer, TRADING_DAYS};
use crate::data::market_data::{MarketDataStore, SeriesSummary};
use crate::error::{EngineError, Result};

pub const DEFAULT_GROUP_COLUMN: &str = "name";

/// Operations of `PriceSeriesAnalyzer` that can be run across a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Close,
    ClosePctChange,
    LastClose,
    LastHigh,
    LastLow,
    PivotPoint,
    Resistance,
    Support,
    PortReturn,
    CumulativeReturns,
    IsBearMarket,
    IsBullMarket,
    DailyStd,
    AnnualizedVolatility,
    Volatility,
    CorrWith,
    Cv,
    Qcd,
    Beta,
    Alpha,
    SharpeRatio,
}

/// Lookup table: (operation, snake_case name, camelCase name).
const OPERATIONS: &[(Operation, &str, &str)] = &[
    (Operation::Close, "close", "close"),
    (Operation::ClosePctChange, "close_pct_change", "closePercentChange"),
    (Operation::LastClose, "last_close", "lastClose"),
    (Operation::LastHigh, "last_high", "lastHigh"),
    (Operation::LastLow, "last_low", "lastLow"),
    (Operation::PivotPoint, "pivot_point", "pivotPoint"),
    (Operation::Resistance, "resistance", "resistance"),
    (Operation::Support, "support", "support"),
    (Operation::PortReturn, "port_return", "portReturn"),
    (Operation::CumulativeReturns, "cumulative_returns", "cumulativeReturns"),
    (Operation::IsBearMarket, "is_bear_market", "isBearMarket"),
    (Operation::IsBullMarket, "is_bull_market", "isBullMarket"),
    (Operation::DailyStd, "daily_std", "dailyStd"),
    (Operation::AnnualizedVolatility, "annualized_volatility", "annualizedVolatility"),
    (Operation::Volatility, "volatility", "volatility"),
    (Operation::CorrWith, "corr_with", "corrWith"),
    (Operation::Cv, "cv", "cv"),
    (Operation::Qcd, "qcd", "qcd"),
    (Operation::Beta, "beta", "beta"),
    (Operation::Alpha, "alpha", "alpha"),
    (Operation::SharpeRatio, "sharpe_ratio", "sharpeRatio"),
];

impl Operation {
    pub fn all() -> impl Iterator<Item = Operation> {
        OPERATIONS.iter().map(|(op, _, _)| *op)
    }

    pub fn name(&self) -> &'static str {
        OPERATIONS
            .iter()
            .find(|(op, _, _)| op == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("unknown")
    }

    pub fn lookup(name: &str) -> Result<Self> {
        OPERATIONS
            .iter()
            .find(|(_, snake, camel)| *snake == name || *camel == name)
            .map(|(op, _, _)| *op)
            .ok_or_else(|| EngineError::UnknownOperation(name.to_string()))
    }

    /// Runs the operation against one analyzer.
    pub fn apply(&self, analyzer: &PriceSeriesAnalyzer<'_>, args: &OperationArgs<'_>) -> Result<AnalysisValue> {
        let value = match self {
            Operation::Close => AnalysisValue::Series(analyzer.close()),
            Operation::ClosePctChange => AnalysisValue::Series(analyzer.close_pct_change()),
            Operation::LastClose => AnalysisValue::Scalar(analyzer.last_close()),
            Operation::LastHigh => AnalysisValue::Scalar(analyzer.last_high()),
            Operation::LastLow => AnalysisValue::Scalar(analyzer.last_low()),
            Operation::PivotPoint => AnalysisValue::Scalar(analyzer.pivot_point()),
            Operation::Resistance => AnalysisValue::Scalar(analyzer.resistance(args.level())?),
            Operation::Support => AnalysisValue::Scalar(analyzer.support(args.level())?),
            Operation::PortReturn => {
                AnalysisValue::Scalar(PriceSeriesAnalyzer::port_return(analyzer.data().bars()))
            }
            Operation::CumulativeReturns => AnalysisValue::Series(analyzer.cumulative_returns()),
            Operation::IsBearMarket => AnalysisValue::Flag(analyzer.is_bear_market()),
            Operation::IsBullMarket => AnalysisValue::Flag(analyzer.is_bull_market()),
            Operation::DailyStd => AnalysisValue::Scalar(analyzer.daily_std(args.periods())),
            Operation::AnnualizedVolatility => AnalysisValue::Scalar(analyzer.annualized_volatility()),
            Operation::Volatility => AnalysisValue::Series(analyzer.volatility(args.periods())),
            Operation::CorrWith => {
                AnalysisValue::Correlation(analyzer.corr_with(args.require_other(*self)?))
            }
            Operation::Cv => AnalysisValue::Scalar(analyzer.cv()),
            Operation::Qcd => AnalysisValue::Scalar(analyzer.qcd()),
            Operation::Beta => AnalysisValue::Scalar(analyzer.beta(args.require_index(*self)?)),
            Operation::Alpha => AnalysisValue::Scalar(analyzer.alpha(
                args.require_index(*self)?,
                args.require_risk_free_rate(*self)?,
            )),
            Operation::SharpeRatio => {
                AnalysisValue::Scalar(analyzer.sharpe_ratio(args.require_risk_free_rate(*self)?))
            }
        };
        Ok(value)
    }
}

impl FromStr for Operation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::lookup(s)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyword arguments for an operation. Unused fields are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationArgs<'a> {
    /// Support/resistance level, defaults to 1.
    pub level: Option<u8>,
    /// Look-back for `daily_std`/`volatility`, defaults to 252.
    pub periods: Option<usize>,
    /// Percent for `alpha`, plain rate for `sharpe_ratio`.
    pub risk_free_rate: Option<f64>,
    /// Benchmark for `beta`/`alpha`.
    pub index: Option<&'a PriceSeries>,
    /// Table for `corr_with`.
    pub other: Option<&'a PriceSeries>,
}

impl<'a> OperationArgs<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_periods(mut self, periods: usize) -> Self {
        self.periods = Some(periods);
        self
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = Some(rate);
        self
    }

    pub fn with_index(mut self, index: &'a PriceSeries) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_other(mut self, other: &'a PriceSeries) -> Self {
        self.other = Some(other);
        self
    }

    fn level(&self) -> u8 {
        self.level.unwrap_or(1)
    }

    fn periods(&self) -> usize {
        self.periods.unwrap_or(TRADING_DAYS)
    }

    fn require_index(&self, op: Operation) -> Result<&'a PriceSeries> {
        self.index.ok_or(EngineError::MissingArgument {
            operation: op.name(),
            argument: "index",
        })
    }

    fn require_other(&self, op: Operation) -> Result<&'a PriceSeries> {
        self.other.ok_or(EngineError::MissingArgument {
            operation: op.name(),
            argument: "other",
        })
    }

    fn require_risk_free_rate(&self, op: Operation) -> Result<f64> {
        self.risk_free_rate.ok_or(EngineError::MissingArgument {
            operation: op.name(),
            argument: "risk_free_rate",
        })
    }
}

/// Result of one operation on one partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisValue {
    Scalar(f64),
    Flag(bool),
    Series(TimeSeries),
    Correlation(BTreeMap<Column, f64>),
}

impl AnalysisValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            AnalysisValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AnalysisValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&TimeSeries> {
        match self {
            AnalysisValue::Series(s) => Some(s),
            _ => None,
        }
    }
}

/// Runs `PriceSeriesAnalyzer` operations over every group of a multi-symbol table.
#[derive(Debug, Clone)]
pub struct GroupAnalyzer {
    partitions: MarketDataStore,
}

impl GroupAnalyzer {
    /// Groups by the symbol `name` column.
    pub fn new(data: &GroupPriceSeries) -> Result<Self> {
        Self::with_group_column(data, DEFAULT_GROUP_COLUMN)
    }

    pub fn with_group_column(data: &GroupPriceSeries, group_col: &str) -> Result<Self> {
        let group_column: Column = group_col
            .parse()
            .map_err(|_| EngineError::MissingColumn(group_col.to_string()))?;
        let partitions = MarketDataStore::partition(data, group_column);
        tracing::info!(group_column = %group_column, groups = partitions.len(), "Built group analyzer");
        Ok(Self { partitions })
    }

    /// Analyzer over one group's rows.
    pub fn analyzer(&self, group: &str) -> Option<PriceSeriesAnalyzer<'_>> {
        self.partitions.get_series(group).map(PriceSeriesAnalyzer::new)
    }

    /// Looks `operation` up by name and runs it on every group.
    pub fn analyze(&self, operation: &str, args: &OperationArgs<'_>) -> Result<BTreeMap<String, AnalysisValue>> {
        let op = Operation::lookup(operation)?;
        self.analyze_operation(op, args)
    }

    pub fn analyze_operation(
        &self,
        op: Operation,
        args: &OperationArgs<'_>,
    ) -> Result<BTreeMap<String, AnalysisValue>> {
        tracing::debug!(operation = %op, groups = self.partitions.len(), "Running group analysis");
        self.partitions
            .iter()
            .map(|(group, series)| {
                let value = op.apply(&PriceSeriesAnalyzer::new(series), args)?;
                Ok((group.to_string(), value))
            })
            .collect()
    }

    /// Close statistics per group.
    pub fn summary(&self) -> BTreeMap<String, SeriesSummary> {
        self.partitions.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::price_series::tests::series_from_closes;
    use crate::analysis::stats;

    fn group() -> GroupPriceSeries {
        GroupPriceSeries::from_series(vec![
            series_from_closes("VNM", &[100.0, 110.0, 121.0]),
            series_from_closes("FPT", &[50.0, 45.0]),
            series_from_closes("HPG", &[20.0, 21.0, 22.0, 19.0]),
        ])
    }

    #[test]
    fn test_unknown_operation() {
        let analyzer = GroupAnalyzer::new(&group()).unwrap();
        let result = analyzer.analyze("nonexistentMethod", &OperationArgs::new());
        assert!(matches!(result, Err(EngineError::UnknownOperation(name)) if name == "nonexistentMethod"));
    }

    #[test]
    fn test_missing_group_column() {
        let result = GroupAnalyzer::with_group_column(&group(), "Ticker");
        assert!(matches!(result, Err(EngineError::MissingColumn(col)) if col == "Ticker"));
    }

    #[test]
    fn test_grouping_by_currency_keeps_every_row() {
        let data = group();
        let analyzer = GroupAnalyzer::with_group_column(&data, "Currency").unwrap();
        let closes: Vec<f64> = data.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes.len(), 9);

        let summary = analyzer.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary["VND"].count, 9);

        let cv = analyzer.analyze("cv", &OperationArgs::new()).unwrap();
        let expected = stats::sample_std(&closes) / stats::mean(&closes);
        assert!((cv["VND"].as_scalar().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_last_close_per_symbol() {
        let data = group();
        let analyzer = GroupAnalyzer::new(&data).unwrap();
        let result = analyzer.analyze("lastClose", &OperationArgs::new()).unwrap();
        assert_eq!(result.len(), 3);
        for symbol in data.symbols() {
            let own = data.series_for(symbol);
            let expected = PriceSeriesAnalyzer::new(&own).last_close();
            assert_eq!(result[symbol].as_scalar(), Some(expected));
        }
        assert_eq!(result["FPT"].as_scalar(), Some(45.0));
    }

    #[test]
    fn test_snake_case_names_resolve_to_same_operation() {
        assert_eq!(Operation::lookup("last_close").unwrap(), Operation::LastClose);
        assert_eq!(Operation::lookup("lastClose").unwrap(), Operation::LastClose);
        assert_eq!("sharpeRatio".parse::<Operation>().unwrap(), Operation::SharpeRatio);
    }

    #[test]
    fn test_every_operation_round_trips_its_name() {
        for op in Operation::all() {
            assert_eq!(Operation::lookup(op.name()).unwrap(), op);
        }
    }

    #[test]
    fn test_arguments_are_forwarded() {
        let analyzer = GroupAnalyzer::new(&group()).unwrap();
        let result = analyzer
            .analyze("resistance", &OperationArgs::new().with_level(2))
            .unwrap();
        let vnm = analyzer.analyzer("VNM").unwrap();
        assert_eq!(result["VNM"].as_scalar(), Some(vnm.resistance(2).unwrap()));
    }

    #[test]
    fn test_invalid_level_fails_whole_analysis() {
        let analyzer = GroupAnalyzer::new(&group()).unwrap();
        let result = analyzer.analyze("support", &OperationArgs::new().with_level(4));
        assert!(matches!(result, Err(EngineError::InvalidLevel(4))));
    }

    #[test]
    fn test_missing_index_argument() {
        let analyzer = GroupAnalyzer::new(&group()).unwrap();
        let result = analyzer.analyze("beta", &OperationArgs::new());
        assert!(matches!(
            result,
            Err(EngineError::MissingArgument { operation: "beta", argument: "index" })
        ));
    }

    #[test]
    fn test_beta_against_index() {
        let index = series_from_closes("VNINDEX", &[1000.0, 1010.0, 1030.0, 1000.0]);
        let analyzer = GroupAnalyzer::new(&group()).unwrap();
        let result = analyzer
            .analyze_operation(Operation::Beta, &OperationArgs::new().with_index(&index))
            .unwrap();
        let hpg = analyzer.analyzer("HPG").unwrap();
        assert_eq!(result["HPG"].as_scalar(), Some(hpg.beta(&index)));
    }

    #[test]
    fn test_series_and_flag_results() {
        let analyzer = GroupAnalyzer::new(&group()).unwrap();
        let cumulative = analyzer.analyze("cumulative_returns", &OperationArgs::new()).unwrap();
        let vnm = cumulative["VNM"].as_series().unwrap();
        assert!((vnm[1] - 1.21).abs() < 1e-12);

        let bull = analyzer.analyze("isBullMarket", &OperationArgs::new()).unwrap();
        assert_eq!(bull["VNM"].as_flag(), Some(true));
        assert_eq!(bull["FPT"].as_flag(), Some(false));
    }

    #[test]
    fn test_results_serialize_per_group() {
        let analyzer = GroupAnalyzer::new(&group()).unwrap();
        let result = analyzer.analyze("last_close", &OperationArgs::new()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["HPG"], 19.0);
    }
}
