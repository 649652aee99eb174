// Engine library root
// Technical-analysis metrics over daily OHLCV price tables:
// - `analysis`: single-symbol metrics and group-wide broadcasting
// - `indicators`: candlestick, moving averages and MACD with chart descriptors
// - `data`: date-range resolution, CSV loading, per-symbol partitions
// - `config`: analysis settings

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;

pub use analysis::{AnalysisValue, GroupAnalyzer, Operation, OperationArgs, PriceSeriesAnalyzer};
pub use data::date_range::{resolve_date_range, DateRangeResolver};
pub use error::{EngineError, Result};
pub use indicators::{Candlestick, ExponentialMovingAverage, Indicator, Macd, MovingAverage};
