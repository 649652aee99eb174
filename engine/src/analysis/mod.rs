// Single-symbol and group metrics over price tables
pub mod group;
pub mod price_series;
pub mod stats;

pub use group::{AnalysisValue, GroupAnalyzer, Operation, OperationArgs};
pub use price_series::PriceSeriesAnalyzer;
