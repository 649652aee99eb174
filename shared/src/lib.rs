pub mod models;
pub mod utils;

// Price tables, derived series and chart descriptors shared by the engine
// library and its command line front end.
pub use models::{
    ChartData, ChartDescriptor, Column, DateRange, GroupPriceSeries, PriceBar, PriceSeries,
    TimeSeries,
};
