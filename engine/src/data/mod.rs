pub mod csv_parser;
pub mod date_range;
pub mod market_data;
