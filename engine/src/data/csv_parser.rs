use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use shared::models::{GroupPriceSeries, PriceBar};
use shared::utils::parse_date_with;
use std::fs::File;
use std::io::{BufReader, Read};
use std::str::FromStr;

use crate::config::AnalysisSettings;

/// Loads price tables exported from the market-data provider.
///
/// CSV Header (any column order): Date,Open,Close,Low,High,Volume,Currency,name
/// Example Row: 02/01/2024,67.5,68.1,67.2,68.4,1250300,VND,VNM
pub struct PriceCsvParser {
    delimiter: u8,
    date_format: String,
}

impl PriceCsvParser {
    pub fn new(delimiter: u8, date_format: impl Into<String>) -> Self {
        Self {
            delimiter,
            date_format: date_format.into(),
        }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self::new(settings.delimiter(), settings.date_format.clone())
    }

    pub fn load_from_csv(&self, file_path: &str) -> Result<GroupPriceSeries> {
        let file = File::open(file_path).map_err(|e| anyhow!("Failed to open CSV file '{}': {}", file_path, e))?;
        let group = self
            .load_from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to load price table from '{}'", file_path))?;
        tracing::info!(path = %file_path, rows = group.len(), symbols = group.symbols().len(), "Loaded price table");
        Ok(group)
    }

    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<GroupPriceSeries> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut bars = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| anyhow!("Error reading CSV record at line {}: {}", line, e))?;

            let date_str = Self::require_field(&record, &headers, "Date", line)?;
            let date = parse_date_with(date_str, &self.date_format)
                .map_err(|e| anyhow!("Error parsing 'Date' at line {}: {}", line, e))?;

            bars.push(PriceBar {
                date,
                open: Self::parse_field(&record, &headers, "Open", line)?,
                close: Self::parse_field(&record, &headers, "Close", line)?,
                low: Self::parse_field(&record, &headers, "Low", line)?,
                high: Self::parse_field(&record, &headers, "High", line)?,
                volume: Self::parse_field(&record, &headers, "Volume", line)?,
                currency: Self::require_field(&record, &headers, "Currency", line)?.to_string(),
                name: Self::require_field(&record, &headers, "name", line)?.to_uppercase(),
            });
        }
        Ok(GroupPriceSeries::new(bars))
    }

    fn parse_field<T>(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = Self::require_field(record, headers, name, line)?;
        raw.parse::<T>()
            .map_err(|e| anyhow!("Error parsing '{}' at line {}: {}", name, line, e))
    }

    fn require_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str> {
        Self::get_field(record, headers, name)
            .ok_or_else(|| anyhow!("Missing '{}' field in CSV record at line {}", name, line))
    }

    // Looks a field up by header name so column order does not matter.
    fn get_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .position(|header| header == name)
            .and_then(|pos| record.get(pos))
    }
}

impl Default for PriceCsvParser {
    fn default() -> Self {
        Self::from_settings(&AnalysisSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_from_csv_valid_data() {
        let csv_content = "\
Date,Open,Close,Low,High,Volume,Currency,name
02/01/2024,67.5,68.1,67.2,68.4,1250300,VND,VNM
02/01/2024,95.0,96.2,94.8,96.5,880000,VND,fpt
03/01/2024,68.1,67.9,67.5,68.6,990000,VND,VNM";
        let tmp_file = create_test_csv(csv_content);
        let group = PriceCsvParser::default()
            .load_from_csv(tmp_file.path().to_str().unwrap())
            .unwrap();

        assert_eq!(group.len(), 3);
        let first = &group.bars()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(first.open, 67.5);
        assert_eq!(first.close, 68.1);
        assert_eq!(first.low, 67.2);
        assert_eq!(first.high, 68.4);
        assert_eq!(first.volume, 1_250_300);
        assert_eq!(first.currency, "VND");
        assert_eq!(group.symbols(), vec!["VNM", "FPT"]);
    }

    #[test]
    fn test_columns_located_by_header() {
        let csv_content = "\
name;Currency;Volume;High;Low;Close;Open;Date
VNM;VND;100;12;8;10;9;01/03/2024";
        let parser = PriceCsvParser::new(b';', "%d/%m/%Y");
        let group = parser.load_from_reader(csv_content.as_bytes()).unwrap();
        let bar = &group.bars()[0];
        assert_eq!((bar.open, bar.close, bar.low, bar.high), (9.0, 10.0, 8.0, 12.0));
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_load_from_csv_empty_file() {
        let tmp_file = create_test_csv("Date,Open,Close,Low,High,Volume,Currency,name"); // Only header
        let group = PriceCsvParser::default()
            .load_from_csv(tmp_file.path().to_str().unwrap())
            .unwrap();
        assert!(group.is_empty());
    }

    #[test]
    fn test_load_from_csv_missing_field() {
        let csv_content = "\
Date,Open,Close,Low,High,Volume,name
02/01/2024,67.5,68.1,67.2,68.4,1250300,VNM"; // Missing Currency
        let result = PriceCsvParser::default().load_from_reader(csv_content.as_bytes());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Missing 'Currency' field"));
    }

    #[test]
    fn test_load_from_csv_invalid_data_format() {
        let csv_content = "\
Date,Open,Close,Low,High,Volume,Currency,name
02/01/2024,invalid,68.1,67.2,68.4,1250300,VND,VNM";
        let result = PriceCsvParser::default().load_from_reader(csv_content.as_bytes());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Error parsing 'Open' at line 2"));
    }

    #[test]
    fn test_load_from_csv_invalid_date() {
        let csv_content = "\
Date,Open,Close,Low,High,Volume,Currency,name
2024-01-02,67.5,68.1,67.2,68.4,1250300,VND,VNM";
        let result = PriceCsvParser::default().load_from_reader(csv_content.as_bytes());
        assert!(result.unwrap_err().to_string().contains("Error parsing 'Date' at line 2"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = PriceCsvParser::default().load_from_csv("/nonexistent/prices.csv");
        assert!(result.unwrap_err().to_string().contains("Failed to open CSV file"));
    }
}
