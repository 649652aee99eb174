// Date handling shared across the engine and its callers.
// The upstream market-data provider speaks day/month/year, so every date that
// crosses a boundary (CSV, JSON, CLI) uses that format.
use anyhow::{anyhow, Result};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%d/%m/%Y";

// Parses "dd/mm/yyyy" into a NaiveDate. Single-digit day/month ("1/9/2020") is accepted.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    parse_date_with(s, DATE_FORMAT)
}

pub fn parse_date_with(s: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), format)
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", s, e))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde adapter for a single `NaiveDate` in `DD/MM/YYYY` form.
pub mod dmy_date {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(D::Error::custom)
    }
}

/// Serde adapter for a date index (`Vec<NaiveDate>`) in `DD/MM/YYYY` form.
pub mod dmy_dates {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dates: &[NaiveDate], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(dates.iter().map(|d| d.format(DATE_FORMAT).to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<NaiveDate>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(D::Error::custom))
            .collect()
    }
}
