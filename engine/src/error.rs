use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Not a valid level: {0}. Must be 1, 2, or 3")]
    InvalidLevel(u8),

    #[error("Column '{0}' not in price table")]
    MissingColumn(String),

    #[error("Price series analyzer has no '{0}' operation")]
    UnknownOperation(String),

    #[error("Data too short: {indicator} needs at least {required} rows, got {available}")]
    InsufficientData {
        indicator: String,
        required: usize,
        available: usize,
    },

    #[error("Indicator period cannot be 0: {0}")]
    InvalidPeriod(String),

    #[error("Operation '{operation}' requires the '{argument}' argument")]
    MissingArgument {
        operation: &'static str,
        argument: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
