use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonetizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Data source not found: {0}")]
    SourceNotFound(String),

    #[error("No data source given. Pass --source or run `seizure-monetizer init --source <file>`")]
    NoSource,

    #[error("Could not locate the {column} column (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    #[error("Invalid criteria table: {0}")]
    InvalidCriteria(String),

    #[error("Duplicate category in criteria table: {0}")]
    DuplicateCategory(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid period: end {end} is before start {start}")]
    InvalidWindow { start: String, end: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MonetizerError>;
