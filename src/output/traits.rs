//! Exporter trait and output errors

use crate::screener::ResultSet;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid table name: '{0}'")]
    InvalidTable(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes a result set somewhere outside the process
pub trait Exporter {
    /// Exports every record of `results`, headers first
    fn export(&self, results: &ResultSet) -> OutputResult<()>;
}
