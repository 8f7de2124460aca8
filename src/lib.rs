//! Screener-Harvest: a paginated stock screener extractor
//!
//! This crate fetches a screener table whose rows are split across many HTML pages,
//! downloads the pages concurrently, and reassembles them into one ordered, bounded
//! result set.

pub mod config;
pub mod output;
pub mod query;
pub mod screener;

use thiserror::Error;

/// Main error type for Screener-Harvest operations
#[derive(Debug, Error)]
pub enum ScreenerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid table type: {table}")]
    InvalidTableType { table: String },

    #[error("Invalid row count: rows must be a positive integer")]
    InvalidRowCap,

    #[error("No results found for query: {query}")]
    NoResults { query: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Rate limited while fetching {url}")]
    RateLimited { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to fetch {descriptor} after {attempts} attempt(s): {source}")]
    PageFailed {
        descriptor: String,
        attempts: usize,
        source: Box<ScreenerError>,
    },

    #[error("Worker task aborted: {message}")]
    WorkerAborted { message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Structural errors raised while reading a screener page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("header row not found")]
    MissingHeaderRow,

    #[error("header column {column} has neither text nor icon")]
    EmptyHeader { column: usize },

    #[error("page {page}, row {row}: column {column} has neither text nor fallback value")]
    MissingCellValue {
        page: usize,
        row: usize,
        column: usize,
    },

    #[error("page {page}, row {row}: expected {expected} cells, found {found}")]
    CellCountMismatch {
        page: usize,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("page {page}, row {row}: invalid row number '{value}'")]
    InvalidRowNumber {
        page: usize,
        row: usize,
        value: String,
    },

    #[error("page {page}: expected {expected} rows, found {found}")]
    ShortPage {
        page: usize,
        expected: usize,
        found: usize,
    },

    #[error("total row count indicator not found")]
    MissingTotalRows,

    #[error("could not read total row count from '{text}'")]
    InvalidTotalRows { text: String },

    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Result type alias for Screener-Harvest operations
pub type Result<T> = std::result::Result<T, ScreenerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page parsing operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

// Re-export commonly used types
pub use config::Config;
pub use query::{Query, QueryUpdate, TableKind};
pub use screener::{Record, ResultSet, Screener};
