//! Configuration module for Screener-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing file is not an error for callers that use [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use screener_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("screener.toml")).unwrap();
//! println!("Rows per page: {}", config.source.rows_per_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, MarkupConfig, RetryConfig, SourceConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
