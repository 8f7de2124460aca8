//! Output module for rendering and exporting result sets
//!
//! This module handles:
//! - Rendering a result set as an aligned text table
//! - Exporting to CSV files
//! - Exporting to SQLite databases

mod csv_export;
mod sqlite_export;
mod table;
mod traits;

pub use csv_export::{write_csv, CsvExporter};
pub use sqlite_export::{SqliteExporter, DEFAULT_TABLE};
pub use table::format_table;
pub use traits::{Exporter, OutputError, OutputResult};
