//! SQLite export
//!
//! Each export replaces the target table with the current result set and appends a
//! row to the `exports` metadata table.

use crate::output::traits::{Exporter, OutputError, OutputResult};
use crate::screener::ResultSet;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection};
use std::path::{Path, PathBuf};

/// Default name of the results table
pub const DEFAULT_TABLE: &str = "screener_results";

const EXPORTS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS exports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_name TEXT NOT NULL,
    row_count INTEGER NOT NULL,
    total_rows INTEGER NOT NULL,
    exported_at TEXT NOT NULL
);
";

/// Writes a result set into a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteExporter {
    path: PathBuf,
    table: String,
}

impl SqliteExporter {
    /// Creates an exporter targeting [`DEFAULT_TABLE`]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Writes the result set through an open connection
    pub fn export_to(&self, conn: &mut Connection, results: &ResultSet) -> OutputResult<()> {
        if self.table.trim().is_empty() {
            return Err(OutputError::InvalidTable(self.table.clone()));
        }

        let table = quote_identifier(&self.table);
        let columns = results
            .headers()
            .iter()
            .map(|header| format!("{} TEXT", quote_identifier(header)))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=results.headers().len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = conn.transaction()?;
        tx.execute_batch(EXPORTS_SCHEMA)?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
        tx.execute(&format!("CREATE TABLE {} ({})", table, columns), [])?;

        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;
            for record in results {
                stmt.execute(params_from_iter(record.values()))?;
            }
        }

        tx.execute(
            "INSERT INTO exports (table_name, row_count, total_rows, exported_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                self.table,
                results.len() as i64,
                results.total_rows() as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;

        Ok(())
    }
}

impl Exporter for SqliteExporter {
    fn export(&self, results: &ResultSet) -> OutputResult<()> {
        let mut conn = Connection::open(&self.path)?;
        self.export_to(&mut conn, results)?;
        tracing::info!(
            "Wrote {} row(s) to {} (table {})",
            results.len(),
            self.path.display(),
            self.table
        );
        Ok(())
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
