//! CSV export

use crate::output::traits::{Exporter, OutputResult};
use crate::screener::ResultSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes a result set to a CSV file, header row first
#[derive(Debug, Clone)]
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Exporter for CsvExporter {
    fn export(&self, results: &ResultSet) -> OutputResult<()> {
        let file = std::fs::File::create(&self.path)?;
        write_csv(results, file)?;
        tracing::info!("Wrote {} row(s) to {}", results.len(), self.path.display());
        Ok(())
    }
}

/// Writes a result set as CSV to any writer
pub fn write_csv<W: Write>(results: &ResultSet, writer: W) -> OutputResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(results.headers())?;
    for record in results {
        writer.write_record(record.values())?;
    }
    writer.flush()?;
    Ok(())
}
