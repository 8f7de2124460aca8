//! Row and result-set types produced by a resolve

use crate::output::format_table;
use std::fmt;
use std::sync::Arc;

/// One screener row: values keyed by the session's header list
///
/// The record shares the header list it was parsed against, so its keys always equal
/// the headers in name and order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Pairs values with headers; `None` if the counts differ
    pub fn new(headers: Arc<[String]>, values: Vec<String>) -> Option<Self> {
        if headers.len() != values.len() {
            return None;
        }
        Some(Self { headers, values })
    }

    /// Value of the named column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|header| header == column)
            .map(|index| self.values[index].as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// (column, value) pairs in header order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(&self.values)
            .map(|(header, value)| (header.as_str(), value.as_str()))
    }

    /// Serial row number carried by the leading column
    pub fn serial(&self) -> Option<usize> {
        self.values.first().and_then(|value| value.trim().parse().ok())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The outcome of one resolve: ordered records plus the pagination facts behind them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    headers: Arc<[String]>,
    records: Vec<Record>,
    total_rows: usize,
    effective_cap: usize,
}

impl ResultSet {
    pub fn new(
        headers: Arc<[String]>,
        records: Vec<Record>,
        total_rows: usize,
        effective_cap: usize,
    ) -> Self {
        Self {
            headers,
            records,
            total_rows,
            effective_cap,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of rows the source reported for the query
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Number of rows this result was bounded to
    pub fn effective_cap(&self) -> usize {
        self.effective_cap
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Every value of one column, in row order
    ///
    /// Rows are uniform, so an unknown column yields an empty list.
    pub fn column(&self, name: &str) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|record| record.get(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_table(&self.headers, &self.records))
    }
}
