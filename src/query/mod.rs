//! Screener query construction
//!
//! A [`Query`] is an immutable value. Narrowing a search produces a new query through
//! [`Query::merge`]; the session re-resolves from scratch every time.

mod table;

pub use table::TableKind;

use crate::{Result, ScreenerError};
use std::fmt;

/// Parameters for one screener search
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    tickers: Vec<String>,
    filters: Vec<String>,
    table: TableKind,
    order: String,
    signal: String,
    rows: Option<usize>,
}

impl Query {
    /// Creates an unfiltered Overview query returning every row
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a query
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn table(&self) -> TableKind {
        self.table
    }

    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// The requested row cap, `None` meaning every available row
    pub fn rows(&self) -> Option<usize> {
        self.rows
    }

    /// Returns a new query with the update applied
    ///
    /// Tickers and filters are appended; table, order, signal and rows are overwritten
    /// when the update carries them. The table name is checked before anything else
    /// happens, so an invalid update never reaches the network.
    ///
    /// # Examples
    ///
    /// ```
    /// use screener_harvest::{Query, QueryUpdate};
    ///
    /// let query = Query::builder().filters(["cap_large"]).build().unwrap();
    /// let merged = query
    ///     .merge(&QueryUpdate::new().filters(["fa_div_high"]).table("Performance"))
    ///     .unwrap();
    ///
    /// assert_eq!(merged.filters(), ["cap_large", "fa_div_high"]);
    /// assert_eq!(merged.table().wire_code(), "140");
    /// ```
    pub fn merge(&self, update: &QueryUpdate) -> Result<Query> {
        let table = match &update.table {
            Some(name) => name.parse()?,
            None => self.table,
        };

        let rows = match update.rows {
            Some(0) => return Err(ScreenerError::InvalidRowCap),
            Some(rows) => Some(rows),
            None => self.rows,
        };

        let mut tickers = self.tickers.clone();
        tickers.extend(update.tickers.iter().cloned());

        let mut filters = self.filters.clone();
        filters.extend(update.filters.iter().cloned());

        Ok(Query {
            tickers,
            filters,
            table,
            order: update.order.clone().unwrap_or_else(|| self.order.clone()),
            signal: update.signal.clone().unwrap_or_else(|| self.signal.clone()),
            rows,
        })
    }

    /// Serializes the query into request parameters in wire order: `v, t, f, o, s`
    pub fn to_params(&self) -> [(&'static str, String); 5] {
        [
            ("v", self.table.wire_code().to_string()),
            ("t", self.tickers.join(",")),
            ("f", self.filters.join(",")),
            ("o", self.order.clone()),
            ("s", self.signal.clone()),
        ]
    }

    /// URL-encoded form of [`Query::to_params`], as it appears after the `?`
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_params())
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = match self.rows {
            Some(rows) => rows.to_string(),
            None => "all".to_string(),
        };

        writeln!(f, "tickers: ({})", self.tickers.join(", "))?;
        writeln!(f, "filters: ({})", self.filters.join(", "))?;
        writeln!(f, "rows: {}", rows)?;
        writeln!(f, "order: {}", self.order)?;
        writeln!(f, "signal: {}", self.signal)?;
        write!(f, "table: {}", self.table)
    }
}

/// Builder for [`Query`]
///
/// The table is kept as the raw name until [`QueryBuilder::build`], which is where an
/// unknown name is reported.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    tickers: Vec<String>,
    filters: Vec<String>,
    table: Option<String>,
    order: String,
    signal: String,
    rows: Option<usize>,
}

impl QueryBuilder {
    pub fn tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tickers.extend(tickers.into_iter().map(Into::into));
        self
    }

    pub fn filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.extend(filters.into_iter().map(Into::into));
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn table_kind(mut self, table: TableKind) -> Self {
        self.table = Some(table.name().to_string());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    pub fn signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = signal.into();
        self
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Validates the table name and row cap and produces the query
    pub fn build(self) -> Result<Query> {
        let table = match self.table {
            Some(name) => name.parse()?,
            None => TableKind::default(),
        };

        if self.rows == Some(0) {
            return Err(ScreenerError::InvalidRowCap);
        }

        Ok(Query {
            tickers: self.tickers,
            filters: self.filters,
            table,
            order: self.order,
            signal: self.signal,
            rows: self.rows,
        })
    }
}

/// Changes to apply to an existing query
///
/// `None` leaves a scalar field as it was; `Some("")` clears order or signal.
#[derive(Debug, Clone, Default)]
pub struct QueryUpdate {
    tickers: Vec<String>,
    filters: Vec<String>,
    table: Option<String>,
    order: Option<String>,
    signal: Option<String>,
    rows: Option<usize>,
}

impl QueryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tickers.extend(tickers.into_iter().map(Into::into));
        self
    }

    pub fn filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.extend(filters.into_iter().map(Into::into));
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = Some(signal.into());
        self
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }
}
