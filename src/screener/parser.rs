//! HTML parser for screener table pages
//!
//! This module reads the screener markup into:
//! - The header list (from the single header row)
//! - Ordered records (from the data rows)
//!
//! Every table cell goes through [`resolve_cell`], which decides whether the value
//! comes from the cell's own text, a nested fallback element, or an icon.

use crate::config::MarkupConfig;
use crate::screener::record::Record;
use crate::{ParseError, ParseResult};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

/// Value read from a single table cell, tagged by where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// The cell's own text
    Text(String),
    /// Text of the first nested fallback element (e.g. a styled span)
    Fallback(String),
    /// Identifier of an embedded icon standing in for text
    Icon(String),
}

impl Cell {
    pub fn into_value(self) -> String {
        match self {
            Cell::Text(value) | Cell::Fallback(value) | Cell::Icon(value) => value,
        }
    }
}

/// Compiled selectors for one screener markup layout
#[derive(Debug, Clone)]
pub struct TableSelectors {
    header_row: Selector,
    header_cell: Selector,
    data_row: Selector,
    data_cell: Selector,
    fallback: Selector,
    icon: Selector,
    pub(crate) total_count: Selector,
}

impl TableSelectors {
    /// Compiles the selectors named in the markup configuration
    pub fn new(markup: &MarkupConfig) -> ParseResult<Self> {
        Ok(Self {
            header_row: compile(&markup.header_row)?,
            header_cell: compile(&markup.header_cell)?,
            data_row: compile(&markup.data_row)?,
            data_cell: compile(&markup.data_cell)?,
            fallback: compile(&markup.fallback)?,
            icon: compile(&markup.icon)?,
            total_count: compile(&markup.total_count)?,
        })
    }
}

fn compile(selector: &str) -> ParseResult<Selector> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Resolves a cell to its value
///
/// Order of preference: own text, first non-empty fallback element, icon `alt` or
/// `title` attribute. Returns `None` when the cell carries none of them.
pub fn resolve_cell(cell: ElementRef<'_>, selectors: &TableSelectors) -> Option<Cell> {
    let own_text: String = cell
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect();
    let own_text = own_text.trim();
    if !own_text.is_empty() {
        return Some(Cell::Text(own_text.to_string()));
    }

    let fallback = cell
        .select(&selectors.fallback)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty());
    if let Some(text) = fallback {
        return Some(Cell::Fallback(text));
    }

    cell.select(&selectors.icon)
        .filter_map(|icon| {
            let attrs = icon.value();
            attrs
                .attr("alt")
                .filter(|v| !v.trim().is_empty())
                .or_else(|| attrs.attr("title").filter(|v| !v.trim().is_empty()))
        })
        .map(|identifier| Cell::Icon(identifier.trim().to_string()))
        .next()
}

/// Extracts the header list from a page
///
/// # Example
///
/// ```
/// use screener_harvest::config::MarkupConfig;
/// use screener_harvest::screener::{parse_headers, TableSelectors};
///
/// let selectors = TableSelectors::new(&MarkupConfig::default()).unwrap();
/// let html = r#"<table>
///     <tr valign="middle"><td>No.</td><td><img alt="Ticker"></td></tr>
/// </table>"#;
/// let headers = parse_headers(html, &selectors).unwrap();
/// assert_eq!(headers, ["No.", "Ticker"]);
/// ```
pub fn parse_headers(markup: &str, selectors: &TableSelectors) -> ParseResult<Vec<String>> {
    let document = Html::parse_document(markup);
    headers_from_document(&document, selectors)
}

pub(crate) fn headers_from_document(
    document: &Html,
    selectors: &TableSelectors,
) -> ParseResult<Vec<String>> {
    let header_row = document
        .select(&selectors.header_row)
        .next()
        .ok_or(ParseError::MissingHeaderRow)?;

    let headers = header_row
        .select(&selectors.header_cell)
        .enumerate()
        .map(|(column, cell)| {
            resolve_cell(cell, selectors)
                .map(Cell::into_value)
                .ok_or(ParseError::EmptyHeader { column })
        })
        .collect::<ParseResult<Vec<_>>>()?;

    if headers.is_empty() {
        return Err(ParseError::MissingHeaderRow);
    }

    Ok(headers)
}

/// Extracts the data rows of one page
///
/// Rows are read in document order. Reading stops after the row whose serial number
/// equals `row_cap`, so the last page of a bounded search is consumed only as far as
/// needed.
///
/// # Arguments
///
/// * `markup` - The page HTML
/// * `page` - Ordinal of the page, used in error reports
/// * `headers` - The session header list
/// * `row_cap` - Effective row cap of the session
pub fn parse_rows(
    markup: &str,
    page: usize,
    headers: &Arc<[String]>,
    row_cap: usize,
    selectors: &TableSelectors,
) -> ParseResult<Vec<Record>> {
    let document = Html::parse_document(markup);
    rows_from_document(&document, page, headers, row_cap, selectors)
}

pub(crate) fn rows_from_document(
    document: &Html,
    page: usize,
    headers: &Arc<[String]>,
    row_cap: usize,
    selectors: &TableSelectors,
) -> ParseResult<Vec<Record>> {
    let mut records = Vec::new();

    // Rows without data cells are layout rows
    let data_rows = document
        .select(&selectors.data_row)
        .map(|row| row.select(&selectors.data_cell).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty());

    for (row, cells) in data_rows.enumerate() {
        if cells.len() != headers.len() {
            return Err(ParseError::CellCountMismatch {
                page,
                row,
                expected: headers.len(),
                found: cells.len(),
            });
        }

        let values = cells
            .into_iter()
            .enumerate()
            .map(|(column, cell)| match resolve_cell(cell, selectors) {
                Some(Cell::Text(value)) | Some(Cell::Fallback(value)) => Ok(value),
                Some(Cell::Icon(_)) | None => {
                    Err(ParseError::MissingCellValue { page, row, column })
                }
            })
            .collect::<ParseResult<Vec<_>>>()?;

        let serial: usize =
            values[0]
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidRowNumber {
                    page,
                    row,
                    value: values[0].clone(),
                })?;

        let found = values.len();
        let record =
            Record::new(Arc::clone(headers), values).ok_or(ParseError::CellCountMismatch {
                page,
                row,
                expected: headers.len(),
                found,
            })?;
        records.push(record);

        if serial == row_cap {
            break;
        }
    }

    Ok(records)
}
