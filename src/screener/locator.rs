//! Page planning for a bounded search
//!
//! The first page tells us how many rows the query matches. From that number and the
//! requested cap we work out which pages are worth fetching at all.

use crate::config::SourceConfig;
use crate::screener::parser::TableSelectors;
use crate::{ParseError, ParseResult, Result, ScreenerError};
use scraper::Html;
use std::fmt;
use url::Url;

/// One page of a paginated search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Position of the page in the final ordering (0 = first page)
    pub index: usize,

    /// 1-based number of the first row on this page
    pub offset: usize,

    /// Rows this page contributes to the result set
    pub rows: usize,

    /// Request target for this page
    pub url: Url,
}

impl PageDescriptor {
    /// Fails when the page served fewer rows than planned
    pub fn ensure_complete(&self, found: usize) -> ParseResult<()> {
        if found < self.rows {
            return Err(ParseError::ShortPage {
                page: self.index,
                expected: self.rows,
                found,
            });
        }
        Ok(())
    }
}

impl fmt::Display for PageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} ({})", self.index, self.url)
    }
}

/// Pagination facts resolved from the first page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    /// Rows the source reports for the query
    pub total_rows: usize,

    /// Rows the search will return
    pub effective_cap: usize,

    /// Pages to read, in order; `pages[0]` is the first page
    pub pages: Vec<PageDescriptor>,
}

impl PagePlan {
    /// Pages still to be fetched after the first one
    pub fn remaining(&self) -> &[PageDescriptor] {
        self.pages.get(1..).unwrap_or_default()
    }
}

/// Reads the total row count from a page's count indicator
///
/// The indicator reads like `Total: 8,123 #1`; the first number after the colon is the
/// row count.
pub fn parse_total_rows(markup: &str, selectors: &TableSelectors) -> ParseResult<usize> {
    let document = Html::parse_document(markup);
    total_rows_from_document(&document, selectors)
}

pub(crate) fn total_rows_from_document(
    document: &Html,
    selectors: &TableSelectors,
) -> ParseResult<usize> {
    let indicator = document
        .select(&selectors.total_count)
        .next()
        .ok_or(ParseError::MissingTotalRows)?;

    let text = indicator.text().collect::<String>();
    read_total(&text).ok_or_else(|| ParseError::InvalidTotalRows {
        text: text.trim().to_string(),
    })
}

fn read_total(text: &str) -> Option<usize> {
    let count = text.split_once(':').map_or(text, |(_, rest)| rest);
    let digits: String = count
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Reconciles the requested cap with what the source has
pub fn effective_cap(requested: Option<usize>, total_rows: usize) -> usize {
    match requested {
        Some(rows) if rows <= total_rows => rows,
        _ => total_rows,
    }
}

/// Plans the pages needed for a search
///
/// # Arguments
///
/// * `total_rows` - Row count read from the first page
/// * `requested_cap` - Cap from the query, `None` for every row
/// * `first_url` - URL the first page was fetched from
/// * `query` - Encoded query, reported when nothing matched
/// * `source` - Pagination layout of the source
///
/// # Returns
///
/// * `Ok(PagePlan)` - Pages covering exactly the effective cap
/// * `Err(ScreenerError::NoResults)` - The query matched no rows
pub fn plan_pages(
    total_rows: usize,
    requested_cap: Option<usize>,
    first_url: &Url,
    query: &str,
    source: &SourceConfig,
) -> Result<PagePlan> {
    if total_rows == 0 {
        return Err(ScreenerError::NoResults {
            query: query.to_string(),
        });
    }

    let effective_cap = effective_cap(requested_cap, total_rows);
    let rows_per_page = source.rows_per_page.max(1);

    let mut pages = Vec::new();
    let mut covered = 0;
    while covered < effective_cap {
        let index = pages.len();
        let offset = index * rows_per_page + 1;

        let url = if index == 0 {
            first_url.clone()
        } else {
            let mut url = first_url.clone();
            url.query_pairs_mut()
                .append_pair(&source.offset_param, &offset.to_string());
            url
        };

        let rows = (effective_cap - covered).min(rows_per_page);
        pages.push(PageDescriptor {
            index,
            offset,
            rows,
            url,
        });
        covered += rows;
    }

    Ok(PagePlan {
        total_rows,
        effective_cap,
        pages,
    })
}

/// Reads the total from the first page and plans the pages to fetch
pub fn locate(
    first_page: &str,
    requested_cap: Option<usize>,
    first_url: &Url,
    query: &str,
    source: &SourceConfig,
    selectors: &TableSelectors,
) -> Result<PagePlan> {
    let document = Html::parse_document(first_page);
    plan_from_document(&document, requested_cap, first_url, query, source, selectors)
}

pub(crate) fn plan_from_document(
    document: &Html,
    requested_cap: Option<usize>,
    first_url: &Url,
    query: &str,
    source: &SourceConfig,
    selectors: &TableSelectors,
) -> Result<PagePlan> {
    let total_rows = total_rows_from_document(document, selectors)?;
    plan_pages(total_rows, requested_cap, first_url, query, source)
}
