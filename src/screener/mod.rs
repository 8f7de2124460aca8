//! Screener extraction pipeline
//!
//! This module contains:
//! - The table parser turning page markup into headers and records
//! - The page locator planning which pages a search needs
//! - The connector running page workers concurrently while keeping their order
//! - The session composing them into a single resolve
//! - Chart downloads reusing the same connector

pub mod charts;
mod connector;
mod fetcher;
mod locator;
mod parser;
mod record;
mod retry;
mod session;

pub use charts::{ChartOptions, ChartPeriod, ChartRequest, ChartSize, ChartStyle};
pub use connector::{Connector, DispatchError};
pub use fetcher::{build_http_client, fetch_bytes, fetch_page};
pub use locator::{effective_cap, locate, parse_total_rows, plan_pages, PageDescriptor, PagePlan};
pub use parser::{parse_headers, parse_rows, resolve_cell, Cell, TableSelectors};
pub use record::{Record, ResultSet};
pub use retry::{RetryFailure, RetryPolicy, Retryable};
pub use session::Screener;
