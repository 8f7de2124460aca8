//! Extraction session: one query in, one ordered and bounded result set out
//!
//! A resolve runs in five steps:
//! 1. Serialize the query into the first-page URL
//! 2. Fetch the first page and read its headers, total row count and rows
//! 3. Plan the remaining pages
//! 4. Fetch and parse the remaining pages through the [`Connector`]
//! 5. Concatenate in page order and truncate to the effective cap
//!
//! The session only publishes a result set once the whole resolve has succeeded.

use crate::config::{validate, Config, SourceConfig};
use crate::query::{Query, QueryUpdate};
use crate::screener::charts::{self, ChartOptions};
use crate::screener::connector::Connector;
use crate::screener::fetcher::{build_http_client, fetch_page};
use crate::screener::locator::{plan_from_document, PageDescriptor, PagePlan};
use crate::screener::parser::{headers_from_document, parse_rows, rows_from_document, TableSelectors};
use crate::screener::record::{Record, ResultSet};
use crate::{Result, ScreenerError};
use reqwest::Client;
use scraper::Html;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// What the first page tells us
#[derive(Debug)]
struct Bootstrap {
    headers: Arc<[String]>,
    plan: PagePlan,
    first_records: Vec<Record>,
}

/// Reads everything needed from the first page in a single parse
fn bootstrap(
    markup: &str,
    query: &Query,
    first_url: &Url,
    source: &SourceConfig,
    selectors: &TableSelectors,
) -> Result<Bootstrap> {
    let document = Html::parse_document(markup);

    // An empty result page may not carry a header row at all
    let plan = plan_from_document(
        &document,
        query.rows(),
        first_url,
        &query.to_query_string(),
        source,
        selectors,
    )?;

    let headers: Arc<[String]> = headers_from_document(&document, selectors)?.into();
    let first_records = rows_from_document(&document, 0, &headers, plan.effective_cap, selectors)?;
    if let Some(first) = plan.pages.first() {
        first.ensure_complete(first_records.len())?;
    }

    Ok(Bootstrap {
        headers,
        plan,
        first_records,
    })
}

/// A screener session holding the last successful query and its results
pub struct Screener {
    config: Arc<Config>,
    client: Client,
    connector: Connector,
    selectors: Arc<TableSelectors>,
    query: Option<Query>,
    results: Option<ResultSet>,
}

impl Screener {
    /// Creates a session from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Screener)` - Ready to resolve queries
    /// * `Err(ScreenerError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let selectors = TableSelectors::new(&config.markup)?;
        let client = build_http_client(&config.fetcher)?;
        let connector = Connector::from_config(&config.fetcher, &config.retry);

        Ok(Self {
            config: Arc::new(config),
            client,
            connector,
            selectors: Arc::new(selectors),
            query: None,
            results: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The query behind the published results
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    /// The published results of the last successful search
    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    /// Resolves a query without touching the session state
    ///
    /// # Arguments
    ///
    /// * `query` - The query to resolve
    ///
    /// # Returns
    ///
    /// * `Ok(ResultSet)` - Records in row order, bounded by the effective cap
    /// * `Err(ScreenerError::NoResults)` - Nothing matched; only the first page was fetched
    /// * `Err(ScreenerError::PageFailed)` - A page could not be fetched, could not be parsed,
    ///   or served fewer rows than planned
    pub async fn resolve(&self, query: &Query) -> Result<ResultSet> {
        let source = &self.config.source;
        let first_url = Url::parse_with_params(&source.screener_url, query.to_params())?;

        let first_label = format!("page 0 ({})", first_url);
        tracing::info!("Resolving {}", first_url);

        let first_page = self
            .connector
            .retry_policy()
            .run(|| fetch_page(&self.client, &first_url))
            .await
            .map_err(|failure| ScreenerError::PageFailed {
                descriptor: first_label.clone(),
                attempts: failure.attempts,
                source: Box::new(failure.error),
            })?;

        let Bootstrap {
            headers,
            plan,
            first_records,
        } = bootstrap(&first_page, query, &first_url, source, &self.selectors).map_err(
            |error| match error {
                ScreenerError::Parse(_) => ScreenerError::PageFailed {
                    descriptor: first_label,
                    attempts: 1,
                    source: Box::new(error),
                },
                other => other,
            },
        )?;

        tracing::info!(
            "{} row(s) available, reading {} across {} page(s)",
            plan.total_rows,
            plan.effective_cap,
            plan.pages.len()
        );

        let mut records = first_records;

        let remaining: Vec<PageDescriptor> = plan.remaining().to_vec();
        if !remaining.is_empty() {
            let client = self.client.clone();
            let selectors = Arc::clone(&self.selectors);
            let shared_headers = Arc::clone(&headers);
            let row_cap = plan.effective_cap;

            let pages = self
                .connector
                .run(remaining, move |page: PageDescriptor| {
                    let client = client.clone();
                    let selectors = Arc::clone(&selectors);
                    let headers = Arc::clone(&shared_headers);
                    async move {
                        let markup = fetch_page(&client, &page.url).await?;
                        let rows = parse_rows(&markup, page.index, &headers, row_cap, &selectors)?;
                        page.ensure_complete(rows.len())?;
                        tracing::debug!("{} yielded {} row(s)", page, rows.len());
                        Ok::<_, ScreenerError>(rows)
                    }
                })
                .await?;

            records.extend(pages.into_iter().flatten());
        }

        // Every page served at least its planned rows
        records.truncate(plan.effective_cap);

        Ok(ResultSet::new(
            headers,
            records,
            plan.total_rows,
            plan.effective_cap,
        ))
    }

    /// Resolves a query and publishes it with its results
    ///
    /// On failure the previously published query and results are kept.
    pub async fn search(&mut self, query: Query) -> Result<&ResultSet> {
        let results = self.resolve(&query).await?;
        self.query = Some(query);
        Ok(&*self.results.insert(results))
    }

    /// Narrows the current query and searches again
    ///
    /// Tickers and filters are appended to the current query, the other fields
    /// overwritten. Without a current query the update applies to [`Query::default`].
    pub async fn refine(&mut self, update: QueryUpdate) -> Result<&ResultSet> {
        let query = self.query.clone().unwrap_or_default().merge(&update)?;
        self.search(query).await
    }

    /// Downloads a chart for every ticker in the published results
    ///
    /// Returns the written file paths in row order; empty when nothing has been
    /// published yet.
    pub async fn download_charts(
        &self,
        options: &ChartOptions,
        dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let Some(results) = &self.results else {
            tracing::debug!("No published results; skipping chart download");
            return Ok(Vec::new());
        };

        let requests = charts::chart_requests_for(&self.config.source.chart_url, results, options)?;
        charts::download_charts(&self.client, &self.connector, requests, dir).await
    }
}
