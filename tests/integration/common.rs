//! Shared fixtures: a screener-like page generator and mock server setup

use screener_harvest::config::Config;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ROWS_PER_PAGE: usize = 20;

/// Creates a configuration pointing at the mock server with fast retries
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.source.screener_url = format!("{}/screener.ashx", server.uri());
    config.source.chart_url = format!("{}/chart.ashx", server.uri());
    config.fetcher.max_concurrent_requests = 4;
    config.fetcher.timeout_secs = 5;
    config.retry.max_attempts = 3;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

pub fn row_html(serial: usize) -> String {
    format!(
        r#"<tr valign="top"><td><a class="screener-link">{n}</a></td><td><a class="screener-link-primary">TK{n}</a></td><td><a class="screener-link">Company {n}</a></td><td><a class="screener-link"><span class="is-green">{n}.00%</span></a></td></tr>"#,
        n = serial
    )
}

/// Renders one screener page holding rows `first..=last` of `total`
pub fn page_html(total: usize, first: usize, last: usize) -> String {
    let rows: String = (first..=last).map(row_html).collect();
    page_with_rows(total, first, &rows)
}

pub fn page_with_rows(total: usize, first: usize, rows: &str) -> String {
    format!(
        r#"<html><body>
<table width="100%"><tr><td class="count-text"><b>Total: </b>{total} #{first}</td></tr></table>
<table width="100%" cellpadding="3" cellspacing="1">
<tr valign="middle" align="center"><td class="table-top">No.</td><td class="table-top-s"><img src="/img/sort_up.gif" alt="Ticker"></td><td class="table-top">Company</td><td class="table-top">Change</td></tr>
<tr valign="top"><td colspan="4"><img src="/img/spacer.gif" width="1" height="1"></td></tr>
{rows}
</table>
</body></html>"#,
        total = total,
        first = first,
        rows = rows
    )
}

/// Renders the page a query with no matches produces
pub fn empty_page_html() -> String {
    r#"<html><body>
<table width="100%"><tr><td class="count-text"><b>Total: </b>0 #0</td></tr></table>
<table width="100%"><tr><td>No results</td></tr></table>
</body></html>"#
        .to_string()
}

pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

/// Mounts one mock per page for a search matching `total` rows
///
/// Offset pages are mounted before the first page so the more specific matcher wins.
pub async fn mount_pages(server: &MockServer, total: usize) {
    for offset in (ROWS_PER_PAGE + 1..=total).step_by(ROWS_PER_PAGE) {
        let last = (offset + ROWS_PER_PAGE - 1).min(total);
        Mock::given(method("GET"))
            .and(path("/screener.ashx"))
            .and(query_param("r", offset.to_string()))
            .respond_with(html(page_html(total, offset, last)))
            .mount(server)
            .await;
    }

    mount_first_page(server, total).await;
}

pub async fn mount_first_page(server: &MockServer, total: usize) {
    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .respond_with(html(page_html(total, 1, ROWS_PER_PAGE.min(total))))
        .mount(server)
        .await;
}

/// Requests the server received for screener pages
pub async fn screener_requests(server: &MockServer) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/screener.ashx")
        .collect()
}

pub fn offset_of(request: &wiremock::Request) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == "r")
        .map(|(_, value)| value.into_owned())
}
