//! End-to-end search tests against a mocked screener

use crate::common::{
    empty_page_html, html, mount_first_page, mount_pages, offset_of, page_html, page_with_rows,
    row_html, screener_requests, test_config,
};
use screener_harvest::screener::Record;
use screener_harvest::{ParseError, Query, QueryUpdate, Screener, ScreenerError};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn serials(records: &[Record]) -> Vec<usize> {
    records.iter().filter_map(Record::serial).collect()
}

#[tokio::test]
async fn test_two_page_search() {
    let server = MockServer::start().await;
    mount_pages(&server, 1000).await;

    let mut screener = Screener::new(test_config(&server)).unwrap();
    let query = Query::builder()
        .filters(["cap_large"])
        .rows(40)
        .build()
        .unwrap();

    let results = screener.search(query).await.unwrap();

    assert_eq!(results.len(), 40);
    assert_eq!(results.total_rows(), 1000);
    assert_eq!(results.headers()[0], "No.");
    assert_eq!(results.headers()[1], "Ticker");
    assert_eq!(serials(results.records()), (1..=40).collect::<Vec<_>>());
    for record in results {
        assert_eq!(record.keys().collect::<Vec<_>>(), results.headers());
    }
    assert_eq!(results.get(0).and_then(|r| r.get("Change")), Some("1.00%"));

    let requests = screener_requests(&server).await;
    assert_eq!(requests.len(), 2);

    let first = &requests
        .iter()
        .find(|r| offset_of(r).is_none())
        .expect("first page request");
    let params: Vec<(String, String)> = first.url.query_pairs().into_owned().collect();
    let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["v", "t", "f", "o", "s"]);
    assert_eq!(params[0].1, "110");
    assert_eq!(params[2].1, "cap_large");

    let mut offsets: Vec<_> = requests.iter().filter_map(offset_of).collect();
    offsets.sort();
    assert_eq!(offsets, ["21"]);
}

#[tokio::test]
async fn test_all_rows_when_uncapped() {
    let server = MockServer::start().await;
    mount_pages(&server, 45).await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let results = screener.resolve(&Query::new()).await.unwrap();

    assert_eq!(results.len(), 45);
    assert_eq!(results.effective_cap(), 45);
    assert_eq!(serials(results.records()), (1..=45).collect::<Vec<_>>());
    assert_eq!(screener_requests(&server).await.len(), 3);
}

#[tokio::test]
async fn test_cap_below_total() {
    let server = MockServer::start().await;
    mount_pages(&server, 45).await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let query = Query::builder().rows(30).build().unwrap();
    let results = screener.resolve(&query).await.unwrap();

    assert_eq!(results.len(), 30);
    assert_eq!(results.records().last().and_then(Record::serial), Some(30));

    // The third page is never needed
    let offsets: Vec<_> = screener_requests(&server)
        .await
        .iter()
        .filter_map(offset_of)
        .collect();
    assert_eq!(offsets, ["21"]);
}

#[tokio::test]
async fn test_cap_above_total_is_clamped() {
    let server = MockServer::start().await;
    mount_pages(&server, 7).await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let query = Query::builder().rows(500).build().unwrap();
    let results = screener.resolve(&query).await.unwrap();

    assert_eq!(results.len(), 7);
    assert_eq!(results.effective_cap(), 7);
    assert_eq!(screener_requests(&server).await.len(), 1);
}

#[tokio::test]
async fn test_no_results_stops_after_first_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .and(query_param("r", "21"))
        .respond_with(html(page_html(40, 21, 40)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .respond_with(html(empty_page_html()))
        .expect(1)
        .mount(&server)
        .await;

    let mut screener = Screener::new(test_config(&server)).unwrap();
    let query = Query::builder()
        .filters(["sh_price_u1", "fa_pe_o200"])
        .build()
        .unwrap();

    let err = screener.search(query).await.unwrap_err();
    match err {
        ScreenerError::NoResults { query } => {
            assert!(query.contains("f=sh_price_u1%2Cfa_pe_o200"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(screener.results().is_none());
    assert!(screener.query().is_none());
}

#[tokio::test]
async fn test_unknown_table_never_reaches_network() {
    let server = MockServer::start().await;
    mount_pages(&server, 5).await;

    let err = Query::builder().table("Bogus").build().unwrap_err();
    assert!(err.to_string().contains("Bogus"));

    let mut screener = Screener::new(test_config(&server)).unwrap();
    screener.search(Query::new()).await.unwrap();
    let before = screener.results().cloned();

    let err = screener
        .refine(QueryUpdate::new().table("Bogus"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScreenerError::InvalidTableType { ref table } if table == "Bogus"));

    // Only the initial search hit the server and the published state is unchanged
    assert_eq!(screener_requests(&server).await.len(), 1);
    assert_eq!(screener.results().cloned(), before);
    assert_eq!(screener.query(), Some(&Query::new()));
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let server = MockServer::start().await;
    mount_pages(&server, 65).await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let query = Query::builder().rows(50).build().unwrap();

    let first = screener.resolve(&query).await.unwrap();
    let second = screener.resolve(&query).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_delayed_pages_keep_their_order() {
    let server = MockServer::start().await;
    let total = 80;

    // Earlier pages answer slower than later ones
    for (offset, delay_ms) in [(21, 300), (41, 150), (61, 0)] {
        Mock::given(method("GET"))
            .and(path("/screener.ashx"))
            .and(query_param("r", offset.to_string()))
            .respond_with(
                html(page_html(total, offset, offset + 19))
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .mount(&server)
            .await;
    }
    mount_first_page(&server, total).await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let results = screener.resolve(&Query::new()).await.unwrap();

    assert_eq!(serials(results.records()), (1..=80).collect::<Vec<_>>());
    assert_eq!(results.column("Ticker")[20], "TK21");
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .and(query_param("r", "21"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_pages(&server, 40).await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let results = screener.resolve(&Query::new()).await.unwrap();

    assert_eq!(results.len(), 40);
    let offsets: Vec<_> = screener_requests(&server)
        .await
        .iter()
        .filter_map(offset_of)
        .collect();
    assert_eq!(offsets, ["21", "21"]);
}

#[tokio::test]
async fn test_persistent_server_error_fails_the_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .and(query_param("r", "21"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    mount_first_page(&server, 40).await;

    let mut screener = Screener::new(test_config(&server)).unwrap();
    let err = screener.search(Query::new()).await.unwrap_err();

    match err {
        ScreenerError::PageFailed {
            descriptor,
            attempts,
            source,
        } => {
            assert!(descriptor.starts_with("page 1"));
            assert_eq!(attempts, 3);
            assert!(matches!(*source, ScreenerError::HttpStatus { status: 500, .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(screener.results().is_none());
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let err = screener.resolve(&Query::new()).await.unwrap_err();

    match err {
        ScreenerError::PageFailed {
            descriptor,
            attempts,
            ..
        } => {
            assert!(descriptor.starts_with("page 0"));
            assert_eq!(attempts, 1);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_malformed_row_reports_page_and_row() {
    let server = MockServer::start().await;

    let broken_rows = format!(
        "{}{}",
        row_html(21),
        r#"<tr valign="top"><td><a>22</a></td><td><a>TK22</a></td><td><a></a></td><td><a>1%</a></td></tr>"#
    );
    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .and(query_param("r", "21"))
        .respond_with(html(page_with_rows(40, 21, &broken_rows)))
        .expect(1)
        .mount(&server)
        .await;
    mount_first_page(&server, 40).await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let err = screener.resolve(&Query::new()).await.unwrap_err();

    match err {
        ScreenerError::PageFailed { source, .. } => match *source {
            ScreenerError::Parse(parse) => assert_eq!(
                parse,
                ParseError::MissingCellValue {
                    page: 1,
                    row: 1,
                    column: 2
                }
            ),
            other => panic!("unexpected source: {}", other),
        },
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_short_page_fails_the_search() {
    let server = MockServer::start().await;

    // The source reports 40 rows but the second page is empty
    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .and(query_param("r", "21"))
        .respond_with(html(page_with_rows(40, 21, "")))
        .expect(1)
        .mount(&server)
        .await;
    mount_first_page(&server, 40).await;

    let mut screener = Screener::new(test_config(&server)).unwrap();
    let err = screener.search(Query::new()).await.unwrap_err();

    match err {
        ScreenerError::PageFailed {
            descriptor,
            attempts,
            source,
        } => {
            assert!(descriptor.starts_with("page 1"));
            assert!(descriptor.contains("r=21"));
            assert_eq!(attempts, 1);
            assert!(matches!(
                *source,
                ScreenerError::Parse(ParseError::ShortPage {
                    page: 1,
                    expected: 20,
                    found: 0
                })
            ));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(screener.results().is_none());
}

#[tokio::test]
async fn test_first_page_parse_failure_names_the_page() {
    let server = MockServer::start().await;

    let without_header = r#"<html><body>
<table><tr><td class="count-text"><b>Total: </b>12 #1</td></tr></table>
<table><tr valign="top"><td><a>1</a></td><td><a>TK1</a></td></tr></table>
</body></html>"#;
    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .respond_with(html(without_header.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let err = screener.resolve(&Query::new()).await.unwrap_err();

    match err {
        ScreenerError::PageFailed {
            descriptor,
            attempts,
            source,
        } => {
            assert!(descriptor.starts_with("page 0"));
            assert!(descriptor.contains("/screener.ashx?v=110"));
            assert_eq!(attempts, 1);
            assert!(matches!(
                *source,
                ScreenerError::Parse(ParseError::MissingHeaderRow)
            ));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_refine_merges_and_republishes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .and(query_param("v", "140"))
        .and(query_param("f", "cap_large,fa_div_high"))
        .respond_with(html(page_html(3, 1, 3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/screener.ashx"))
        .and(query_param("v", "110"))
        .and(query_param("f", "cap_large"))
        .respond_with(html(page_html(12, 1, 12)))
        .expect(1)
        .mount(&server)
        .await;

    let mut screener = Screener::new(test_config(&server)).unwrap();
    let query = Query::builder().filters(["cap_large"]).build().unwrap();
    assert_eq!(screener.search(query).await.unwrap().len(), 12);

    let results = screener
        .refine(
            QueryUpdate::new()
                .filters(["fa_div_high"])
                .table("Performance"),
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 3);

    let query = screener.query().unwrap();
    assert_eq!(query.filters(), ["cap_large", "fa_div_high"]);
    assert_eq!(query.table().name(), "Performance");
}

#[tokio::test]
async fn test_result_set_renders_as_table() {
    let server = MockServer::start().await;
    mount_pages(&server, 2).await;

    let screener = Screener::new(test_config(&server)).unwrap();
    let results = screener.resolve(&Query::new()).await.unwrap();
    let text = results.to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("No. | Ticker | Company"));
    assert!(lines[1].starts_with("--- | ------ |"));
    assert!(lines[2].starts_with("1   | TK1    | Company 1"));
}
