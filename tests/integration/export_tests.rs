//! Export and chart download tests

use crate::common::{mount_pages, test_config};
use screener_harvest::output::{CsvExporter, Exporter, SqliteExporter};
use screener_harvest::screener::{ChartOptions, ChartPeriod};
use screener_harvest::{Query, Screener};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[tokio::test]
async fn test_csv_export() {
    let server = MockServer::start().await;
    mount_pages(&server, 25).await;

    let mut screener = Screener::new(test_config(&server)).unwrap();
    let results = screener.search(Query::new()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let exporter = CsvExporter::new(dir.path().join("screener.csv"));
    exporter.export(results).unwrap();

    let text = std::fs::read_to_string(exporter.path()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 26);
    assert_eq!(lines[0], "No.,Ticker,Company,Change");
    assert_eq!(lines[25], "25,TK25,Company 25,25.00%");
}

#[tokio::test]
async fn test_sqlite_export() {
    let server = MockServer::start().await;
    mount_pages(&server, 25).await;

    let mut screener = Screener::new(test_config(&server)).unwrap();
    let results = screener
        .search(Query::builder().rows(22).build().unwrap())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let exporter = SqliteExporter::new(dir.path().join("screener.sqlite"));
    exporter.export(results).unwrap();

    let conn = rusqlite::Connection::open(exporter.path()).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM screener_results", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 22);

    let ticker: String = conn
        .query_row(
            "SELECT \"Ticker\" FROM screener_results WHERE \"No.\" = '22'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(ticker, "TK22");

    let (rows, total): (i64, i64) = conn
        .query_row("SELECT row_count, total_rows FROM exports", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!((rows, total), (22, 25));
}

#[tokio::test]
async fn test_chart_download() {
    let server = MockServer::start().await;
    mount_pages(&server, 3).await;

    Mock::given(method("GET"))
        .and(path("/chart.ashx"))
        .and(query_param("p", "w"))
        .and(query_param("ta", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_MAGIC.to_vec(), "image/png"))
        .expect(3)
        .mount(&server)
        .await;

    let mut screener = Screener::new(test_config(&server)).unwrap();
    screener.search(Query::new()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let options = ChartOptions {
        period: ChartPeriod::Weekly,
        ..ChartOptions::default()
    };
    let paths = screener.download_charts(&options, dir.path()).await.unwrap();

    let names: Vec<_> = paths
        .iter()
        .filter_map(|p| p.file_name())
        .filter_map(|n| n.to_str())
        .collect();
    assert_eq!(names, ["TK1.png", "TK2.png", "TK3.png"]);
    for path in &paths {
        assert_eq!(std::fs::read(path).unwrap(), PNG_MAGIC);
    }

    let tickers: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/chart.ashx")
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "t")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(tickers.len(), 3);
    assert!(tickers.contains(&"TK2".to_string()));
}

#[tokio::test]
async fn test_chart_download_without_results() {
    let server = MockServer::start().await;
    let screener = Screener::new(test_config(&server)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths = screener
        .download_charts(&ChartOptions::default(), dir.path())
        .await
        .unwrap();
    assert!(paths.is_empty());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
