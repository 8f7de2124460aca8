//! Screener-Harvest main entry point
//!
//! This is the command-line interface for the Screener-Harvest extractor.

use anyhow::Context;
use clap::Parser;
use screener_harvest::config::{load_config_with_hash, Config};
use screener_harvest::output::{CsvExporter, Exporter, SqliteExporter, DEFAULT_TABLE};
use screener_harvest::screener::{ChartOptions, ChartPeriod, ChartSize, ChartStyle};
use screener_harvest::{Query, Screener};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Screener-Harvest: a paginated stock screener extractor
///
/// Fetches every page of a screener search concurrently and prints the rows as one
/// ordered table. Results can also be exported to CSV or SQLite and the matching
/// charts downloaded.
#[derive(Parser, Debug)]
#[command(name = "screener-harvest")]
#[command(version)]
#[command(about = "A paginated stock screener extractor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Ticker symbols, comma separated (e.g. AAPL,AMD,WMT)
    #[arg(short, long, value_delimiter = ',')]
    tickers: Vec<String>,

    /// Filter tokens, comma separated (e.g. exch_nasd,idx_sp500)
    #[arg(short, long, value_delimiter = ',')]
    filters: Vec<String>,

    /// Table type: Overview, Valuation, Ownership, Performance, Custom, Financial, Technical
    #[arg(long, default_value = "Overview")]
    table: String,

    /// Sort order token (e.g. -price)
    #[arg(short, long, default_value = "")]
    order: String,

    /// Signal token (e.g. n_majornews)
    #[arg(short, long, default_value = "")]
    signal: String,

    /// Maximum number of rows to return (all rows when omitted)
    #[arg(short, long)]
    rows: Option<usize>,

    /// Write the results to a CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write the results to a SQLite database
    #[arg(long, value_name = "PATH")]
    sqlite: Option<PathBuf>,

    /// Table name used for the SQLite export
    #[arg(long, default_value = DEFAULT_TABLE)]
    sqlite_table: String,

    /// Download a chart for every ticker into this directory
    #[arg(long, value_name = "DIR")]
    charts: Option<PathBuf>,

    /// Chart period: d, w or m
    #[arg(long, default_value = "d")]
    chart_period: ChartPeriod,

    /// Chart size: l or s
    #[arg(long, default_value = "l")]
    chart_size: ChartSize,

    /// Chart style: c (candles) or l (lines)
    #[arg(long, default_value = "c")]
    chart_style: ChartStyle,

    /// Hide the technical analysis overlay on charts
    #[arg(long)]
    no_ta: bool,

    /// Do not print the result table
    #[arg(long)]
    no_print: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Err(e) = run(cli, config).await {
        tracing::error!("Screener run failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("screener_harvest=info,warn"),
            1 => EnvFilter::new("screener_harvest=debug,info"),
            2 => EnvFilter::new("screener_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn build_query(cli: &Cli) -> screener_harvest::Result<Query> {
    let mut builder = Query::builder()
        .tickers(cli.tickers.iter().cloned())
        .filters(cli.filters.iter().cloned())
        .table(cli.table.as_str())
        .order(cli.order.as_str())
        .signal(cli.signal.as_str());

    if let Some(rows) = cli.rows {
        builder = builder.rows(rows);
    }

    builder.build()
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    // Checked before the session exists so a bad table never reaches the network
    let query = build_query(&cli)?;
    tracing::debug!("Query:\n{}", query);

    let mut screener = Screener::new(config).context("failed to start screener session")?;
    let results = screener.search(query).await?;

    if !cli.no_print && !cli.quiet {
        print!("{}", results);
    }

    if let Some(path) = &cli.csv {
        CsvExporter::new(path)
            .export(results)
            .with_context(|| format!("CSV export to {} failed", path.display()))?;
    }

    if let Some(path) = &cli.sqlite {
        SqliteExporter::new(path)
            .with_table(cli.sqlite_table.as_str())
            .export(results)
            .with_context(|| format!("SQLite export to {} failed", path.display()))?;
    }

    if let Some(dir) = &cli.charts {
        let options = ChartOptions {
            period: cli.chart_period,
            size: cli.chart_size,
            style: cli.chart_style,
            technical_analysis: !cli.no_ta,
        };
        let paths = screener.download_charts(&options, dir).await?;
        tracing::info!("Saved {} chart(s) to {}", paths.len(), dir.display());
    }

    Ok(())
}
