//! Chart image download for the tickers of a result set
//!
//! Charts are fetched through the same [`Connector`] as screener pages; only the
//! worker differs.

use crate::screener::connector::Connector;
use crate::screener::fetcher::fetch_bytes;
use crate::{Result, ResultSet, ScreenerError};
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Column holding the ticker symbol
pub const TICKER_COLUMN: &str = "Ticker";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid chart {option}: '{value}'")]
pub struct ChartOptionError {
    pub option: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl ChartPeriod {
    pub fn code(&self) -> &'static str {
        match self {
            ChartPeriod::Daily => "d",
            ChartPeriod::Weekly => "w",
            ChartPeriod::Monthly => "m",
        }
    }
}

impl FromStr for ChartPeriod {
    type Err = ChartOptionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "d" | "daily" => Ok(ChartPeriod::Daily),
            "w" | "weekly" => Ok(ChartPeriod::Weekly),
            "m" | "monthly" => Ok(ChartPeriod::Monthly),
            _ => Err(ChartOptionError {
                option: "period",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartSize {
    #[default]
    Large,
    Small,
}

impl ChartSize {
    pub fn code(&self) -> &'static str {
        match self {
            ChartSize::Large => "l",
            ChartSize::Small => "s",
        }
    }
}

impl FromStr for ChartSize {
    type Err = ChartOptionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "l" | "large" => Ok(ChartSize::Large),
            "s" | "small" => Ok(ChartSize::Small),
            _ => Err(ChartOptionError {
                option: "size",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartStyle {
    #[default]
    Candles,
    Lines,
}

impl ChartStyle {
    pub fn code(&self) -> &'static str {
        match self {
            ChartStyle::Candles => "c",
            ChartStyle::Lines => "l",
        }
    }
}

impl FromStr for ChartStyle {
    type Err = ChartOptionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "c" | "candles" => Ok(ChartStyle::Candles),
            "l" | "lines" => Ok(ChartStyle::Lines),
            _ => Err(ChartOptionError {
                option: "style",
                value: s.to_string(),
            }),
        }
    }
}

/// Rendering options sent to the chart endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub period: ChartPeriod,
    pub size: ChartSize,
    pub style: ChartStyle,

    /// Overlay technical analysis on the chart
    pub technical_analysis: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            period: ChartPeriod::default(),
            size: ChartSize::default(),
            style: ChartStyle::default(),
            technical_analysis: true,
        }
    }
}

impl ChartOptions {
    /// Request parameters in wire order: `ty, ta, p, s`
    pub fn to_params(&self) -> [(&'static str, &'static str); 4] {
        [
            ("ty", self.style.code()),
            ("ta", if self.technical_analysis { "1" } else { "0" }),
            ("p", self.period.code()),
            ("s", self.size.code()),
        ]
    }
}

/// One chart to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub ticker: String,
    pub url: Url,
}

impl ChartRequest {
    /// File name the chart is stored under
    pub fn file_name(&self) -> String {
        let stem: String = self
            .ticker
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}.png", stem)
    }
}

impl fmt::Display for ChartRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chart {} ({})", self.ticker, self.url)
    }
}

/// Builds one chart request per ticker, in the given order
pub fn chart_requests<'a, I>(
    chart_url: &str,
    tickers: I,
    options: &ChartOptions,
) -> Result<Vec<ChartRequest>>
where
    I: IntoIterator<Item = &'a str>,
{
    let base = Url::parse_with_params(chart_url, options.to_params())?;

    Ok(tickers
        .into_iter()
        .map(|ticker| {
            let mut url = base.clone();
            url.query_pairs_mut().append_pair("t", ticker);
            ChartRequest {
                ticker: ticker.to_string(),
                url,
            }
        })
        .collect())
}

/// Chart requests for every ticker of a result set
pub fn chart_requests_for(
    chart_url: &str,
    results: &ResultSet,
    options: &ChartOptions,
) -> Result<Vec<ChartRequest>> {
    let tickers = results.column(TICKER_COLUMN);
    if tickers.is_empty() && !results.is_empty() {
        tracing::warn!("Result set has no '{}' column; no charts to fetch", TICKER_COLUMN);
    }
    chart_requests(chart_url, tickers, options)
}

/// Downloads every chart into `dir`, returning the written paths in request order
pub async fn download_charts(
    client: &Client,
    connector: &Connector,
    requests: Vec<ChartRequest>,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let client = client.clone();
    let dir = dir.to_path_buf();
    let count = requests.len();

    let paths = connector
        .run(requests, move |request: ChartRequest| {
            let client = client.clone();
            let path = dir.join(request.file_name());
            async move {
                let image = fetch_bytes(&client, &request.url).await?;
                tokio::fs::write(&path, &image).await?;
                tracing::debug!("Saved {} ({} bytes)", path.display(), image.len());
                Ok::<_, ScreenerError>(path)
            }
        })
        .await?;

    tracing::info!("Downloaded {} chart(s)", count);
    Ok(paths)
}
