use serde::Deserialize;

/// Main configuration structure for Screener-Harvest
///
/// Every section is optional; missing sections and keys fall back to the defaults
/// that match the public screener.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub markup: MarkupConfig,
}

/// Remote endpoint and pagination layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SourceConfig {
    /// Endpoint serving the paginated screener table
    pub screener_url: String,

    /// Endpoint serving per-ticker chart images
    pub chart_url: String,

    /// Number of data rows the source renders per page
    pub rows_per_page: usize,

    /// Query parameter carrying the 1-based offset of a page's first row
    pub offset_param: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            screener_url: "https://finviz.com/screener.ashx".to_string(),
            chart_url: "https://finviz.com/chart.ashx".to_string(),
            rows_per_page: 20,
            offset_param: "r".to_string(),
        }
    }
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Maximum number of page requests in flight at once
    pub max_concurrent_requests: usize,

    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 5,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (compatible; screener-harvest/0.1)".to_string(),
        }
    }
}

/// Retry envelope for transient fetch failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Total attempts per request, including the first one
    pub max_attempts: usize,

    /// Delay before the first retry (milliseconds), doubled on each further retry
    pub base_delay_ms: u64,

    /// Upper bound for a single retry delay (milliseconds)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

/// CSS selectors describing the screener table markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MarkupConfig {
    pub header_row: String,
    pub header_cell: String,
    pub data_row: String,
    pub data_cell: String,
    pub fallback: String,
    pub icon: String,
    pub total_count: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            header_row: r#"tr[valign="middle"]"#.to_string(),
            header_cell: "td".to_string(),
            data_row: r#"tr[valign="top"]"#.to_string(),
            data_cell: "a".to_string(),
            fallback: "span".to_string(),
            icon: "img".to_string(),
            total_count: "td.count-text".to_string(),
        }
    }
}
