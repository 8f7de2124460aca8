use crate::config::types::{Config, FetcherConfig, MarkupConfig, RetryConfig, SourceConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_retry_config(&config.retry)?;
    validate_markup_config(&config.markup)?;
    Ok(())
}

/// Validates endpoint and pagination settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_endpoint("screener_url", &config.screener_url)?;
    validate_endpoint("chart_url", &config.chart_url)?;

    if config.rows_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "rows_per_page must be >= 1, got {}",
            config.rows_per_page
        )));
    }

    if config.offset_param.is_empty() {
        return Err(ConfigError::Validation(
            "offset_param cannot be empty".to_string(),
        ));
    }

    if ["v", "t", "f", "o", "s"].contains(&config.offset_param.as_str()) {
        return Err(ConfigError::Validation(format!(
            "offset_param '{}' collides with a query parameter",
            config.offset_param
        )));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 32, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry envelope
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.max_delay_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms ({}) must not be smaller than base_delay_ms ({})",
            config.max_delay_ms, config.base_delay_ms
        )));
    }

    Ok(())
}

/// Validates that every markup selector compiles
fn validate_markup_config(config: &MarkupConfig) -> Result<(), ConfigError> {
    for (name, selector) in [
        ("header_row", &config.header_row),
        ("header_cell", &config.header_cell),
        ("data_row", &config.data_row),
        ("data_cell", &config.data_cell),
        ("fallback", &config.fallback),
        ("icon", &config.icon),
        ("total_count", &config.total_count),
    ] {
        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidSelector(format!("{} = '{}': {:?}", name, selector, e))
        })?;
    }

    Ok(())
}

/// Validates that an endpoint is an absolute HTTP(S) URL
fn validate_endpoint(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            name, value
        )));
    }

    Ok(())
}
