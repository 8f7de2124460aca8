//! HTTP fetcher for screener pages and chart images
//!
//! This module handles:
//! - Building the HTTP client from the fetcher configuration
//! - GET requests for page markup and raw bytes
//! - Classifying failures into timeouts, throttling, bad statuses and transport errors

use crate::config::FetcherConfig;
use crate::{Result, ScreenerError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use screener_harvest::config::FetcherConfig;
/// use screener_harvest::screener::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches a page and returns its body as text
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String> {
    let response = send(client, url).await?;
    response
        .text()
        .await
        .map_err(|e| classify_transport(url, e))
}

/// Fetches a resource and returns its raw body
pub async fn fetch_bytes(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let response = send(client, url).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify_transport(url, e))?;
    Ok(bytes.to_vec())
}

async fn send(client: &Client, url: &Url) -> Result<Response> {
    tracing::debug!("GET {}", url);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_transport(url, e))?;

    check_status(url, response.status())?;
    Ok(response)
}

fn check_status(url: &Url, status: StatusCode) -> Result<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ScreenerError::RateLimited {
            url: url.to_string(),
        });
    }

    if !status.is_success() {
        return Err(ScreenerError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(())
}

fn classify_transport(url: &Url, error: reqwest::Error) -> ScreenerError {
    if error.is_timeout() {
        ScreenerError::Timeout {
            url: url.to_string(),
        }
    } else {
        ScreenerError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
