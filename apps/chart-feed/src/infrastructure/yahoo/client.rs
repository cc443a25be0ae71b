//! HTTP chart fetch client.
//!
//! Performs exactly one GET per `fetch` invocation and maps transport
//! failures onto the [`FetchError`] taxonomy. Retries are deliberately not
//! implemented here; cadence and backoff are the scheduler's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::application::ports::ChartFetcher;
use crate::domain::error::FetchError;
use crate::domain::request::{TimeInterval, TimeRange};
use crate::domain::series::{ChartSeries, normalize};
use crate::domain::symbol::Symbol;
use crate::infrastructure::config::ProviderSettings;
use crate::infrastructure::metrics;

use super::payload::parse_chart;

/// Cap on provider error bodies carried inside a `FetchError`.
const MAX_ERROR_BODY_LEN: usize = 256;

/// Error building the underlying HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("failed to build HTTP client: {0}")]
pub struct ClientBuildError(String);

/// Chart fetch client for a Yahoo-Finance-shaped provider.
#[derive(Debug, Clone)]
pub struct YahooChartClient {
    client: Client,
    base_url: String,
}

impl YahooChartClient {
    /// Create a client from provider settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ClientBuildError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The configured base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChartFetcher for YahooChartClient {
    async fn fetch(
        &self,
        symbol: &Symbol,
        range: TimeRange,
        interval: TimeInterval,
    ) -> Result<ChartSeries, FetchError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol.as_str());

        let response = self
            .client
            .get(&url)
            .query(&[("range", range.as_str()), ("interval", interval.as_str())])
            .send()
            .await
            .map_err(|e| network_failure(symbol, &e))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::RateLimited {
                symbol: symbol.clone(),
                message: non_empty(truncate(&body)),
                retry_after,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::NetworkFailure {
                symbol: symbol.clone(),
                message: Some(format!("HTTP {status}: {}", truncate(&body))),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| network_failure(symbol, &e))?;

        let (points, meta) = parse_chart(symbol, &body)?;
        let series = normalize(symbol.clone(), meta, &points)?;

        let dropped = points.len() - series.len();
        if dropped > 0 {
            metrics::record_rows_dropped(dropped);
            tracing::debug!(
                symbol = %symbol,
                dropped,
                kept = series.len(),
                "Dropped incomplete chart rows"
            );
        }

        Ok(series)
    }
}

fn network_failure(symbol: &Symbol, error: &reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        format!("request timed out: {error}")
    } else {
        error.to_string()
    };
    FetchError::NetworkFailure {
        symbol: symbol.clone(),
        message: Some(message),
    }
}

/// Numeric `Retry-After` header, when present and parseable.
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        body.to_string()
    } else {
        let mut end = MAX_ERROR_BODY_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_bodies_alone() {
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn truncate_caps_long_bodies() {
        let long = "x".repeat(1024);
        let capped = truncate(&long);
        assert!(capped.len() <= MAX_ERROR_BODY_LEN + 3);
        assert!(capped.ends_with("..."));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "\u{20ac}".repeat(200); // 3 bytes each, boundary falls mid-char
        let capped = truncate(&long);
        assert!(capped.ends_with("..."));
    }

    #[test]
    fn non_empty_filters_blank_strings() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("   ".to_string()), None);
        assert_eq!(non_empty("detail".to_string()), Some("detail".to_string()));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let settings = ProviderSettings {
            base_url: "https://example.test/".to_string(),
            ..ProviderSettings::default()
        };
        let client = YahooChartClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "https://example.test");
    }
}
