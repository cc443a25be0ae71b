//! Chart payload models and decoding.
//!
//! The provider envelope:
//!
//! ```json
//! {
//!   "chart": {
//!     "result": [{
//!       "meta": { "currency": "USD", "chartPreviousClose": 189.7, ... },
//!       "timestamp": [1700000000, 1700000120, ...],
//!       "indicators": {
//!         "quote": [{
//!           "open":   [189.1, null, ...],
//!           "high":   [189.9, null, ...],
//!           "low":    [188.7, null, ...],
//!           "close":  [189.4, null, ...],
//!           "volume": [120000, null, ...]
//!         }]
//!       }
//!     }],
//!     "error": null
//!   }
//! }
//! ```
//!
//! Decoding keeps index alignment: output point `i` always corresponds to
//! timestamp `i`, with absent quote values as `None`. Missing metadata and
//! a missing quote block are tolerated; a missing result record is not.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::domain::error::FetchError;
use crate::domain::series::{RawQuotePoint, SeriesMeta};
use crate::domain::symbol::Symbol;

// =============================================================================
// Envelope Models
// =============================================================================

/// Top-level chart response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    /// The chart body.
    pub chart: ChartBody,
}

/// Result-or-error body of the envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    /// Result records; the first one carries the requested series.
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    /// Provider-reported error, mutually exclusive with `result` in practice.
    #[serde(default)]
    pub error: Option<ProviderError>,
}

/// Provider-reported error record.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderError {
    /// Machine-readable code (e.g. "Not Found").
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

/// One result record: metadata, timestamps, and quote indicators.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    /// Series metadata; optional and tolerated when absent.
    #[serde(default)]
    pub meta: Option<PayloadMeta>,
    /// Sample instants as epoch seconds; absent for empty windows.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    /// Quote indicator arrays.
    #[serde(default)]
    pub indicators: Option<Indicators>,
}

/// Series metadata as reported by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadMeta {
    /// ISO currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Previous session close used for chart change displays.
    #[serde(default, rename = "chartPreviousClose")]
    pub chart_previous_close: Option<f64>,
    /// Exchange timezone name.
    #[serde(default, rename = "exchangeTimezoneName")]
    pub exchange_timezone_name: Option<String>,
}

/// Indicator container; only the quote block is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    /// Parallel OHLCV arrays, one block per requested indicator set.
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
}

/// Parallel optional OHLCV arrays aligned to the timestamp array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteBlock {
    /// Opening prices.
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    /// High prices.
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    /// Low prices.
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    /// Closing prices.
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    /// Traded volumes.
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a raw payload body into aligned quote points plus metadata.
///
/// # Errors
///
/// Returns [`FetchError::ParseFailure`] when the body is not valid JSON of
/// the expected shape, the provider reported an error record, the result
/// record is missing, or a timestamp does not map to a valid instant.
pub fn parse_chart(
    symbol: &Symbol,
    body: &str,
) -> Result<(Vec<RawQuotePoint>, SeriesMeta), FetchError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| parse_failure(symbol, e.to_string()))?;

    if let Some(error) = envelope.chart.error {
        let detail = match (error.code, error.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(code), None) => code,
            (None, Some(description)) => description,
            (None, None) => "provider reported an unspecified error".to_string(),
        };
        return Err(parse_failure(symbol, detail));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.swap_remove(0))
            }
        })
        .ok_or_else(|| parse_failure(symbol, "payload has no result record".to_string()))?;

    let quote = result
        .indicators
        .and_then(|indicators| indicators.quote.into_iter().next())
        .unwrap_or_default();

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (i, &epoch) in result.timestamp.iter().enumerate() {
        let timestamp = instant_from_epoch(epoch)
            .ok_or_else(|| parse_failure(symbol, format!("timestamp {epoch} is out of range")))?;
        points.push(RawQuotePoint {
            timestamp,
            open: nth(&quote.open, i),
            high: nth(&quote.high, i),
            low: nth(&quote.low, i),
            close: nth(&quote.close, i),
            volume: nth(&quote.volume, i),
        });
    }

    let meta = result.meta.unwrap_or_default();
    let meta = SeriesMeta {
        previous_close: meta.chart_previous_close,
        currency: meta.currency,
        exchange_timezone: meta.exchange_timezone_name,
    };

    Ok((points, meta))
}

fn parse_failure(symbol: &Symbol, message: String) -> FetchError {
    FetchError::ParseFailure {
        symbol: symbol.clone(),
        message: Some(message),
    }
}

fn instant_from_epoch(epoch: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(epoch, 0).single()
}

/// Element `i` of a quote array, `None` when the array is short or the
/// element is null. Short arrays must not shorten the point sequence.
fn nth<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn symbol() -> Symbol {
        Symbol::new("AAPL")
    }

    #[test]
    fn decodes_a_full_payload() {
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": {
                        "currency": "USD",
                        "chartPreviousClose": 189.7,
                        "exchangeTimezoneName": "America/New_York"
                    },
                    "timestamp": [100, 160, 220],
                    "indicators": {
                        "quote": [{
                            "open":   [1.0, 2.0, 3.0],
                            "high":   [1.5, 2.5, 3.5],
                            "low":    [0.5, 1.5, 2.5],
                            "close":  [1.2, 2.2, 3.2],
                            "volume": [10, 20, 30]
                        }]
                    }
                }],
                "error": null
            }
        }"#;

        let (points, meta) = parse_chart(&symbol(), body).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].timestamp, Utc.timestamp_opt(100, 0).unwrap());
        assert_eq!(points[2].close, Some(3.2));
        assert_eq!(points[1].volume, Some(20));
        assert_eq!(meta.previous_close, Some(189.7));
        assert_eq!(meta.currency.as_deref(), Some("USD"));
        assert_eq!(meta.exchange_timezone.as_deref(), Some("America/New_York"));
    }

    #[test]
    fn nulls_preserve_index_alignment() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [100, 160, 220],
                    "indicators": {
                        "quote": [{
                            "open":   [1.0, 2.0, 3.0],
                            "high":   [1.5, 2.5, 3.5],
                            "low":    [0.5, 1.5, 2.5],
                            "close":  [1.2, null, 3.2],
                            "volume": [10, 20, 30]
                        }]
                    }
                }]
            }
        }"#;

        let (points, _) = parse_chart(&symbol(), body).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[1].close, None);
        assert_eq!(points[1].open, Some(2.0));
        assert_eq!(points[2].close, Some(3.2));
    }

    #[test]
    fn short_quote_arrays_pad_with_none() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [100, 160, 220],
                    "indicators": {
                        "quote": [{
                            "open":   [1.0],
                            "high":   [1.5, 2.5],
                            "low":    [],
                            "close":  [1.2, 2.2, 3.2],
                            "volume": [10, 20, 30]
                        }]
                    }
                }]
            }
        }"#;

        let (points, _) = parse_chart(&symbol(), body).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[1].open, None);
        assert_eq!(points[1].high, Some(2.5));
        assert_eq!(points[2].low, None);
        assert_eq!(points[2].close, Some(3.2));
    }

    #[test]
    fn missing_result_is_a_parse_failure() {
        let body = r#"{"chart": {"result": null, "error": null}}"#;
        let err = parse_chart(&symbol(), body).unwrap_err();
        assert!(matches!(err, FetchError::ParseFailure { .. }));
    }

    #[test]
    fn empty_result_list_is_a_parse_failure() {
        let body = r#"{"chart": {"result": [], "error": null}}"#;
        let err = parse_chart(&symbol(), body).unwrap_err();
        assert!(matches!(err, FetchError::ParseFailure { .. }));
    }

    #[test]
    fn provider_error_record_is_a_parse_failure_with_detail() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;

        let err = parse_chart(&symbol(), body).unwrap_err();
        assert!(matches!(err, FetchError::ParseFailure { .. }));
        let message = err.provider_message().unwrap_or_default();
        assert!(message.contains("Not Found"));
        assert!(message.contains("delisted"));
    }

    #[test]
    fn invalid_json_is_a_parse_failure() {
        let err = parse_chart(&symbol(), "not json at all").unwrap_err();
        assert!(matches!(err, FetchError::ParseFailure { .. }));
        assert_eq!(err.symbol().as_str(), "AAPL");
    }

    #[test]
    fn non_numeric_price_is_a_parse_failure() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [100],
                    "indicators": {"quote": [{"open": ["not-a-number"]}]}
                }]
            }
        }"#;

        let err = parse_chart(&symbol(), body).unwrap_err();
        assert!(matches!(err, FetchError::ParseFailure { .. }));
    }

    #[test]
    fn missing_quote_block_yields_all_none_points() {
        let body = r#"{
            "chart": {
                "result": [{"timestamp": [100, 160]}]
            }
        }"#;

        let (points, _) = parse_chart(&symbol(), body).unwrap();

        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| !p.is_complete()));
    }

    #[test]
    fn empty_timestamp_array_yields_no_points() {
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": {"currency": "USD"},
                    "indicators": {"quote": [{}]}
                }]
            }
        }"#;

        let (points, meta) = parse_chart(&symbol(), body).unwrap();

        assert!(points.is_empty());
        assert_eq!(meta.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn out_of_range_timestamp_is_a_parse_failure() {
        let body = r#"{
            "chart": {
                "result": [{"timestamp": [9223372036854775807]}]
            }
        }"#;

        let err = parse_chart(&symbol(), body).unwrap_err();
        assert!(matches!(err, FetchError::ParseFailure { .. }));
    }
}
