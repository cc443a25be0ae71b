//! Chart series types and normalization.
//!
//! The provider reports parallel arrays in which any individual field may
//! be null (a half-formed bar during market open, a venue outage, a
//! just-listed symbol). Normalization keeps only rows where every field is
//! present, because a bar missing its close is not trustworthy enough to
//! chart; partial rows are dropped whole, never interpolated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::FetchError;
use crate::domain::symbol::Symbol;

// =============================================================================
// Raw Points
// =============================================================================

/// One upstream sample, field-for-field as the provider reported it.
///
/// Index `i` of the parsed point sequence corresponds to index `i` of the
/// provider's timestamp array; missing quote values stay `None` rather than
/// shortening the sequence, preserving alignment for normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawQuotePoint {
    /// Sample instant (converted from provider epoch seconds).
    pub timestamp: DateTime<Utc>,
    /// Opening price, if reported.
    pub open: Option<f64>,
    /// High price, if reported.
    pub high: Option<f64>,
    /// Low price, if reported.
    pub low: Option<f64>,
    /// Closing price, if reported.
    pub close: Option<f64>,
    /// Traded volume, if reported.
    pub volume: Option<u64>,
}

impl RawQuotePoint {
    /// Whether every field is present and every price is finite.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_some_and(f64::is_finite)) && self.volume.is_some()
    }
}

// =============================================================================
// Series Metadata
// =============================================================================

/// Optional provider metadata attached to a series.
///
/// Everything here is best-effort: the pipeline tolerates a payload with no
/// metadata at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesMeta {
    /// Previous session's close, for change-since-close displays.
    pub previous_close: Option<f64>,
    /// ISO currency code the prices are quoted in.
    pub currency: Option<String>,
    /// Exchange timezone name (e.g. "America/New_York").
    pub exchange_timezone: Option<String>,
}

/// Display glyph for a quote currency code, for the subset of currencies
/// the widgets are expected to meet. Unknown codes return `None`; callers
/// fall back to showing the code itself.
#[must_use]
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    let glyph = match code.to_ascii_uppercase().as_str() {
        "USD" => "$",
        "CAD" => "CA$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{a3}",
        "CHF" => "CHF",
        "JPY" | "CNY" => "\u{a5}",
        "HKD" => "HK$",
        "KRW" => "\u{20a9}",
        "INR" => "\u{20b9}",
        "AUD" => "A$",
        "NZD" => "NZ$",
        "SGD" => "S$",
        "SEK" | "NOK" | "DKK" => "kr",
        "BRL" => "R$",
        "ZAR" => "R",
        "TRY" => "\u{20ba}",
        "ILS" => "\u{20aa}",
        "BTC" => "\u{20bf}",
        "ETH" => "\u{039e}",
        _ => return None,
    };
    Some(glyph)
}

// =============================================================================
// Chart Series
// =============================================================================

/// A cleaned, strictly aligned OHLCV series for one symbol.
///
/// All five sequences have identical length and the length is never zero:
/// a fetch whose cleaned output would be empty fails with
/// [`FetchError::EmptyResult`] instead. A series is immutable once built
/// (only [`normalize`] constructs one); each successful refresh produces a
/// fresh series that supersedes, never mutates, its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    symbol: Symbol,
    meta: SeriesMeta,
    timestamps: Vec<DateTime<Utc>>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<u64>,
}

impl ChartSeries {
    /// Symbol this series belongs to.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Provider metadata captured with the series.
    #[must_use]
    pub const fn meta(&self) -> &SeriesMeta {
        &self.meta
    }

    /// Number of points. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Always false; kept so `len` satisfies the usual pairing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sample instants, non-decreasing in provider order.
    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Opening prices.
    #[must_use]
    pub fn open(&self) -> &[f64] {
        &self.open
    }

    /// High prices.
    #[must_use]
    pub fn high(&self) -> &[f64] {
        &self.high
    }

    /// Low prices.
    #[must_use]
    pub fn low(&self) -> &[f64] {
        &self.low
    }

    /// Closing prices.
    #[must_use]
    pub fn close(&self) -> &[f64] {
        &self.close
    }

    /// Traded volumes.
    #[must_use]
    pub fn volume(&self) -> &[u64] {
        &self.volume
    }

    /// The most recent close, i.e. the price a widget headline shows.
    #[must_use]
    pub fn last_close(&self) -> f64 {
        self.close[self.close.len() - 1]
    }

    /// Derive summary statistics over the series.
    #[must_use]
    pub fn summary(&self) -> SeriesSummary {
        let min_low = self.low.iter().copied().fold(f64::INFINITY, f64::min);
        let max_high = self.high.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_close = self.close.iter().sum::<f64>() / self.close.len() as f64;
        let total_volume = self.volume.iter().sum();

        SeriesSummary {
            points: self.len(),
            min_low,
            max_high,
            mean_close,
            total_volume,
            first_timestamp: self.timestamps[0],
            last_timestamp: self.timestamps[self.timestamps.len() - 1],
        }
    }
}

/// Summary statistics derived from a cleaned series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    /// Number of surviving points.
    pub points: usize,
    /// Minimum of the low prices.
    pub min_low: f64,
    /// Maximum of the high prices.
    pub max_high: f64,
    /// Mean of the closing prices.
    pub mean_close: f64,
    /// Sum of the volumes.
    pub total_volume: u64,
    /// First sample instant.
    pub first_timestamp: DateTime<Utc>,
    /// Last sample instant.
    pub last_timestamp: DateTime<Utc>,
}

// =============================================================================
// Normalization
// =============================================================================

/// Clean a parsed point sequence into a [`ChartSeries`].
///
/// A point survives only if all of open, high, low, close, and volume are
/// present (and the prices finite). Surviving points keep their original
/// relative order; nothing is re-sorted or interpolated.
///
/// When the provider omitted a previous close, the first surviving open
/// stands in for it, matching what the widgets previously displayed.
///
/// # Errors
///
/// Returns [`FetchError::EmptyResult`] when no point survives filtering.
pub fn normalize(
    symbol: Symbol,
    mut meta: SeriesMeta,
    points: &[RawQuotePoint],
) -> Result<ChartSeries, FetchError> {
    let mut timestamps = Vec::new();
    let mut open = Vec::new();
    let mut high = Vec::new();
    let mut low = Vec::new();
    let mut close = Vec::new();
    let mut volume = Vec::new();

    for point in points.iter().filter(|p| p.is_complete()) {
        timestamps.push(point.timestamp);
        // is_complete guarantees every field below is present
        open.extend(point.open);
        high.extend(point.high);
        low.extend(point.low);
        close.extend(point.close);
        volume.extend(point.volume);
    }

    if timestamps.is_empty() {
        return Err(FetchError::EmptyResult {
            symbol,
            message: None,
        });
    }

    if meta.previous_close.is_none() {
        meta.previous_close = open.first().copied();
    }

    Ok(ChartSeries {
        symbol,
        meta,
        timestamps,
        open,
        high,
        low,
        close,
        volume,
    })
}

// =============================================================================
// Tests
// =============================================================================
