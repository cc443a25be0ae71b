//! Fetch pipeline error taxonomy.
//!
//! Every failure in the fetch-and-normalize pipeline collapses into one of
//! four variants, each carrying the symbol it originated from so schedulers
//! can log and count failures without extra context. None of these are
//! fatal: the scheduler for the symbol keeps its cadence and retries on the
//! next tick.

use std::time::Duration;

use thiserror::Error;

use crate::domain::symbol::Symbol;

/// Errors produced while fetching and cleaning a chart series.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Transport-level failure: timeout, refused connection, or a non-2xx
    /// response that is not a rate limit.
    #[error("network failure while fetching {symbol}")]
    NetworkFailure {
        /// Symbol the failed request was for.
        symbol: Symbol,
        /// Transport or provider detail, when available.
        message: Option<String>,
    },

    /// The payload could not be decoded into the expected chart shape.
    #[error("unparseable chart payload for {symbol}")]
    ParseFailure {
        /// Symbol the failed request was for.
        symbol: Symbol,
        /// Decoder or provider detail, when available.
        message: Option<String>,
    },

    /// The provider answered but no row survived cleaning.
    ///
    /// This is a deliberate sentinel: a zero-length series is never stored,
    /// so callers can tell "provider has no data for this symbol/range"
    /// apart from a transient empty tick.
    #[error("no usable chart data for {symbol}")]
    EmptyResult {
        /// Symbol the empty response was for.
        symbol: Symbol,
        /// Provider detail, when available.
        message: Option<String>,
    },

    /// The provider reported a rate limit.
    #[error("rate limited while fetching {symbol}")]
    RateLimited {
        /// Symbol the throttled request was for.
        symbol: Symbol,
        /// Provider detail, when available.
        message: Option<String>,
        /// Provider-suggested wait before retrying, when advertised.
        retry_after: Option<Duration>,
    },
}

impl FetchError {
    /// Symbol this error originated from.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        match self {
            Self::NetworkFailure { symbol, .. }
            | Self::ParseFailure { symbol, .. }
            | Self::EmptyResult { symbol, .. }
            | Self::RateLimited { symbol, .. } => symbol,
        }
    }

    /// Provider-supplied detail, when any was captured.
    #[must_use]
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            Self::NetworkFailure { message, .. }
            | Self::ParseFailure { message, .. }
            | Self::EmptyResult { message, .. }
            | Self::RateLimited { message, .. } => message.as_deref(),
        }
    }

    /// Stable kind label for metrics and log fields.
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::NetworkFailure { .. } => FetchErrorKind::Network,
            Self::ParseFailure { .. } => FetchErrorKind::Parse,
            Self::EmptyResult { .. } => FetchErrorKind::Empty,
            Self::RateLimited { .. } => FetchErrorKind::RateLimited,
        }
    }
}

/// Coarse error classification used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Transport failure.
    Network,
    /// Payload decode failure.
    Parse,
    /// Nothing survived cleaning.
    Empty,
    /// Provider throttled the request.
    RateLimited,
}

impl FetchErrorKind {
    /// Stable string form for metric labels and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parse => "parse",
            Self::Empty => "empty",
            Self::RateLimited => "rate_limited",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_exposes_symbol() {
        let err = FetchError::ParseFailure {
            symbol: Symbol::new("AAPL"),
            message: Some("missing result".to_string()),
        };
        assert_eq!(err.symbol().as_str(), "AAPL");
        assert_eq!(err.provider_message(), Some("missing result"));
    }

    #[test]
    fn error_kind_labels_are_stable() {
        assert_eq!(FetchErrorKind::Network.as_str(), "network");
        assert_eq!(FetchErrorKind::Parse.as_str(), "parse");
        assert_eq!(FetchErrorKind::Empty.as_str(), "empty");
        assert_eq!(FetchErrorKind::RateLimited.as_str(), "rate_limited");
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let err = FetchError::RateLimited {
            symbol: Symbol::new("MSFT"),
            message: None,
            retry_after: Some(Duration::from_secs(120)),
        };
        assert_eq!(err.kind(), FetchErrorKind::RateLimited);
        match err {
            FetchError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(120)));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn display_names_the_symbol() {
        let err = FetchError::EmptyResult {
            symbol: Symbol::new("BADTICKER"),
            message: None,
        };
        assert!(format!("{err}").contains("BADTICKER"));
    }
}
