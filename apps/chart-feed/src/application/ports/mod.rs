//! Application Ports
//!
//! Interfaces between the scheduling core and the outside world. The
//! scheduler and registry depend on these abstractions rather than on the
//! concrete HTTP adapter, which keeps the refresh machinery testable with
//! scripted fetchers.

use async_trait::async_trait;

use crate::domain::error::FetchError;
use crate::domain::request::{TimeInterval, TimeRange};
use crate::domain::series::ChartSeries;
use crate::domain::symbol::Symbol;

/// Port for fetching one cleaned chart series per call.
///
/// Implementations perform exactly one remote call per invocation and never
/// retry internally; retry cadence and backoff belong to the scheduler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChartFetcher: Send + Sync {
    /// Fetch and normalize the chart for `symbol` over `range` at `interval`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing the transport, decode, or
    /// empty-data failure; the error always names the symbol.
    async fn fetch(
        &self,
        symbol: &Symbol,
        range: TimeRange,
        interval: TimeInterval,
    ) -> Result<ChartSeries, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::{RawQuotePoint, SeriesMeta, normalize};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn mock_fetcher_satisfies_the_port() {
        let mut mock = MockChartFetcher::new();
        mock.expect_fetch().returning(|symbol, _, _| {
            let point = RawQuotePoint {
                timestamp: Utc.timestamp_opt(100, 0).unwrap(),
                open: Some(1.0),
                high: Some(2.0),
                low: Some(0.5),
                close: Some(1.5),
                volume: Some(10),
            };
            normalize(symbol.clone(), SeriesMeta::default(), &[point])
        });

        let series = mock
            .fetch(
                &Symbol::new("AAPL"),
                TimeRange::OneDay,
                TimeInterval::TwoMinutes,
            )
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
    }
}
