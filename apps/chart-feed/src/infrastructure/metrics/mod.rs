//! Prometheus Metrics Module
//!
//! Records fetch and fan-out metrics through the `metrics` facade. With no
//! recorder installed (library use, tests) every call is a no-op; the
//! runner installs a Prometheus recorder at startup and optionally serves
//! it over HTTP.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::error::FetchErrorKind;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus metrics recorder.
///
/// When `port` is non-zero the exporter also serves `/metrics` on that
/// port; this requires a running tokio runtime. Idempotent: later calls
/// return the first handle.
///
/// # Panics
///
/// Panics if the recorder cannot be installed on first call.
#[allow(clippy::expect_used)]
pub fn init_metrics(port: u16) -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = if port == 0 {
                builder
                    .install_recorder()
                    .expect("failed to install Prometheus recorder")
            } else {
                let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
                let (recorder, exporter) = builder
                    .with_http_listener(addr)
                    .build()
                    .expect("failed to build Prometheus exporter");
                let handle = recorder.handle();
                metrics::set_global_recorder(recorder)
                    .expect("failed to install Prometheus recorder");
                tokio::spawn(async move {
                    if let Err(e) = exporter.await {
                        tracing::error!(error = %e, "Prometheus exporter stopped");
                    }
                });
                handle
            };

            register_metrics();
            handle
        })
        .clone()
}

fn register_metrics() {
    describe_counter!(
        "chart_feed_fetches_total",
        "Total chart fetch attempts across all symbols"
    );
    describe_counter!(
        "chart_feed_fetch_failures_total",
        "Total failed chart fetches by error kind"
    );
    describe_counter!(
        "chart_feed_series_published_total",
        "Total chart series published to subscribers"
    );
    describe_counter!(
        "chart_feed_rows_dropped_total",
        "Total incomplete chart rows dropped during normalization"
    );

    describe_gauge!(
        "chart_feed_active_symbols",
        "Number of symbols with a running refresh scheduler"
    );
    describe_gauge!(
        "chart_feed_subscriptions",
        "Number of live widget subscriptions"
    );
}

/// Record one fetch attempt.
pub fn record_fetch_attempt(symbol: &str) {
    counter!("chart_feed_fetches_total", "symbol" => symbol.to_string()).increment(1);
}

/// Record one failed fetch.
pub fn record_fetch_failure(symbol: &str, kind: FetchErrorKind) {
    counter!(
        "chart_feed_fetch_failures_total",
        "symbol" => symbol.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record one published series.
pub fn record_series_published(symbol: &str) {
    counter!("chart_feed_series_published_total", "symbol" => symbol.to_string()).increment(1);
}

/// Record rows dropped by normalization.
pub fn record_rows_dropped(count: usize) {
    counter!("chart_feed_rows_dropped_total").increment(count as u64);
}

/// Update the active-symbol gauge.
pub fn set_active_symbols(count: usize) {
    gauge!("chart_feed_active_symbols").set(count as f64);
}

/// Update the live-subscription gauge.
pub fn set_subscriptions(count: usize) {
    gauge!("chart_feed_subscriptions").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_a_recorder_is_a_noop() {
        // No recorder installed in unit tests; these must not panic.
        record_fetch_attempt("AAPL");
        record_fetch_failure("AAPL", FetchErrorKind::Network);
        record_series_published("AAPL");
        record_rows_dropped(3);
        set_active_symbols(2);
        set_subscriptions(5);
    }
}
