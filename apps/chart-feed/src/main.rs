//! Chart Feed Runner
//!
//! Headless entry point: seeds one subscription per watchlist symbol and
//! logs every published series until shutdown. Widget shells embed the
//! library directly; this binary exists for operating the pipeline on its
//! own (and for watching it under load).
//!
//! # Usage
//!
//! ```bash
//! cargo run -p chart-feed
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `CHART_FEED_BASE_URL`: chart endpoint base (default: <https://query1.finance.yahoo.com>)
//! - `CHART_FEED_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `CHART_FEED_USER_AGENT`: user agent sent with chart requests
//! - `CHART_FEED_POLL_INTERVAL_SECS`: single-ticker poll cadence (default: 60)
//! - `CHART_FEED_PREVIEW_POLL_INTERVAL_SECS`: preview poll cadence (default: 300)
//! - `CHART_FEED_RATE_LIMIT_HOLD_INITIAL_SECS`: first rate-limit hold (default: 30)
//! - `CHART_FEED_RATE_LIMIT_HOLD_MAX_SECS`: rate-limit hold cap (default: 900)
//! - `CHART_FEED_WATCHLIST_PATH`: watchlist file (default: watchlist.json)
//! - `CHART_FEED_METRICS_PORT`: Prometheus port, 0 disables (default: 0)
//! - `RUST_LOG`: log filter (default: chart_feed=info)

use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;

use chart_feed::{
    FeedConfig, SeriesReceiver, SubscribeOptions, Symbol, WatchlistStore, WidgetRegistry,
    YahooChartClient, init_metrics, telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init();

    tracing::info!("Starting chart feed");

    let config = FeedConfig::from_env();
    log_config(&config);

    if config.metrics_port != 0 {
        let _handle = init_metrics(config.metrics_port);
        tracing::info!(port = config.metrics_port, "Prometheus exporter listening");
    }

    let fetcher = Arc::new(YahooChartClient::new(&config.provider)?);
    let registry = Arc::new(WidgetRegistry::new(fetcher, config.registry));

    let store = WatchlistStore::new(&config.watchlist_path);
    let symbols = store.load();
    if symbols.is_empty() {
        tracing::warn!(
            path = %config.watchlist_path.display(),
            "Watchlist is empty; nothing to poll"
        );
    }

    let shutdown_token = CancellationToken::new();
    let mut subscriptions = Vec::new();

    for symbol in symbols {
        match registry
            .subscribe(symbol.clone(), SubscribeOptions::preview())
            .await
        {
            Ok((subscription, receiver)) => {
                tokio::spawn(watch_and_log(
                    symbol,
                    receiver,
                    shutdown_token.clone(),
                ));
                subscriptions.push(subscription);
            }
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Skipping invalid watchlist symbol");
            }
        }
    }

    let stats = registry.stats().await;
    tracing::info!(
        symbols = stats.symbols,
        subscriptions = stats.subscriptions,
        "Chart feed ready"
    );

    await_shutdown().await;
    shutdown_token.cancel();

    for subscription in subscriptions {
        registry.unsubscribe(subscription).await;
    }

    tracing::info!("Chart feed stopped");
    Ok(())
}

/// Log each series published for `symbol` until shutdown.
async fn watch_and_log(symbol: Symbol, mut receiver: SeriesReceiver, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            changed = receiver.changed() => {
                if changed.is_err() {
                    // Scheduler gone; nothing more will arrive.
                    return;
                }
            }
        }

        let series = receiver.borrow_and_update().clone();
        if let Some(series) = series {
            let summary = series.summary();
            tracing::info!(
                symbol = %symbol,
                points = summary.points,
                last_close = series.last_close(),
                low = summary.min_low,
                high = summary.max_high,
                last_sample = %summary.last_timestamp,
                "Chart updated"
            );
        }
    }
}

/// Load .env from the current directory or any ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &FeedConfig) {
    tracing::info!(
        base_url = %config.provider.base_url,
        request_timeout_secs = config.provider.request_timeout.as_secs(),
        poll_interval_secs = config.registry.poll.single_ticker_interval.as_secs(),
        preview_interval_secs = config.registry.poll.preview_interval.as_secs(),
        watchlist = %config.watchlist_path.display(),
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
