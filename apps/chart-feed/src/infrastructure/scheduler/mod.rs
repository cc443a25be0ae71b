//! Per-Symbol Refresh Scheduling
//!
//! One `SymbolScheduler` per actively subscribed symbol. Each scheduler
//! owns a spawned task that is the only place a fetch for its symbol can
//! happen, which makes the at-most-one-in-flight guarantee structural
//! rather than lock-based: refresh triggers that land while a fetch is
//! outstanding are coalesced and served by that fetch's result.
//!
//! Published series travel through a `tokio::sync::watch` channel holding
//! `Option<Arc<ChartSeries>>`. Subscribers observe publications in order
//! and a late subscriber immediately sees the last published series.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::ports::ChartFetcher;
use crate::domain::error::FetchError;
use crate::domain::request::{SubscribeOptions, TimeInterval, TimeRange};
use crate::domain::series::ChartSeries;
use crate::domain::symbol::Symbol;
use crate::infrastructure::config::BackoffSettings;
use crate::infrastructure::metrics;

/// Capacity of the manual-refresh request channel. Requests beyond this
/// while a fetch is outstanding carry no extra information and are dropped.
const REFRESH_CHANNEL_CAPACITY: usize = 8;

/// Receiver side of a symbol's publication channel.
pub type SeriesReceiver = watch::Receiver<Option<Arc<ChartSeries>>>;

/// Settings for one scheduler instance.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    /// Recurring tick interval.
    pub poll_interval: Duration,
    /// Rate-limit hold-off settings.
    pub backoff: BackoffSettings,
}

/// A manual refresh request, optionally retargeting the chart window.
#[derive(Debug, Clone, Copy, Default)]
struct RefreshRequest {
    range: Option<TimeRange>,
    interval: Option<TimeInterval>,
}

/// Handle to a running per-symbol refresh task.
///
/// Dropping the handle does not stop the task; call [`Self::shutdown`] (the
/// registry does this when the last subscriber departs).
#[derive(Debug)]
pub struct SymbolScheduler {
    symbol: Symbol,
    refresh_tx: mpsc::Sender<RefreshRequest>,
    series_rx: SeriesReceiver,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SymbolScheduler {
    /// Spawn the refresh task for `symbol` and start polling immediately.
    #[must_use]
    pub fn start(
        symbol: Symbol,
        options: SubscribeOptions,
        settings: SchedulerSettings,
        fetcher: Arc<dyn ChartFetcher>,
    ) -> Self {
        let (series_tx, series_rx) = watch::channel(None);
        let (refresh_tx, refresh_rx) = mpsc::channel(REFRESH_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_refresh_loop(RefreshLoop {
            symbol: symbol.clone(),
            fetcher,
            settings,
            range: options.range,
            interval: options.interval,
            refresh_rx,
            series_tx,
            cancel: cancel.clone(),
        }));

        Self {
            symbol,
            refresh_tx,
            series_rx,
            cancel,
            task,
        }
    }

    /// Symbol this scheduler polls.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// New receiver for this symbol's publications. The receiver's current
    /// value is the last published series, if any.
    #[must_use]
    pub fn subscribe_series(&self) -> SeriesReceiver {
        self.series_rx.clone()
    }

    /// Last published series, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<ChartSeries>> {
        self.series_rx.borrow().clone()
    }

    /// Request an immediate refresh, optionally retargeting the window.
    ///
    /// Subject to the single-flight guarantee: a request that lands while a
    /// fetch is outstanding is absorbed by that fetch. Requests are also
    /// dropped once the small request queue is full, since a queued refresh
    /// already covers them.
    pub fn request_refresh(&self, range: Option<TimeRange>, interval: Option<TimeInterval>) {
        let request = RefreshRequest { range, interval };
        if self.refresh_tx.try_send(request).is_err() {
            tracing::debug!(symbol = %self.symbol, "Refresh request coalesced (queue full)");
        }
    }

    /// Stop the scheduler, cancelling any in-flight fetch.
    ///
    /// Deterministic: the refresh task has fully exited when this returns,
    /// and a cancelled fetch never publishes.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::warn!(symbol = %self.symbol, error = %e, "Refresh task ended abnormally");
            }
        }
    }
}

/// State owned by one refresh task.
struct RefreshLoop {
    symbol: Symbol,
    fetcher: Arc<dyn ChartFetcher>,
    settings: SchedulerSettings,
    range: TimeRange,
    interval: TimeInterval,
    refresh_rx: mpsc::Receiver<RefreshRequest>,
    series_tx: watch::Sender<Option<Arc<ChartSeries>>>,
    cancel: CancellationToken,
}

impl RefreshLoop {
    fn apply(&mut self, request: RefreshRequest) {
        if let Some(range) = request.range {
            self.range = range;
        }
        if let Some(interval) = request.interval {
            self.interval = interval;
        }
    }
}

/// What woke the refresh loop.
enum Wake {
    Cancelled,
    Tick,
    Request(Option<RefreshRequest>),
}

async fn run_refresh_loop(mut state: RefreshLoop) {
    let mut ticker = tokio::time::interval(state.settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut backoff = RateLimitBackoff::new(state.settings.backoff);
    let mut hold_until: Option<Instant> = None;

    tracing::debug!(
        symbol = %state.symbol,
        poll_interval_secs = state.settings.poll_interval.as_secs(),
        range = %state.range,
        interval = %state.interval,
        "Refresh loop started"
    );

    loop {
        let wake = tokio::select! {
            () = state.cancel.cancelled() => Wake::Cancelled,
            _ = ticker.tick() => Wake::Tick,
            request = state.refresh_rx.recv() => Wake::Request(request),
        };

        match wake {
            Wake::Cancelled => {
                tracing::debug!(symbol = %state.symbol, "Refresh loop stopped");
                return;
            }
            Wake::Tick => {
                // Skip ticks while a rate-limit hold is armed.
                if let Some(until) = hold_until {
                    if Instant::now() < until {
                        tracing::debug!(symbol = %state.symbol, "Tick skipped during rate-limit hold");
                        continue;
                    }
                    hold_until = None;
                }
            }
            Wake::Request(Some(request)) => {
                // A manual refresh overrides any hold.
                hold_until = None;
                state.apply(request);
            }
            // All senders gone; the owning handle was dropped.
            Wake::Request(None) => return,
        }

        metrics::record_fetch_attempt(state.symbol.as_str());
        let outcome = tokio::select! {
            biased;
            () = state.cancel.cancelled() => None,
            outcome = state.fetcher.fetch(&state.symbol, state.range, state.interval) => Some(outcome),
        };
        let Some(outcome) = outcome else {
            tracing::debug!(symbol = %state.symbol, "In-flight fetch cancelled");
            return;
        };

        match outcome {
            Ok(series) => {
                backoff.reset();
                hold_until = None;

                // The fetch may have raced a shutdown; never publish after stop.
                if state.cancel.is_cancelled() {
                    return;
                }

                let points = series.len();
                let _ = state.series_tx.send(Some(Arc::new(series)));
                metrics::record_series_published(state.symbol.as_str());
                tracing::debug!(symbol = %state.symbol, points, "Published chart series");
            }
            Err(error) => {
                metrics::record_fetch_failure(state.symbol.as_str(), error.kind());
                tracing::warn!(
                    symbol = %state.symbol,
                    kind = error.kind().as_str(),
                    detail = error.provider_message().unwrap_or_default(),
                    error = %error,
                    "Chart refresh failed; keeping last series"
                );

                if let FetchError::RateLimited { retry_after, .. } = &error {
                    let hold = backoff.next_hold(*retry_after);
                    hold_until = Some(Instant::now() + hold);
                    tracing::warn!(
                        symbol = %state.symbol,
                        hold_secs = hold.as_secs(),
                        "Holding refreshes after rate limit"
                    );
                }
            }
        }

        // Coalesce refresh requests that arrived while fetching: the fetch
        // that just finished serves them. Window retargets still apply.
        while let Ok(request) = state.refresh_rx.try_recv() {
            state.apply(request);
        }
    }
}

// =============================================================================
// Rate-Limit Backoff
// =============================================================================

/// Exponential hold with jitter for consecutive rate-limit failures.
///
/// Ordinary failures keep the regular tick cadence; only rate limiting
/// arms a hold, and any success resets it.
#[derive(Debug)]
struct RateLimitBackoff {
    settings: BackoffSettings,
    current_hold: Duration,
}

impl RateLimitBackoff {
    const fn new(settings: BackoffSettings) -> Self {
        Self {
            settings,
            current_hold: settings.initial_hold,
        }
    }

    /// Next hold duration. A provider-advertised retry-after acts as a
    /// floor so the hold never undercuts what the provider asked for.
    fn next_hold(&mut self, retry_after: Option<Duration>) -> Duration {
        let base = self.current_hold;

        let scaled = base.as_secs_f64() * self.settings.multiplier;
        self.current_hold = Duration::from_secs_f64(scaled.min(self.settings.max_hold.as_secs_f64()));

        let held = retry_after.map_or(base, |floor| base.max(floor));
        apply_jitter(held, self.settings.jitter_factor)
    }

    const fn reset(&mut self) {
        self.current_hold = self.settings.initial_hold;
    }
}

fn apply_jitter(duration: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return duration;
    }
    let spread = duration.as_secs_f64() * factor;
    let offset = rand::rng().random_range(-spread..=spread);
    Duration::from_secs_f64((duration.as_secs_f64() + offset).max(0.0))
}
