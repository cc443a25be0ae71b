//! Widget Registry
//!
//! Maps symbols to refresh schedulers and reference-counts widget
//! subscriptions. The first subscriber for a symbol starts its scheduler;
//! the last one leaving stops it, cancelling any in-flight fetch before
//! `unsubscribe` returns, so no work ever dangles after the final consumer
//! departs.
//!
//! Symbols match case-insensitively: "aapl" and "AAPL" share one
//! scheduler. All interior state sits behind a single async mutex, the one
//! mutual-exclusion discipline for calls arriving from arbitrary tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::ports::ChartFetcher;
use crate::domain::request::{SubscribeOptions, TimeInterval, TimeRange, WidgetClass};
use crate::domain::subscription::{SubscriptionId, SubscriptionLedger};
use crate::domain::symbol::{Symbol, SymbolError};
use crate::infrastructure::config::RegistrySettings;
use crate::infrastructure::metrics;
use crate::infrastructure::scheduler::{SchedulerSettings, SeriesReceiver, SymbolScheduler};

/// A live widget subscription; pass back to [`WidgetRegistry::unsubscribe`].
#[derive(Debug)]
pub struct WidgetSubscription {
    id: SubscriptionId,
    symbol: Symbol,
}

impl WidgetSubscription {
    /// Subscription id.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Symbol this subscription watches, with the caller's casing.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Symbols with a running scheduler.
    pub symbols: usize,
    /// Live widget subscriptions across all symbols.
    pub subscriptions: usize,
}

/// Maps symbols to schedulers and fans series out to widget subscribers.
pub struct WidgetRegistry {
    fetcher: Arc<dyn ChartFetcher>,
    settings: RegistrySettings,
    inner: Mutex<RegistryState>,
}

struct RegistryState {
    ledger: SubscriptionLedger,
    /// Folded symbol key to running scheduler.
    schedulers: HashMap<String, SymbolScheduler>,
}

impl WidgetRegistry {
    /// Create a registry polling through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ChartFetcher>, settings: RegistrySettings) -> Self {
        Self {
            fetcher,
            settings,
            inner: Mutex::new(RegistryState {
                ledger: SubscriptionLedger::new(),
                schedulers: HashMap::new(),
            }),
        }
    }

    /// Subscribe a widget to `symbol`.
    ///
    /// The first subscription for a previously unseen symbol starts a
    /// scheduler with the given options; later subscriptions attach to the
    /// running scheduler (its cadence and window stay as configured by the
    /// first subscriber) and do not trigger a fetch. The returned
    /// receiver's current value is the last published series, if any.
    ///
    /// # Errors
    ///
    /// Returns an error for a symbol that fails validation.
    pub async fn subscribe(
        &self,
        symbol: Symbol,
        options: SubscribeOptions,
    ) -> Result<(WidgetSubscription, SeriesReceiver), SymbolError> {
        symbol.validate()?;

        let mut inner = self.inner.lock().await;
        let (id, _first) = inner.ledger.subscribe(&symbol);

        let scheduler = match inner.schedulers.entry(symbol.key()) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let scheduler_settings = self.scheduler_settings(&options);
                tracing::info!(
                    symbol = %symbol,
                    poll_interval_secs = scheduler_settings.poll_interval.as_secs(),
                    "Starting refresh scheduler"
                );
                entry.insert(SymbolScheduler::start(
                    symbol.clone(),
                    options,
                    scheduler_settings,
                    Arc::clone(&self.fetcher),
                ))
            }
        };
        let receiver = scheduler.subscribe_series();

        metrics::set_active_symbols(inner.schedulers.len());
        metrics::set_subscriptions(inner.ledger.subscription_count());

        Ok((WidgetSubscription { id, symbol }, receiver))
    }

    /// Release a subscription.
    ///
    /// When this was the symbol's last subscription, its scheduler is
    /// stopped before returning: any in-flight fetch is cancelled and will
    /// not publish.
    pub async fn unsubscribe(&self, subscription: WidgetSubscription) {
        let mut inner = self.inner.lock().await;

        let Some((key, last)) = inner.ledger.unsubscribe(subscription.id) else {
            tracing::warn!(
                symbol = %subscription.symbol,
                id = subscription.id,
                "Unsubscribe for unknown subscription"
            );
            return;
        };

        if last {
            if let Some(scheduler) = inner.schedulers.remove(&key) {
                scheduler.shutdown().await;
                tracing::info!(symbol = %subscription.symbol, "Stopped refresh scheduler");
            }
        }

        metrics::set_active_symbols(inner.schedulers.len());
        metrics::set_subscriptions(inner.ledger.subscription_count());
    }

    /// Request an immediate refresh for `symbol`, optionally retargeting
    /// its chart window. Returns false when the symbol has no scheduler.
    pub async fn request_refresh(
        &self,
        symbol: &Symbol,
        range: Option<TimeRange>,
        interval: Option<TimeInterval>,
    ) -> bool {
        let inner = self.inner.lock().await;
        match inner.schedulers.get(&symbol.key()) {
            Some(scheduler) => {
                scheduler.request_refresh(range, interval);
                true
            }
            None => false,
        }
    }

    /// Symbols with a running scheduler, in their subscribed casing.
    pub async fn active_symbols(&self) -> Vec<Symbol> {
        let inner = self.inner.lock().await;
        inner
            .schedulers
            .values()
            .map(|s| s.symbol().clone())
            .collect()
    }

    /// Current registry statistics.
    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.lock().await;
        RegistryStats {
            symbols: inner.ledger.symbol_count(),
            subscriptions: inner.ledger.subscription_count(),
        }
    }

    /// Resolve the scheduler settings for a subscription: an explicit
    /// override wins, then the configured default for the widget class.
    fn scheduler_settings(&self, options: &SubscribeOptions) -> SchedulerSettings {
        let poll_interval = options.poll_interval.unwrap_or(match options.class {
            WidgetClass::SingleTicker => self.settings.poll.single_ticker_interval,
            WidgetClass::Preview => self.settings.poll.preview_interval,
        });
        SchedulerSettings {
            poll_interval,
            backoff: self.settings.backoff,
        }
    }

    /// Stop every scheduler, releasing all subscriptions. Used at shutdown.
    pub async fn shutdown_all(&self) {
        let mut inner = self.inner.lock().await;
        inner.ledger = SubscriptionLedger::new();
        for (_, scheduler) in inner.schedulers.drain() {
            scheduler.shutdown().await;
        }
        metrics::set_active_symbols(0);
        metrics::set_subscriptions(0);
        tracing::info!("All refresh schedulers stopped");
    }
}

impl std::fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
