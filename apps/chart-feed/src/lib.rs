#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Chart Feed - Widget Data Pipeline
//!
//! The data-acquisition core behind the desktop ticker widgets. Each
//! subscribed symbol gets one timer-driven scheduler that polls the quote
//! provider's chart endpoint, normalizes the payload into a strictly
//! aligned OHLCV series, and pushes immutable snapshots to every widget
//! watching that symbol. Fetches are de-duplicated per symbol (at most one
//! in flight) and cancelled promptly when the last widget departs.
//!
//! # Layers (inside to outside)
//!
//! - **Domain**: series types, normalization, symbol identity
//!   - `series`: raw points, cleaned series, summary statistics
//!   - `symbol`: case-insensitive, case-preserving ticker identity
//!   - `subscription`: per-symbol reference counting
//! - **Application**: port definitions
//!   - `ports`: the `ChartFetcher` abstraction the scheduler polls through
//! - **Infrastructure**: adapters and integrations
//!   - `yahoo`: payload decoding and the HTTP fetch client
//!   - `scheduler`: per-symbol refresh state machine
//!   - `registry`: symbol-to-scheduler map with refcounted subscriptions
//!   - `config`, `watchlist`, `metrics`, `telemetry`
//!
//! # Data Flow
//!
//! ```text
//! WidgetRegistry -> SymbolScheduler -> YahooChartClient -> parse_chart
//!       ^                                                      |
//!       |                                                 normalize
//!       +---- watch channel <- Arc<ChartSeries> <---------------+
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core chart-series types with no I/O dependencies.
pub mod domain;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::error::{FetchError, FetchErrorKind};
pub use domain::request::{SubscribeOptions, TimeInterval, TimeRange, WidgetClass};
pub use domain::series::{
    ChartSeries, RawQuotePoint, SeriesMeta, SeriesSummary, currency_symbol, normalize,
};
pub use domain::subscription::{SubscriptionId, SubscriptionLedger};
pub use domain::symbol::{Symbol, SymbolError};

// Application ports
pub use application::ports::ChartFetcher;

// Infrastructure
pub use infrastructure::config::{
    BackoffSettings, FeedConfig, PollSettings, ProviderSettings, RegistrySettings,
};
pub use infrastructure::metrics::init_metrics;
pub use infrastructure::registry::{RegistryStats, WidgetRegistry, WidgetSubscription};
pub use infrastructure::scheduler::{SchedulerSettings, SeriesReceiver, SymbolScheduler};
pub use infrastructure::telemetry;
pub use infrastructure::watchlist::WatchlistStore;
pub use infrastructure::yahoo::{ClientBuildError, YahooChartClient, parse_chart};
