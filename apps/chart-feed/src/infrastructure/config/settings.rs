//! Feed configuration settings, loaded from environment variables.
//!
//! Nothing here is required: every setting has a working default, so the
//! runner starts with no environment at all. `CHART_FEED_*` variables
//! override individual values; unparseable values fall back to the default
//! rather than failing startup.

use std::path::PathBuf;
use std::time::Duration;

/// Quote provider endpoint settings.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Base URL of the chart endpoint host.
    pub base_url: String,
    /// Per-request timeout; a request past this is a network failure.
    pub request_timeout: Duration,
    /// User agent sent with chart requests.
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("chart-feed/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Default polling cadence per widget class.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Poll interval for full single-ticker widgets.
    pub single_ticker_interval: Duration,
    /// Poll interval for lightweight preview widgets.
    pub preview_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            single_ticker_interval: Duration::from_secs(60),
            preview_interval: Duration::from_secs(300),
        }
    }
}

/// Hold-off settings applied after repeated rate-limit failures.
#[derive(Debug, Clone, Copy)]
pub struct BackoffSettings {
    /// Hold after the first rate-limit failure.
    pub initial_hold: Duration,
    /// Cap on the hold duration.
    pub max_hold: Duration,
    /// Multiplier applied per consecutive rate-limit failure.
    pub multiplier: f64,
    /// Jitter factor as a fraction (0.1 = plus or minus 10%).
    pub jitter_factor: f64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_hold: Duration::from_secs(30),
            max_hold: Duration::from_secs(900),
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

/// Settings handed to the widget registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrySettings {
    /// Polling cadence defaults.
    pub poll: PollSettings,
    /// Rate-limit hold-off settings.
    pub backoff: BackoffSettings,
}

/// Complete feed configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Provider endpoint settings.
    pub provider: ProviderSettings,
    /// Registry and scheduler settings.
    pub registry: RegistrySettings,
    /// Path of the persisted watchlist file.
    pub watchlist_path: PathBuf,
    /// Prometheus exporter port (0 = disabled).
    pub metrics_port: u16,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            registry: RegistrySettings::default(),
            watchlist_path: PathBuf::from("watchlist.json"),
            metrics_port: 0,
        }
    }
}

impl FeedConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let provider = ProviderSettings {
            base_url: parse_env_string("CHART_FEED_BASE_URL", defaults.provider.base_url),
            request_timeout: parse_env_duration_secs(
                "CHART_FEED_REQUEST_TIMEOUT_SECS",
                defaults.provider.request_timeout,
            ),
            user_agent: parse_env_string("CHART_FEED_USER_AGENT", defaults.provider.user_agent),
        };

        let poll = PollSettings {
            single_ticker_interval: parse_env_duration_secs(
                "CHART_FEED_POLL_INTERVAL_SECS",
                defaults.registry.poll.single_ticker_interval,
            ),
            preview_interval: parse_env_duration_secs(
                "CHART_FEED_PREVIEW_POLL_INTERVAL_SECS",
                defaults.registry.poll.preview_interval,
            ),
        };

        let backoff = BackoffSettings {
            initial_hold: parse_env_duration_secs(
                "CHART_FEED_RATE_LIMIT_HOLD_INITIAL_SECS",
                defaults.registry.backoff.initial_hold,
            ),
            max_hold: parse_env_duration_secs(
                "CHART_FEED_RATE_LIMIT_HOLD_MAX_SECS",
                defaults.registry.backoff.max_hold,
            ),
            multiplier: defaults.registry.backoff.multiplier,
            jitter_factor: defaults.registry.backoff.jitter_factor,
        };

        let watchlist_path = std::env::var("CHART_FEED_WATCHLIST_PATH")
            .map_or(defaults.watchlist_path, PathBuf::from);

        let metrics_port = parse_env_u16("CHART_FEED_METRICS_PORT", defaults.metrics_port);

        Self {
            provider,
            registry: RegistrySettings { poll, backoff },
            watchlist_path,
            metrics_port,
        }
    }
}

fn parse_env_string(key: &str, default: String) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}
