//! Tracing Subscriber Initialization
//!
//! Installs a formatted `tracing` subscriber filtered through `RUST_LOG`.
//! Safe to call more than once (later calls are no-ops), so tests and the
//! runner can both initialize freely.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `chart_feed=info`)

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "chart_feed=info";

/// Initialize the global tracing subscriber.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    // try_init so a second call (tests, embedding apps) is harmless.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
