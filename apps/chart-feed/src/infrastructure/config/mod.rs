//! Feed Configuration
//!
//! Configuration types for the chart feed, loaded from environment
//! variables with sensible defaults.

/// Settings types and environment loading.
pub mod settings;

pub use settings::{
    BackoffSettings, FeedConfig, PollSettings, ProviderSettings, RegistrySettings,
};
