//! Quote Provider Chart Adapter
//!
//! Talks to a Yahoo-Finance-shaped chart endpoint:
//! `GET {base}/v8/finance/chart/{symbol}?range=R&interval=I`, returning a
//! `chart.result[0]` record with a timestamp array and parallel optional
//! OHLCV arrays. `payload` owns the decode into aligned raw points;
//! `client` owns the HTTP call and error mapping.

/// HTTP fetch client.
pub mod client;

/// Payload models and decoding.
pub mod payload;

pub use client::{ClientBuildError, YahooChartClient};
pub use payload::parse_chart;
