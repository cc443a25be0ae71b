//! Chart request parameters.
//!
//! `TimeRange` and `TimeInterval` are opaque enumerated parameters passed
//! through to the provider's chart endpoint; no combination is validated
//! here. An unsupported pairing surfaces as whatever error the provider
//! returns.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How far back the requested chart window reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    /// One trading day.
    #[default]
    OneDay,
    /// Five trading days.
    FiveDays,
    /// One month.
    OneMonth,
    /// Three months.
    ThreeMonths,
    /// Six months.
    SixMonths,
    /// One year.
    OneYear,
    /// Two years.
    TwoYears,
    /// Five years.
    FiveYears,
    /// Ten years.
    TenYears,
    /// Year to date.
    YearToDate,
    /// Full listed history.
    Max,
}

impl TimeRange {
    /// Query-string form expected by the provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sample granularity of the requested chart window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInterval {
    /// One-minute bars.
    OneMinute,
    /// Two-minute bars.
    #[default]
    TwoMinutes,
    /// Five-minute bars.
    FiveMinutes,
    /// Fifteen-minute bars.
    FifteenMinutes,
    /// Thirty-minute bars.
    ThirtyMinutes,
    /// Sixty-minute bars.
    SixtyMinutes,
    /// Ninety-minute bars.
    NinetyMinutes,
    /// One-hour bars.
    OneHour,
    /// Daily bars.
    OneDay,
    /// Five-day bars.
    FiveDays,
    /// Weekly bars.
    OneWeek,
    /// Monthly bars.
    OneMonth,
    /// Quarterly bars.
    ThreeMonths,
}

impl TimeInterval {
    /// Query-string form expected by the provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::TwoMinutes => "2m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::SixtyMinutes => "60m",
            Self::NinetyMinutes => "90m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneWeek => "1wk",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Widget class driving the default refresh cadence.
///
/// A full single-ticker widget refreshes every minute; a lightweight tray
/// preview refreshes every five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetClass {
    /// Full chart widget for one ticker.
    #[default]
    SingleTicker,
    /// Lightweight preview (tray sparkline).
    Preview,
}

impl WidgetClass {
    /// Default poll interval for this widget class.
    #[must_use]
    pub const fn default_poll_interval(self) -> Duration {
        match self {
            Self::SingleTicker => Duration::from_secs(60),
            Self::Preview => Duration::from_secs(300),
        }
    }
}

/// Options supplied when subscribing a widget to a symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscribeOptions {
    /// Widget class, which selects the default poll interval.
    pub class: WidgetClass,
    /// Overrides the class default poll interval when set.
    pub poll_interval: Option<Duration>,
    /// Requested chart window.
    pub range: TimeRange,
    /// Requested bar granularity.
    pub interval: TimeInterval,
}

impl SubscribeOptions {
    /// Options for a full single-ticker widget (1D at 2m, 60 s polls).
    #[must_use]
    pub fn single_ticker() -> Self {
        Self::default()
    }

    /// Options for a lightweight preview widget (1D at 2m, 300 s polls).
    #[must_use]
    pub fn preview() -> Self {
        Self {
            class: WidgetClass::Preview,
            ..Self::default()
        }
    }

    /// The poll interval after applying any override.
    #[must_use]
    pub fn effective_poll_interval(&self) -> Duration {
        self.poll_interval
            .unwrap_or_else(|| self.class.default_poll_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(TimeRange::OneDay, "1d")]
    #[test_case(TimeRange::FiveDays, "5d")]
    #[test_case(TimeRange::OneMonth, "1mo")]
    #[test_case(TimeRange::YearToDate, "ytd")]
    #[test_case(TimeRange::Max, "max")]
    fn time_range_query_strings(range: TimeRange, expected: &str) {
        assert_eq!(range.as_str(), expected);
    }

    #[test_case(TimeInterval::OneMinute, "1m")]
    #[test_case(TimeInterval::TwoMinutes, "2m")]
    #[test_case(TimeInterval::OneHour, "1h")]
    #[test_case(TimeInterval::OneWeek, "1wk")]
    #[test_case(TimeInterval::ThreeMonths, "3mo")]
    fn time_interval_query_strings(interval: TimeInterval, expected: &str) {
        assert_eq!(interval.as_str(), expected);
    }

    #[test]
    fn defaults_match_the_widget_default_view() {
        assert_eq!(TimeRange::default(), TimeRange::OneDay);
        assert_eq!(TimeInterval::default(), TimeInterval::TwoMinutes);
    }

    #[test]
    fn widget_class_poll_intervals() {
        assert_eq!(
            WidgetClass::SingleTicker.default_poll_interval(),
            Duration::from_secs(60)
        );
        assert_eq!(
            WidgetClass::Preview.default_poll_interval(),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn subscribe_options_override_wins() {
        let options = SubscribeOptions {
            poll_interval: Some(Duration::from_secs(15)),
            ..SubscribeOptions::preview()
        };
        assert_eq!(options.effective_poll_interval(), Duration::from_secs(15));
    }

    #[test]
    fn subscribe_options_class_default() {
        assert_eq!(
            SubscribeOptions::preview().effective_poll_interval(),
            Duration::from_secs(300)
        );
        assert_eq!(
            SubscribeOptions::single_ticker().effective_poll_interval(),
            Duration::from_secs(60)
        );
    }
}
