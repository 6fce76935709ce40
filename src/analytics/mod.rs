//! Analytics reports over recorded menu events.
//!
//! All aggregation happens in memory over the events of one window, read in
//! timestamp order, so ties in ranked lists keep first-seen order.

mod insights;
mod retention;
mod stats;

pub use insights::*;
pub use retention::*;
pub use stats::*;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Locale;

/// Query string shared by the analytics endpoints.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WindowQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub language: Option<Locale>,
    pub limit: Option<usize>,
}

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AnalyticsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalyticsWindow {
    /// `end` defaults to `now` and `start` to `default_days` before `end`.
    /// Windows longer than `max_days` are rejected.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        default_days: i64,
        max_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let end = end.unwrap_or(now);
        let start = start.unwrap_or(end - Duration::days(default_days));
        if start > end {
            return Err(AppError::BadRequest(
                "start must not be after end".to_string(),
            ));
        }
        if end - start > Duration::days(max_days) {
            return Err(AppError::BadRequest(format!(
                "Analytics window must not exceed {} days",
                max_days
            )));
        }
        Ok(Self { start, end })
    }
}

/// Round to two decimals for display.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole` as a percentage, 0 when `whole` is 0.
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 * 100.0 / whole as f64)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::models::{AnalyticsAction, AnalyticsEvent, Locale, TrackEventRequest};

    pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    pub(crate) fn event(
        action: AnalyticsAction,
        dish_id: Option<&str>,
        language: Locale,
        session: &str,
        timestamp: DateTime<Utc>,
    ) -> AnalyticsEvent {
        AnalyticsEvent::from_request(
            TrackEventRequest {
                dish_id: dish_id.map(str::to_string),
                action,
                language,
                session_id: session.to_string(),
                search_query: None,
                filter_used: None,
                view_duration: None,
                device_type: Default::default(),
            },
            timestamp,
        )
    }

    pub(crate) fn view(dish_id: &str, language: Locale, session: &str) -> AnalyticsEvent {
        event(AnalyticsAction::View, Some(dish_id), language, session, at(12, 19))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_defaults() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let window = AnalyticsWindow::resolve(None, None, 7, 366, now).unwrap();
        assert_eq!(window.end, now);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2026, 10, 9, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let now = Utc::now();
        let err =
            AnalyticsWindow::resolve(Some(now), Some(now - Duration::hours(1)), 7, 366, now)
                .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_window_rejects_oversized_range() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let ancient = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
        let err = AnalyticsWindow::resolve(Some(ancient), None, 7, 366, now).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        // Exactly at the limit is still accepted
        let window =
            AnalyticsWindow::resolve(Some(now - Duration::days(366)), None, 7, 366, now).unwrap();
        assert_eq!(window.end, now);

        // A default window longer than the cap is rejected too
        assert!(AnalyticsWindow::resolve(None, None, 30, 14, now).is_err());
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 0), 0.0);
    }
}
