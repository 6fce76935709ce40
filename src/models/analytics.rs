//! Menu interaction events.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::Locale;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsAction {
    View,
    Search,
    Filter,
    Favorite,
    Share,
    DetailView,
}

impl AnalyticsAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsAction::View => "view",
            AnalyticsAction::Search => "search",
            AnalyticsAction::Filter => "filter",
            AnalyticsAction::Favorite => "favorite",
            AnalyticsAction::Share => "share",
            AnalyticsAction::DetailView => "detail_view",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "view" => Some(AnalyticsAction::View),
            "search" => Some(AnalyticsAction::Search),
            "filter" => Some(AnalyticsAction::Filter),
            "favorite" => Some(AnalyticsAction::Favorite),
            "share" => Some(AnalyticsAction::Share),
            "detail_view" => Some(AnalyticsAction::DetailView),
            _ => None,
        }
    }

    /// `view` and `detail_view` both count as dish views.
    pub fn is_view(&self) -> bool {
        matches!(self, AnalyticsAction::View | AnalyticsAction::DetailView)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mobile" => Some(DeviceType::Mobile),
            "tablet" => Some(DeviceType::Tablet),
            "desktop" => Some(DeviceType::Desktop),
            _ => None,
        }
    }
}

/// An append-only interaction record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: String,
    pub dish_id: Option<String>,
    pub action: AnalyticsAction,
    pub language: Locale,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_used: Option<String>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_duration: Option<f64>,
    pub device_type: DeviceType,
    pub timestamp: DateTime<Utc>,
    /// 0 = Sunday
    pub day_of_week: u32,
    pub hour_of_day: u32,
}

impl AnalyticsEvent {
    /// Build an event stamped at `timestamp`, deriving the calendar fields.
    pub fn from_request(request: TrackEventRequest, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            dish_id: request.dish_id.filter(|id| !id.trim().is_empty()),
            action: request.action,
            language: request.language,
            session_id: request.session_id,
            search_query: request
                .search_query
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            filter_used: request.filter_used.filter(|f| !f.trim().is_empty()),
            view_duration: request.view_duration,
            device_type: request.device_type,
            timestamp,
            day_of_week: timestamp.weekday().num_days_from_sunday(),
            hour_of_day: timestamp.hour(),
        }
    }
}

/// Body of POST /api/analytics/track.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    #[serde(default)]
    pub dish_id: Option<String>,
    pub action: AnalyticsAction,
    #[serde(default)]
    pub language: Locale,
    pub session_id: String,
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub filter_used: Option<String>,
    #[serde(default)]
    pub view_duration: Option<f64>,
    #[serde(default)]
    pub device_type: DeviceType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_calendar_fields_are_derived() {
        let request: TrackEventRequest = serde_json::from_value(serde_json::json!({
            "dishId": "d1",
            "action": "detail_view",
            "language": "th",
            "sessionId": "s1",
            "searchQuery": "   "
        }))
        .unwrap();
        // 2026-10-18 is a Sunday
        let ts = Utc.with_ymd_and_hms(2026, 10, 18, 19, 45, 0).unwrap();
        let event = AnalyticsEvent::from_request(request, ts);

        assert_eq!(event.day_of_week, 0);
        assert_eq!(event.hour_of_day, 19);
        assert_eq!(event.action, AnalyticsAction::DetailView);
        assert_eq!(event.language, Locale::Th);
        assert!(event.search_query.is_none());
        assert_eq!(event.device_type, DeviceType::Mobile);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<TrackEventRequest, _> = serde_json::from_value(serde_json::json!({
            "action": "purchase",
            "sessionId": "s1"
        }));
        assert!(result.is_err());
    }
}
