//! Whole-restaurant reports: overview, daily and hourly activity.

use std::collections::HashMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use super::insights::{average_minutes, hourly_views, unique_sessions, ConversionFunnel, HourBucket};
use super::{percentage, AnalyticsWindow};
use crate::models::{AnalyticsAction, AnalyticsEvent, DeviceType};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceShare {
    pub device_type: DeviceType,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    #[serde(flatten)]
    pub window: AnalyticsWindow,
    pub total_events: u64,
    pub total_views: u64,
    pub total_searches: u64,
    pub unique_sessions: usize,
    /// Minutes
    pub average_view_duration: f64,
    pub conversion_funnel: ConversionFunnel,
    pub devices: Vec<DeviceShare>,
}

pub fn overview(window: AnalyticsWindow, events: &[AnalyticsEvent]) -> Overview {
    let mut devices: IndexMap<DeviceType, u64> = IndexMap::new();
    for event in events {
        *devices.entry(event.device_type).or_insert(0) += 1;
    }
    let total = events.len() as u64;

    Overview {
        window,
        total_events: total,
        total_views: events.iter().filter(|e| e.action.is_view()).count() as u64,
        total_searches: events
            .iter()
            .filter(|e| e.action == AnalyticsAction::Search)
            .count() as u64,
        unique_sessions: unique_sessions(events.iter()),
        average_view_duration: average_minutes(events.iter()),
        conversion_funnel: ConversionFunnel::from_events(events),
        devices: devices
            .into_iter()
            .map(|(device_type, count)| DeviceShare {
                device_type,
                count,
                percentage: percentage(count, total),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub views: u64,
    pub unique_sessions: usize,
    pub searches: u64,
}

/// One bucket per UTC calendar day from the window's start to its end, inclusive.
pub fn daily_stats(window: AnalyticsWindow, events: &[AnalyticsEvent]) -> Vec<DailyBucket> {
    let first = window.start.date_naive();
    let last = window.end.date_naive();

    let mut by_day: HashMap<NaiveDate, Vec<&AnalyticsEvent>> = HashMap::new();
    for event in events {
        let date = event.timestamp.date_naive();
        if date >= first && date <= last {
            by_day.entry(date).or_default().push(event);
        }
    }

    first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| {
            let day = by_day.remove(&date).unwrap_or_default();
            DailyBucket {
                date,
                views: day.iter().filter(|e| e.action.is_view()).count() as u64,
                unique_sessions: unique_sessions(day.iter().copied()),
                searches: day
                    .iter()
                    .filter(|e| e.action == AnalyticsAction::Search)
                    .count() as u64,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayBucket {
    /// 0 = Sunday
    pub day: u32,
    pub views: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyStats {
    pub hours: Vec<HourBucket>,
    pub weekdays: Vec<WeekdayBucket>,
}

pub fn hourly_stats(events: &[AnalyticsEvent]) -> HourlyStats {
    let mut weekdays: Vec<WeekdayBucket> = (0..7).map(|day| WeekdayBucket { day, views: 0 }).collect();
    for event in events.iter().filter(|e| e.action.is_view()) {
        if let Some(bucket) = weekdays.get_mut(event.day_of_week as usize) {
            bucket.views += 1;
        }
    }

    HourlyStats {
        hours: hourly_views(events),
        weekdays,
    }
}
