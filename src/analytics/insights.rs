//! The insight report of the analytics dashboard.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use super::{percentage, round2, AnalyticsWindow};
use crate::models::{AnalyticsAction, AnalyticsEvent, Dish, Locale};

/// Number of languages listed per top dish.
const TOP_LANGUAGES_PER_DISH: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct InsightOptions {
    /// Length of top-N lists
    pub limit: usize,
    /// Views above which a dish is trending
    pub trending_threshold: u64,
    /// Language used for dish names
    pub name_language: Locale,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageCount {
    pub language: Locale,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopDish {
    pub dish_id: String,
    /// Absent when the dish no longer exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub total_views: u64,
    pub unique_viewers: usize,
    /// Minutes
    pub average_view_duration: f64,
    pub top_languages: Vec<LanguageCount>,
    pub trending: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageShare {
    pub language: Locale,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HourBucket {
    pub hour: u32,
    pub views: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchTerm {
    pub query: String,
    pub count: u64,
}

/// Event counts per step of the browse-to-engage funnel.
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionFunnel {
    pub views: u64,
    pub detail_views: u64,
    pub favorites: u64,
    pub shares: u64,
}

impl ConversionFunnel {
    pub fn from_events(events: &[AnalyticsEvent]) -> Self {
        let mut funnel = Self::default();
        for event in events {
            match event.action {
                AnalyticsAction::View => funnel.views += 1,
                AnalyticsAction::DetailView => funnel.detail_views += 1,
                AnalyticsAction::Favorite => funnel.favorites += 1,
                AnalyticsAction::Share => funnel.shares += 1,
                AnalyticsAction::Search | AnalyticsAction::Filter => {}
            }
        }
        funnel
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    #[serde(flatten)]
    pub window: AnalyticsWindow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Locale>,
    /// Every event in the window
    pub total_events: u64,
    /// `view` and `detail_view` events
    pub total_views: u64,
    pub unique_sessions: usize,
    /// Minutes, over events that reported a duration
    pub average_view_duration: f64,
    pub top_dishes: Vec<TopDish>,
    pub language_distribution: Vec<LanguageShare>,
    /// Always 24 buckets, hour 0 first
    pub hourly_views: Vec<HourBucket>,
    pub top_search_terms: Vec<SearchTerm>,
    pub conversion_funnel: ConversionFunnel,
}

/// Build the insight report. `events` must be in timestamp order.
pub fn compute_insights(
    window: AnalyticsWindow,
    language: Option<Locale>,
    events: &[AnalyticsEvent],
    dishes: &[Dish],
    options: &InsightOptions,
) -> InsightReport {
    let views: Vec<&AnalyticsEvent> = events.iter().filter(|e| e.action.is_view()).collect();

    InsightReport {
        window,
        language,
        total_events: events.len() as u64,
        total_views: views.len() as u64,
        unique_sessions: unique_sessions(events.iter()),
        average_view_duration: average_minutes(events.iter()),
        top_dishes: top_dishes(events, dishes, options),
        language_distribution: language_distribution(events),
        hourly_views: hourly_views(events),
        top_search_terms: top_search_terms(events, options.limit),
        conversion_funnel: ConversionFunnel::from_events(events),
    }
}

pub(crate) fn unique_sessions<'a>(events: impl Iterator<Item = &'a AnalyticsEvent>) -> usize {
    events
        .map(|e| e.session_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Mean of reported view durations, converted from seconds to minutes.
pub(crate) fn average_minutes<'a>(events: impl Iterator<Item = &'a AnalyticsEvent>) -> f64 {
    let durations: Vec<f64> = events.filter_map(|e| e.view_duration).collect();
    if durations.is_empty() {
        return 0.0;
    }
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    round2(mean / 60.0)
}

/// Sort grouped counts descending. Stable, so equal counts keep first-seen order.
fn ranked<K>(counts: IndexMap<K, u64>) -> Vec<(K, u64)> {
    let mut entries: Vec<(K, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// Dishes ranked by views in the window.
pub fn top_dishes(
    events: &[AnalyticsEvent],
    dishes: &[Dish],
    options: &InsightOptions,
) -> Vec<TopDish> {
    let mut per_dish: IndexMap<&str, Vec<&AnalyticsEvent>> = IndexMap::new();
    for event in events.iter().filter(|e| e.action.is_view()) {
        if let Some(dish_id) = event.dish_id.as_deref() {
            per_dish.entry(dish_id).or_default().push(event);
        }
    }

    let counts: IndexMap<&str, u64> = per_dish
        .iter()
        .map(|(id, views)| (*id, views.len() as u64))
        .collect();

    ranked(counts)
        .into_iter()
        .take(options.limit)
        .map(|(dish_id, total_views)| {
            let views = &per_dish[dish_id];

            let mut languages: IndexMap<Locale, u64> = IndexMap::new();
            for event in views {
                *languages.entry(event.language).or_insert(0) += 1;
            }
            let top_languages = ranked(languages)
                .into_iter()
                .take(TOP_LANGUAGES_PER_DISH)
                .map(|(language, count)| LanguageCount { language, count })
                .collect();

            TopDish {
                dish_id: dish_id.to_string(),
                name: dishes
                    .iter()
                    .find(|d| d.id == dish_id)
                    .map(|d| d.name.get(options.name_language).to_string()),
                total_views,
                unique_viewers: unique_sessions(views.iter().copied()),
                average_view_duration: average_minutes(views.iter().copied()),
                top_languages,
                trending: total_views > options.trending_threshold,
            }
        })
        .collect()
}

/// Share of all events per language, most used first.
pub fn language_distribution(events: &[AnalyticsEvent]) -> Vec<LanguageShare> {
    let mut counts: IndexMap<Locale, u64> = IndexMap::new();
    for event in events {
        *counts.entry(event.language).or_insert(0) += 1;
    }
    let total = events.len() as u64;
    ranked(counts)
        .into_iter()
        .map(|(language, count)| LanguageShare {
            language,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

pub fn hourly_views(events: &[AnalyticsEvent]) -> Vec<HourBucket> {
    let mut buckets: Vec<HourBucket> = (0..24).map(|hour| HourBucket { hour, views: 0 }).collect();
    for event in events.iter().filter(|e| e.action.is_view()) {
        if let Some(bucket) = buckets.get_mut(event.hour_of_day as usize) {
            bucket.views += 1;
        }
    }
    buckets
}

/// Search queries grouped case-insensitively.
pub fn top_search_terms(events: &[AnalyticsEvent], limit: usize) -> Vec<SearchTerm> {
    let mut counts: IndexMap<String, u64> = IndexMap::new();
    for event in events.iter().filter(|e| e.action == AnalyticsAction::Search) {
        if let Some(query) = event.search_query.as_deref() {
            let query = query.trim().to_lowercase();
            if !query.is_empty() {
                *counts.entry(query).or_insert(0) += 1;
            }
        }
    }
    ranked(counts)
        .into_iter()
        .take(limit)
        .map(|(query, count)| SearchTerm { query, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{at, event, view};
    use crate::menu::fixtures::dish;

    fn options() -> InsightOptions {
        InsightOptions {
            limit: 10,
            trending_threshold: 100,
            name_language: Locale::En,
        }
    }

    fn window() -> AnalyticsWindow {
        AnalyticsWindow {
            start: at(1, 0),
            end: at(31, 0),
        }
    }

    #[test]
    fn test_trending_boundary() {
        let mut events: Vec<AnalyticsEvent> = (0..100).map(|_| view("d1", Locale::En, "s")).collect();
        let at_threshold = top_dishes(&events, &[], &options());
        assert_eq!(at_threshold[0].total_views, 100);
        assert!(!at_threshold[0].trending);

        events.push(view("d1", Locale::En, "s"));
        let above = top_dishes(&events, &[], &options());
        assert_eq!(above[0].total_views, 101);
        assert!(above[0].trending);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let events = vec![
            view("b", Locale::En, "s1"),
            view("a", Locale::En, "s1"),
            view("c", Locale::En, "s1"),
            view("c", Locale::En, "s2"),
            view("a", Locale::En, "s2"),
        ];
        let ids: Vec<String> = top_dishes(&events, &[], &options())
            .into_iter()
            .map(|d| d.dish_id)
            .collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_language_counts_sum_to_total() {
        let events = vec![
            view("d1", Locale::Th, "s1"),
            view("d1", Locale::Th, "s2"),
            event(AnalyticsAction::Search, None, Locale::Fr, "s3", at(12, 8)),
            event(AnalyticsAction::Share, Some("d1"), Locale::De, "s4", at(12, 9)),
        ];
        let report = compute_insights(window(), None, &events, &[], &options());

        let sum: u64 = report.language_distribution.iter().map(|l| l.count).sum();
        assert_eq!(sum, report.total_events);
        assert_eq!(report.language_distribution[0].language, Locale::Th);
        assert_eq!(report.language_distribution[0].percentage, 50.0);
        assert_eq!(report.total_views, 2);
        assert_eq!(report.unique_sessions, 4);
        assert_eq!(report.conversion_funnel.shares, 1);
    }

    #[test]
    fn test_empty_window_is_zero_filled() {
        let report = compute_insights(window(), Some(Locale::Ru), &[], &[], &options());
        assert_eq!(report.total_events, 0);
        assert_eq!(report.hourly_views.len(), 24);
        assert!(report.hourly_views.iter().all(|b| b.views == 0));
        assert!(report.top_dishes.is_empty());
        assert!(report.language_distribution.is_empty());
        assert_eq!(report.average_view_duration, 0.0);
        assert_eq!(report.conversion_funnel, ConversionFunnel::default());
    }

    #[test]
    fn test_top_dish_details() {
        let mut long = view("d1", Locale::Ru, "s1");
        long.view_duration = Some(90.0);
        let mut short = view("d1", Locale::Ru, "s1");
        short.view_duration = Some(30.0);
        let detail = event(AnalyticsAction::DetailView, Some("d1"), Locale::En, "s2", at(12, 20));
        let events = vec![long, short, detail, view("gone", Locale::En, "s3")];

        let report = compute_insights(
            window(),
            None,
            &events,
            &[dish("d1", "Pad Thai", "3", 220.0)],
            &options(),
        );

        let top = &report.top_dishes[0];
        assert_eq!(top.name.as_deref(), Some("Pad Thai"));
        assert_eq!(top.total_views, 3);
        assert_eq!(top.unique_viewers, 2);
        assert_eq!(top.average_view_duration, 1.0);
        assert_eq!(top.top_languages[0].language, Locale::Ru);
        assert_eq!(report.top_dishes[1].name, None);

        assert_eq!(report.hourly_views[19].views, 3);
        assert_eq!(report.hourly_views[20].views, 1);
    }

    #[test]
    fn test_search_terms_grouped_case_insensitively() {
        let mut events = Vec::new();
        for query in ["Curry", "pad thai", "curry ", "CURRY", "Pad Thai"] {
            let mut e = event(AnalyticsAction::Search, None, Locale::En, "s1", at(12, 12));
            e.search_query = Some(query.to_string());
            events.push(e);
        }
        let terms = top_search_terms(&events, 10);
        assert_eq!(
            terms,
            vec![
                SearchTerm {
                    query: "curry".to_string(),
                    count: 3
                },
                SearchTerm {
                    query: "pad thai".to_string(),
                    count: 2
                },
            ]
        );
    }
}
