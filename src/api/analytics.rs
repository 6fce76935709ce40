//! Analytics API endpoints.

use axum::extract::State;
use chrono::Utc;

use super::{error, success, ApiJson, ApiQuery, ApiResult};
use crate::analytics::{
    compute_insights, daily_stats, hourly_stats, overview, top_dishes, AnalyticsWindow,
    DailyBucket, HourlyStats, InsightOptions, InsightReport, Overview, TopDish, WindowQuery,
};
use crate::errors::AppError;
use crate::models::{AnalyticsEvent, Locale, TrackEventRequest};
use crate::AppState;

/// Largest accepted `limit`.
const MAX_REPORT_LIMIT: usize = 100;

/// POST /api/analytics/track - Record a menu interaction.
pub async fn track_event(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TrackEventRequest>,
) -> ApiResult<AnalyticsEvent> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    if request.session_id.trim().is_empty() {
        return error(
            AppError::Validation("sessionId is required".to_string()),
            revision_id,
        );
    }
    if let Some(duration) = request.view_duration {
        if !duration.is_finite() || duration < 0.0 {
            return error(
                AppError::Validation("viewDuration must be a non-negative number".to_string()),
                revision_id,
            );
        }
    }

    let event = AnalyticsEvent::from_request(request, Utc::now());
    if let Err(e) = state.repo.insert_event(&event).await {
        return error(e, revision_id);
    }

    // The view counter is best effort; the event itself is already stored
    if let (true, Some(dish_id)) = (event.action.is_view(), event.dish_id.as_deref()) {
        match state.catalog.record_dish_view(dish_id).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("View tracked for unknown dish {}", dish_id),
            Err(e) => tracing::warn!("Failed to bump views of dish {}: {}", dish_id, e),
        }
    }

    let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
    success(event, new_revision)
}

struct ReportInput {
    window: AnalyticsWindow,
    events: Vec<AnalyticsEvent>,
    options: InsightOptions,
}

async fn load_report(state: &AppState, query: &WindowQuery) -> Result<ReportInput, AppError> {
    let analytics = &state.config.analytics;
    let window = AnalyticsWindow::resolve(
        query.start,
        query.end,
        analytics.default_window_days,
        analytics.max_window_days,
        Utc::now(),
    )?;
    let events = state
        .repo
        .events_between(window.start, window.end, query.language)
        .await?;

    Ok(ReportInput {
        window,
        events,
        options: InsightOptions {
            limit: query
                .limit
                .unwrap_or(analytics.top_dishes_limit)
                .clamp(1, MAX_REPORT_LIMIT),
            trending_threshold: analytics.trending_threshold,
            name_language: query.language.unwrap_or(Locale::En),
        },
    })
}

/// GET /api/analytics - Insight report for the dashboard.
pub async fn get_insights(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> ApiResult<InsightReport> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let input = match load_report(&state, &query).await {
        Ok(input) => input,
        Err(e) => return error(e, revision_id),
    };
    let dishes = match state.catalog.list_dishes().await {
        Ok(dishes) => dishes,
        Err(e) => return error(e, revision_id),
    };

    success(
        compute_insights(input.window, query.language, &input.events, &dishes, &input.options),
        revision_id,
    )
}

/// GET /api/analytics/overview - Totals and funnel for the window.
pub async fn get_overview(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> ApiResult<Overview> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match load_report(&state, &query).await {
        Ok(input) => success(overview(input.window, &input.events), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/analytics/top-dishes - Most viewed dishes.
pub async fn get_top_dishes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> ApiResult<Vec<TopDish>> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let input = match load_report(&state, &query).await {
        Ok(input) => input,
        Err(e) => return error(e, revision_id),
    };
    match state.catalog.list_dishes().await {
        Ok(dishes) => success(top_dishes(&input.events, &dishes, &input.options), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/analytics/daily-stats - One bucket per day of the window.
pub async fn get_daily_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> ApiResult<Vec<DailyBucket>> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match load_report(&state, &query).await {
        Ok(input) => success(daily_stats(input.window, &input.events), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/analytics/hourly-stats - Views by hour of day and day of week.
pub async fn get_hourly_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> ApiResult<HourlyStats> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match load_report(&state, &query).await {
        Ok(input) => success(hourly_stats(&input.events), revision_id),
        Err(e) => error(e, revision_id),
    }
}
