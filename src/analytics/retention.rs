//! Background purge of old analytics events.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::AnalyticsConfig;
use crate::db::Repository;
use crate::errors::AppError;

/// Delete events older than `retention_days`. Returns the number removed.
pub async fn purge_expired(repo: &Repository, retention_days: i64) -> Result<u64, AppError> {
    let cutoff = Utc::now() - Duration::days(retention_days);
    let removed = repo.purge_events_before(cutoff).await?;
    if removed > 0 {
        tracing::info!("Purged {} analytics events older than {}", removed, cutoff);
    }
    Ok(removed)
}

/// Run [`purge_expired`] every `retention_interval_secs` until `cancel` fires.
pub fn spawn_retention_task(
    repo: Arc<Repository>,
    config: AnalyticsConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = StdDuration::from_secs(config.retention_interval_secs.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Analytics retention task stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = purge_expired(&repo, config.retention_days).await {
                        tracing::warn!("Analytics retention pass failed: {}", e);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::event;
    use crate::models::{AnalyticsAction, Locale};
    use tempfile::TempDir;

    async fn repository(dir: &TempDir) -> Repository {
        let pool = crate::db::init_database(&dir.path().join("menu.sqlite"))
            .await
            .unwrap();
        Repository::new(pool)
    }

    #[tokio::test]
    async fn test_purge_keeps_recent_events() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;

        let now = Utc::now();
        let old = event(AnalyticsAction::View, Some("d1"), Locale::En, "s1", now - Duration::days(400));
        let recent = event(AnalyticsAction::View, Some("d1"), Locale::En, "s1", now - Duration::days(2));
        repo.insert_event(&old).await.unwrap();
        repo.insert_event(&recent).await.unwrap();

        assert_eq!(purge_expired(&repo, 365).await.unwrap(), 1);
        let left = repo
            .events_between(now - Duration::days(1000), now, None)
            .await
            .unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, recent.id);
    }

    #[tokio::test]
    async fn test_task_stops_on_cancel() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(repository(&dir).await);
        let cancel = CancellationToken::new();

        let handle = spawn_retention_task(repo, AnalyticsConfig::default(), cancel.clone());
        cancel.cancel();
        tokio::time::timeout(StdDuration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
