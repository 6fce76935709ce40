//! Database repository for users, orders and analytics events.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    format_timestamp, now_timestamp, AnalyticsAction, AnalyticsEvent, DeviceType, Locale, Order,
    OrderItem, OrderStatus, Role, User,
};

/// Database repository for non-catalog data.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, name, role, is_active, last_login, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Look a user up by email, ignoring case.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, name, role, is_active, last_login, created_at FROM users WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Create a user from an already-hashed password.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let email = normalize_email(email);
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, role, is_active, last_login, created_at) VALUES (?, ?, ?, ?, ?, 1, NULL, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(password_hash)
        .bind(name)
        .bind(role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // The UNIQUE constraint on email decides between concurrent registrations
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation(format!("Email {} is already registered", email))
            }
            other => other.into(),
        })?;

        Ok(User {
            id,
            email,
            password_hash: password_hash.to_string(),
            name: name.to_string(),
            role,
            is_active: true,
            last_login: None,
            created_at: now,
        })
    }

    /// Stamp a successful login and return the timestamp.
    pub async fn touch_last_login(&self, id: &str) -> Result<String, AppError> {
        let now = now_timestamp();
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(now)
    }

    // ==================== ORDER OPERATIONS ====================

    pub async fn create_order(&self, order: &Order) -> Result<(), AppError> {
        let items_json = serde_json::to_string(&order.items)
            .map_err(|e| AppError::Internal(format!("Failed to encode order items: {}", e)))?;

        sqlx::query(
            "INSERT INTO orders (id, table_number, items, total, currency, status, language, notes, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(order.table_number as i64)
        .bind(&items_json)
        .bind(order.total)
        .bind(&order.currency)
        .bind(order.status.as_str())
        .bind(order.language.as_str())
        .bind(&order.notes)
        .bind(&order.created_at)
        .bind(&order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Orders newest first, optionally restricted to a status and/or table.
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        table_number: Option<u32>,
    ) -> Result<Vec<Order>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, table_number, items, total, currency, status, language, notes, created_at, updated_at
               FROM orders
               WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR table_number = ?2)
               ORDER BY created_at DESC"#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(table_number.map(|t| t as i64))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    pub async fn get_order(&self, id: &str) -> Result<Option<Order>, AppError> {
        let row = sqlx::query(
            "SELECT id, table_number, items, total, currency, status, language, notes, created_at, updated_at FROM orders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    /// Move an order to `next`, enforcing the status lifecycle.
    pub async fn update_order_status(
        &self,
        id: &str,
        next: OrderStatus,
    ) -> Result<Order, AppError> {
        let existing = self
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        if !existing.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "Cannot move order from {} to {}",
                existing.status.as_str(),
                next.as_str()
            )));
        }

        let now = now_timestamp();
        // Conditional on the status we validated against
        let result = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(next.as_str())
        .bind(&now)
        .bind(id)
        .bind(existing.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "Order {} changed status concurrently",
                id
            )));
        }

        Ok(Order {
            status: next,
            updated_at: now,
            ..existing
        })
    }

    // ==================== ANALYTICS OPERATIONS ====================

    pub async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO menu_analytics (
                id, dish_id, action, language, session_id, search_query, filter_used,
                view_duration, device_type, timestamp, day_of_week, hour_of_day
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&event.id)
        .bind(&event.dish_id)
        .bind(event.action.as_str())
        .bind(event.language.as_str())
        .bind(&event.session_id)
        .bind(&event.search_query)
        .bind(&event.filter_used)
        .bind(event.view_duration)
        .bind(event.device_type.as_str())
        .bind(format_timestamp(event.timestamp))
        .bind(event.day_of_week as i64)
        .bind(event.hour_of_day as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Events with `start <= timestamp <= end` in chronological order.
    pub async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        language: Option<Locale>,
    ) -> Result<Vec<AnalyticsEvent>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, dish_id, action, language, session_id, search_query, filter_used,
                      view_duration, device_type, timestamp, day_of_week, hour_of_day
               FROM menu_analytics
               WHERE timestamp >= ?1 AND timestamp <= ?2 AND (?3 IS NULL OR language = ?3)
               ORDER BY timestamp, rowid"#,
        )
        .bind(format_timestamp(start))
        .bind(format_timestamp(end))
        .bind(language.map(|l| l.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(event_from_row).collect()
    }

    /// Delete events recorded before `cutoff`. Returns how many were removed.
    pub async fn purge_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM menu_analytics WHERE timestamp < ?")
            .bind(format_timestamp(cutoff))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// Helper functions for row conversion

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn corrupt(what: &str, value: &str) -> AppError {
    AppError::Database(format!("Unexpected {} value '{}' in database", what, value))
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, AppError> {
    let role: String = row.get("role");
    let is_active: i32 = row.get("is_active");
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        role: Role::from_str(&role).ok_or_else(|| corrupt("role", &role))?,
        is_active: is_active != 0,
        last_login: row.get("last_login"),
        created_at: row.get("created_at"),
    })
}

fn order_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Order, AppError> {
    let items: String = row.get("items");
    let status: String = row.get("status");
    let language: String = row.get("language");
    let table_number: i64 = row.get("table_number");

    Ok(Order {
        id: row.get("id"),
        table_number: table_number as u32,
        items: serde_json::from_str::<Vec<OrderItem>>(&items)
            .map_err(|_| corrupt("order items", &items))?,
        total: row.get("total"),
        currency: row.get("currency"),
        status: OrderStatus::from_str(&status).ok_or_else(|| corrupt("status", &status))?,
        language: Locale::from_str(&language).ok_or_else(|| corrupt("language", &language))?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn event_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnalyticsEvent, AppError> {
    let action: String = row.get("action");
    let language: String = row.get("language");
    let device_type: String = row.get("device_type");
    let timestamp: String = row.get("timestamp");
    let day_of_week: i64 = row.get("day_of_week");
    let hour_of_day: i64 = row.get("hour_of_day");

    Ok(AnalyticsEvent {
        id: row.get("id"),
        dish_id: row.get("dish_id"),
        action: AnalyticsAction::from_str(&action).ok_or_else(|| corrupt("action", &action))?,
        language: Locale::from_str(&language).ok_or_else(|| corrupt("language", &language))?,
        session_id: row.get("session_id"),
        search_query: row.get("search_query"),
        filter_used: row.get("filter_used"),
        view_duration: row.get("view_duration"),
        device_type: DeviceType::from_str(&device_type)
            .ok_or_else(|| corrupt("device type", &device_type))?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|_| corrupt("timestamp", &timestamp))?
            .with_timezone(&Utc),
        day_of_week: day_of_week as u32,
        hour_of_day: hour_of_day as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocalizedText, TrackEventRequest};
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    async fn repo(dir: &TempDir) -> Repository {
        let pool = crate::db::init_database(&dir.path().join("test.sqlite"))
            .await
            .unwrap();
        Repository::new(pool)
    }

    fn event_at(action: AnalyticsAction, ts: DateTime<Utc>) -> AnalyticsEvent {
        AnalyticsEvent::from_request(
            TrackEventRequest {
                dish_id: Some("d1".to_string()),
                action,
                language: Locale::Fr,
                session_id: "s1".to_string(),
                search_query: None,
                filter_used: None,
                view_duration: Some(30.0),
                device_type: DeviceType::Tablet,
            },
            ts,
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;

        repo.create_user("Owner@Example.com", "hash", "Owner", Role::Admin)
            .await
            .unwrap();
        let err = repo
            .create_user("owner@example.com ", "hash", "Other", Role::Staff)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let found = repo.find_user_by_email("OWNER@example.com").await.unwrap();
        assert_eq!(found.unwrap().role, Role::Admin);
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_registration_keeps_one_user() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;

        let (first, second) = tokio::join!(
            repo.create_user("cook@example.com", "hash", "Cook", Role::Staff),
            repo.create_user("Cook@example.com", "hash", "Cook", Role::Staff),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::Validation(_)))));
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_order_status_lifecycle() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;
        let now = now_timestamp();
        let order = Order {
            id: "o1".to_string(),
            table_number: 4,
            items: vec![OrderItem {
                dish_id: "d1".to_string(),
                name: LocalizedText::uniform("Som Tam"),
                quantity: 2,
                price: 90.0,
            }],
            total: 180.0,
            currency: "THB".to_string(),
            status: OrderStatus::Pending,
            language: Locale::Th,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        };
        repo.create_order(&order).await.unwrap();

        let confirmed = repo
            .update_order_status("o1", OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let err = repo
            .update_order_status("o1", OrderStatus::Served)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let pending = repo
            .list_orders(Some(OrderStatus::Pending), None)
            .await
            .unwrap();
        assert!(pending.is_empty());
        let at_table = repo.list_orders(None, Some(4)).await.unwrap();
        assert_eq!(at_table.len(), 1);
        assert_eq!(at_table[0].items, order.items);
    }

    #[tokio::test]
    async fn test_events_window_and_purge() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        for days_ago in [0, 3, 10, 400] {
            repo.insert_event(&event_at(AnalyticsAction::View, base - Duration::days(days_ago)))
                .await
                .unwrap();
        }

        let week = repo
            .events_between(base - Duration::days(7), base, None)
            .await
            .unwrap();
        assert_eq!(week.len(), 2);
        assert!(week[0].timestamp < week[1].timestamp);
        assert_eq!(week[1].device_type, DeviceType::Tablet);

        let english = repo
            .events_between(base - Duration::days(7), base, Some(Locale::En))
            .await
            .unwrap();
        assert!(english.is_empty());

        let purged = repo
            .purge_events_before(base - Duration::days(365))
            .await
            .unwrap();
        assert_eq!(purged, 1);
    }
}
