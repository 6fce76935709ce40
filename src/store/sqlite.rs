//! SQLite document backend.
//!
//! Each collection is a table of JSON documents keyed by id, with the
//! version kept in its own column for conditional updates. The catalog
//! revision lives in the `meta` row and is bumped in the same transaction
//! as the write.

use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::Document;
use crate::errors::AppError;
use crate::models::{now_timestamp, RevisionInfo};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    pub async fn list<D: Document>(&self) -> Result<Vec<D>, AppError> {
        let sql = format!("SELECT body FROM {} ORDER BY rowid", D::COLLECTION.name());
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|row| decode(row.get("body"))).collect()
    }

    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<D>, AppError> {
        let sql = format!("SELECT body FROM {} WHERE id = ?", D::COLLECTION.name());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| decode(r.get("body"))).transpose()
    }

    pub async fn insert<D: Document>(&self, doc: &D) -> Result<(), AppError> {
        let body = encode(doc)?;
        let now = now_timestamp();
        let sql = format!(
            "INSERT INTO {} (id, body, version, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            D::COLLECTION.name()
        );

        let mut tx = self.pool.begin().await?;
        sqlx::query(&sql)
            .bind(doc.id())
            .bind(&body)
            .bind(doc.version())
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        bump_revision(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn replace<D: Document>(&self, doc: &D, expected_version: i64) -> Result<bool, AppError> {
        let body = encode(doc)?;
        let sql = format!(
            "UPDATE {} SET body = ?, version = ?, updated_at = ? WHERE id = ? AND version = ?",
            D::COLLECTION.name()
        );

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql)
            .bind(&body)
            .bind(doc.version())
            .bind(now_timestamp())
            .bind(doc.id())
            .bind(expected_version)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn remove<D: Document>(&self, id: &str) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", D::COLLECTION.name());

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        Ok(true)
    }
}

async fn bump_revision(tx: &mut Transaction<'_, Sqlite>) -> Result<(), AppError> {
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(now_timestamp())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn encode<D: Document>(doc: &D) -> Result<String, AppError> {
    serde_json::to_string(doc)
        .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", doc.id(), e)))
}

fn decode<D: Document>(body: String) -> Result<D, AppError> {
    serde_json::from_str(&body).map_err(|e| {
        AppError::Storage(format!(
            "Corrupt document in {}: {}",
            D::COLLECTION.name(),
            e
        ))
    })
}
