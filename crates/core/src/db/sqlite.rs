//! SQLite-backed account audit log.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::audit::{AuditEntry, AuditKind, AuditSink};
use crate::error::Result;
use crate::person::PersonRecord;

pub struct SqliteAuditLog {
    pool: SqlitePool,
}

impl SqliteAuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Entries for a person, matched by username or numeric id, newest first.
    pub async fn list_for_person(&self, person: &PersonRecord, limit: i64) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT id, username, numeric_id, kind, message, created_at FROM account_log
             WHERE (?1 IS NOT NULL AND username = ?1) OR (?2 IS NOT NULL AND numeric_id = ?2)
             ORDER BY id DESC LIMIT ?3",
        )
        .bind(person.username())
        .bind(person.numeric_id())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Most recent entries across all accounts, newest first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT id, username, numeric_id, kind, message, created_at FROM account_log
             ORDER BY id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}

fn row_to_entry(r: &sqlx::sqlite::SqliteRow) -> Result<AuditEntry> {
    let created_str: String = r.get("created_at");
    let created_at = chrono::NaiveDateTime::parse_from_str(&created_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_default()
        .and_utc();
    let kind: String = r.get("kind");
    Ok(AuditEntry {
        id: r.get("id"),
        username: r.get("username"),
        numeric_id: r.get("numeric_id"),
        kind: kind.parse()?,
        message: r.get("message"),
        created_at,
    })
}

#[async_trait]
impl AuditSink for SqliteAuditLog {
    async fn record(&self, person: &PersonRecord, kind: AuditKind, message: &str) -> Result<()> {
        sqlx::query("INSERT INTO account_log (username, numeric_id, kind, message) VALUES (?1, ?2, ?3, ?4)")
            .bind(person.username())
            .bind(person.numeric_id())
            .bind(kind.as_str())
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn backfill_username(&self, person: &PersonRecord) -> Result<()> {
        let (Some(username), Some(numeric_id)) = (person.username(), person.numeric_id()) else {
            return Ok(());
        };
        sqlx::query("UPDATE account_log SET username = ?1 WHERE numeric_id = ?2 AND username IS NULL")
            .bind(username)
            .bind(numeric_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_username(
        &self,
        numeric_id: Option<&str>,
        old_username: &str,
        new_username: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE account_log SET username = ?1 WHERE username = ?2")
            .bind(new_username)
            .bind(old_username)
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT INTO account_log (username, numeric_id, kind, message) VALUES (?1, ?2, ?3, ?4)")
            .bind(new_username)
            .bind(numeric_id)
            .bind(AuditKind::Update.as_str())
            .bind(format!("username changed from {old_username} to {new_username}"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
