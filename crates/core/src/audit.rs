//! Account audit log: entry types, the sink trait and a tracing-backed sink.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AccountError, Result};
use crate::person::PersonRecord;

/// What kind of event an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditKind {
    Create,
    Update,
    Error,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditKind {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "ERROR" => Ok(Self::Error),
            other => Err(AccountError::Serialization(format!(
                "unknown audit kind: {other}"
            ))),
        }
    }
}

/// An entry waiting to be written, not yet attributed to a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub kind: AuditKind,
    pub message: String,
}

impl PendingEntry {
    pub fn new(kind: AuditKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A persisted audit log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub username: Option<String>,
    pub numeric_id: Option<String>,
    pub kind: AuditKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only destination for account audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry for `person`.
    async fn record(&self, person: &PersonRecord, kind: AuditKind, message: &str) -> Result<()>;

    /// Attach `person`'s username to earlier entries recorded under the numeric id alone.
    async fn backfill_username(&self, person: &PersonRecord) -> Result<()>;

    /// Rewrite history after a username change.
    async fn update_username(
        &self,
        numeric_id: Option<&str>,
        old_username: &str,
        new_username: &str,
    ) -> Result<()>;
}

/// Writes audit entries to the tracing output. Used when no audit database
/// is configured.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditSink for TracingAuditLog {
    async fn record(&self, person: &PersonRecord, kind: AuditKind, message: &str) -> Result<()> {
        info!(
            target: "gaccount::audit",
            username = person.username().unwrap_or("-"),
            numeric_id = person.numeric_id().unwrap_or("-"),
            kind = %kind,
            "{message}"
        );
        Ok(())
    }

    async fn backfill_username(&self, person: &PersonRecord) -> Result<()> {
        info!(
            target: "gaccount::audit",
            username = person.username().unwrap_or("-"),
            numeric_id = person.numeric_id().unwrap_or("-"),
            "username back-filled"
        );
        Ok(())
    }

    async fn update_username(
        &self,
        numeric_id: Option<&str>,
        old_username: &str,
        new_username: &str,
    ) -> Result<()> {
        info!(
            target: "gaccount::audit",
            numeric_id = numeric_id.unwrap_or("-"),
            old_username,
            new_username,
            "username changed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [AuditKind::Create, AuditKind::Update, AuditKind::Error] {
            let parsed: AuditKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("DELETE".parse::<AuditKind>().is_err());
    }

    #[test]
    fn kind_serializes_uppercase() {
        let json = serde_json::to_string(&AuditKind::Update).unwrap();
        assert_eq!(json, "\"UPDATE\"");
    }

    #[test]
    fn pending_entry_new() {
        let e = PendingEntry::new(AuditKind::Update, "moved");
        assert_eq!(e.kind, AuditKind::Update);
        assert_eq!(e.message, "moved");
    }

    #[tokio::test]
    async fn tracing_sink_accepts_everything() {
        let sink = TracingAuditLog;
        let person = PersonRecord::new(Some("jdoe".into()), None).unwrap();
        sink.record(&person, AuditKind::Create, "created").await.unwrap();
        sink.backfill_username(&person).await.unwrap();
        sink.update_username(None, "jdoe", "jdoe2").await.unwrap();
    }
}
