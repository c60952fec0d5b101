//! Audit trail sinks.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::warn;

use crate::entity::audit_entry;
use crate::models::AuditEntry;

/// Destination for audit records.
///
/// Recording is fire-and-forget: implementations swallow their own failures.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}

/// Writes entries to the `audit_entry` table.
#[derive(Debug, Clone)]
pub struct DbAuditSink {
    db: DatabaseConnection,
}

impl DbAuditSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for DbAuditSink {
    async fn record(&self, entry: AuditEntry) {
        let model = audit_entry::ActiveModel {
            kind: Set(entry.kind),
            description: Set(entry.description.clone()),
            user_id: Set(entry.user_id),
            entity_id: Set(entry.entity_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        if let Err(e) = model.insert(&self.db).await {
            warn!(
                kind = %entry.kind,
                entity_id = entry.entity_id,
                error = %e,
                "Failed to record audit entry"
            );
        }
    }
}

/// Discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _entry: AuditEntry) {}
}
