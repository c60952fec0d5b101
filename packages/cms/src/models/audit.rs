use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an audit trail entry.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sea_orm::DeriveActiveEnum,
    sea_orm::EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum AuditKind {
    #[sea_orm(string_value = "New")]
    New,
    #[sea_orm(string_value = "Save")]
    Save,
    #[sea_orm(string_value = "Move")]
    Move,
    #[sea_orm(string_value = "Delete")]
    Delete,
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "New",
            Self::Save => "Save",
            Self::Move => "Move",
            Self::Delete => "Delete",
        };
        f.write_str(s)
    }
}

/// A single audit record, written after the unit of work it describes commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub kind: AuditKind,
    pub description: String,
    pub user_id: i32,
    /// `-1` when the entry summarises a batch.
    pub entity_id: i32,
}

impl AuditEntry {
    pub fn new(
        kind: AuditKind,
        description: impl Into<String>,
        user_id: i32,
        entity_id: i32,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            user_id,
            entity_id,
        }
    }
}
