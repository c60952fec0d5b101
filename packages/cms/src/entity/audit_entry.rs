use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::audit::AuditKind;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kind: AuditKind,
    pub description: String,
    pub user_id: i32,
    /// `-1` for entries that summarise a batch.
    pub entity_id: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
