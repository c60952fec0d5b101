use common::NodeKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One tree node. Media and content share the table, told apart by `object_type`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "node")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub object_type: NodeKind,

    /// `-1` for root-level nodes, the kind's recycle bin id for binned ones.
    pub parent_id: i32,
    /// Ancestor ids joined by `,`, ending in `id`.
    pub path: String,
    pub level: i32,
    pub sort_order: i32,
    pub name: String,

    pub content_type_id: i32,
    pub creator_id: i32,
    pub trashed: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
