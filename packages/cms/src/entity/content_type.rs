use common::NodeKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Schema definition a node is built from (a media type or a document type).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "kind_alias")]
    pub object_type: NodeKind,
    #[sea_orm(unique_key = "kind_alias")]
    pub alias: String,
    pub name: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
