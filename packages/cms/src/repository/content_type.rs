use chrono::Utc;
use common::NodeKind;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
};
use tracing::debug;

use crate::entity::content_type;
use crate::error::{ServiceError, ServiceResult};
use crate::models::ContentType;

pub struct ContentTypeRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ContentTypeRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Option<ContentType>> {
        Ok(content_type::Entity::find_by_id(id).one(self.conn).await?)
    }

    /// Look up a type by alias within one node kind.
    pub async fn get_by_alias(
        &self,
        kind: NodeKind,
        alias: &str,
    ) -> ServiceResult<Option<ContentType>> {
        Ok(content_type::Entity::find()
            .filter(content_type::Column::ObjectType.eq(kind))
            .filter(content_type::Column::Alias.eq(alias))
            .one(self.conn)
            .await?)
    }

    /// Register a new type. Aliases are unique per kind.
    pub async fn create(
        &self,
        kind: NodeKind,
        alias: &str,
        name: &str,
    ) -> ServiceResult<ContentType> {
        let taken = || {
            ServiceError::Validation(format!(
                "{} type alias '{}' is already in use",
                kind.display_name(),
                alias
            ))
        };
        if self.get_by_alias(kind, alias).await?.is_some() {
            return Err(taken());
        }

        let model = content_type::ActiveModel {
            object_type: Set(kind),
            alias: Set(alias.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model.insert(self.conn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                debug!(alias, "Content type alias race caught on insert");
                taken()
            }
            _ => ServiceError::from(e),
        })
    }

    /// Remove a type. Nodes built from it are left alone.
    pub async fn delete(&self, id: i32) -> ServiceResult<()> {
        let result = content_type::Entity::delete_by_id(id).exec(self.conn).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Content type {id} not found")));
        }
        Ok(())
    }
}
