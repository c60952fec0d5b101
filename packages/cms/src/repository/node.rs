use chrono::Utc;
use common::{NodeKind, ROOT_ID};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::entity::node;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Node, path};

/// Node access for a single [`NodeKind`].
///
/// Keeps `path` and `level` consistent with the live parent chain: both are
/// recomputed on every upsert and descendant paths are rewritten when a
/// node changes place.
pub struct NodeRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
    kind: NodeKind,
}

impl<'a, C: ConnectionTrait> NodeRepository<'a, C> {
    pub fn new(conn: &'a C, kind: NodeKind) -> Self {
        Self { conn, kind }
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Option<Node>> {
        let row = node::Entity::find_by_id(id)
            .filter(node::Column::ObjectType.eq(self.kind))
            .one(self.conn)
            .await?;
        Ok(row.map(Node::from))
    }

    pub async fn get_many(&self, ids: &[i32]) -> ServiceResult<Vec<Node>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query(Condition::all().add(node::Column::Id.is_in(ids.to_vec())))
            .await
    }

    /// All nodes of this kind matching `condition`, in tree order.
    pub async fn query(&self, condition: Condition) -> ServiceResult<Vec<Node>> {
        let rows = node::Entity::find()
            .filter(node::Column::ObjectType.eq(self.kind))
            .filter(condition)
            .order_by_asc(node::Column::Level)
            .order_by_asc(node::Column::SortOrder)
            .order_by_asc(node::Column::Id)
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(Node::from).collect())
    }

    pub async fn children(&self, parent_id: i32) -> ServiceResult<Vec<Node>> {
        self.query(Condition::all().add(node::Column::ParentId.eq(parent_id)))
            .await
    }

    pub async fn count_children(&self, parent_id: i32) -> ServiceResult<u64> {
        Ok(node::Entity::find()
            .filter(node::Column::ObjectType.eq(self.kind))
            .filter(node::Column::ParentId.eq(parent_id))
            .count(self.conn)
            .await?)
    }

    /// Nodes whose path is `ancestor_path` or lies beneath it.
    pub async fn descendants(&self, ancestor_path: &str) -> ServiceResult<Vec<Node>> {
        self.query(Self::within(ancestor_path)).await
    }

    pub async fn by_content_type(&self, content_type_id: i32) -> ServiceResult<Vec<Node>> {
        self.query(Condition::all().add(node::Column::ContentTypeId.eq(content_type_id)))
            .await
    }

    /// Direct children of this kind's recycle bin.
    pub async fn in_bin(&self) -> ServiceResult<Vec<Node>> {
        self.children(self.kind.recycle_bin_id()).await
    }

    /// Insert a transient node or update a persisted one.
    ///
    /// On return `node` carries its assigned id, path and level.
    pub async fn upsert(&self, node: &mut Node) -> ServiceResult<()> {
        let parent_path = self.parent_path(node.parent_id).await?;
        let now = Utc::now();
        node.updated_at = now;

        if !node.has_identity() {
            let inserted = node::ActiveModel {
                object_type: Set(self.kind),
                parent_id: Set(node.parent_id),
                path: Set(String::new()),
                level: Set(0),
                sort_order: Set(node.sort_order),
                name: Set(node.name.clone()),
                content_type_id: Set(node.content_type_id),
                creator_id: Set(node.creator_id),
                trashed: Set(node.trashed),
                created_at: Set(node.created_at),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(self.conn)
            .await?;

            node.id = inserted.id;
            node.path = path::child_path(&parent_path, inserted.id);
            node.level = path::level_of(&node.path);

            node::ActiveModel {
                id: Set(node.id),
                path: Set(node.path.clone()),
                level: Set(node.level),
                ..Default::default()
            }
            .update(self.conn)
            .await?;

            debug!(kind = %self.kind, id = node.id, path = %node.path, "Inserted node");
            return Ok(());
        }

        let stored = node::Entity::find_by_id(node.id)
            .filter(node::Column::ObjectType.eq(self.kind))
            .one(self.conn)
            .await?
            .ok_or_else(|| self.not_found(node.id))?;

        if path::is_within(&parent_path, &stored.path) {
            return Err(ServiceError::Validation(format!(
                "cannot place {} {} beneath itself or one of its descendants",
                self.kind, node.id
            )));
        }

        let new_path = path::child_path(&parent_path, node.id);
        if new_path != stored.path {
            self.rebase_descendants(&stored.path, &new_path).await?;
        }

        node.path = new_path;
        node.level = path::level_of(&node.path);

        node::ActiveModel {
            id: Set(node.id),
            object_type: Set(self.kind),
            parent_id: Set(node.parent_id),
            path: Set(node.path.clone()),
            level: Set(node.level),
            sort_order: Set(node.sort_order),
            name: Set(node.name.clone()),
            content_type_id: Set(node.content_type_id),
            creator_id: Set(node.creator_id),
            trashed: Set(node.trashed),
            created_at: Set(node.created_at),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(self.conn)
        .await?;

        Ok(())
    }

    /// Remove a node together with its subtree.
    ///
    /// Fails with [`ServiceError::NotFound`] if the node no longer exists.
    pub async fn delete(&self, node: &Node) -> ServiceResult<u64> {
        let stored = self.get(node.id).await?.ok_or_else(|| self.not_found(node.id))?;

        let result = node::Entity::delete_many()
            .filter(node::Column::ObjectType.eq(self.kind))
            .filter(Self::within(&stored.path))
            .exec(self.conn)
            .await?;

        debug!(kind = %self.kind, id = node.id, rows = result.rows_affected, "Deleted node");
        Ok(result.rows_affected)
    }

    /// Remove everything under this kind's recycle bin.
    pub async fn delete_bin_contents(&self) -> ServiceResult<u64> {
        let prefix = path::descendant_prefix(&self.kind.recycle_bin_path());
        let result = node::Entity::delete_many()
            .filter(node::Column::ObjectType.eq(self.kind))
            .filter(
                Condition::any()
                    .add(node::Column::ParentId.eq(self.kind.recycle_bin_id()))
                    .add(node::Column::Path.starts_with(prefix)),
            )
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn parent_path(&self, parent_id: i32) -> ServiceResult<String> {
        if parent_id == ROOT_ID {
            return Ok(path::root_path());
        }
        if parent_id == self.kind.recycle_bin_id() {
            return Ok(self.kind.recycle_bin_path());
        }

        let parent = node::Entity::find_by_id(parent_id)
            .filter(node::Column::ObjectType.eq(self.kind))
            .one(self.conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Parent {} {} not found", self.kind, parent_id))
            })?;
        Ok(parent.path)
    }

    async fn rebase_descendants(&self, old_path: &str, new_path: &str) -> ServiceResult<()> {
        let descendants = node::Entity::find()
            .filter(node::Column::ObjectType.eq(self.kind))
            .filter(node::Column::Path.starts_with(path::descendant_prefix(old_path)))
            .all(self.conn)
            .await?;

        for row in descendants {
            let Some(rebased) = path::rebase(&row.path, old_path, new_path) else {
                continue;
            };
            let level = path::level_of(&rebased);
            node::ActiveModel {
                id: Set(row.id),
                path: Set(rebased),
                level: Set(level),
                ..Default::default()
            }
            .update(self.conn)
            .await?;
        }

        Ok(())
    }

    fn within(ancestor_path: &str) -> Condition {
        Condition::any()
            .add(node::Column::Path.eq(ancestor_path))
            .add(node::Column::Path.starts_with(path::descendant_prefix(ancestor_path)))
    }

    fn not_found(&self, id: i32) -> ServiceError {
        ServiceError::NotFound(format!("{} {} not found", self.kind.display_name(), id))
    }
}
