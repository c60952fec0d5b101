use std::sync::Arc;

use common::NodeKind;
use common::event::Event;
use common::hook::{Hook, HookAction, HookRegistry};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument, warn};

use crate::audit::{AuditSink, DbAuditSink};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{AuditEntry, AuditKind, Node, OperationStatus};
use crate::notifications::{LifecycleEvent, LifecyclePhase, effective_action};
use crate::repository::{ContentTypeRepository, NodeRepository};
use crate::users::UserResolver;

/// Create/read/move/trash/delete façade over one kind of tree node.
///
/// Every mutation follows the same shape: publish the cancellable "before"
/// notification, open one unit of work, persist, commit, record an audit
/// entry, then publish the "after" notification. Once the unit of work has
/// committed the call succeeds: observer failures on "after" topics are
/// logged, not returned. Reads go straight to the pool.
pub struct EntityLifecycleService {
    db: DatabaseConnection,
    kind: NodeKind,
    hooks: HookRegistry,
    users: UserResolver,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for EntityLifecycleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityLifecycleService")
            .field("kind", &self.kind)
            .field("hooks", &self.hooks)
            .field("users", &self.users)
            .finish()
    }
}

impl EntityLifecycleService {
    /// Service with no hooks, the default user resolver and audit rows
    /// written to the same database.
    pub fn new(db: DatabaseConnection, kind: NodeKind) -> Self {
        Self {
            audit: Arc::new(DbAuditSink::new(db.clone())),
            db,
            kind,
            hooks: HookRegistry::new(),
            users: UserResolver::default(),
        }
    }

    pub fn with_users(mut self, users: UserResolver) -> Self {
        self.users = users;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Observer registration for this instance.
    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    /// Register a lifecycle observer on this instance.
    pub async fn subscribe<H: Hook<LifecycleEvent> + 'static>(
        &mut self,
        hook: H,
    ) -> ServiceResult<()> {
        self.hooks.add_hook::<LifecycleEvent, H>(hook).await?;
        Ok(())
    }

    fn repo<'a, C: sea_orm::ConnectionTrait>(&self, conn: &'a C) -> NodeRepository<'a, C> {
        NodeRepository::new(conn, self.kind)
    }

    /// Build a node of the type registered under `alias` beneath `parent_id`.
    ///
    /// The node is NOT persisted: it only becomes durable once passed to
    /// [`save`](Self::save). If a "creating" hook cancels, the node is returned
    /// as built, without a creator stamp, "created" notification or audit entry.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn create(
        &self,
        parent_id: i32,
        type_alias: &str,
        user_id: Option<i32>,
    ) -> ServiceResult<Node> {
        let (node, _) = self.create_node(parent_id, type_alias, user_id).await?;
        Ok(node)
    }

    /// [`create`](Self::create) followed by [`save`](Self::save).
    ///
    /// Returns the unsaved node if either step was cancelled.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn create_and_save(
        &self,
        parent_id: i32,
        type_alias: &str,
        user_id: Option<i32>,
    ) -> ServiceResult<Node> {
        let (mut node, status) = self.create_node(parent_id, type_alias, user_id).await?;
        if status.is_completed() {
            self.save(&mut node, user_id).await?;
        }
        Ok(node)
    }

    async fn create_node(
        &self,
        parent_id: i32,
        type_alias: &str,
        user_id: Option<i32>,
    ) -> ServiceResult<(Node, OperationStatus)> {
        let content_type = ContentTypeRepository::new(&self.db)
            .get_by_alias(self.kind, type_alias)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "{} type with alias '{}' not found",
                    self.kind.display_name(),
                    type_alias
                ))
            })?;

        let mut node = Node::new(self.kind, parent_id, content_type.id);

        let creating = LifecycleEvent::new(self.kind, LifecyclePhase::Creating, vec![node.clone()])
            .with_target_parent(parent_id);
        if self.publish(creating).await?.is_cancelled() {
            debug!(parent_id, type_alias, "Create cancelled by hook");
            return Ok((node, OperationStatus::Cancelled));
        }

        node.creator_id = self.users.resolve(user_id);

        self.record(
            AuditKind::New,
            format!("Create {} performed by user", self.kind.display_name()),
            node.creator_id,
            node.id,
        )
        .await;
        self.notify(
            LifecycleEvent::new(self.kind, LifecyclePhase::Created, vec![node.clone()])
                .with_target_parent(parent_id),
        )
        .await;

        Ok((node, OperationStatus::Completed))
    }

    pub async fn get_by_id(&self, id: i32) -> ServiceResult<Option<Node>> {
        self.repo(&self.db).get(id).await
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> ServiceResult<Vec<Node>> {
        self.repo(&self.db).get_many(ids).await
    }

    pub async fn get_children(&self, parent_id: i32) -> ServiceResult<Vec<Node>> {
        self.repo(&self.db).children(parent_id).await
    }

    pub async fn count_children(&self, parent_id: i32) -> ServiceResult<u64> {
        self.repo(&self.db).count_children(parent_id).await
    }

    pub async fn has_children(&self, id: i32) -> ServiceResult<bool> {
        Ok(self.count_children(id).await? > 0)
    }

    /// The node with `id` and everything beneath it. Empty if `id` is unknown.
    pub async fn get_descendants(&self, id: i32) -> ServiceResult<Vec<Node>> {
        let repo = self.repo(&self.db);
        match repo.get(id).await? {
            Some(node) => repo.descendants(&node.path).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_by_content_type(&self, content_type_id: i32) -> ServiceResult<Vec<Node>> {
        self.repo(&self.db).by_content_type(content_type_id).await
    }

    pub async fn get_root(&self) -> ServiceResult<Vec<Node>> {
        self.repo(&self.db).children(common::ROOT_ID).await
    }

    pub async fn get_in_recycle_bin(&self) -> ServiceResult<Vec<Node>> {
        self.repo(&self.db).in_bin().await
    }

    /// Persist a single node, assigning id and path on first save.
    #[instrument(skip(self, node), fields(kind = %self.kind, id = node.id))]
    pub async fn save(
        &self,
        node: &mut Node,
        user_id: Option<i32>,
    ) -> ServiceResult<OperationStatus> {
        self.ensure_kind(node)?;
        let saving = LifecycleEvent::new(self.kind, LifecyclePhase::Saving, vec![node.clone()]);
        if self.publish(saving).await?.is_cancelled() {
            debug!("Save cancelled by hook");
            return Ok(OperationStatus::Cancelled);
        }

        let acting_user = self.users.resolve(user_id);
        let mut staged = node.clone();
        staged.creator_id = acting_user;

        let txn = self.db.begin().await?;
        self.repo(&txn).upsert(&mut staged).await?;
        txn.commit().await?;
        *node = staged;

        info!(id = node.id, path = %node.path, "Saved node");

        self.record(
            AuditKind::Save,
            format!("Save {} performed by user", self.kind.display_name()),
            acting_user,
            node.id,
        )
        .await;
        self.notify(LifecycleEvent::new(
            self.kind,
            LifecyclePhase::Saved,
            vec![node.clone()],
        ))
        .await;

        Ok(OperationStatus::Completed)
    }

    /// Persist several nodes in one unit of work with a single summary audit entry.
    #[instrument(skip(self, nodes), fields(kind = %self.kind, count = nodes.len()))]
    pub async fn save_many(
        &self,
        nodes: &mut [Node],
        user_id: Option<i32>,
    ) -> ServiceResult<OperationStatus> {
        for node in nodes.iter() {
            self.ensure_kind(node)?;
        }
        let saving = LifecycleEvent::new(self.kind, LifecyclePhase::Saving, nodes.to_vec());
        if self.publish(saving).await?.is_cancelled() {
            debug!("Bulk save cancelled by hook");
            return Ok(OperationStatus::Cancelled);
        }

        let acting_user = self.users.resolve(user_id);

        let mut staged = nodes.to_vec();

        let txn = self.db.begin().await?;
        let repo = self.repo(&txn);
        for node in staged.iter_mut() {
            node.creator_id = acting_user;
            repo.upsert(node).await?;
        }
        txn.commit().await?;
        nodes.clone_from_slice(&staged);

        info!(count = nodes.len(), "Saved nodes");

        self.record(
            AuditKind::Save,
            format!("Save multiple {} performed by user", self.kind.display_name()),
            acting_user,
            -1,
        )
        .await;
        self.notify(LifecycleEvent::new(
            self.kind,
            LifecyclePhase::Saved,
            nodes.to_vec(),
        ))
        .await;

        Ok(OperationStatus::Completed)
    }

    /// Re-parent `node` under `parent_id`.
    ///
    /// Persists through [`save`](Self::save), so a completed move publishes
    /// both the moving/moved and the saving/saved pair and leaves a Save and
    /// a Move audit entry. If the save is cancelled or fails before commit the
    /// move is abandoned and `node.parent_id` is restored.
    #[instrument(skip(self, node), fields(kind = %self.kind, id = node.id))]
    pub async fn move_to(
        &self,
        node: &mut Node,
        parent_id: i32,
        user_id: Option<i32>,
    ) -> ServiceResult<OperationStatus> {
        self.ensure_kind(node)?;
        let moving = LifecycleEvent::new(self.kind, LifecyclePhase::Moving, vec![node.clone()])
            .with_target_parent(parent_id);
        if self.publish(moving).await?.is_cancelled() {
            debug!(parent_id, "Move cancelled by hook");
            return Ok(OperationStatus::Cancelled);
        }

        let previous_parent = node.parent_id;
        node.parent_id = parent_id;
        match self.save(node, user_id).await {
            Ok(OperationStatus::Completed) => {}
            Ok(OperationStatus::Cancelled) => {
                node.parent_id = previous_parent;
                return Ok(OperationStatus::Cancelled);
            }
            // `save` only writes back into `node` after commit.
            Err(e) => {
                node.parent_id = previous_parent;
                return Err(e);
            }
        }

        self.record(
            AuditKind::Move,
            format!("Move {} performed by user", self.kind.display_name()),
            self.users.resolve(user_id),
            node.id,
        )
        .await;
        self.notify(
            LifecycleEvent::new(self.kind, LifecyclePhase::Moved, vec![node.clone()])
                .with_target_parent(parent_id),
        )
        .await;

        Ok(OperationStatus::Completed)
    }

    /// Soft-delete `node` into the recycle bin. Children move along with it
    /// but are not flagged as trashed themselves.
    #[instrument(skip(self, node), fields(kind = %self.kind, id = node.id))]
    pub async fn move_to_recycle_bin(
        &self,
        node: &mut Node,
        user_id: Option<i32>,
    ) -> ServiceResult<OperationStatus> {
        self.ensure_kind(node)?;
        let trashing = LifecycleEvent::new(self.kind, LifecyclePhase::Trashing, vec![node.clone()]);
        if self.publish(trashing).await?.is_cancelled() {
            debug!("Trash cancelled by hook");
            return Ok(OperationStatus::Cancelled);
        }

        let mut staged = node.clone();
        staged.change_trashed_state(true);

        let txn = self.db.begin().await?;
        self.repo(&txn).upsert(&mut staged).await?;
        txn.commit().await?;
        *node = staged;

        info!(id = node.id, "Moved node to recycle bin");

        self.record(
            AuditKind::Move,
            format!(
                "Move {} to Recycle Bin performed by user",
                self.kind.display_name()
            ),
            self.users.resolve(user_id),
            node.id,
        )
        .await;
        self.notify(LifecycleEvent::new(
            self.kind,
            LifecyclePhase::Trashed,
            vec![node.clone()],
        ))
        .await;

        Ok(OperationStatus::Completed)
    }

    /// Permanently remove everything in the recycle bin. Not cancellable.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn empty_recycle_bin(&self) -> ServiceResult<u64> {
        let txn = self.db.begin().await?;
        let removed = self.repo(&txn).delete_bin_contents().await?;
        txn.commit().await?;

        info!(removed, "Emptied recycle bin");

        self.record(
            AuditKind::Delete,
            format!(
                "Empty {} Recycle Bin performed by user",
                self.kind.display_name()
            ),
            self.users.resolve(None),
            self.kind.recycle_bin_id(),
        )
        .await;
        self.notify(LifecycleEvent::new(
            self.kind,
            LifecyclePhase::EmptiedRecycleBin,
            Vec::new(),
        ))
        .await;

        Ok(removed)
    }

    /// Trash every node built from `content_type_id`.
    ///
    /// Despite the name this is a soft delete: matching nodes land in the
    /// recycle bin and stay there until it is emptied.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn delete_of_type(
        &self,
        content_type_id: i32,
        user_id: Option<i32>,
    ) -> ServiceResult<OperationStatus> {
        let mut nodes = self.repo(&self.db).by_content_type(content_type_id).await?;

        let deleting = LifecycleEvent::new(self.kind, LifecyclePhase::Deleting, nodes.clone());
        if self.publish(deleting).await?.is_cancelled() {
            debug!(content_type_id, "Delete of type cancelled by hook");
            return Ok(OperationStatus::Cancelled);
        }

        let txn = self.db.begin().await?;
        let repo = self.repo(&txn);
        for node in nodes.iter_mut() {
            node.change_trashed_state(true);
            repo.upsert(node).await?;
        }
        txn.commit().await?;

        info!(content_type_id, count = nodes.len(), "Trashed nodes of type");

        self.record(
            AuditKind::Delete,
            format!(
                "Delete {} of Type {} performed by user",
                self.kind.display_name(),
                content_type_id
            ),
            self.users.resolve(user_id),
            -1,
        )
        .await;
        self.notify(LifecycleEvent::new(
            self.kind,
            LifecyclePhase::Deleted,
            nodes,
        ))
        .await;

        Ok(OperationStatus::Completed)
    }

    /// Permanently remove `node` and its subtree. Stored files are not touched.
    ///
    /// Fails with [`ServiceError::NotFound`] if the node is already gone.
    #[instrument(skip(self, node), fields(kind = %self.kind, id = node.id))]
    pub async fn delete(
        &self,
        node: &Node,
        user_id: Option<i32>,
    ) -> ServiceResult<OperationStatus> {
        self.ensure_kind(node)?;
        let deleting = LifecycleEvent::new(self.kind, LifecyclePhase::Deleting, vec![node.clone()]);
        if self.publish(deleting).await?.is_cancelled() {
            debug!("Delete cancelled by hook");
            return Ok(OperationStatus::Cancelled);
        }

        let txn = self.db.begin().await?;
        let removed = self.repo(&txn).delete(node).await?;
        txn.commit().await?;

        info!(id = node.id, removed, "Deleted node");

        self.record(
            AuditKind::Delete,
            format!("Delete {} performed by user", self.kind.display_name()),
            self.users.resolve(user_id),
            node.id,
        )
        .await;
        self.notify(LifecycleEvent::new(
            self.kind,
            LifecyclePhase::Deleted,
            vec![node.clone()],
        ))
        .await;

        Ok(OperationStatus::Completed)
    }

    fn ensure_kind(&self, node: &Node) -> ServiceResult<()> {
        if node.kind != self.kind {
            return Err(ServiceError::Validation(format!(
                "{} node {} cannot be handled by the {} service",
                node.kind.display_name(),
                node.id,
                self.kind.display_name()
            )));
        }
        Ok(())
    }

    async fn publish(&self, event: LifecycleEvent) -> ServiceResult<HookAction> {
        let phase = event.phase;
        let action = self.hooks.trigger(&event).await?;
        Ok(effective_action(phase, action))
    }

    async fn notify(&self, event: LifecycleEvent) {
        if let Err(e) = self.hooks.trigger(&event).await {
            warn!(topic = event.topic(), error = %e, "Lifecycle observer failed");
        }
    }

    async fn record(&self, kind: AuditKind, description: String, user_id: i32, entity_id: i32) {
        self.audit
            .record(AuditEntry::new(kind, description, user_id, entity_id))
            .await;
    }
}
