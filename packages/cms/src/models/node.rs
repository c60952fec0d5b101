use chrono::{DateTime, Utc};
use common::NodeKind;
use serde::{Deserialize, Serialize};

use crate::entity::node;
use crate::models::path;

/// Id carried by a node that has never been persisted.
pub const UNSAVED_ID: i32 = 0;

/// A media item or content document in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// [`UNSAVED_ID`] until the first save assigns one.
    pub id: i32,
    pub kind: NodeKind,
    pub parent_id: i32,
    /// Empty until the first save; maintained by the repository afterwards.
    pub path: String,
    pub level: i32,
    pub sort_order: i32,
    pub name: String,
    pub content_type_id: i32,
    pub creator_id: i32,
    pub trashed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Build a transient node under `parent_id`.
    pub fn new(kind: NodeKind, parent_id: i32, content_type_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: UNSAVED_ID,
            kind,
            parent_id,
            path: String::new(),
            level: 0,
            sort_order: 0,
            name: String::new(),
            content_type_id,
            creator_id: 0,
            trashed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_identity(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// Recycle bin membership is keyed on the parent id.
    pub fn is_in_recycle_bin(&self) -> bool {
        self.parent_id == self.kind.recycle_bin_id()
    }

    /// Flip the trashed flag. Trashing also re-parents the node into the
    /// recycle bin of its kind.
    pub fn change_trashed_state(&mut self, trashed: bool) {
        self.trashed = trashed;
        if trashed {
            self.parent_id = self.kind.recycle_bin_id();
        }
    }

    /// True if `self` is `other` or sits anywhere beneath it.
    pub fn is_descendant_or_self_of(&self, other: &Node) -> bool {
        !other.path.is_empty() && path::is_within(&self.path, &other.path)
    }
}

impl From<node::Model> for Node {
    fn from(m: node::Model) -> Self {
        Self {
            id: m.id,
            kind: m.object_type,
            parent_id: m.parent_id,
            path: m.path,
            level: m.level,
            sort_order: m.sort_order,
            name: m.name,
            content_type_id: m.content_type_id,
            creator_id: m.creator_id,
            trashed: m.trashed,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
