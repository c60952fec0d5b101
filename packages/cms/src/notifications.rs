//! Lifecycle notifications published around every node mutation.
//!
//! Each (kind, phase) pair is its own topic, e.g. `media.saving`. "Before"
//! phases are cancellable: a hook returning [`HookAction::Cancel`] vetoes the
//! operation. "After" phases are informational.

use common::NodeKind;
use common::event::Event;
use common::hook::HookAction;
use serde::{Deserialize, Serialize};

use crate::models::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Creating,
    Created,
    Saving,
    Saved,
    Moving,
    Moved,
    Trashing,
    Trashed,
    Deleting,
    Deleted,
    EmptiedRecycleBin,
}

const MEDIA_TOPICS: [&str; 11] = [
    "media.creating",
    "media.created",
    "media.saving",
    "media.saved",
    "media.moving",
    "media.moved",
    "media.trashing",
    "media.trashed",
    "media.deleting",
    "media.deleted",
    "media.emptied_recycle_bin",
];

const CONTENT_TOPICS: [&str; 11] = [
    "content.creating",
    "content.created",
    "content.saving",
    "content.saved",
    "content.moving",
    "content.moved",
    "content.trashing",
    "content.trashed",
    "content.deleting",
    "content.deleted",
    "content.emptied_recycle_bin",
];

impl LifecyclePhase {
    pub const ALL: [LifecyclePhase; 11] = [
        Self::Creating,
        Self::Created,
        Self::Saving,
        Self::Saved,
        Self::Moving,
        Self::Moved,
        Self::Trashing,
        Self::Trashed,
        Self::Deleting,
        Self::Deleted,
        Self::EmptiedRecycleBin,
    ];

    /// True for phases published before the mutation, which hooks may cancel.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Self::Creating | Self::Saving | Self::Moving | Self::Trashing | Self::Deleting
        )
    }

    /// Topic name for this phase on nodes of `kind`.
    pub fn topic(&self, kind: NodeKind) -> &'static str {
        let table = match kind {
            NodeKind::Media => &MEDIA_TOPICS,
            NodeKind::Content => &CONTENT_TOPICS,
        };
        table[*self as usize]
    }
}

/// Every topic published for `kind`, handy for hooks that observe everything.
pub fn all_topics(kind: NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::Media => &MEDIA_TOPICS,
        NodeKind::Content => &CONTENT_TOPICS,
    }
}

/// Payload of a lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    topic: String,
    pub kind: NodeKind,
    pub phase: LifecyclePhase,
    /// Nodes affected by the operation, as they stand at publish time.
    pub entities: Vec<Node>,
    /// Destination parent for moves and creations.
    pub target_parent_id: Option<i32>,
}

impl LifecycleEvent {
    pub fn new(kind: NodeKind, phase: LifecyclePhase, entities: Vec<Node>) -> Self {
        Self {
            topic: phase.topic(kind).to_string(),
            kind,
            phase,
            entities,
            target_parent_id: None,
        }
    }

    pub fn with_target_parent(mut self, parent_id: i32) -> Self {
        self.target_parent_id = Some(parent_id);
        self
    }
}

impl Event for LifecycleEvent {
    fn topic(&self) -> &str {
        &self.topic
    }
}

/// Hook outcome for a phase: cancellation only counts on "before" phases.
pub(crate) fn effective_action(phase: LifecyclePhase, action: HookAction) -> HookAction {
    if phase.is_cancellable() {
        action
    } else {
        HookAction::Pass
    }
}
