pub mod audit;
pub mod node;
pub mod path;

pub use audit::{AuditEntry, AuditKind};
pub use node::{Node, UNSAVED_ID};

/// A media type or document type row.
pub type ContentType = crate::entity::content_type::Model;

/// Outcome of a mutating service call.
///
/// Cancellation by an observer is not an error; it is reported here so
/// callers do not have to diff entity state to notice it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// The mutation was persisted and the "after" notification published.
    Completed,
    /// A "before" observer vetoed the operation. Nothing was persisted.
    Cancelled,
}

impl OperationStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
