use common::NodeKind;
use sea_orm::DatabaseConnection;

use super::EntityLifecycleService;

/// Lifecycle service over content documents (recycle bin `-20`).
pub type ContentService = EntityLifecycleService;

/// Create a content service with default collaborators.
pub fn content_service(db: DatabaseConnection) -> ContentService {
    EntityLifecycleService::new(db, NodeKind::Content)
}
