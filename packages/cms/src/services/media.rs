use common::NodeKind;
use sea_orm::DatabaseConnection;

use super::EntityLifecycleService;

/// Lifecycle service over media nodes (recycle bin `-21`).
pub type MediaService = EntityLifecycleService;

/// Create a media service with default collaborators.
pub fn media_service(db: DatabaseConnection) -> MediaService {
    EntityLifecycleService::new(db, NodeKind::Media)
}
