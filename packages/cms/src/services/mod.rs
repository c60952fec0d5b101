mod content;
mod lifecycle;
mod media;

pub use content::{ContentService, content_service};
pub use lifecycle::EntityLifecycleService;
pub use media::{MediaService, media_service};
