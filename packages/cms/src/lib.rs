pub mod audit;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod identity;
pub mod models;
pub mod notifications;
pub mod repository;
pub mod services;
pub mod users;

pub use error::{ServiceError, ServiceResult};
pub use models::{Node, OperationStatus};
pub use services::{
    ContentService, EntityLifecycleService, MediaService, content_service, media_service,
};
