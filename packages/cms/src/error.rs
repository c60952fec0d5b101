use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by repositories and services.
///
/// Observer cancellation is not an error; see [`crate::models::OperationStatus`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error("Notification observer failed: {0}")]
    Notification(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
