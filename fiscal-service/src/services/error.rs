use service_core::error::AppError;
use thiserror::Error;

use crate::models::AmountOverflow;

/// MongoDB server code for a unique-index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(mongodb::error::Error),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        ServiceError::NotFound(format!("{} with ID {} not found", entity, id))
    }
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return ServiceError::Conflict("A record with the same unique key already exists".into());
        }
        ServiceError::Database(err)
    }
}

impl From<AmountOverflow> for ServiceError {
    fn from(err: AmountOverflow) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::BulkWrite(e) => e
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY_CODE)),
        _ => false,
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::NotFound(e) => AppError::NotFound(anyhow::anyhow!(e)),
            ServiceError::Conflict(e) => AppError::Conflict(anyhow::anyhow!(e)),
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Queue(e) => AppError::QueueError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
