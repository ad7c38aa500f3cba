//! Storage error classification.
//!
//! Every [`RepositoryError`] becomes a [`UserError`] here and nowhere else.
//! New storage error kinds get one new match arm below.

use crate::error::{RepositoryError, UserError};
use tracing::{error, warn};

pub const NOT_FOUND_MESSAGE: &str = "Resource not found";
pub const CONFLICT_MESSAGE: &str = "Duplicate entry";
pub const DATABASE_ERROR_MESSAGE: &str = "Database error";
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Classify a storage failure.
///
/// `custom` replaces the default message for not-found, conflict and
/// unexpected failures. Unclassified database errors always read
/// "Database error" so driver text never reaches the caller.
pub fn translate(error: RepositoryError, custom: Option<&str>) -> UserError {
    let message = |default: &str| custom.unwrap_or(default).to_string();

    match error {
        RepositoryError::RecordNotFound => UserError::NotFound(message(NOT_FOUND_MESSAGE)),
        RepositoryError::UniqueViolation(detail) => {
            warn!(detail = %detail, "Unique constraint violated");
            UserError::Conflict(message(CONFLICT_MESSAGE))
        }
        RepositoryError::Database(detail) => {
            error!(detail = %detail, "Unclassified database error");
            UserError::BadRequest(DATABASE_ERROR_MESSAGE.to_string())
        }
        RepositoryError::Unexpected(detail) => {
            error!(detail = %detail, "Unexpected repository failure");
            UserError::Internal(message(INTERNAL_ERROR_MESSAGE))
        }
    }
}

impl From<RepositoryError> for UserError {
    fn from(error: RepositoryError) -> Self {
        translate(error, None)
    }
}
