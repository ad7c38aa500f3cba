use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

/// Storage-native failures surfaced by a [`UserRepository`](crate::UserRepository).
///
/// Repositories report what the store said, nothing more. Choosing a
/// caller-facing status is the job of [`crate::fault::translate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("record not found")]
    RecordNotFound,

    #[error("database error: {0}")]
    Database(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Caller-facing fault taxonomy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    pub fn not_found() -> Self {
        UserError::NotFound(crate::fault::NOT_FOUND_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UserError::Validation(_) | UserError::BadRequest(_) => StatusCode::BAD_REQUEST,
            UserError::NotFound(_) => StatusCode::NOT_FOUND,
            UserError::Conflict(_) => StatusCode::CONFLICT,
            UserError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller
    pub fn message(&self) -> &str {
        match self {
            UserError::Validation(msg)
            | UserError::NotFound(msg)
            | UserError::Conflict(msg)
            | UserError::BadRequest(msg)
            | UserError::Internal(msg) => msg,
        }
    }

    pub fn to_fault(&self) -> RpcFault {
        RpcFault {
            status: self.status().as_u16(),
            message: self.message().to_string(),
        }
    }
}

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{} {}", field, reasons.join(", "))
            })
            .collect();
        fields.sort();

        UserError::Validation(fields.join("; "))
    }
}

impl From<serde_json::Error> for UserError {
    fn from(error: serde_json::Error) -> Self {
        UserError::Validation(format!("Invalid payload: {}", error))
    }
}

/// Fault body sent back to callers in place of a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFault {
    pub status: u16,
    pub message: String,
}
