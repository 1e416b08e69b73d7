use serde_json::{json, Value};
use thiserror::Error;
use warp::http::StatusCode;

use super::form::ValidationErrors;

pub const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthenticated: {0}")]
    Unauthenticated(&'static str),
    #[error("not found")]
    NotFound,
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hashing(argon2::password_hash::Error),
}

impl ApiError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::default();
        errors.add(field, message);
        ApiError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Query(_) | ApiError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body sent to the client. Internal causes stay in the logs.
    pub fn body(&self) -> Value {
        match self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::InvalidCredentials => json!({ "non_field_errors": [INVALID_CREDENTIALS] }),
            ApiError::Unauthenticated(reason) => json!({ "detail": reason }),
            ApiError::NotFound => json!({ "detail": "Not found." }),
            ApiError::Query(_) | ApiError::Hashing(_) => {
                json!({ "detail": "A server error occurred." })
            }
        }
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(value: argon2::password_hash::Error) -> Self {
        ApiError::Hashing(value)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(value: ValidationErrors) -> Self {
        ApiError::Validation(value)
    }
}

impl warp::reject::Reject for ApiError {}

/// Unique-constraint violations are the only database errors a client can cause.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.is_unique_violation(),
        _ => false,
    }
}
