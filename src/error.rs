//! Error taxonomy shared by the core procedures and the HTTP layer.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T, E = WardError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum WardError {
    /// Referenced entity is absent or soft-deleted.
    #[error("{entity} {id} was not found")]
    NotFound { entity: &'static str, id: i64 },

    /// One or more business rules rejected the request. Every message is
    /// meant to be shown to the user as-is.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("the record was changed by someone else, reload and try again")]
    ConcurrencyConflict,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl WardError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        WardError::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        WardError::Validation(vec![message.into()])
    }

    /// User-facing messages carried by the error.
    pub fn messages(&self) -> Vec<String> {
        match self {
            WardError::Validation(messages) => messages.clone(),
            WardError::Database(_) | WardError::Migration(_) => {
                vec!["An internal error has occurred.".to_string()]
            }
            other => vec![other.to_string()],
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            WardError::NotFound { .. } => "not_found",
            WardError::Validation(_) => "validation",
            WardError::ConcurrencyConflict => "concurrency_conflict",
            WardError::Forbidden(_) => "forbidden",
            WardError::Database(_) | WardError::Migration(_) => "internal",
        }
    }
}

/// SQLite busy / locked result codes, extended codes included. Two
/// transactions upgrading to a write lock at once end up here.
pub fn is_lock_contention(code: &str) -> bool {
    code.parse::<i32>()
        .map(|code| matches!(code & 0xff, 5 | 6))
        .unwrap_or(false)
}

impl From<sqlx::Error> for WardError {
    fn from(err: sqlx::Error) -> Self {
        let contended = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| is_lock_contention(&code));

        if contended {
            tracing::warn!(error = %err, "write lock contention");
            WardError::ConcurrencyConflict
        } else {
            WardError::Database(err)
        }
    }
}

impl From<ValidationErrors> for WardError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid ({})", field, e.code),
                })
            })
            .collect();
        messages.sort();
        WardError::Validation(messages)
    }
}

impl ResponseError for WardError {
    fn status_code(&self) -> StatusCode {
        match self {
            WardError::NotFound { .. } => StatusCode::NOT_FOUND,
            WardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WardError::ConcurrencyConflict => StatusCode::CONFLICT,
            WardError::Forbidden(_) => StatusCode::FORBIDDEN,
            WardError::Database(_) | WardError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "messages": self.messages(),
        }))
    }
}
