//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid name: {kind} '{name}'")]
    InvalidName { kind: &'static str, name: String },
    #[error("invalid field {entity}.{field}: {reason}")]
    InvalidField {
        entity: String,
        field: String,
        reason: String,
    },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("authentication: {0}")]
    Authentication(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}

/// Coarse error class shared by the HTTP mapping and the in-process API client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    BadRequest,
    NotFound,
    Authentication,
    Conflict,
    Transport,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Config => "config_error",
            ErrorKind::Validation => "validation_error",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Authentication => "authentication_error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Transport => "transport_error",
            ErrorKind::Internal => "internal_error",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Config | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::Config,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Authentication(_) => ErrorKind::Authentication,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::Transport(_) => ErrorKind::Transport,
            AppError::Io(_) | AppError::Internal(_) => ErrorKind::Internal,
            AppError::Db(e) => match e {
                sqlx::Error::RowNotFound => ErrorKind::NotFound,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    ErrorKind::Transport
                }
                sqlx::Error::Database(db) if db.is_unique_violation() => ErrorKind::Conflict,
                _ => ErrorKind::Internal,
            },
        }
    }

    /// Message without the variant prefix, as sent in the error envelope.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(m)
            | AppError::Validation(m)
            | AppError::Authentication(m)
            | AppError::Conflict(m)
            | AppError::BadRequest(m)
            | AppError::Transport(m)
            | AppError::Internal(m) => m.clone(),
            other => other.to_string(),
        }
    }

    /// Rebuild an error from a decoded `{ "error": { code, message } }` body.
    pub fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::Config => AppError::Config(ConfigError::Load(message)),
            ErrorKind::Validation => AppError::Validation(message),
            ErrorKind::BadRequest => AppError::BadRequest(message),
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::Authentication => AppError::Authentication(message),
            ErrorKind::Conflict => AppError::Conflict(message),
            ErrorKind::Transport => AppError::Transport(message),
            ErrorKind::Internal => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if matches!(kind, ErrorKind::Internal | ErrorKind::Config | ErrorKind::Transport) {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: kind.code().to_string(),
                message: self.message(),
                details: None,
            },
        };
        (kind.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_are_transport_errors() {
        assert_eq!(AppError::Db(sqlx::Error::PoolTimedOut).kind(), ErrorKind::Transport);
        assert_eq!(AppError::Db(sqlx::Error::RowNotFound).kind(), ErrorKind::NotFound);
        assert_eq!(
            AppError::Authentication("no session".into()).kind().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn envelope_message_drops_the_variant_prefix() {
        assert_eq!(AppError::NotFound("todos 3".into()).message(), "todos 3");
        assert_eq!(AppError::Io(std::io::Error::other("disk")).message(), "io: disk");
    }
}
