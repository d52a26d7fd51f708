use thiserror::Error;
use uuid::Uuid;
use axum::http::StatusCode;

use crate::{db::error::DbError, error::HttpError};

/// Broad category of a service failure, independent of HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    State,
    NotFound,
    Database,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid {entity} transition for {id}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        id: Uuid,
        from: &'static str,
        to: &'static str,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::InvalidTransition { .. } | ServiceError::InvalidState(_) => ErrorKind::State,
            ServiceError::Database(_) => ErrorKind::Database,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::State => StatusCode::CONFLICT,
            ErrorKind::Database => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ServiceError::InvalidState(message.into())
    }
}

impl From<DbError> for ServiceError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DbError::StaleStatus { .. } => ServiceError::InvalidState(error.to_string()),
            DbError::Duplicate(what) => ServiceError::Conflict(format!("{} already exists", what)),
            DbError::Sqlx(e) => ServiceError::Database(e.to_string()),
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        HttpError::new(error.to_string(), error.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_status_is_a_state_error() {
        let err: ServiceError = DbError::StaleStatus {
            entity: "application",
            id: Uuid::nil(),
            expected: "pending",
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn duplicate_is_a_conflict() {
        let err: ServiceError = DbError::Duplicate("email".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Conflict: email already exists");
    }

    #[test]
    fn http_status_follows_kind() {
        let err: HttpError = ServiceError::validation("bad rating").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let err: HttpError = ServiceError::NotFound { entity: "job", id: Uuid::nil() }.into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
