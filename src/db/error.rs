// db/error.rs
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// A conditional write found the row in a different status than expected.
    #[error("{entity} {id} is no longer {expected}")]
    StaleStatus {
        entity: &'static str,
        id: Uuid,
        expected: &'static str,
    },

    #[error("Duplicate {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// Maps a Postgres unique violation to `Duplicate`, anything else to `Sqlx`.
    pub fn from_insert(error: sqlx::Error, what: &str) -> Self {
        let unique = error
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if unique {
            DbError::Duplicate(what.to_string())
        } else {
            DbError::Sqlx(error)
        }
    }
}
