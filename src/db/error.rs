// db/error.rs
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint {0} violated")]
    UniqueViolation(String),

    #[error("Check constraint {0} violated")]
    CheckViolation(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
            if db_err.is_check_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::CheckViolation(constraint);
            }
        }
        StoreError::Database(err)
    }
}
