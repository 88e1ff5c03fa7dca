//! Store errors

use thiserror::Error;

use crate::db::DeadlineExceeded;

/// Outcome classes of a versioned-store operation
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row for the id (or the id can never exist)
    #[error("record not found")]
    NotFound,

    /// The presented version is no longer current
    #[error("edit conflict")]
    EditConflict,

    /// Unique constraint violation
    #[error("duplicate key violates constraint {constraint}")]
    DuplicateKey { constraint: String },

    /// Foreign key constraint violation
    #[error("foreign key violates constraint {constraint}")]
    ForeignKey { constraint: String },

    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    /// Duplicate on exactly this constraint
    pub fn is_duplicate_of(&self, name: &str) -> bool {
        matches!(self, StoreError::DuplicateKey { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => StoreError::DuplicateKey { constraint },
                    ErrorKind::ForeignKeyViolation => StoreError::ForeignKey { constraint },
                    _ => StoreError::Database(err),
                }
            }
            _ => StoreError::Database(err),
        }
    }
}
