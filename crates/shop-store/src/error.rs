use thiserror::Error;

/// Errors that can occur when interacting with the shop store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique attribute collided with an existing record.
    #[error("Duplicate key on {field}: {values:?}")]
    Duplicate {
        field: &'static str,
        values: Vec<String>,
    },

    /// The record failed schema validation before it was written.
    #[error("Validation failed: {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Short machine-oriented explanation of the failure, if there is one.
    pub fn reason(&self) -> Option<String> {
        match self {
            StoreError::Duplicate { field, .. } => Some(format!("{field} must be unique")),
            StoreError::Validation { field, .. } => Some(format!("path `{field}`")),
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                Some(db_err.message().to_string())
            }
            StoreError::Database(_) | StoreError::Migration(_) => None,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
