use thiserror::Error;

/// Storage-specific error types for the precinct scanner.
///
/// These errors represent failures while recording sheets, reading settings,
/// or maintaining batch bookkeeping.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// A record with the same key already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored JSON could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create a not-found error for a sheet.
    pub fn sheet_not_found(sheet_id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "sheet".to_string(),
            field: "id".to_string(),
            value: sheet_id.to_string(),
        }
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_not_found_message() {
        let error = StorageError::sheet_not_found("abc");
        assert_eq!(error.to_string(), "Entity not found: sheet with id=abc");
    }

    #[test]
    fn test_conflict_message() {
        let error = StorageError::Conflict("sheet abc already recorded".to_string());
        assert_eq!(error.to_string(), "Conflict: sheet abc already recorded");
    }
}
