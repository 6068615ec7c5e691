use thiserror::Error;

/// Storage-specific error types for the Facegate access controller.
///
/// These errors represent failures in database operations and in the
/// integrity checks applied to enrolled signatures.
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

    /// Signature dimension disagrees with the stored samples
    #[error("Signature dimension mismatch: expected {expected}, got {actual}")]
    InvalidSignature { expected: usize, actual: usize },

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored data could not be decoded
    #[error("Corrupted record: {0}")]
    Corrupted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create a not-found error for an enrolled identity.
    pub fn identity_not_found(identity_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "identity".to_string(),
            field: "identity_id".to_string(),
            value: identity_id.into(),
        }
    }
}

impl From<facegate_core::Error> for StorageError {
    fn from(error: facegate_core::Error) -> Self {
        match error {
            facegate_core::Error::InvalidSignature { expected, actual } => {
                Self::InvalidSignature { expected, actual }
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
