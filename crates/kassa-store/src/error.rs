//! Error types for kassa storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A unique key is already taken by another record.
    #[error("duplicate {entity}: {key}")]
    Duplicate {
        /// Kind of record.
        entity: &'static str,
        /// The conflicting key.
        key: String,
    },
}
