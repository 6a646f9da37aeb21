//! Error types for LarchDB.

use thiserror::Error;

/// Result type alias using LarchError.
pub type Result<T> = std::result::Result<T, LarchError>;

/// Errors that can occur in LarchDB operations.
#[derive(Debug, Error)]
pub enum LarchError {
    // Arena errors
    #[error("node arena exhausted: all {capacity} slots in use")]
    ArenaExhausted { capacity: usize },

    // B-tree errors
    #[error("B-tree corrupted: {0}")]
    TreeCorrupted(String),

    // Type errors
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    // Codec errors
    #[error("value corrupted: {0}")]
    ValueCorrupted(String),

    // Configuration errors
    #[error("invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}
