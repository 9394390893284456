//! Error types for orbitdeck operations

use thiserror::Error;

use crate::upstream::UpstreamFailure;

/// Validation errors raised before any storage or upstream access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid slug '{slug}': only lowercase letters, digits and '-' are allowed")]
    InvalidSlug { slug: String },

    #[error("Invalid export snapshot name '{name}'")]
    InvalidSnapshotName { name: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Row decode failed for {table}: {reason}")]
    DecodeFailed { table: String, reason: String },

    #[error("Duplicate key: {key}")]
    DuplicateKey { key: String },
}

/// Master error type for orbitdeck operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrbitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Upstream(#[from] UpstreamFailure),
}

/// Result type for orbitdeck operations.
pub type OrbitResult<T> = Result<T, OrbitError>;
