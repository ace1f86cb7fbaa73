//! Error types for ripple operations.

use thiserror::Error;

/// Durable store failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Read failed in namespace {namespace} for key {key}: {reason}")]
    ReadFailed {
        namespace: String,
        key: String,
        reason: String,
    },

    #[error("Write failed in namespace {namespace} for key {key}: {reason}")]
    WriteFailed {
        namespace: String,
        key: String,
        reason: String,
    },

    #[error("Delete failed in namespace {namespace} for key {key}: {reason}")]
    DeleteFailed {
        namespace: String,
        key: String,
        reason: String,
    },

    #[error("Destroy failed for namespace {namespace}: {reason}")]
    DestroyFailed { namespace: String, reason: String },

    #[error("Key listing failed for namespace {namespace}: {reason}")]
    ListFailed { namespace: String, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Background loader failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoaderError {
    #[error("Loader is not running")]
    NotRunning,
}

/// Master error type for all ripple errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RippleError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
}

/// Result type alias for ripple operations.
pub type RippleResult<T> = Result<T, RippleError>;

// ============================================================================
// TESTS
// ============================================================================
