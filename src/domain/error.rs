//! Domain errors

use thiserror::Error;

/// Failures that are not expected outcomes of an identity operation.
///
/// Expected failures (duplicate email, weak password, ...) travel as
/// [`IdentityResult`](super::IdentityResult) values instead.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A unique index rejected the write. Carries the offending column.
    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
