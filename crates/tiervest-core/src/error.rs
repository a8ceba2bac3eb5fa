//! Error types for tiervest-core.

use crate::ids::IdError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core domain operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A plan definition violates its own invariants.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
