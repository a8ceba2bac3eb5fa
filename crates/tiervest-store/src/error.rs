//! Error types for the storage layer.

use tiervest_core::{EntryId, EntryStatus, InvestmentId, PlanId, UserId};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(String),

    /// Value (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A referenced user row does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// A referenced plan row does not exist.
    #[error("plan not found: {0}")]
    PlanNotFound(PlanId),

    /// A referenced investment row does not exist.
    #[error("investment not found: {0}")]
    InvestmentNotFound(InvestmentId),

    /// A referenced ledger entry does not exist.
    #[error("ledger entry not found: {0}")]
    EntryNotFound(EntryId),

    /// A resolution was attempted on an entry that is no longer pending.
    ///
    /// This is how a duplicate deposit approval fails instead of
    /// double-crediting the cascade.
    #[error("ledger entry {entry_id} is not pending (status: {status:?})")]
    NotPending {
        /// The entry that was targeted.
        entry_id: EntryId,
        /// Its current status.
        status: EntryStatus,
    },
}
