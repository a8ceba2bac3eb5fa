//! Error types for the engine.

use tiervest_core::{EntryId, EntryKind, PlanId, UserId};
use tiervest_store::StoreError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in engine operations.
///
/// Configuration gaps (a missing commission rate, no plan admitting a
/// balance) are not errors; they are skipped and logged. These variants are
/// the data-integrity failures that abort an atomic unit.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Storage failure or atomicity violation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An investment references a plan row that no longer exists.
    #[error("plan not found: {0}")]
    MissingPlan(PlanId),

    /// An investment or ledger entry references a missing user row.
    #[error("user not found: {0}")]
    MissingUser(UserId),

    /// A resolution was requested for the wrong kind of ledger entry.
    #[error("entry {entry_id} has kind {kind:?}, which this operation cannot resolve")]
    WrongEntryKind {
        /// The targeted entry.
        entry_id: EntryId,
        /// Its actual kind.
        kind: EntryKind,
    },

    /// A user tried to start an investment while one is already active.
    #[error("user {0} already has an active investment")]
    AlreadyInvested(UserId),

    /// A user tried to start an investment with nothing to invest.
    #[error("user {0} has no balance to invest")]
    NothingToInvest(UserId),
}
