//! Ledger entry types.
//!
//! Every balance movement produces a ledger entry. The ledger is append-only
//! except for status transitions on deposit and withdrawal rows; it is the
//! durable record from which all earnings summaries are derived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntryId, UserId};

/// A ledger entry recording one balance movement.
///
/// Sign conventions per kind:
///
/// - `Deposit`, `ReferralDirect`, `ReferralPassive`, `Bonus`: positive.
/// - `Withdraw`: negative (the debit as it hit the balance).
/// - `DailyRoi`: signed; negative on loss days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier (ULID, time-ordered).
    pub id: EntryId,

    /// The user whose balance moved.
    pub user_id: UserId,

    /// Counterparty, when one exists. For referral commissions this is the
    /// original depositor, making the commission's provenance traceable.
    pub related_user: Option<UserId>,

    /// What kind of movement this is.
    pub kind: EntryKind,

    /// Amount in cents, signed per the kind's convention.
    pub amount_cents: i64,

    /// Approval status. Only deposit and withdrawal entries ever leave
    /// `Pending`-at-creation; everything else is born `Approved`.
    pub status: EntryStatus,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    fn new(
        user_id: UserId,
        related_user: Option<UserId>,
        kind: EntryKind,
        amount_cents: i64,
        status: EntryStatus,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            related_user,
            kind,
            amount_cents,
            status,
            created_at: Utc::now(),
        }
    }

    /// A pending deposit of `amount_cents` (positive), awaiting approval.
    #[must_use]
    pub fn deposit(user_id: UserId, amount_cents: i64) -> Self {
        Self::new(user_id, None, EntryKind::Deposit, amount_cents, EntryStatus::Pending)
    }

    /// A pending withdrawal. `amount_cents` is the positive magnitude; the
    /// entry records the debit, so the stored amount is negative.
    #[must_use]
    pub fn withdraw(user_id: UserId, amount_cents: i64) -> Self {
        Self::new(
            user_id,
            None,
            EntryKind::Withdraw,
            -amount_cents.abs(),
            EntryStatus::Pending,
        )
    }

    /// A daily ROI accrual, signed. Born approved.
    #[must_use]
    pub fn daily_roi(user_id: UserId, amount_cents: i64) -> Self {
        Self::new(user_id, None, EntryKind::DailyRoi, amount_cents, EntryStatus::Approved)
    }

    /// A direct referral commission credited to `user_id` because
    /// `depositor` made a deposit. Born approved.
    #[must_use]
    pub fn referral_direct(user_id: UserId, amount_cents: i64, depositor: UserId) -> Self {
        Self::new(
            user_id,
            Some(depositor),
            EntryKind::ReferralDirect,
            amount_cents,
            EntryStatus::Approved,
        )
    }

    /// A bonus credit. Born approved.
    #[must_use]
    pub fn bonus(user_id: UserId, amount_cents: i64) -> Self {
        Self::new(user_id, None, EntryKind::Bonus, amount_cents, EntryStatus::Approved)
    }

    /// The positive magnitude of the entry's amount.
    #[must_use]
    pub fn magnitude_cents(&self) -> i64 {
        self.amount_cents.abs()
    }
}

/// Kind of ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A user deposit into the platform.
    Deposit,

    /// A user withdrawal out of the platform.
    Withdraw,

    /// Daily ROI accrual on an active investment.
    DailyRoi,

    /// Direct multi-level referral commission on an approved deposit.
    ReferralDirect,

    /// Passive referral earnings (reserved for future commission kinds).
    ReferralPassive,

    /// Administrative bonus credit.
    Bonus,
}

/// Approval status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Awaiting an admin decision.
    Pending,

    /// Approved and reflected in the balance.
    Approved,

    /// Rejected; any pre-deducted amount has been refunded.
    Rejected,
}
