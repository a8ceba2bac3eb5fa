//! User ledger fields.
//!
//! The user record carried here is the financial slice of the account: the
//! spendable balance plus informational accumulators. Identity, credentials,
//! and roles live in the excluded account store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{InvestmentId, UserId};

/// The financial state of one user.
///
/// `balance_cents` is the single source of truth for plan-eligibility checks.
/// The `*_earnings` and `total_*` fields are informational accumulators and
/// must never feed a balance computation; deriving a balance from them would
/// double count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User identifier, owned by the excluded account store.
    pub id: UserId,

    /// Direct sponsor in the referral tree, if the user was referred.
    ///
    /// An explicit parent reference; commission cascades walk this link
    /// upward, capped at [`crate::MAX_REFERRAL_DEPTH`] levels.
    pub sponsor_id: Option<UserId>,

    /// Spendable balance in cents.
    pub balance_cents: i64,

    /// Cumulative ROI credited (or debited on loss days), in cents.
    pub roi_earnings_cents: i64,

    /// Cumulative referral commissions credited, in cents.
    pub affiliate_earnings_cents: i64,

    /// Lifetime approved deposits, in cents.
    pub total_deposits_cents: i64,

    /// Lifetime approved withdrawals, in cents.
    pub total_withdrawals_cents: i64,

    /// The user's single active investment, if any.
    ///
    /// Owned reference: at most one active investment per user, enforced
    /// here rather than by check-then-act scans.
    pub current_investment: Option<InvestmentId>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with zero balances and no sponsor.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id,
            sponsor_id: None,
            balance_cents: 0,
            roi_earnings_cents: 0,
            affiliate_earnings_cents: 0,
            total_deposits_cents: 0,
            total_withdrawals_cents: 0,
            current_investment: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new user referred by `sponsor_id`.
    #[must_use]
    pub fn with_sponsor(id: UserId, sponsor_id: UserId) -> Self {
        Self {
            sponsor_id: Some(sponsor_id),
            ..Self::new(id)
        }
    }
}
