//! Investment plan definitions.
//!
//! A plan is a tier: an eligible balance range, a nominal total return over a
//! fixed duration, and flags controlling automatic reinvestment and
//! availability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::PlanId;
use crate::money::{apply_pct, div_round};

/// An investment plan tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan identifier.
    pub id: PlanId,

    /// Display name ("Silver", "Gold", ...).
    pub name: String,

    /// Minimum eligible balance in cents.
    pub min_balance_cents: i64,

    /// Maximum eligible balance in cents; `None` means unbounded.
    pub max_balance_cents: Option<i64>,

    /// Nominal total return over the full duration, in milli-percent.
    ///
    /// A plan paying 9% over its duration stores `9_000`.
    pub total_return_pct_milli: i64,

    /// Duration of one investment cycle in days. Always positive.
    pub duration_days: i64,

    /// Whether matured investments roll the balance into a fresh cycle.
    pub auto_return: bool,

    /// Whether the plan is open to new or migrating investments.
    pub active: bool,

    /// When the plan was created.
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Create a new active plan.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        min_balance_cents: i64,
        max_balance_cents: Option<i64>,
        total_return_pct_milli: i64,
        duration_days: i64,
    ) -> Self {
        Self {
            id: PlanId::generate(),
            name: name.into(),
            min_balance_cents,
            max_balance_cents,
            total_return_pct_milli,
            duration_days,
            auto_return: true,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Validate plan invariants: positive duration, ordered balance range.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPlan` if an invariant is violated.
    pub fn validate(&self) -> Result<()> {
        if self.duration_days <= 0 {
            return Err(CoreError::InvalidPlan(format!(
                "duration_days must be positive, got {}",
                self.duration_days
            )));
        }
        if let Some(max) = self.max_balance_cents {
            if self.min_balance_cents > max {
                return Err(CoreError::InvalidPlan(format!(
                    "min {} exceeds max {}",
                    self.min_balance_cents, max
                )));
            }
        }
        Ok(())
    }

    /// Whether a balance falls inside this plan's eligibility range.
    #[must_use]
    pub fn admits(&self, balance_cents: i64) -> bool {
        balance_cents >= self.min_balance_cents
            && self
                .max_balance_cents
                .map_or(true, |max| balance_cents <= max)
    }

    /// Flat per-day return in milli-percent, used when a schedule row is
    /// missing. A degraded-mode approximation, not a sum-to-target guarantee.
    #[must_use]
    pub fn flat_daily_pct_milli(&self) -> i64 {
        div_round(self.total_return_pct_milli, self.duration_days)
    }

    /// Expected value of an investment at maturity: principal plus the
    /// nominal total return.
    #[must_use]
    pub fn expected_return_cents(&self, amount_cents: i64) -> i64 {
        amount_cents + apply_pct(amount_cents, self.total_return_pct_milli)
    }
}
