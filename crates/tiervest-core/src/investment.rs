//! Investment records.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ids::{InvestmentId, PlanId, UserId};
use crate::plan::Plan;

/// An investment of a user's balance into a plan tier.
///
/// The committed amount is mutable: settlement re-prices it when the balance
/// shrinks, and migration re-prices it against a new plan. The start date
/// never changes; the end date moves only on migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    /// Investment identifier.
    pub id: InvestmentId,

    /// Owning user.
    pub user_id: UserId,

    /// The plan currently backing this investment.
    pub plan_id: PlanId,

    /// Committed amount in cents.
    pub amount_cents: i64,

    /// Expected value at maturity in cents (principal plus nominal return).
    pub expected_return_cents: i64,

    /// First day of the cycle. Immutable.
    pub start_date: NaiveDate,

    /// Day the cycle matures. Recomputed on migration.
    pub end_date: NaiveDate,

    /// Lifecycle status.
    pub status: InvestmentStatus,
}

impl Investment {
    /// Open a new investment of `amount_cents` into `plan`, starting `today`.
    #[must_use]
    pub fn open(user_id: UserId, plan: &Plan, amount_cents: i64, today: NaiveDate) -> Self {
        Self {
            id: InvestmentId::generate(),
            user_id,
            plan_id: plan.id,
            amount_cents,
            expected_return_cents: plan.expected_return_cents(amount_cents),
            start_date: today,
            end_date: today + Duration::days(plan.duration_days),
            status: InvestmentStatus::Active,
        }
    }

    /// Re-price the committed amount against the current plan.
    pub fn reprice(&mut self, plan: &Plan, amount_cents: i64) {
        self.amount_cents = amount_cents;
        self.expected_return_cents = plan.expected_return_cents(amount_cents);
    }

    /// Migrate to a new plan: re-price and restart the maturity clock.
    ///
    /// The start date is preserved; only the end date moves.
    pub fn migrate(&mut self, plan: &Plan, amount_cents: i64, today: NaiveDate) {
        self.plan_id = plan.id;
        self.reprice(plan, amount_cents);
        self.end_date = today + Duration::days(plan.duration_days);
    }

    /// Days elapsed since the cycle started, clamped at zero.
    #[must_use]
    pub fn elapsed_days(&self, today: NaiveDate) -> i64 {
        (today - self.start_date).num_days().max(0)
    }

    /// Days remaining until maturity, clamped at zero.
    #[must_use]
    pub fn remaining_days(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days().max(0)
    }

    /// Progress through the cycle as a whole percentage, clamped to 0..=100.
    #[must_use]
    pub fn progress_percent(&self, today: NaiveDate) -> u8 {
        let total = (self.end_date - self.start_date).num_days();
        if total <= 0 {
            return 100;
        }
        let pct = self.elapsed_days(today) * 100 / total;
        u8::try_from(pct.clamp(0, 100)).unwrap_or(100)
    }

    /// Whether the investment has reached its end date.
    #[must_use]
    pub fn is_mature(&self, today: NaiveDate) -> bool {
        today >= self.end_date
    }
}

/// Lifecycle status of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    /// Accruing daily returns.
    Active,

    /// Closed: matured, or the balance fell below every plan floor.
    Completed,
}
