//! Plan selection and the investment surface exposed to the excluded
//! request-handling layer.

use chrono::NaiveDate;
use tiervest_core::{Investment, Plan, User, UserId};
use tiervest_store::{Store, UserDelta};

use crate::error::{EngineError, Result};

/// Pick the best-fit plan for a balance: the active plan with the lowest
/// minimum whose `[min, max]` range admits the balance.
///
/// `plans` must be the active set sorted by ascending minimum (the store's
/// `list_active_plans` order), so the first admitting plan is the answer.
/// Settlement migration, auto-reinvestment, and `start_investment` all select
/// through this one function so their semantics cannot drift apart.
#[must_use]
pub fn best_fit_plan<'a>(plans: &'a [Plan], balance_cents: i64) -> Option<&'a Plan> {
    plans.iter().find(|plan| plan.admits(balance_cents))
}

/// Start an investment for a user with no active one, committing their whole
/// balance to the best-fit plan.
///
/// # Errors
///
/// - [`EngineError::MissingUser`] if the user row does not exist.
/// - [`EngineError::AlreadyInvested`] if an active investment exists.
/// - [`EngineError::NothingToInvest`] if the balance is not positive or no
///   plan admits it.
pub fn start_investment<S: Store>(
    store: &S,
    user_id: UserId,
    today: NaiveDate,
) -> Result<Investment> {
    let user = store
        .get_user(&user_id)?
        .ok_or(EngineError::MissingUser(user_id))?;

    if user.current_investment.is_some() {
        return Err(EngineError::AlreadyInvested(user_id));
    }
    if user.balance_cents <= 0 {
        return Err(EngineError::NothingToInvest(user_id));
    }

    let plans = store.list_active_plans()?;
    let Some(plan) = best_fit_plan(&plans, user.balance_cents) else {
        tracing::warn!(user_id = %user_id, balance = user.balance_cents, "no plan admits balance");
        return Err(EngineError::NothingToInvest(user_id));
    };

    // One atomic unit: the investment row and the user's owned reference to
    // it land together.
    let investment = Investment::open(user_id, plan, user.balance_cents, today);
    let mut delta = UserDelta::new(user_id);
    delta.current_investment = Some(Some(investment.id));
    store.commit_settlement(&tiervest_store::SettlementWrite {
        user_deltas: vec![delta],
        investments: vec![investment.clone()],
        entries: Vec::new(),
    })?;

    tracing::info!(
        user_id = %user_id,
        plan = %plan.name,
        amount = investment.amount_cents,
        "investment started"
    );
    Ok(investment)
}

/// Dashboard view of a user's active investment.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvestmentView {
    /// Name of the backing plan.
    pub plan_name: String,

    /// Committed amount in cents.
    pub amount_cents: i64,

    /// Expected value at maturity in cents.
    pub expected_return_cents: i64,

    /// Days since the cycle started.
    pub elapsed_days: i64,

    /// Days until maturity.
    pub remaining_days: i64,

    /// Progress through the cycle, 0..=100.
    pub progress_percent: u8,
}

/// The active-investment read exposed for dashboard display.
///
/// Returns `None` when the user has no active investment.
///
/// # Errors
///
/// - [`EngineError::MissingUser`] if the user row does not exist.
/// - [`EngineError::MissingPlan`] if the investment references a vanished
///   plan row.
pub fn active_investment<S: Store>(
    store: &S,
    user_id: UserId,
    today: NaiveDate,
) -> Result<Option<InvestmentView>> {
    let user: User = store
        .get_user(&user_id)?
        .ok_or(EngineError::MissingUser(user_id))?;

    let Some(investment_id) = user.current_investment else {
        return Ok(None);
    };
    let Some(investment) = store.get_investment(&investment_id)? else {
        return Ok(None);
    };

    let plan = store
        .get_plan(&investment.plan_id)?
        .ok_or(EngineError::MissingPlan(investment.plan_id))?;

    Ok(Some(InvestmentView {
        plan_name: plan.name,
        amount_cents: investment.amount_cents,
        expected_return_cents: investment.expected_return_cents,
        elapsed_days: investment.elapsed_days(today),
        remaining_days: investment.remaining_days(today),
        progress_percent: investment.progress_percent(today),
    }))
}
