//! The daily investment settlement job.
//!
//! For every active investment: re-evaluate plan-tier fit, look up today's
//! return, accrue it, and close or auto-reinvest matured cycles. The whole
//! day is computed first and committed as one atomic unit; any single-row
//! error aborts the entire run, which is retried at the next scheduled
//! invocation. A skipped settlement day is preferable to partially-applied
//! ROI across users.

use std::collections::HashMap;

use chrono::NaiveDate;
use tiervest_core::{
    apply_pct, Investment, InvestmentStatus, LedgerEntry, Plan, PlanId, User,
};
use tiervest_store::{SettlementWrite, Store, UserDelta};

use crate::error::{EngineError, Result};
use crate::invest::best_fit_plan;

/// Counters describing one settlement run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Investments that accrued a non-zero return.
    pub accrued: usize,

    /// Investments re-priced within their current plan.
    pub repriced: usize,

    /// Investments migrated to a different plan tier.
    pub migrated: usize,

    /// Investments completed (matured or below every floor).
    pub completed: usize,

    /// Matured investments rolled into a fresh cycle.
    pub reinvested: usize,
}

/// Run one settlement day over every active investment.
///
/// # Errors
///
/// Data-integrity failures (missing user or plan rows, storage errors) abort
/// the run; nothing is written.
pub fn run_settlement<S: Store>(store: &S, today: NaiveDate) -> Result<SettlementReport> {
    let active_plans = store.list_active_plans()?;
    let mut plan_cache: HashMap<PlanId, Plan> = HashMap::new();
    for plan in &active_plans {
        plan_cache.insert(plan.id, plan.clone());
    }

    let mut run = SettlementRun {
        store,
        active_plans,
        plan_cache,
        today,
        report: SettlementReport::default(),
        write: SettlementWrite::default(),
    };

    for investment in store.list_active_investments()? {
        run.settle_one(investment)?;
    }

    if run.write.is_empty() {
        tracing::info!(date = %today, "no active investments to settle");
        return Ok(run.report);
    }

    let entries = run.write.entries.len();
    store.commit_settlement(&run.write)?;

    tracing::info!(
        date = %today,
        accrued = run.report.accrued,
        repriced = run.report.repriced,
        migrated = run.report.migrated,
        completed = run.report.completed,
        reinvested = run.report.reinvested,
        entries,
        "settlement committed"
    );
    Ok(run.report)
}

/// In-flight state of one settlement run: the day's write set accumulates
/// here and commits once at the end.
struct SettlementRun<'a, S: Store> {
    store: &'a S,
    /// Active plans in lowest-minimum-first order.
    active_plans: Vec<Plan>,
    /// Plans an investment may still reference after deactivation.
    plan_cache: HashMap<PlanId, Plan>,
    today: NaiveDate,
    report: SettlementReport,
    write: SettlementWrite,
}

impl<S: Store> SettlementRun<'_, S> {
    fn settle_one(&mut self, mut investment: Investment) -> Result<()> {
        let user = self
            .store
            .get_user(&investment.user_id)?
            .ok_or(EngineError::MissingUser(investment.user_id))?;
        let mut delta = UserDelta::new(user.id);

        // Tier re-evaluation: a withdrawal (or loss) may have shrunk the
        // balance below the committed amount since the last run. The correct
        // plan must be settled before today's return is looked up.
        let plan = match self.re_evaluate(&user, &mut investment, &mut delta)? {
            Some(plan) => plan,
            None => {
                // Below every plan floor: closed out, no ROI this cycle.
                self.write.investments.push(investment);
                self.write.user_deltas.push(delta);
                return Ok(());
            }
        };

        // Today's rate, or the flat average as a degraded-mode fallback so
        // settlement never stalls on missing schedule data.
        let pct_milli = match self.store.get_daily_return(&plan.id, self.today)? {
            Some(pct) => pct,
            None => {
                tracing::warn!(
                    plan = %plan.name,
                    date = %self.today,
                    "no schedule row, using flat average"
                );
                plan.flat_daily_pct_milli()
            }
        };

        // Accrual. A zero day is a no-op: no ledger entry, no balance change.
        let amount = apply_pct(investment.amount_cents, pct_milli);
        let mut balance_after = user.balance_cents;
        if amount != 0 {
            delta.balance_delta += amount;
            delta.roi_delta += amount;
            balance_after += amount;
            self.write.entries.push(LedgerEntry::daily_roi(user.id, amount));
            self.report.accrued += 1;
        }

        // Maturity follows accrual so the matured day's return is still paid.
        if investment.is_mature(self.today) {
            investment.status = InvestmentStatus::Completed;
            delta.current_investment = Some(None);
            self.report.completed += 1;
            if plan.auto_return {
                self.reinvest(&user, balance_after, &mut delta);
            }
        }

        self.write.investments.push(investment);
        if !delta.is_noop() {
            self.write.user_deltas.push(delta);
        }
        Ok(())
    }

    /// Settle which plan backs the investment for today's accrual. Returns
    /// `None` when the balance fell below every plan floor and the
    /// investment was completed instead.
    fn re_evaluate(
        &mut self,
        user: &User,
        investment: &mut Investment,
        delta: &mut UserDelta,
    ) -> Result<Option<Plan>> {
        let plan = self.lookup_plan(investment.plan_id)?;

        if user.balance_cents >= investment.amount_cents {
            return Ok(Some(plan));
        }

        if plan.active && plan.admits(user.balance_cents) {
            investment.reprice(&plan, user.balance_cents);
            self.report.repriced += 1;
            tracing::debug!(
                investment = %investment.id,
                amount = investment.amount_cents,
                "repriced within plan"
            );
            return Ok(Some(plan));
        }

        if let Some(target) = best_fit_plan(&self.active_plans, user.balance_cents).cloned() {
            investment.migrate(&target, user.balance_cents, self.today);
            self.report.migrated += 1;
            tracing::info!(
                investment = %investment.id,
                plan = %target.name,
                amount = investment.amount_cents,
                "migrated to new tier"
            );
            return Ok(Some(target));
        }

        investment.status = InvestmentStatus::Completed;
        delta.current_investment = Some(None);
        self.report.completed += 1;
        tracing::info!(
            investment = %investment.id,
            balance = user.balance_cents,
            "balance below all plan floors, investment completed"
        );
        Ok(None)
    }

    /// After maturity, roll the post-accrual balance into a fresh cycle when
    /// a plan admits it. Leaving funds idle is the fallback, not the goal.
    fn reinvest(&mut self, user: &User, balance_after: i64, delta: &mut UserDelta) {
        if balance_after <= 0 {
            return;
        }
        let Some(next) = best_fit_plan(&self.active_plans, balance_after).cloned() else {
            tracing::debug!(user_id = %user.id, balance = balance_after, "no plan admits matured balance");
            return;
        };
        let next_investment = Investment::open(user.id, &next, balance_after, self.today);
        delta.current_investment = Some(Some(next_investment.id));
        self.report.reinvested += 1;
        tracing::info!(
            user_id = %user.id,
            plan = %next.name,
            amount = balance_after,
            "matured investment reinvested"
        );
        self.write.investments.push(next_investment);
    }

    fn lookup_plan(&mut self, plan_id: PlanId) -> Result<Plan> {
        if let Some(plan) = self.plan_cache.get(&plan_id) {
            return Ok(plan.clone());
        }
        let plan = self
            .store
            .get_plan(&plan_id)?
            .ok_or(EngineError::MissingPlan(plan_id))?;
        self.plan_cache.insert(plan_id, plan.clone());
        Ok(plan)
    }
}
