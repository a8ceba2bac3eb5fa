//! The daily schedule refresh job.
//!
//! Keeps every active plan holding a future-dated return schedule, so the
//! settlement job that follows always has rows to consume.

use chrono::NaiveDate;
use rand::Rng;
use tiervest_core::generate_schedule;
use tiervest_store::Store;

use crate::error::Result;

/// Regenerate exhausted schedules for every active plan.
///
/// A plan is exhausted when it has no schedule at all or its last scheduled
/// date is not strictly after `today`. Exhausted schedules are deleted and
/// regenerated from `today` in one atomic batch; a plan with a fresh
/// future-dated schedule is left untouched, making the job idempotent per
/// plan per day.
///
/// Returns how many plans were regenerated.
///
/// # Errors
///
/// Returns an error if a storage operation fails; the run stops at the
/// first failing plan.
pub fn refresh_schedules<S: Store, R: Rng>(
    store: &S,
    rng: &mut R,
    today: NaiveDate,
) -> Result<usize> {
    let mut regenerated = 0;

    for plan in store.list_active_plans()? {
        let exhausted = match store.schedule_last_date(&plan.id)? {
            None => true,
            Some(last) => last <= today,
        };
        if !exhausted {
            continue;
        }

        let rows = generate_schedule(&plan, today, rng);
        store.replace_schedule(&plan.id, &rows)?;
        regenerated += 1;
        tracing::info!(
            plan = %plan.name,
            days = rows.len(),
            start = %today,
            "return schedule regenerated"
        );
    }

    Ok(regenerated)
}
