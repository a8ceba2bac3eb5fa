//! Randomized daily return schedule generation.
//!
//! For a plan paying a nominal total return R over D days, the generator
//! produces D signed daily percentages that sum to exactly R in milli-percent.
//! A handful of days are negative ("loss days") to make the curve look like a
//! market rather than a straight line, but the total is conserved.
//!
//! The RNG is an explicit argument so schedules are reproducible in tests
//! with a seeded generator.

use chrono::{Duration, NaiveDate};
use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ids::PlanId;
use crate::plan::Plan;

/// One day of a plan's return schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReturn {
    /// The plan this row belongs to.
    pub plan_id: PlanId,

    /// Calendar date the rate applies to.
    pub date: NaiveDate,

    /// Signed daily return in milli-percent.
    pub pct_milli: i64,
}

/// Number of loss days in a D-day schedule: `min(3, D / 10)`.
///
/// Schedules shorter than 10 days have no loss days.
#[must_use]
pub fn loss_day_count(duration_days: i64) -> usize {
    usize::try_from((duration_days / 10).clamp(0, 3)).unwrap_or(0)
}

/// Generate a full schedule for `plan` starting at `start`.
///
/// The returned rows cover `plan.duration_days` consecutive dates and their
/// `pct_milli` values sum to exactly `plan.total_return_pct_milli`. A plan
/// with a zero target produces an all-zero schedule; that is not an error.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn generate_schedule<R: Rng>(plan: &Plan, start: NaiveDate, rng: &mut R) -> Vec<DailyReturn> {
    let days = usize::try_from(plan.duration_days).unwrap_or(0);
    if days == 0 {
        return Vec::new();
    }

    let target_milli = plan.total_return_pct_milli;
    let target_pct = target_milli as f64 / 1000.0;

    // Proportional allocation: uniform weights normalized to sum to R.
    let mut values: Vec<f64> = (0..days).map(|_| rng.gen::<f64>()).collect();
    let weight_sum: f64 = values.iter().sum();
    if weight_sum > 0.0 {
        for v in &mut values {
            *v *= target_pct / weight_sum;
        }
    }

    // Overwrite the loss days with small drawdowns. Day 0 is excluded: it
    // absorbs the rounding residue below and must stay on the positive side.
    let losses = loss_day_count(plan.duration_days);
    if losses > 0 && target_pct > 0.0 {
        let per_day = target_pct / days as f64;
        for idx in sample(rng, days - 1, losses) {
            values[idx + 1] = rng.gen_range(-0.8 * per_day..0.0);
        }
    }

    // The overwrites perturbed the sum; one multiplicative rescale restores it.
    let current: f64 = values.iter().sum();
    if current != 0.0 {
        let factor = target_pct / current;
        for v in &mut values {
            *v *= factor;
        }
    }

    // Quantize to milli-percent. Loss days must stay strictly negative, so
    // any that rounded up to zero are pinned at -1 and the difference flows
    // into the day-0 residual along with ordinary rounding error.
    let mut milli: Vec<i64> = values.iter().map(|v| (v * 1000.0).round() as i64).collect();
    for i in 1..days {
        if milli[i] == 0 && values[i] < 0.0 {
            milli[i] = -1;
        }
    }
    let residual = target_milli - milli.iter().sum::<i64>();
    milli[0] += residual;

    // A negative residual can drag a small day 0 below zero, which would add
    // an extra loss day. Shift the deficit onto the largest positive day;
    // the total is unchanged.
    if milli[0] < 0 && target_milli > 0 {
        if let Some(idx) = (1..days).max_by_key(|&i| milli[i]) {
            if milli[idx] > -milli[0] {
                milli[idx] += milli[0];
                milli[0] = 0;
            }
        }
    }

    milli
        .into_iter()
        .enumerate()
        .map(|(i, pct_milli)| DailyReturn {
            plan_id: plan.id,
            date: start + Duration::days(i as i64),
            pct_milli,
        })
        .collect()
}
