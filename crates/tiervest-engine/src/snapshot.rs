//! The daily balance snapshot job.

use chrono::NaiveDate;
use tiervest_store::Store;

use crate::error::Result;

/// Persist every user's end-of-day balance for `today`.
///
/// Runs strictly after settlement so the snapshot reflects the day's
/// accrual. Upsert semantics: re-running for the same day overwrites rather
/// than duplicates. Returns how many users were snapshotted.
///
/// # Errors
///
/// Returns an error if a storage operation fails.
pub fn run_snapshots<S: Store>(store: &S, today: NaiveDate) -> Result<usize> {
    let users = store.list_users()?;
    for user in &users {
        store.put_snapshot(&user.id, today, user.balance_cents)?;
    }
    tracing::info!(date = %today, users = users.len(), "balance snapshots written");
    Ok(users.len())
}
