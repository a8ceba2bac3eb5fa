//! The referral commission engine.
//!
//! Triggered synchronously when an admin resolves a pending deposit or
//! withdrawal, not on a schedule. Approving a deposit credits the depositor
//! and cascades direct commissions up the sponsor chain; the status flip and
//! every credit commit as one atomic unit, so a duplicate approval fails
//! instead of double-crediting.

use tiervest_core::{
    apply_pct, EntryId, EntryKind, EntryStatus, LedgerEntry, User, UserId, MAX_REFERRAL_DEPTH,
};
use tiervest_store::{ResolutionWrite, Store, UserDelta};

use crate::error::{EngineError, Result};

/// One posted commission, for reporting back to the admin action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedCommission {
    /// Sponsor level, 1 = immediate sponsor.
    pub level: u8,

    /// The credited ancestor.
    pub referrer: UserId,

    /// Commission amount in cents.
    pub amount_cents: i64,
}

/// Approve a pending deposit: credit the depositor and cascade referral
/// commissions up the sponsor chain.
///
/// Returns the commissions that were posted (possibly empty).
///
/// # Errors
///
/// - [`EngineError::WrongEntryKind`] if the entry is not a deposit.
/// - [`StoreError::NotPending`](tiervest_store::StoreError::NotPending) if
///   the entry was already resolved; nothing is credited twice.
/// - Storage errors abort the whole cascade; the entry stays pending.
pub fn approve_deposit<S: Store>(
    store: &S,
    entry_id: EntryId,
) -> Result<Vec<PostedCommission>> {
    let entry = load_pending(store, entry_id, EntryKind::Deposit)?;
    let depositor_id = entry.user_id;
    let amount = entry.amount_cents;

    let mut deltas = Vec::new();
    let mut depositor_delta = UserDelta::new(depositor_id);
    depositor_delta.balance_delta = amount;
    depositor_delta.deposits_delta = amount;
    deltas.push(depositor_delta);

    let rates = store.get_referral_rates()?;
    let mut commissions = Vec::new();
    let mut entries = Vec::new();
    let mut total_deltas = Vec::new();

    for (level, ancestor) in walk_sponsors(store, depositor_id)? {
        let Some(rate) = rates.rate_for(level) else {
            // A gap in configured levels does not break the chain.
            tracing::debug!(level, "no commission rate configured, skipping level");
            continue;
        };
        let commission = apply_pct(amount, rate);
        if commission == 0 {
            continue;
        }

        let mut delta = UserDelta::new(ancestor.id);
        delta.balance_delta = commission;
        delta.affiliate_delta = commission;
        deltas.push(delta);
        entries.push(LedgerEntry::referral_direct(ancestor.id, commission, depositor_id));
        total_deltas.push((ancestor.id, depositor_id, commission));
        commissions.push(PostedCommission {
            level,
            referrer: ancestor.id,
            amount_cents: commission,
        });
    }

    let mut approved = entry;
    approved.status = EntryStatus::Approved;
    store.commit_resolution(&ResolutionWrite {
        entry: approved,
        user_deltas: deltas,
        commissions: entries,
        total_deltas,
    })?;

    tracing::info!(
        entry = %entry_id,
        depositor = %depositor_id,
        amount,
        levels = commissions.len(),
        "deposit approved, commissions posted"
    );
    Ok(commissions)
}

/// Reject a pending deposit. No balance ever moved, so this is only the
/// status flip.
///
/// # Errors
///
/// Same failure modes as [`approve_deposit`].
pub fn reject_deposit<S: Store>(store: &S, entry_id: EntryId) -> Result<()> {
    let entry = load_pending(store, entry_id, EntryKind::Deposit)?;
    let mut rejected = entry;
    rejected.status = EntryStatus::Rejected;
    store.commit_resolution(&ResolutionWrite {
        entry: rejected,
        user_deltas: Vec::new(),
        commissions: Vec::new(),
        total_deltas: Vec::new(),
    })?;
    tracing::info!(entry = %entry_id, "deposit rejected");
    Ok(())
}

/// Approve a pending withdrawal. The amount was pre-deducted at request
/// time; approval flips the status and accrues `total_withdrawals`.
///
/// # Errors
///
/// Same failure modes as [`approve_deposit`], with kind `Withdraw`.
pub fn approve_withdrawal<S: Store>(store: &S, entry_id: EntryId) -> Result<()> {
    let entry = load_pending(store, entry_id, EntryKind::Withdraw)?;
    let mut delta = UserDelta::new(entry.user_id);
    delta.withdrawals_delta = entry.magnitude_cents();

    let mut approved = entry;
    approved.status = EntryStatus::Approved;
    store.commit_resolution(&ResolutionWrite {
        entry: approved,
        user_deltas: vec![delta],
        commissions: Vec::new(),
        total_deltas: Vec::new(),
    })?;
    tracing::info!(entry = %entry_id, "withdrawal approved");
    Ok(())
}

/// Reject a pending withdrawal: refund the pre-deducted amount to the
/// user's balance atomically with the status flip.
///
/// # Errors
///
/// Same failure modes as [`approve_deposit`], with kind `Withdraw`.
pub fn reject_withdrawal<S: Store>(store: &S, entry_id: EntryId) -> Result<()> {
    let entry = load_pending(store, entry_id, EntryKind::Withdraw)?;
    let mut delta = UserDelta::new(entry.user_id);
    delta.balance_delta = entry.magnitude_cents();

    let mut rejected = entry;
    rejected.status = EntryStatus::Rejected;
    store.commit_resolution(&ResolutionWrite {
        entry: rejected,
        user_deltas: vec![delta],
        commissions: Vec::new(),
        total_deltas: Vec::new(),
    })?;
    tracing::info!(entry = %entry_id, "withdrawal rejected, amount refunded");
    Ok(())
}

fn load_pending<S: Store>(
    store: &S,
    entry_id: EntryId,
    expected: EntryKind,
) -> Result<LedgerEntry> {
    let entry = store
        .get_entry(&entry_id)?
        .ok_or(tiervest_store::StoreError::EntryNotFound(entry_id))?;
    if entry.kind != expected {
        return Err(EngineError::WrongEntryKind {
            entry_id,
            kind: entry.kind,
        });
    }
    // The store re-verifies under its write lock; this early check just
    // yields a cleaner error before any cascade work is done.
    if entry.status != EntryStatus::Pending {
        return Err(tiervest_store::StoreError::NotPending {
            entry_id,
            status: entry.status,
        }
        .into());
    }
    Ok(entry)
}

/// Walk the sponsor chain upward from `from`, yielding `(level, ancestor)`
/// pairs. Stops at a missing sponsor, at [`MAX_REFERRAL_DEPTH`] levels, or
/// when the chain revisits a user (a referral cycle: bounded by the cap, but
/// semantically wrong, so the walk ends there with a warning).
fn walk_sponsors<S: Store>(store: &S, from: UserId) -> Result<Vec<(u8, User)>> {
    let mut chain = Vec::new();
    let mut seen = std::collections::HashSet::from([from]);

    let mut current = store
        .get_user(&from)?
        .ok_or(EngineError::MissingUser(from))?;

    for level in 1..=MAX_REFERRAL_DEPTH {
        let Some(sponsor_id) = current.sponsor_id else {
            break;
        };
        if !seen.insert(sponsor_id) {
            tracing::warn!(user = %sponsor_id, "referral cycle detected, truncating chain");
            break;
        }
        let Some(sponsor) = store.get_user(&sponsor_id)? else {
            tracing::warn!(sponsor = %sponsor_id, "dangling sponsor reference, truncating chain");
            break;
        };
        chain.push((level, sponsor.clone()));
        current = sponsor;
    }

    Ok(chain)
}
