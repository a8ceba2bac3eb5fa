//! Deposit/withdrawal resolution and referral cascade integration tests.

mod common;

use common::{funded_user, referred_user, test_store};
use tiervest_core::{EntryKind, EntryStatus, LedgerEntry, ReferralRates, User};
use tiervest_engine::{
    approve_deposit, approve_withdrawal, reject_deposit, reject_withdrawal, EngineError,
};
use tiervest_store::{RocksStore, Store, StoreError};

fn set_rates(store: &RocksStore, pairs: &[(u8, i64)]) {
    store.set_referral_rates(&ReferralRates::from_pairs(pairs)).unwrap();
}

fn pending_deposit(store: &RocksStore, user: &User, amount_cents: i64) -> LedgerEntry {
    let entry = LedgerEntry::deposit(user.id, amount_cents);
    store.put_entry(&entry).unwrap();
    entry
}

fn pending_withdrawal(store: &RocksStore, user: &User, amount_cents: i64) -> LedgerEntry {
    let entry = LedgerEntry::withdraw(user.id, amount_cents);
    store.put_entry(&entry).unwrap();
    entry
}

/// Build a sponsor chain of `depth` ancestors and return
/// `(ancestors_root_first, depositor)`.
fn sponsor_chain(store: &RocksStore, depth: usize) -> (Vec<User>, User) {
    let mut ancestors = vec![funded_user(store, 0)];
    for _ in 1..depth {
        let sponsor = ancestors.last().unwrap().id;
        ancestors.push(referred_user(store, sponsor, 0));
    }
    let depositor = referred_user(store, ancestors.last().unwrap().id, 0);
    (ancestors, depositor)
}

// ============================================================================
// Deposit approval and the cascade
// ============================================================================

#[test]
fn deposit_approval_cascades_five_levels() {
    let (store, _dir) = test_store();
    // 10%, 8%, 6%, 4%, 2% for levels 1..=5.
    set_rates(&store, &[(1, 10_000), (2, 8_000), (3, 6_000), (4, 4_000), (5, 2_000)]);
    let (ancestors, depositor) = sponsor_chain(&store, 5);
    let entry = pending_deposit(&store, &depositor, 100_000);

    let commissions = approve_deposit(&store, entry.id).unwrap();
    assert_eq!(commissions.len(), 5);

    // Level 1 is the immediate sponsor, i.e. the last ancestor built.
    let expected = [10_000, 8_000, 6_000, 4_000, 2_000];
    for (i, commission) in commissions.iter().enumerate() {
        let ancestor = &ancestors[ancestors.len() - 1 - i];
        assert_eq!(commission.level, u8::try_from(i + 1).unwrap());
        assert_eq!(commission.referrer, ancestor.id);
        assert_eq!(commission.amount_cents, expected[i]);

        let row = store.get_user(&ancestor.id).unwrap().unwrap();
        assert_eq!(row.balance_cents, expected[i]);
        assert_eq!(row.affiliate_earnings_cents, expected[i]);

        // Per-pair lifetime totals track who generated the commission.
        let total = store.get_referral_total(&ancestor.id, &depositor.id).unwrap();
        assert_eq!(total, expected[i]);

        // Each ancestor got a traceable commission entry.
        let entries = store.list_entries_by_user(&ancestor.id, 10, 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::ReferralDirect);
        assert_eq!(entries[0].related_user, Some(depositor.id));
    }

    // The depositor was credited and the entry approved.
    let after = store.get_user(&depositor.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 100_000);
    assert_eq!(after.total_deposits_cents, 100_000);
    let resolved = store.get_entry(&entry.id).unwrap().unwrap();
    assert_eq!(resolved.status, EntryStatus::Approved);
}

#[test]
fn duplicate_approval_does_not_double_credit() {
    let (store, _dir) = test_store();
    set_rates(&store, &[(1, 10_000)]);
    let sponsor = funded_user(&store, 0);
    let depositor = referred_user(&store, sponsor.id, 0);
    let entry = pending_deposit(&store, &depositor, 50_000);

    approve_deposit(&store, entry.id).unwrap();
    let err = approve_deposit(&store, entry.id).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Store(StoreError::NotPending { .. })
    ));

    let after = store.get_user(&sponsor.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 5_000);
    let depositor_after = store.get_user(&depositor.id).unwrap().unwrap();
    assert_eq!(depositor_after.balance_cents, 50_000);
}

#[test]
fn short_chain_truncates_cascade() {
    let (store, _dir) = test_store();
    set_rates(&store, &[(1, 10_000), (2, 8_000), (3, 6_000), (4, 4_000), (5, 2_000)]);
    let (ancestors, depositor) = sponsor_chain(&store, 2);
    let entry = pending_deposit(&store, &depositor, 100_000);

    let commissions = approve_deposit(&store, entry.id).unwrap();
    assert_eq!(commissions.len(), 2);
    assert_eq!(commissions[0].referrer, ancestors[1].id);
    assert_eq!(commissions[1].referrer, ancestors[0].id);
}

#[test]
fn rate_gap_skips_level_without_breaking_chain() {
    let (store, _dir) = test_store();
    // Level 2 deliberately unconfigured.
    set_rates(&store, &[(1, 10_000), (3, 6_000)]);
    let (ancestors, depositor) = sponsor_chain(&store, 3);
    let entry = pending_deposit(&store, &depositor, 100_000);

    let commissions = approve_deposit(&store, entry.id).unwrap();
    assert_eq!(commissions.len(), 2);
    assert_eq!(commissions[0].level, 1);
    assert_eq!(commissions[1].level, 3);
    assert_eq!(commissions[1].referrer, ancestors[0].id);

    // The skipped level-2 ancestor was left untouched.
    let skipped = store.get_user(&ancestors[1].id).unwrap().unwrap();
    assert_eq!(skipped.balance_cents, 0);
    assert!(store.list_entries_by_user(&ancestors[1].id, 10, 0).unwrap().is_empty());
}

#[test]
fn sponsor_cycle_truncates_cascade() {
    let (store, _dir) = test_store();
    set_rates(&store, &[(1, 10_000), (2, 8_000), (3, 6_000)]);

    // a sponsors b, b sponsors a: approving a deposit by a must stop after
    // crediting b once.
    let a = funded_user(&store, 0);
    let b = referred_user(&store, a.id, 0);
    let mut a_row = store.get_user(&a.id).unwrap().unwrap();
    a_row.sponsor_id = Some(b.id);
    store.put_user(&a_row).unwrap();

    let entry = pending_deposit(&store, &a_row, 100_000);
    let commissions = approve_deposit(&store, entry.id).unwrap();
    assert_eq!(commissions.len(), 1);
    assert_eq!(commissions[0].referrer, b.id);
    assert_eq!(commissions[0].amount_cents, 10_000);
}

#[test]
fn unreferred_depositor_gets_no_cascade() {
    let (store, _dir) = test_store();
    set_rates(&store, &[(1, 10_000)]);
    let depositor = funded_user(&store, 0);
    let entry = pending_deposit(&store, &depositor, 100_000);

    let commissions = approve_deposit(&store, entry.id).unwrap();
    assert!(commissions.is_empty());
    let after = store.get_user(&depositor.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 100_000);
}

#[test]
fn repeat_deposits_accumulate_referral_totals() {
    let (store, _dir) = test_store();
    set_rates(&store, &[(1, 10_000)]);
    let sponsor = funded_user(&store, 0);
    let depositor = referred_user(&store, sponsor.id, 0);

    for amount in [50_000, 30_000] {
        let entry = pending_deposit(&store, &depositor, amount);
        approve_deposit(&store, entry.id).unwrap();
    }

    let total = store.get_referral_total(&sponsor.id, &depositor.id).unwrap();
    assert_eq!(total, 8_000);
    let row = store.get_user(&sponsor.id).unwrap().unwrap();
    assert_eq!(row.affiliate_earnings_cents, 8_000);
}

#[test]
fn reject_deposit_only_flips_status() {
    let (store, _dir) = test_store();
    set_rates(&store, &[(1, 10_000)]);
    let sponsor = funded_user(&store, 0);
    let depositor = referred_user(&store, sponsor.id, 0);
    let entry = pending_deposit(&store, &depositor, 100_000);

    reject_deposit(&store, entry.id).unwrap();

    let resolved = store.get_entry(&entry.id).unwrap().unwrap();
    assert_eq!(resolved.status, EntryStatus::Rejected);
    let depositor_after = store.get_user(&depositor.id).unwrap().unwrap();
    assert_eq!(depositor_after.balance_cents, 0);
    assert_eq!(depositor_after.total_deposits_cents, 0);
    let sponsor_after = store.get_user(&sponsor.id).unwrap().unwrap();
    assert_eq!(sponsor_after.balance_cents, 0);
}

#[test]
fn resolving_the_wrong_kind_is_rejected() {
    let (store, _dir) = test_store();
    let user = funded_user(&store, 10_000);
    let withdrawal = pending_withdrawal(&store, &user, 3_000);

    let err = approve_deposit(&store, withdrawal.id).unwrap_err();
    assert!(matches!(err, EngineError::WrongEntryKind { .. }));

    let missing = approve_deposit(&store, tiervest_core::EntryId::generate()).unwrap_err();
    assert!(matches!(
        missing,
        EngineError::Store(StoreError::EntryNotFound(_))
    ));
}

// ============================================================================
// Withdrawal resolution
// ============================================================================

#[test]
fn approve_withdrawal_accrues_lifetime_total() {
    let (store, _dir) = test_store();
    // 7_000 left after the 3_000 debit at request time.
    let user = funded_user(&store, 7_000);
    let entry = pending_withdrawal(&store, &user, 3_000);

    approve_withdrawal(&store, entry.id).unwrap();

    let after = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 7_000);
    assert_eq!(after.total_withdrawals_cents, 3_000);
    let resolved = store.get_entry(&entry.id).unwrap().unwrap();
    assert_eq!(resolved.status, EntryStatus::Approved);
}

#[test]
fn reject_withdrawal_refunds_the_held_amount() {
    let (store, _dir) = test_store();
    let user = funded_user(&store, 7_000);
    let entry = pending_withdrawal(&store, &user, 3_000);

    reject_withdrawal(&store, entry.id).unwrap();

    let after = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 10_000);
    assert_eq!(after.total_withdrawals_cents, 0);
    let resolved = store.get_entry(&entry.id).unwrap().unwrap();
    assert_eq!(resolved.status, EntryStatus::Rejected);

    // Rejecting again neither errors silently nor refunds twice.
    let err = reject_withdrawal(&store, entry.id).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Store(StoreError::NotPending { .. })
    ));
    let still = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(still.balance_cents, 10_000);
}
