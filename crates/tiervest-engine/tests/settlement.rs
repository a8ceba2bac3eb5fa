//! Settlement job integration tests.

mod common;

use common::{date, funded_user, insert_plan, test_store, today};
use tiervest_core::{DailyReturn, EntryKind, Investment, InvestmentStatus, UserId};
use tiervest_engine::{run_settlement, start_investment, EngineError, SettlementReport};
use tiervest_store::{SettlementWrite, Store, UserDelta};

/// Pin today's return for a plan to a single known value.
fn pin_daily_return(store: &tiervest_store::RocksStore, plan: &tiervest_core::Plan, pct_milli: i64) {
    store
        .replace_schedule(
            &plan.id,
            &[DailyReturn {
                plan_id: plan.id,
                date: today(),
                pct_milli,
            }],
        )
        .unwrap();
}

/// Open an investment and point the user's current-investment reference at it.
fn open_investment(
    store: &tiervest_store::RocksStore,
    user: &tiervest_core::User,
    plan: &tiervest_core::Plan,
    amount_cents: i64,
    start: chrono::NaiveDate,
) -> Investment {
    let investment = Investment::open(user.id, plan, amount_cents, start);
    let mut delta = UserDelta::new(user.id);
    delta.current_investment = Some(Some(investment.id));
    store
        .commit_settlement(&SettlementWrite {
            user_deltas: vec![delta],
            investments: vec![investment.clone()],
            entries: Vec::new(),
        })
        .unwrap();
    investment
}

// ============================================================================
// Accrual
// ============================================================================

#[test]
fn loss_day_debits_balance_and_roi_together() {
    let (store, _dir) = test_store();
    // 9% over 30 days, $10,000.00 committed, today's rate -0.050%.
    let plan = insert_plan(&store, "Standard", 0, None, 9_000, 30);
    let user = funded_user(&store, 1_000_000);
    open_investment(&store, &user, &plan, 1_000_000, today());
    pin_daily_return(&store, &plan, -50);

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report.accrued, 1);

    let after = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 999_500);
    assert_eq!(after.roi_earnings_cents, -500);

    let entries = store.list_entries_by_user(&user.id, 10, 0).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::DailyRoi);
    assert_eq!(entries[0].amount_cents, -500);
}

#[test]
fn zero_return_day_is_a_noop() {
    let (store, _dir) = test_store();
    let plan = insert_plan(&store, "Standard", 0, None, 9_000, 30);
    let user = funded_user(&store, 1_000_000);
    open_investment(&store, &user, &plan, 1_000_000, today());
    pin_daily_return(&store, &plan, 0);

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report.accrued, 0);

    let after = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 1_000_000);
    assert_eq!(after.roi_earnings_cents, 0);
    assert!(store.list_entries_by_user(&user.id, 10, 0).unwrap().is_empty());
}

#[test]
fn day_with_no_active_investments_commits_nothing() {
    let (store, _dir) = test_store();
    insert_plan(&store, "Standard", 0, None, 9_000, 30);
    let user = funded_user(&store, 1_000_000);

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report, SettlementReport::default());
    assert!(store.list_entries_by_user(&user.id, 10, 0).unwrap().is_empty());
}

#[test]
fn missing_schedule_row_falls_back_to_flat_average() {
    let (store, _dir) = test_store();
    // 9%/30d flat average is 0.3%/day.
    let plan = insert_plan(&store, "Standard", 0, None, 9_000, 30);
    let user = funded_user(&store, 1_000_000);
    open_investment(&store, &user, &plan, 1_000_000, today());

    run_settlement(&store, today()).unwrap();

    let after = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 1_003_000);
    assert_eq!(after.roi_earnings_cents, 3_000);
}

// ============================================================================
// Tier re-evaluation
// ============================================================================

#[test]
fn shrunk_balance_repriced_within_plan() {
    let (store, _dir) = test_store();
    let plan = insert_plan(&store, "Standard", 100_000, None, 9_000, 30);
    // Committed 500_000 but a withdrawal left only 400_000.
    let user = funded_user(&store, 400_000);
    let investment = open_investment(&store, &user, &plan, 500_000, today());
    pin_daily_return(&store, &plan, 0);

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report.repriced, 1);
    assert_eq!(report.migrated, 0);

    let after = store.get_investment(&investment.id).unwrap().unwrap();
    assert_eq!(after.amount_cents, 400_000);
    assert_eq!(after.plan_id, plan.id);
    assert_eq!(after.expected_return_cents, plan.expected_return_cents(400_000));
    assert_eq!(after.status, InvestmentStatus::Active);
}

#[test]
fn balance_drop_migrates_to_lower_tier() {
    let (store, _dir) = test_store();
    let gold = insert_plan(&store, "Gold", 300_000, None, 12_000, 60);
    let silver = insert_plan(&store, "Silver", 100_000, Some(299_999), 9_000, 30);
    pin_daily_return(&store, &silver, 0);

    let user = funded_user(&store, 200_000);
    let investment = open_investment(&store, &user, &gold, 500_000, date(2026, 8, 1));

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report.migrated, 1);

    let after = store.get_investment(&investment.id).unwrap().unwrap();
    assert_eq!(after.plan_id, silver.id);
    assert_eq!(after.amount_cents, 200_000);
    // expected_return = balance + balance * 9% = 218_000
    assert_eq!(after.expected_return_cents, 218_000);
    assert_eq!(after.end_date, today() + chrono::Duration::days(30));
    assert_eq!(after.start_date, date(2026, 8, 1));
    assert_eq!(after.status, InvestmentStatus::Active);
}

#[test]
fn balance_below_every_floor_completes_investment() {
    let (store, _dir) = test_store();
    let plan = insert_plan(&store, "Standard", 100_000, None, 9_000, 30);
    let user = funded_user(&store, 50_000);
    let investment = open_investment(&store, &user, &plan, 500_000, today());
    pin_daily_return(&store, &plan, 300);

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.accrued, 0);

    let after_inv = store.get_investment(&investment.id).unwrap().unwrap();
    assert_eq!(after_inv.status, InvestmentStatus::Completed);

    // No ROI was paid and the user's current-investment slot was cleared.
    let after = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 50_000);
    assert!(after.current_investment.is_none());
    assert!(store.list_entries_by_user(&user.id, 10, 0).unwrap().is_empty());
}

// ============================================================================
// Maturity and reinvestment
// ============================================================================

#[test]
fn matured_investment_paid_then_reinvested() {
    let (store, _dir) = test_store();
    let plan = insert_plan(&store, "Standard", 0, None, 9_000, 30);
    let user = funded_user(&store, 1_000_000);
    // Opened 30 days ago, so it matures today.
    let investment = open_investment(&store, &user, &plan, 1_000_000, today() - chrono::Duration::days(30));
    pin_daily_return(&store, &plan, 300);

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report.accrued, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.reinvested, 1);

    // The matured day's return was still paid before closing.
    let after = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 1_003_000);

    let old = store.get_investment(&investment.id).unwrap().unwrap();
    assert_eq!(old.status, InvestmentStatus::Completed);

    // The replacement cycle commits the post-accrual balance from today.
    let new_id = after.current_investment.expect("reinvested");
    assert_ne!(new_id, investment.id);
    let new = store.get_investment(&new_id).unwrap().unwrap();
    assert_eq!(new.amount_cents, 1_003_000);
    assert_eq!(new.start_date, today());
    assert_eq!(new.end_date, today() + chrono::Duration::days(30));
    assert_eq!(new.status, InvestmentStatus::Active);
}

#[test]
fn maturity_without_auto_return_leaves_balance_idle() {
    let (store, _dir) = test_store();
    let mut plan = tiervest_core::Plan::new("Manual", 0, None, 9_000, 30);
    plan.auto_return = false;
    plan.validate().unwrap();
    store.put_plan(&plan).unwrap();

    let user = funded_user(&store, 1_000_000);
    open_investment(&store, &user, &plan, 1_000_000, today() - chrono::Duration::days(30));
    pin_daily_return(&store, &plan, 0);

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.reinvested, 0);

    let after = store.get_user(&user.id).unwrap().unwrap();
    assert!(after.current_investment.is_none());
    assert_eq!(after.balance_cents, 1_000_000);
}

#[test]
fn matured_balance_with_no_admitting_plan_stays_idle() {
    let (store, _dir) = test_store();
    let plan = insert_plan(&store, "High", 100_000, None, 9_000, 30);
    // Floor is high; after maturity the balance does not reach it.
    let user = funded_user(&store, 50_000);
    open_investment(&store, &user, &plan, 50_000, today() - chrono::Duration::days(30));
    pin_daily_return(&store, &plan, 0);

    let report = run_settlement(&store, today()).unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.reinvested, 0);

    let after = store.get_user(&user.id).unwrap().unwrap();
    assert!(after.current_investment.is_none());
}

// ============================================================================
// Atomicity
// ============================================================================

#[test]
fn one_bad_row_aborts_the_whole_day() {
    let (store, _dir) = test_store();
    let plan = insert_plan(&store, "Standard", 0, None, 9_000, 30);
    let good_user = funded_user(&store, 1_000_000);
    open_investment(&store, &good_user, &plan, 1_000_000, today());
    pin_daily_return(&store, &plan, 300);

    // An investment whose user row does not exist.
    let orphan = Investment::open(UserId::generate(), &plan, 100_000, today());
    store.put_investment(&orphan).unwrap();

    let err = run_settlement(&store, today()).unwrap_err();
    assert!(matches!(err, EngineError::MissingUser(_)));

    // Nothing was applied, not even for the healthy investment.
    let after = store.get_user(&good_user.id).unwrap().unwrap();
    assert_eq!(after.balance_cents, 1_000_000);
    assert!(store.list_entries_by_user(&good_user.id, 10, 0).unwrap().is_empty());
}

// ============================================================================
// Start-investment surface
// ============================================================================

#[test]
fn start_investment_uses_best_fit_and_is_exclusive() {
    let (store, _dir) = test_store();
    let silver = insert_plan(&store, "Silver", 100_000, Some(299_999), 9_000, 30);
    insert_plan(&store, "Gold", 300_000, None, 12_000, 60);
    let user = funded_user(&store, 150_000);

    let investment = start_investment(&store, user.id, today()).unwrap();
    assert_eq!(investment.plan_id, silver.id);
    assert_eq!(investment.amount_cents, 150_000);

    let after = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(after.current_investment, Some(investment.id));

    let err = start_investment(&store, user.id, today()).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyInvested(_)));
}

#[test]
fn start_investment_requires_positive_admitted_balance() {
    let (store, _dir) = test_store();
    insert_plan(&store, "Silver", 100_000, None, 9_000, 30);

    let broke = funded_user(&store, 0);
    assert!(matches!(
        start_investment(&store, broke.id, today()).unwrap_err(),
        EngineError::NothingToInvest(_)
    ));

    let below_floor = funded_user(&store, 50_000);
    assert!(matches!(
        start_investment(&store, below_floor.id, today()).unwrap_err(),
        EngineError::NothingToInvest(_)
    ));
}

#[test]
fn start_and_reinvest_share_selection_semantics() {
    let (store, _dir) = test_store();
    let silver = insert_plan(&store, "Silver", 100_000, Some(299_999), 9_000, 30);
    insert_plan(&store, "Gold", 300_000, None, 12_000, 60);

    // Manual start for one user.
    let starter = funded_user(&store, 150_000);
    let started = start_investment(&store, starter.id, today()).unwrap();

    // Auto-reinvest for another user with the same balance after maturity.
    let maturing = funded_user(&store, 150_000);
    let plan = store.get_plan(&silver.id).unwrap().unwrap();
    open_investment(&store, &maturing, &plan, 150_000, today() - chrono::Duration::days(30));
    pin_daily_return(&store, &plan, 0);
    run_settlement(&store, today()).unwrap();

    let after = store.get_user(&maturing.id).unwrap().unwrap();
    let reinvested = store
        .get_investment(&after.current_investment.unwrap())
        .unwrap()
        .unwrap();

    assert_eq!(started.plan_id, reinvested.plan_id);
}
