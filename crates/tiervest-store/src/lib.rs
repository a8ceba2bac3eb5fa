//! `RocksDB` storage layer for tiervest.
//!
//! This crate provides persistent storage for users, plans, return schedules,
//! investments, ledger entries, referral totals, and balance snapshots, using
//! `RocksDB` with column families and atomic `WriteBatch` compound operations.
//!
//! # Atomic units
//!
//! The financial engine never mutates rows piecemeal. It builds a
//! [`SettlementWrite`] (one whole settlement day) or a [`ResolutionWrite`]
//! (one deposit/withdrawal decision plus its commission cascade) and hands it
//! to the store, which applies every row in a single `WriteBatch`: either the
//! full unit lands or none of it does. User mutations travel as
//! [`UserDelta`]s, applied against the stored row inside the store's write
//! critical section, so concurrent units cannot lose updates.
//!
//! # Example
//!
//! ```no_run
//! use tiervest_store::{RocksStore, Store};
//! use tiervest_core::{User, UserId};
//!
//! let store = RocksStore::open("/tmp/tiervest-db").unwrap();
//!
//! let user = User::new(UserId::generate());
//! store.put_user(&user).unwrap();
//! let retrieved = store.get_user(&user.id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::NaiveDate;
use tiervest_core::{
    DailyReturn, EntryId, Investment, InvestmentId, LedgerEntry, Plan, PlanId, ReferralRates,
    User, UserId,
};

/// A set of field deltas to apply to one user row.
///
/// Deltas rather than whole rows: the store reads the current row inside its
/// write critical section and applies the deltas there, so two atomic units
/// touching the same user cannot overwrite each other's credits.
#[derive(Debug, Clone)]
pub struct UserDelta {
    /// The user to mutate.
    pub user_id: UserId,

    /// Change to the spendable balance, in cents.
    pub balance_delta: i64,

    /// Change to cumulative ROI earnings, in cents.
    pub roi_delta: i64,

    /// Change to cumulative referral earnings, in cents.
    pub affiliate_delta: i64,

    /// Change to lifetime deposits, in cents.
    pub deposits_delta: i64,

    /// Change to lifetime withdrawals, in cents.
    pub withdrawals_delta: i64,

    /// When `Some`, overwrite the user's current-investment reference.
    pub current_investment: Option<Option<InvestmentId>>,
}

impl UserDelta {
    /// An empty delta for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance_delta: 0,
            roi_delta: 0,
            affiliate_delta: 0,
            deposits_delta: 0,
            withdrawals_delta: 0,
            current_investment: None,
        }
    }

    /// Whether the delta changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.balance_delta == 0
            && self.roi_delta == 0
            && self.affiliate_delta == 0
            && self.deposits_delta == 0
            && self.withdrawals_delta == 0
            && self.current_investment.is_none()
    }
}

/// One settlement day's full write set: every touched user, investment, and
/// ledger entry, committed as a single atomic unit.
#[derive(Debug, Clone, Default)]
pub struct SettlementWrite {
    /// Per-user ledger field deltas.
    pub user_deltas: Vec<UserDelta>,

    /// Investments to upsert (re-priced, migrated, completed, or newly
    /// opened for auto-reinvestment).
    pub investments: Vec<Investment>,

    /// `DailyRoi` ledger entries for the day.
    pub entries: Vec<LedgerEntry>,
}

impl SettlementWrite {
    /// Whether the write set contains nothing to commit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_deltas.is_empty() && self.investments.is_empty() && self.entries.is_empty()
    }
}

/// The write set of one deposit/withdrawal resolution: the status flip, the
/// affected balances, the commission entries, and the referral totals.
///
/// The store verifies the target entry is still `Pending` inside the write
/// critical section before committing; a duplicate resolution fails with
/// [`StoreError::NotPending`] and writes nothing.
#[derive(Debug, Clone)]
pub struct ResolutionWrite {
    /// The resolved entry, already carrying its new status.
    pub entry: LedgerEntry,

    /// Per-user ledger field deltas (depositor credit, ancestor commissions,
    /// or a rejection refund).
    pub user_deltas: Vec<UserDelta>,

    /// Commission ledger entries to append.
    pub commissions: Vec<LedgerEntry>,

    /// Additive referral-total updates: `(referrer, referred, delta_cents)`.
    pub total_deltas: Vec<(UserId, UserId, i64)>,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations.
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert or update a user row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// List every user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_users(&self) -> Result<Vec<User>>;

    // =========================================================================
    // Plan Operations
    // =========================================================================

    /// Insert or update a plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_plan(&self, plan: &Plan) -> Result<()>;

    /// Get a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>>;

    /// List active plans, sorted by ascending minimum balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_active_plans(&self) -> Result<Vec<Plan>>;

    // =========================================================================
    // Schedule Operations
    // =========================================================================

    /// Atomically delete a plan's existing schedule and write a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn replace_schedule(&self, plan_id: &PlanId, rows: &[DailyReturn]) -> Result<()>;

    /// The return for `(plan, date)`, in milli-percent, if a row exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_daily_return(&self, plan_id: &PlanId, date: NaiveDate) -> Result<Option<i64>>;

    /// The last scheduled date for a plan, if any schedule exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn schedule_last_date(&self, plan_id: &PlanId) -> Result<Option<NaiveDate>>;

    // =========================================================================
    // Investment Operations
    // =========================================================================

    /// Insert or update an investment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_investment(&self, investment: &Investment) -> Result<()>;

    /// Get an investment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_investment(&self, investment_id: &InvestmentId) -> Result<Option<Investment>>;

    /// List every investment with `Active` status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_active_investments(&self) -> Result<Vec<Investment>>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Insert a ledger entry (maintains the per-user index).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_entry(&self, entry: &LedgerEntry) -> Result<()>;

    /// Get a ledger entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>>;

    /// List ledger entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>>;

    // =========================================================================
    // Referral Operations
    // =========================================================================

    /// The referral rate configuration (empty if never set).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_referral_rates(&self) -> Result<ReferralRates>;

    /// Replace the referral rate configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn set_referral_rates(&self, rates: &ReferralRates) -> Result<()>;

    /// Lifetime commission earned by `referrer` from `referred`, in cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_referral_total(&self, referrer: &UserId, referred: &UserId) -> Result<i64>;

    // =========================================================================
    // Snapshot Operations
    // =========================================================================

    /// Upsert the end-of-day balance for `(user, date)`. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_snapshot(&self, user_id: &UserId, date: NaiveDate, balance_cents: i64) -> Result<()>;

    /// The snapshot balance for `(user, date)`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_snapshot(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<i64>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Commit one settlement day atomically.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UserNotFound`] if a delta references a missing user;
    ///   nothing is written.
    fn commit_settlement(&self, write: &SettlementWrite) -> Result<()>;

    /// Commit one deposit/withdrawal resolution atomically.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EntryNotFound`] if the target entry does not exist.
    /// - [`StoreError::NotPending`] if the entry was already resolved.
    /// - [`StoreError::UserNotFound`] if a delta references a missing user.
    ///
    /// In every error case nothing is written.
    fn commit_resolution(&self, write: &ResolutionWrite) -> Result<()>;
}
