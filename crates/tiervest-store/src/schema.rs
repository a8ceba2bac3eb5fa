//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// User ledger records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Plan definitions, keyed by `plan_id`.
    pub const PLANS: &str = "plans";

    /// Daily return schedule rows, keyed by `plan_id || date`.
    pub const SCHEDULE: &str = "schedule";

    /// Investment records, keyed by `investment_id`.
    pub const INVESTMENTS: &str = "investments";

    /// Ledger entries, keyed by `entry_id` (ULID).
    pub const LEDGER: &str = "ledger";

    /// Index: ledger entries by user, keyed by `user_id || entry_id`.
    /// Value is empty (index only).
    pub const LEDGER_BY_USER: &str = "ledger_by_user";

    /// Cumulative referral commission per pair, keyed by
    /// `referrer_id || referred_id`.
    pub const REFERRAL_TOTALS: &str = "referral_totals";

    /// End-of-day balance snapshots, keyed by `user_id || date`.
    pub const SNAPSHOTS: &str = "snapshots";

    /// Singleton configuration records (referral rates).
    pub const CONFIG: &str = "config";
}

/// Key of the referral rate configuration record in [`cf::CONFIG`].
pub const REFERRAL_RATES_KEY: &[u8] = b"referral_rates";

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::PLANS,
        cf::SCHEDULE,
        cf::INVESTMENTS,
        cf::LEDGER,
        cf::LEDGER_BY_USER,
        cf::REFERRAL_TOTALS,
        cf::SNAPSHOTS,
        cf::CONFIG,
    ]
}
