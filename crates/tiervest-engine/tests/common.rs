//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use tempfile::TempDir;
use tiervest_core::{Plan, User, UserId};
use tiervest_store::{RocksStore, Store};

/// Open a throwaway store; the directory is dropped with the handle.
pub fn test_store() -> (RocksStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = RocksStore::open(dir.path()).unwrap();
    (store, dir)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A fixed "today" used across tests.
pub fn today() -> NaiveDate {
    date(2026, 8, 25)
}

pub fn funded_user(store: &RocksStore, balance_cents: i64) -> User {
    let mut user = User::new(UserId::generate());
    user.balance_cents = balance_cents;
    store.put_user(&user).unwrap();
    user
}

pub fn referred_user(store: &RocksStore, sponsor: UserId, balance_cents: i64) -> User {
    let mut user = User::with_sponsor(UserId::generate(), sponsor);
    user.balance_cents = balance_cents;
    store.put_user(&user).unwrap();
    user
}

/// Insert an active plan and return it.
pub fn insert_plan(
    store: &RocksStore,
    name: &str,
    min: i64,
    max: Option<i64>,
    total_return_pct_milli: i64,
    duration_days: i64,
) -> Plan {
    let plan = Plan::new(name, min, max, total_return_pct_milli, duration_days);
    plan.validate().unwrap();
    store.put_plan(&plan).unwrap();
    plan
}
