//! Key encoding utilities for `RocksDB`.
//!
//! Composite keys concatenate fixed-width components so prefix scans work:
//! UUIDs are 16 bytes, ULIDs are 16 bytes, and dates are 4-byte big-endian
//! day numbers (days since the common era), which sort chronologically.

use chrono::{Datelike, NaiveDate};
use tiervest_core::{EntryId, InvestmentId, PlanId, UserId};

/// Encode a date as 4 big-endian bytes (days since the common era).
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn date_bytes(date: NaiveDate) -> [u8; 4] {
    (date.num_days_from_ce() as u32).to_be_bytes()
}

/// Decode a date previously encoded with [`date_bytes`].
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn decode_date(bytes: [u8; 4]) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(u32::from_be_bytes(bytes) as i32)
}

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a plan key from a plan ID.
#[must_use]
pub fn plan_key(plan_id: &PlanId) -> Vec<u8> {
    plan_id.as_bytes().to_vec()
}

/// Create an investment key from an investment ID.
#[must_use]
pub fn investment_key(investment_id: &InvestmentId) -> Vec<u8> {
    investment_id.as_bytes().to_vec()
}

/// Create a ledger entry key from an entry ID.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a schedule row key.
///
/// Format: `plan_id (16 bytes) || date (4 bytes)`.
#[must_use]
pub fn schedule_key(plan_id: &PlanId, date: NaiveDate) -> Vec<u8> {
    let mut key = Vec::with_capacity(20);
    key.extend_from_slice(plan_id.as_bytes());
    key.extend_from_slice(&date_bytes(date));
    key
}

/// Create a prefix for iterating all schedule rows for a plan.
#[must_use]
pub fn schedule_prefix(plan_id: &PlanId) -> Vec<u8> {
    plan_id.as_bytes().to_vec()
}

/// Extract the date from a schedule row key.
#[must_use]
pub fn extract_date_from_schedule_key(key: &[u8]) -> Option<NaiveDate> {
    if key.len() < 20 {
        return None;
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&key[16..20]);
    decode_date(bytes)
}

/// Create a user-entry index key.
///
/// Format: `user_id (16 bytes) || entry_id (16 bytes)`.
///
/// Since ULIDs are time-ordered, entries for a user sort chronologically.
#[must_use]
pub fn user_entry_key(user_id: &UserId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Create a prefix for iterating all ledger entries for a user.
#[must_use]
pub fn user_entries_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the entry ID from a user-entry index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_entry_id_from_user_key(key: &[u8]) -> EntryId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    EntryId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a referral total key.
///
/// Format: `referrer_id (16 bytes) || referred_id (16 bytes)`.
#[must_use]
pub fn referral_total_key(referrer: &UserId, referred: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(referrer.as_bytes());
    key.extend_from_slice(referred.as_bytes());
    key
}

/// Create a balance snapshot key.
///
/// Format: `user_id (16 bytes) || date (4 bytes)`.
#[must_use]
pub fn snapshot_key(user_id: &UserId, date: NaiveDate) -> Vec<u8> {
    let mut key = Vec::with_capacity(20);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&date_bytes(date));
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_roundtrip() {
        let d = date(2026, 8, 25);
        assert_eq!(decode_date(date_bytes(d)), Some(d));
    }

    #[test]
    fn date_keys_sort_chronologically() {
        assert!(date_bytes(date(2026, 1, 1)) < date_bytes(date(2026, 1, 2)));
        assert!(date_bytes(date(2026, 12, 31)) < date_bytes(date(2027, 1, 1)));
    }

    #[test]
    fn schedule_key_format() {
        let plan_id = PlanId::generate();
        let key = schedule_key(&plan_id, date(2026, 3, 1));
        assert_eq!(key.len(), 20);
        assert!(key.starts_with(plan_id.as_bytes()));
        assert_eq!(extract_date_from_schedule_key(&key), Some(date(2026, 3, 1)));
    }

    #[test]
    fn user_entry_key_roundtrip() {
        let user_id = UserId::generate();
        let entry_id = EntryId::generate();
        let key = user_entry_key(&user_id, &entry_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(extract_entry_id_from_user_key(&key), entry_id);
    }

    #[test]
    fn referral_total_key_is_ordered_pair() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(referral_total_key(&a, &b), referral_total_key(&b, &a));
    }
}
