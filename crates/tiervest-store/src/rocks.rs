//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//! Compound operations serialize through a single write lock and land in one
//! `WriteBatch`, which is the store-level equivalent of a per-unit database
//! transaction.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use tiervest_core::{
    DailyReturn, EntryId, Investment, InvestmentId, InvestmentStatus, LedgerEntry, Plan, PlanId,
    ReferralRates, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf, REFERRAL_RATES_KEY};
use crate::{ResolutionWrite, SettlementWrite, Store, UserDelta};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    // Serializes compound operations so their read-modify-write cycles
    // cannot interleave. Plain puts/gets do not take it.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(path = %path.display(), "database opened");
        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Load the users named by `deltas`, apply each delta, and stage the
    /// results into `batch`. Deltas for the same user accumulate.
    fn stage_user_deltas(&self, batch: &mut WriteBatch, deltas: &[UserDelta]) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let mut loaded: HashMap<UserId, User> = HashMap::new();

        for delta in deltas {
            if !loaded.contains_key(&delta.user_id) {
                let user = self
                    .get_user(&delta.user_id)?
                    .ok_or(StoreError::UserNotFound(delta.user_id))?;
                loaded.insert(delta.user_id, user);
            }
            let user = loaded
                .get_mut(&delta.user_id)
                .ok_or(StoreError::UserNotFound(delta.user_id))?;
            apply_delta(user, delta);
        }

        for user in loaded.values() {
            batch.put_cf(&cf_users, keys::user_key(&user.id), Self::serialize(user)?);
        }
        Ok(())
    }

    /// Stage a ledger entry and its per-user index row.
    fn stage_entry(&self, batch: &mut WriteBatch, entry: &LedgerEntry) -> Result<()> {
        let cf_ledger = self.cf(cf::LEDGER)?;
        let cf_by_user = self.cf(cf::LEDGER_BY_USER)?;
        batch.put_cf(&cf_ledger, keys::entry_key(&entry.id), Self::serialize(entry)?);
        batch.put_cf(
            &cf_by_user,
            keys::user_entry_key(&entry.user_id, &entry.id),
            [],
        );
        Ok(())
    }
}

fn apply_delta(user: &mut User, delta: &UserDelta) {
    user.balance_cents += delta.balance_delta;
    user.roi_earnings_cents += delta.roi_delta;
    user.affiliate_earnings_cents += delta.affiliate_delta;
    user.total_deposits_cents += delta.deposits_delta;
    user.total_withdrawals_cents += delta.withdrawals_delta;
    if let Some(current) = delta.current_investment {
        user.current_investment = current;
    }
    user.updated_at = chrono::Utc::now();
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn put_user(&self, user: &User) -> Result<()> {
        let cf = self.cf(cf::USERS)?;
        self.db
            .put_cf(&cf, keys::user_key(&user.id), Self::serialize(user)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;
        self.db
            .get_cf(&cf, keys::user_key(user_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let cf = self.cf(cf::USERS)?;
        let mut users = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            users.push(Self::deserialize(&value)?);
        }
        Ok(users)
    }

    // =========================================================================
    // Plan Operations
    // =========================================================================

    fn put_plan(&self, plan: &Plan) -> Result<()> {
        let cf = self.cf(cf::PLANS)?;
        self.db
            .put_cf(&cf, keys::plan_key(&plan.id), Self::serialize(plan)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>> {
        let cf = self.cf(cf::PLANS)?;
        self.db
            .get_cf(&cf, keys::plan_key(plan_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_active_plans(&self) -> Result<Vec<Plan>> {
        let cf = self.cf(cf::PLANS)?;
        let mut plans: Vec<Plan> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let plan: Plan = Self::deserialize(&value)?;
            if plan.active {
                plans.push(plan);
            }
        }
        plans.sort_by_key(|p| (p.min_balance_cents, p.id));
        Ok(plans)
    }

    // =========================================================================
    // Schedule Operations
    // =========================================================================

    fn replace_schedule(&self, plan_id: &PlanId, rows: &[DailyReturn]) -> Result<()> {
        let cf = self.cf(cf::SCHEDULE)?;
        let prefix = keys::schedule_prefix(plan_id);

        let mut batch = WriteBatch::default();

        // Delete the exhausted schedule in the same batch as the new one.
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, rocksdb::Direction::Forward));
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            batch.delete_cf(&cf, key);
        }

        for row in rows {
            batch.put_cf(
                &cf,
                keys::schedule_key(plan_id, row.date),
                Self::serialize(&row.pct_milli)?,
            );
        }

        self.write(batch)
    }

    fn get_daily_return(&self, plan_id: &PlanId, date: NaiveDate) -> Result<Option<i64>> {
        let cf = self.cf(cf::SCHEDULE)?;
        self.db
            .get_cf(&cf, keys::schedule_key(plan_id, date))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn schedule_last_date(&self, plan_id: &PlanId) -> Result<Option<NaiveDate>> {
        let cf = self.cf(cf::SCHEDULE)?;
        let prefix = keys::schedule_prefix(plan_id);

        // Date bytes sort chronologically, so the last matching key holds
        // the last scheduled date.
        let mut last = None;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, rocksdb::Direction::Forward));
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            last = keys::extract_date_from_schedule_key(&key);
        }
        Ok(last)
    }

    // =========================================================================
    // Investment Operations
    // =========================================================================

    fn put_investment(&self, investment: &Investment) -> Result<()> {
        let cf = self.cf(cf::INVESTMENTS)?;
        self.db
            .put_cf(
                &cf,
                keys::investment_key(&investment.id),
                Self::serialize(investment)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_investment(&self, investment_id: &InvestmentId) -> Result<Option<Investment>> {
        let cf = self.cf(cf::INVESTMENTS)?;
        self.db
            .get_cf(&cf, keys::investment_key(investment_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_active_investments(&self) -> Result<Vec<Investment>> {
        let cf = self.cf(cf::INVESTMENTS)?;
        let mut investments = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let investment: Investment = Self::deserialize(&value)?;
            if investment.status == InvestmentStatus::Active {
                investments.push(investment);
            }
        }
        Ok(investments)
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn put_entry(&self, entry: &LedgerEntry) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_entry(&mut batch, entry)?;
        self.write(batch)
    }

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>> {
        let cf = self.cf(cf::LEDGER)?;
        self.db
            .get_cf(&cf, keys::entry_key(entry_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let cf_by_user = self.cf(cf::LEDGER_BY_USER)?;
        let prefix = keys::user_entries_prefix(user_id);

        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }

        // ULID keys are time-ordered; reverse for newest first.
        all_keys.reverse();

        let mut entries = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if entries.len() >= limit {
                break;
            }
            let entry_id = keys::extract_entry_id_from_user_key(&key);
            if let Some(entry) = self.get_entry(&entry_id)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    // =========================================================================
    // Referral Operations
    // =========================================================================

    fn get_referral_rates(&self) -> Result<ReferralRates> {
        let cf = self.cf(cf::CONFIG)?;
        let rates = self
            .db
            .get_cf(&cf, REFERRAL_RATES_KEY)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()?
            .unwrap_or_default();
        Ok(rates)
    }

    fn set_referral_rates(&self, rates: &ReferralRates) -> Result<()> {
        let cf = self.cf(cf::CONFIG)?;
        self.db
            .put_cf(&cf, REFERRAL_RATES_KEY, Self::serialize(rates)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_referral_total(&self, referrer: &UserId, referred: &UserId) -> Result<i64> {
        let cf = self.cf(cf::REFERRAL_TOTALS)?;
        let total = self
            .db
            .get_cf(&cf, keys::referral_total_key(referrer, referred))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()?
            .unwrap_or(0);
        Ok(total)
    }

    // =========================================================================
    // Snapshot Operations
    // =========================================================================

    fn put_snapshot(&self, user_id: &UserId, date: NaiveDate, balance_cents: i64) -> Result<()> {
        let cf = self.cf(cf::SNAPSHOTS)?;
        self.db
            .put_cf(
                &cf,
                keys::snapshot_key(user_id, date),
                Self::serialize(&balance_cents)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_snapshot(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<i64>> {
        let cf = self.cf(cf::SNAPSHOTS)?;
        self.db
            .get_cf(&cf, keys::snapshot_key(user_id, date))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn commit_settlement(&self, write: &SettlementWrite) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let cf_investments = self.cf(cf::INVESTMENTS)?;
        let mut batch = WriteBatch::default();

        self.stage_user_deltas(&mut batch, &write.user_deltas)?;

        for investment in &write.investments {
            batch.put_cf(
                &cf_investments,
                keys::investment_key(&investment.id),
                Self::serialize(investment)?,
            );
        }

        for entry in &write.entries {
            self.stage_entry(&mut batch, entry)?;
        }

        tracing::debug!(
            users = write.user_deltas.len(),
            investments = write.investments.len(),
            entries = write.entries.len(),
            "settlement batch staged"
        );
        self.write(batch)
    }

    fn commit_resolution(&self, write: &ResolutionWrite) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Re-read the target entry inside the critical section: a duplicate
        // resolution must fail here, not double-credit.
        let stored = self
            .get_entry(&write.entry.id)?
            .ok_or(StoreError::EntryNotFound(write.entry.id))?;
        if stored.status != tiervest_core::EntryStatus::Pending {
            return Err(StoreError::NotPending {
                entry_id: stored.id,
                status: stored.status,
            });
        }

        let cf_totals = self.cf(cf::REFERRAL_TOTALS)?;
        let mut batch = WriteBatch::default();

        self.stage_entry(&mut batch, &write.entry)?;
        self.stage_user_deltas(&mut batch, &write.user_deltas)?;
        for commission in &write.commissions {
            self.stage_entry(&mut batch, commission)?;
        }

        // Additive upsert: never overwrite a pair's lifetime total.
        let mut totals: HashMap<(UserId, UserId), i64> = HashMap::new();
        for (referrer, referred, delta) in &write.total_deltas {
            let slot = match totals.entry((*referrer, *referred)) {
                std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(self.get_referral_total(referrer, referred)?)
                }
            };
            *slot += delta;
        }
        for ((referrer, referred), total) in &totals {
            batch.put_cf(
                &cf_totals,
                keys::referral_total_key(referrer, referred),
                Self::serialize(total)?,
            );
        }

        self.write(batch)
    }
}
