//! Job orchestration: the fixed daily run order and the lease registry.
//!
//! The three daily jobs run strictly in order: schedule refresh, then
//! settlement, then snapshots, so each day's schedule exists before
//! settlement consumes it and settlement finishes before the snapshot
//! captures its result. Each job takes a named lease first; if a previous
//! run still holds the lease, the trigger is rejected rather than
//! interleaved.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tiervest_store::Store;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::schedule::refresh_schedules;
use crate::settlement::run_settlement;
use crate::snapshot::run_snapshots;

/// Names of the daily jobs, used as lease keys.
pub mod job {
    /// The schedule refresh job.
    pub const SCHEDULE: &str = "schedule_refresh";

    /// The settlement job.
    pub const SETTLEMENT: &str = "settlement";

    /// The snapshot job.
    pub const SNAPSHOT: &str = "balance_snapshot";
}

/// In-process job lease registry.
///
/// A job acquires its named lease before running and releases it when the
/// returned guard drops, on completion or failure alike. A second acquire
/// while the lease is held fails, which is how an overlapping trigger is
/// rejected instead of silently interleaving with a still-running job.
#[derive(Clone, Default)]
pub struct LeaseRegistry {
    held: Arc<Mutex<HashSet<String>>>,
}

impl LeaseRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the lease for `name`. Returns `None` if it is held.
    #[must_use]
    pub fn acquire(&self, name: &str) -> Option<Lease> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(name.to_string()) {
            return None;
        }
        Some(Lease {
            registry: self.held.clone(),
            name: name.to_string(),
        })
    }

    /// Whether the lease for `name` is currently held.
    #[must_use]
    pub fn is_held(&self, name: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }
}

/// A held job lease; dropping it releases the lease.
pub struct Lease {
    registry: Arc<Mutex<HashSet<String>>>,
    name: String,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.name);
    }
}

/// Runs the daily job chain against a store.
pub struct JobRunner<S> {
    store: Arc<S>,
    leases: LeaseRegistry,
}

impl<S: Store> JobRunner<S> {
    /// Create a runner over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            leases: LeaseRegistry::new(),
        }
    }

    /// The runner's lease registry (shared with any other trigger source).
    #[must_use]
    pub fn leases(&self) -> &LeaseRegistry {
        &self.leases
    }

    /// Run one full daily cycle for `today`: schedule refresh, settlement,
    /// snapshots, strictly in that order.
    ///
    /// A job whose lease is still held is skipped with a warning, and the
    /// jobs after it in the chain do not run; the next trigger retries the
    /// whole day. Failures propagate the same way.
    ///
    /// # Errors
    ///
    /// Returns the first job failure; later jobs in the chain are not run.
    pub fn run_daily_cycle(&self, today: NaiveDate) -> Result<()> {
        let Some(_lease) = self.leases.acquire(job::SCHEDULE) else {
            tracing::warn!(job = job::SCHEDULE, "previous run still holds lease, rejecting trigger");
            return Ok(());
        };
        let mut rng = StdRng::from_entropy();
        let regenerated = refresh_schedules(self.store.as_ref(), &mut rng, today)?;
        drop(_lease);
        tracing::debug!(regenerated, "schedule refresh finished");

        let Some(_lease) = self.leases.acquire(job::SETTLEMENT) else {
            tracing::warn!(job = job::SETTLEMENT, "previous run still holds lease, rejecting trigger");
            return Ok(());
        };
        run_settlement(self.store.as_ref(), today)?;
        drop(_lease);

        let Some(_lease) = self.leases.acquire(job::SNAPSHOT) else {
            tracing::warn!(job = job::SNAPSHOT, "previous run still holds lease, rejecting trigger");
            return Ok(());
        };
        run_snapshots(self.store.as_ref(), today)?;

        Ok(())
    }

    /// Drive the daily cycle forever, ticking at the configured UTC hour.
    ///
    /// A failed day logs the error and waits for the next trigger; there is
    /// no intra-day retry.
    pub async fn run_forever(&self, config: &EngineConfig) {
        loop {
            let now = Utc::now();
            let next = next_run_at(now, config.settlement_hour_utc);
            let wait = (next - now)
                .to_std()
                .unwrap_or_else(|_| std::time::Duration::from_secs(0));
            tracing::info!(next_run = %next, "daily cycle scheduled");
            tokio::time::sleep(wait).await;

            let today = Utc::now().date_naive();
            if let Err(e) = self.run_daily_cycle(today) {
                tracing::error!(error = %e, date = %today, "daily cycle failed, will retry next trigger");
            }
        }
    }
}

/// The next instant after `now` that falls on `hour_utc:00:00`.
fn next_run_at(now: chrono::DateTime<Utc>, hour_utc: u32) -> chrono::DateTime<Utc> {
    // Clamped, so and_hms_opt cannot fail.
    let today_run = match now.date_naive().and_hms_opt(hour_utc.min(23), 0, 0) {
        Some(dt) => Utc.from_utc_datetime(&dt),
        None => now,
    };
    if today_run > now {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    }
}
