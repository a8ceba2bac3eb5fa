//! The tiervest financial engine.
//!
//! This crate owns the money-moving core of the platform:
//!
//! - Daily regeneration of randomized, target-sum return schedules
//! - Daily settlement: accrual, tier migration, maturity and reinvestment
//! - Daily end-of-day balance snapshots
//! - The referral commission cascade on deposit approval
//! - Job orchestration with a per-job lease registry
//!
//! Everything that moves money commits through the store's atomic compound
//! operations: a settlement day or a commission cascade either lands whole
//! or not at all. HTTP handlers, authentication, and admin screens live
//! outside this crate and call into the entry points re-exported below.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod invest;
pub mod jobs;
pub mod referral;
pub mod schedule;
pub mod settlement;
pub mod snapshot;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use invest::{active_investment, best_fit_plan, start_investment, InvestmentView};
pub use jobs::{JobRunner, Lease, LeaseRegistry};
pub use referral::{
    approve_deposit, approve_withdrawal, reject_deposit, reject_withdrawal, PostedCommission,
};
pub use schedule::refresh_schedules;
pub use settlement::{run_settlement, SettlementReport};
pub use snapshot::run_snapshots;
