//! Core types and algorithms for tiervest.
//!
//! This crate provides the foundational types used throughout the tiervest
//! platform:
//!
//! - **Identifiers**: `UserId`, `PlanId`, `InvestmentId`, `EntryId`
//! - **Plans**: `Plan`, eligibility ranges and return targets
//! - **Users**: `User`, the per-user ledger fields
//! - **Investments**: `Investment`, `InvestmentStatus`
//! - **Ledger**: `LedgerEntry`, `EntryKind`, `EntryStatus`
//! - **Schedules**: randomized daily return generation
//! - **Rates**: `ReferralRates`, per-level commission configuration
//!
//! # Money units
//!
//! **All amounts are `i64` cents.** Percentages are `i64` milli-percent
//! (`0.050% == 50`), so a plan's daily return schedule sums to its nominal
//! target as an exact integer. Floating point only appears transiently inside
//! schedule generation, before quantization.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod investment;
pub mod ledger;
pub mod money;
pub mod plan;
pub mod rates;
pub mod schedule;
pub mod user;

pub use error::{CoreError, Result};
pub use ids::{EntryId, IdError, InvestmentId, PlanId, UserId};
pub use investment::{Investment, InvestmentStatus};
pub use ledger::{EntryKind, EntryStatus, LedgerEntry};
pub use money::{apply_pct, div_round, PCT_DENOMINATOR};
pub use plan::Plan;
pub use rates::{ReferralRates, MAX_REFERRAL_DEPTH};
pub use schedule::{generate_schedule, loss_day_count, DailyReturn};
pub use user::User;
