//! Types module
//!
//! Contains core data structures used throughout the engine.
//! This module organizes types into logical submodules:
//! - `overview`: dashboard query and result types
//! - `user`: user snapshot and payout-state types
//! - `withdrawal`: withdrawal request, outcome, and attempt-log types
//! - `error`: error types for the engine and its collaborators

pub mod error;
pub mod overview;
pub mod user;
pub mod withdrawal;

pub use error::{EngineError, ProviderError, StoreError};
pub use overview::{DateRange, Granularity, OverviewQuery, OverviewResult};
pub use user::{PayoutState, UserId, UserSnapshot};
pub use withdrawal::{
    AttemptState, ProvisioningStatus, WithdrawalAttempt, WithdrawalOutcome, WithdrawalRequest,
};
