//! Core business logic module
//!
//! This module contains the analytics and payout components:
//! - `traits` - Collaborator abstractions for the record store and payment
//!   provider
//! - `aggregator` - Pure time-bucketed aggregation
//! - `overview` - Dashboard overview orchestration
//! - `withdrawal` - Balance-gated withdrawal orchestration
//! - `provisioner` - Idempotent payout-account provisioning

pub mod aggregator;
pub mod overview;
pub mod provisioner;
pub mod traits;
pub mod withdrawal;

pub use overview::OverviewMetricsService;
pub use provisioner::PayoutAccountProvisioner;
pub use traits::{CurrencyBalance, PaymentProvider, RecordStore};
pub use withdrawal::{SettlementConfig, WithdrawalOrchestrator};
