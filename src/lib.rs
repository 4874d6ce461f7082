//! Analytics & Payout Engine Library
//! # Overview
//!
//! This library provides the analytics-and-payout core of an administrative
//! backend: a time-bucketed aggregation engine for dashboard growth metrics
//! and a balance-gated withdrawal orchestrator coordinating a local funds
//! ledger with an external payment provider.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (queries, results, users, withdrawals, errors)
//! - [`core`] - Business logic components:
//!   - [`core::aggregator`] - Pure time-bucketed aggregation and growth math
//!   - [`core::overview`] - Dashboard overview orchestration
//!   - [`core::withdrawal`] - Balance-gated withdrawal orchestration
//!   - [`core::provisioner`] - Idempotent payout-account provisioning
//!   - [`core::traits`] - Collaborator abstractions (record store, payment
//!     provider)
//! - [`store`] - In-memory reference implementation of the record store
//!
//! # Withdrawal Flow
//!
//! A withdrawal passes a guard phase (snapshot balance, payout connection,
//! account existence) whose failures are surfaced to the caller, then a
//! settlement phase (transfer, balance retrieval, payout, ledger debit)
//! whose failures are absorbed: logged, recorded in a queryable attempt log,
//! and never propagated. Settlement for a given user is serialized by a
//! per-user lock, and the ledger is debited exactly once per completed
//! withdrawal, strictly after the payout succeeds.
//!
//! # Collaborators
//!
//! All external state is reached through the [`core::RecordStore`] and
//! [`core::PaymentProvider`] traits, injected at construction time. The
//! crate never installs a logging subscriber and never spawns work except
//! for the deliberately detached provisioning task.

// Module declarations
pub mod core;
pub mod store;
pub mod types;

pub use crate::core::{
    CurrencyBalance, OverviewMetricsService, PayoutAccountProvisioner, PaymentProvider,
    RecordStore, SettlementConfig, WithdrawalOrchestrator,
};
pub use crate::store::{MemoryRecordStore, UserRecord};
pub use crate::types::{
    AttemptState, DateRange, EngineError, Granularity, OverviewQuery, OverviewResult, PayoutState,
    ProviderError, ProvisioningStatus, StoreError, UserId, UserSnapshot, WithdrawalAttempt,
    WithdrawalOutcome, WithdrawalRequest,
};
