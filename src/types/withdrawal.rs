//! Withdrawal-related types
//!
//! A withdrawal is transient: the request is created per call and never
//! persisted. What *is* kept is a [`WithdrawalAttempt`] per settlement pass,
//! so the gap between "accepted" and "actually completed" stays queryable
//! even though settlement failures are never surfaced to the caller.

use super::user::UserSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A single withdrawal request
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalRequest {
    /// Requested amount in major currency units, must be positive
    pub amount: Decimal,

    /// The caller's view of the withdrawing user
    pub user: UserSnapshot,
}

/// Caller-facing success signal of a withdrawal call
///
/// Guard failures are returned as errors instead; settlement failures after
/// acceptance are absorbed and only observable through the attempt log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalOutcome {
    /// Guards passed and a settlement pass ran (its result may still be a
    /// recorded failure)
    Accepted,

    /// Payout-account provisioning was kicked off in the background; the
    /// caller should retry later
    PendingProvisioning,
}

/// Terminal state of one settlement pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    /// Transfer, payout and ledger debit all succeeded
    Completed,

    /// The transfer to the connected account failed; nothing moved
    TransferFailed,

    /// No available balance in the settlement currency after the transfer
    ///
    /// The transfer may have succeeded, leaving funds parked on the
    /// connected account outside the local ledger.
    BalanceUnavailable,

    /// The payout from the connected account failed; funds remain parked
    /// there
    PayoutFailed,

    /// Provider steps succeeded but the ledger debit failed; local balance
    /// and provider state have diverged
    LedgerUpdateFailed,
}

/// Persisted record of one settlement pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalAttempt {
    /// Originally requested amount
    pub amount: Decimal,

    /// How the pass terminated
    pub state: AttemptState,

    /// Failure message, or the paid-out minor amount on completion
    pub detail: Option<String>,

    /// When the pass terminated
    pub at: DateTime<Utc>,
}

/// Out-of-band status of the background provisioning task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisioningStatus {
    /// No provisioning has been requested for this user
    #[default]
    NotStarted,

    /// A provisioning task is running
    InProgress,

    /// A provider account id is persisted on the user record
    Succeeded,

    /// The last provisioning task failed; a later withdrawal will trigger a
    /// new one
    Failed,
}
