//! User-related types
//!
//! The engine never owns user records; it sees them either as a
//! caller-supplied [`UserSnapshot`] or as a fresh [`PayoutState`] read from
//! the record store immediately before settlement.

use rust_decimal::Decimal;

/// User identifier
///
/// Opaque string id assigned by the surrounding application (e.g. `"us-1"`).
pub type UserId = String;

/// Caller-supplied view of a user at withdrawal time
///
/// This snapshot may be stale; the orchestrator re-reads the authoritative
/// balance and payout account id from the store before any provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSnapshot {
    /// User id
    pub id: UserId,

    /// Email, forwarded to the provider when creating a payout account
    pub email: Option<String>,

    /// Ledger balance as known to the caller
    ///
    /// Invariant: never negative.
    pub balance: Decimal,

    /// Whether the user has requested a payout-provider connection
    pub payout_connection_requested: bool,

    /// Provider account id, `None` until provisioning completes
    pub payout_account_id: Option<String>,
}

/// Authoritative payout-relevant user state read from the record store
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutState {
    /// Current ledger balance
    pub balance: Decimal,

    /// Provider account id, if provisioned
    pub payout_account_id: Option<String>,

    /// Email on record
    pub email: Option<String>,
}
