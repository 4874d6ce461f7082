//! Collaborator traits for the record store and payment provider
//!
//! This module defines the trait abstractions through which the engine
//! reaches the rest of the system. Both traits are object-safe and
//! `Send + Sync` so implementations can be shared behind `Arc` across async
//! tasks and swapped for test doubles.

use crate::types::{DateRange, PayoutState, ProviderError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Queryable store of user and transaction records
///
/// Read queries back the overview aggregation; the point updates back the
/// withdrawal flow. A production implementation would sit on a database; the
/// crate ships [`crate::store::MemoryRecordStore`] as reference
/// implementation and test double.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Signup timestamps of all users created within the range
    async fn user_signup_dates(&self, range: &DateRange) -> Result<Vec<DateTime<Utc>>, StoreError>;

    /// All-time user count
    async fn count_users(&self) -> Result<u64, StoreError>;

    /// Count of users created at or after the given instant
    async fn count_users_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError>;

    /// All-time sum of transaction amounts, zero when there are none
    async fn total_transaction_amount(&self) -> Result<Decimal, StoreError>;

    /// Authoritative payout-relevant state of a user, `None` when the user
    /// does not exist
    async fn payout_state(&self, user: &str) -> Result<Option<PayoutState>, StoreError>;

    /// Persist the provider account id on the user record
    ///
    /// The id is set once; implementations must not clear or overwrite an
    /// existing id.
    async fn set_payout_account(&self, user: &str, account_id: &str) -> Result<(), StoreError>;

    /// Decrement the user's ledger balance by `amount`
    ///
    /// Implementations must refuse a debit that would drive the balance
    /// negative.
    async fn debit_balance(&self, user: &str, amount: Decimal) -> Result<(), StoreError>;
}

/// One available-balance entry on a connected provider account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyBalance {
    /// Lowercase ISO currency code, e.g. `"usd"`
    pub currency: String,

    /// Available amount in minor currency units
    pub amount_minor: i64,
}

/// External payment provider client
///
/// Exposes the four provider primitives the engine consumes: payout-account
/// creation, transfer to a connected account, available-balance retrieval,
/// and payout from a connected account. Amounts are minor currency units.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payout-capable account with transfer capability requested
    ///
    /// # Returns
    ///
    /// The provider-assigned account id.
    async fn create_account(&self, email: Option<&str>) -> Result<String, ProviderError>;

    /// Transfer funds from the platform to a connected account
    async fn create_transfer(
        &self,
        amount_minor: i64,
        currency: &str,
        destination: &str,
        description: &str,
    ) -> Result<(), ProviderError>;

    /// Retrieve the available balances of a connected account
    async fn available_balance(
        &self,
        account_id: &str,
    ) -> Result<Vec<CurrencyBalance>, ProviderError>;

    /// Create a payout from a connected account's balance to its external
    /// destination
    async fn create_payout(
        &self,
        amount_minor: i64,
        currency: &str,
        account_id: &str,
    ) -> Result<(), ProviderError>;
}
