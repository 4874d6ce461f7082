//! In-memory record store
//!
//! DashMap-backed [`RecordStore`] implementation with fine-grained per-key
//! locking. Serves as the reference implementation of the store contract
//! and as the test double for the services.
//!
//! # Invariants
//!
//! - `debit_balance` refuses any debit that would drive a balance negative,
//!   acting as the store-level backstop behind the orchestrator's per-user
//!   settlement lock.
//! - A payout account id is set once; later writes keep the first value.

use crate::core::traits::RecordStore;
use crate::types::{DateRange, PayoutState, StoreError, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

/// A stored user record
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// User id
    pub id: UserId,

    /// Email on record
    pub email: Option<String>,

    /// Signup timestamp, UTC
    pub created_at: DateTime<Utc>,

    /// Current ledger balance, never negative
    pub balance: Decimal,

    /// Whether the user requested a payout-provider connection
    pub payout_connection_requested: bool,

    /// Provider account id, if provisioned
    pub payout_account_id: Option<String>,
}

/// Thread-safe in-memory record store
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    users: DashMap<UserId, UserRecord>,
    transactions: DashMap<u64, Decimal>,
    next_transaction_id: AtomicU64,
}

impl MemoryRecordStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record
    pub fn insert_user(&self, user: UserRecord) {
        self.users.insert(user.id.clone(), user);
    }

    /// Record a revenue transaction
    ///
    /// # Returns
    ///
    /// The assigned transaction id.
    pub fn record_transaction(&self, amount: Decimal) -> u64 {
        let id = self.next_transaction_id.fetch_add(1, Ordering::Relaxed);
        self.transactions.insert(id, amount);
        id
    }

    /// Current balance of a user, `None` when unknown
    pub fn balance_of(&self, user_id: &str) -> Option<Decimal> {
        self.users.get(user_id).map(|user| user.balance)
    }

    /// Persisted payout account id of a user, `None` when unknown or unset
    pub fn payout_account_of(&self, user_id: &str) -> Option<String> {
        self.users
            .get(user_id)
            .and_then(|user| user.payout_account_id.clone())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn user_signup_dates(&self, range: &DateRange) -> Result<Vec<DateTime<Utc>>, StoreError> {
        Ok(self
            .users
            .iter()
            .filter(|user| range.contains(user.created_at))
            .map(|user| user.created_at)
            .collect())
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(self.users.len() as u64)
    }

    async fn count_users_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.created_at >= since)
            .count() as u64)
    }

    async fn total_transaction_amount(&self) -> Result<Decimal, StoreError> {
        Ok(self.transactions.iter().map(|entry| *entry.value()).sum())
    }

    async fn payout_state(&self, user: &str) -> Result<Option<PayoutState>, StoreError> {
        Ok(self.users.get(user).map(|user| PayoutState {
            balance: user.balance,
            payout_account_id: user.payout_account_id.clone(),
            email: user.email.clone(),
        }))
    }

    async fn set_payout_account(&self, user: &str, account_id: &str) -> Result<(), StoreError> {
        let Some(mut record) = self.users.get_mut(user) else {
            return Err(StoreError::user_not_found(user));
        };

        // set once, never overwritten
        if record.payout_account_id.is_none() {
            record.payout_account_id = Some(account_id.to_string());
        }
        Ok(())
    }

    async fn debit_balance(&self, user: &str, amount: Decimal) -> Result<(), StoreError> {
        let Some(mut record) = self.users.get_mut(user) else {
            return Err(StoreError::user_not_found(user));
        };

        if record.balance < amount {
            return Err(StoreError::constraint_violation(format!(
                "debit of {amount} would overdraw user {user} (balance {})",
                record.balance
            )));
        }

        record.balance -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(id: &str, created_at: DateTime<Utc>, balance: Decimal) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            email: None,
            created_at,
            balance,
            payout_connection_requested: true,
            payout_account_id: None,
        }
    }

    fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .unwrap()
    }

    #[tokio::test]
    async fn test_signup_dates_filtered_by_range() {
        let store = MemoryRecordStore::new();
        store.insert_user(user("us-1", utc(2024, 6, 3), Decimal::ZERO));
        store.insert_user(user("us-2", utc(2024, 7, 3), Decimal::ZERO));

        let range = DateRange::new(utc(2024, 6, 1), utc(2024, 6, 30));
        let dates = store.user_signup_dates(&range).await.unwrap();

        assert_eq!(dates, vec![utc(2024, 6, 3)]);
        assert_eq!(store.count_users().await.unwrap(), 2);
        assert_eq!(store.count_users_since(utc(2024, 7, 1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_transaction_sum_zero_when_empty() {
        let store = MemoryRecordStore::new();
        assert_eq!(
            store.total_transaction_amount().await.unwrap(),
            Decimal::ZERO
        );

        store.record_transaction(Decimal::new(1050, 2));
        store.record_transaction(Decimal::new(950, 2));
        assert_eq!(
            store.total_transaction_amount().await.unwrap(),
            Decimal::new(2000, 2)
        );
    }

    #[tokio::test]
    async fn test_debit_refuses_overdraw() {
        let store = MemoryRecordStore::new();
        store.insert_user(user("us-1", utc(2024, 6, 3), Decimal::new(100, 0)));

        let overdraw = store.debit_balance("us-1", Decimal::new(150, 0)).await;
        assert!(matches!(
            overdraw,
            Err(StoreError::ConstraintViolation { .. })
        ));
        assert_eq!(store.balance_of("us-1"), Some(Decimal::new(100, 0)));

        store
            .debit_balance("us-1", Decimal::new(40, 0))
            .await
            .unwrap();
        assert_eq!(store.balance_of("us-1"), Some(Decimal::new(60, 0)));
    }

    #[tokio::test]
    async fn test_payout_account_set_once() {
        let store = MemoryRecordStore::new();
        store.insert_user(user("us-1", utc(2024, 6, 3), Decimal::ZERO));

        store.set_payout_account("us-1", "acct_first").await.unwrap();
        store.set_payout_account("us-1", "acct_second").await.unwrap();

        assert_eq!(store.payout_account_of("us-1").as_deref(), Some("acct_first"));
        assert!(matches!(
            store.set_payout_account("us-9", "acct_x").await,
            Err(StoreError::UserNotFound { .. })
        ));
    }
}
