//! Shared test fixtures
//!
//! A scriptable payment-provider double plus helpers for seeding users and
//! wiring the withdrawal orchestrator against the in-memory store.

use analytics_payout_engine::{
    CurrencyBalance, MemoryRecordStore, PaymentProvider, PayoutAccountProvisioner, ProviderError,
    RecordStore, SettlementConfig, UserRecord, UserSnapshot, WithdrawalOrchestrator,
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scriptable payment-provider double
///
/// Each operation can be switched to fail, the available-balance response is
/// configurable, and every call is recorded by name so tests can assert
/// which provider primitives ran.
#[derive(Default)]
pub struct MockPaymentProvider {
    fail_create_account: bool,
    fail_transfer: bool,
    fail_balance_retrieval: bool,
    fail_payout: bool,
    available: Vec<CurrencyBalance>,
    calls: Mutex<Vec<String>>,
    account_seq: AtomicUsize,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to balance retrieval with one entry
    pub fn with_available(mut self, currency: &str, amount_minor: i64) -> Self {
        self.available = vec![CurrencyBalance {
            currency: currency.to_string(),
            amount_minor,
        }];
        self
    }

    pub fn failing_create_account(mut self) -> Self {
        self.fail_create_account = true;
        self
    }

    pub fn failing_transfer(mut self) -> Self {
        self.fail_transfer = true;
        self
    }

    pub fn failing_balance_retrieval(mut self) -> Self {
        self.fail_balance_retrieval = true;
        self
    }

    pub fn failing_payout(mut self) -> Self {
        self.fail_payout = true;
        self
    }

    /// Names of all provider calls made, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|call| call == name)
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_account(&self, _email: Option<&str>) -> Result<String, ProviderError> {
        self.record("create_account");
        if self.fail_create_account {
            return Err(ProviderError::rejected("create_account", "simulated failure"));
        }
        let seq = self.account_seq.fetch_add(1, Ordering::Relaxed);
        Ok(format!("acct_mock_{seq}"))
    }

    async fn create_transfer(
        &self,
        _amount_minor: i64,
        _currency: &str,
        _destination: &str,
        _description: &str,
    ) -> Result<(), ProviderError> {
        self.record("create_transfer");
        if self.fail_transfer {
            return Err(ProviderError::rejected("create_transfer", "simulated failure"));
        }
        Ok(())
    }

    async fn available_balance(
        &self,
        _account_id: &str,
    ) -> Result<Vec<CurrencyBalance>, ProviderError> {
        self.record("available_balance");
        if self.fail_balance_retrieval {
            return Err(ProviderError::unreachable("simulated failure"));
        }
        Ok(self.available.clone())
    }

    async fn create_payout(
        &self,
        _amount_minor: i64,
        _currency: &str,
        _account_id: &str,
    ) -> Result<(), ProviderError> {
        self.record("create_payout");
        if self.fail_payout {
            return Err(ProviderError::rejected("create_payout", "simulated failure"));
        }
        Ok(())
    }
}

/// Seed a user into the store and return the matching caller snapshot
pub fn seed_user(
    store: &MemoryRecordStore,
    id: &str,
    balance: i64,
    connected: bool,
    account: Option<&str>,
) -> UserSnapshot {
    store.insert_user(UserRecord {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        created_at: Utc::now(),
        balance: Decimal::from(balance),
        payout_connection_requested: connected,
        payout_account_id: account.map(String::from),
    });

    UserSnapshot {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        balance: Decimal::from(balance),
        payout_connection_requested: connected,
        payout_account_id: account.map(String::from),
    }
}

/// Wire an orchestrator (and its provisioner) over the given doubles
pub fn engine(
    store: &Arc<MemoryRecordStore>,
    provider: &Arc<MockPaymentProvider>,
) -> (WithdrawalOrchestrator, Arc<PayoutAccountProvisioner>) {
    let store_dyn: Arc<dyn RecordStore> = store.clone();
    let provider_dyn: Arc<dyn PaymentProvider> = provider.clone();
    let provisioner = Arc::new(PayoutAccountProvisioner::new(
        store_dyn.clone(),
        provider_dyn.clone(),
    ));
    let orchestrator = WithdrawalOrchestrator::new(
        store_dyn,
        provider_dyn,
        provisioner.clone(),
        SettlementConfig::default(),
    );
    (orchestrator, provisioner)
}
