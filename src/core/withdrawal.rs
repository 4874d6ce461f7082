//! Balance-gated withdrawal orchestration
//!
//! [`WithdrawalOrchestrator`] drives a withdrawal from request to completion
//! or early rejection:
//!
//! 1. Guard phase: snapshot balance check, connection check, and (when no
//!    provider account exists yet) a detached provisioning kick-off. Guard
//!    failures are the only errors the caller ever sees.
//! 2. Settlement phase: fresh store re-read, transfer to the connected
//!    account, available-balance retrieval, payout, and finally the ledger
//!    debit. Failures here are absorbed (logged, recorded in the attempt
//!    log, never propagated); from the caller's point of view the
//!    withdrawal was accepted either way.
//!
//! The ledger is debited by the originally requested amount, strictly after
//! the payout succeeds, and exactly once per completed withdrawal. The
//! payout itself moves the *retrieved* available balance, which can differ
//! from the requested amount; the paid-out figure is kept on the attempt
//! record so the divergence stays auditable.
//!
//! # Concurrency
//!
//! The settlement steps for a given user run under a per-user async mutex,
//! so two concurrent withdrawals cannot both pass the fresh balance check
//! and double-spend. The lock is in-process; a multi-process deployment must
//! rely on the store-level refusal to debit below zero instead.

use crate::core::provisioner::PayoutAccountProvisioner;
use crate::core::traits::{PaymentProvider, RecordStore};
use crate::types::{
    AttemptState, EngineError, StoreError, UserId, UserSnapshot, WithdrawalAttempt,
    WithdrawalOutcome, WithdrawalRequest,
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Minor units per major unit of the settlement currency
const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Settlement configuration
///
/// Carries the currency every transfer, balance lookup, and payout is
/// denominated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementConfig {
    /// Lowercase ISO currency code
    pub currency: String,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        SettlementConfig {
            currency: "usd".to_string(),
        }
    }
}

impl SettlementConfig {
    /// Create a config with a custom settlement currency
    ///
    /// An empty currency falls back to the default.
    pub fn new(currency: &str) -> Self {
        if currency.trim().is_empty() {
            let default = Self::default();
            tracing::warn!(
                fallback = %default.currency,
                "empty settlement currency, using default"
            );
            return default;
        }

        SettlementConfig {
            currency: currency.trim().to_lowercase(),
        }
    }
}

/// Convert a major-unit amount to minor currency units
///
/// Returns `None` when the conversion overflows, the result does not fit an
/// `i64`, or the amount carries sub-minor-unit precision the provider cannot
/// represent.
fn to_minor_units(amount: Decimal) -> Option<i64> {
    let minor = amount.checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))?;
    if minor != minor.trunc() {
        return None;
    }
    minor.to_i64()
}

/// The balance-gated withdrawal state machine
///
/// Holds its collaborators by `Arc` (explicit dependency injection, no
/// ambient singletons) plus the per-user settlement locks and the attempt
/// log.
pub struct WithdrawalOrchestrator {
    store: Arc<dyn RecordStore>,
    provider: Arc<dyn PaymentProvider>,
    provisioner: Arc<PayoutAccountProvisioner>,
    config: SettlementConfig,
    /// One entry per user that ever reached settlement; never pruned
    settlement_locks: DashMap<UserId, Arc<Mutex<()>>>,
    attempts: DashMap<UserId, Vec<WithdrawalAttempt>>,
}

impl WithdrawalOrchestrator {
    /// Create a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `store` - Record store for fresh reads and the ledger debit
    /// * `provider` - Payment provider client
    /// * `provisioner` - Shared provisioner, spawned when a connected user
    ///   has no provider account yet
    /// * `config` - Settlement currency configuration
    pub fn new(
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn PaymentProvider>,
        provisioner: Arc<PayoutAccountProvisioner>,
        config: SettlementConfig,
    ) -> Self {
        WithdrawalOrchestrator {
            store,
            provider,
            provisioner,
            config,
            settlement_locks: DashMap::new(),
            attempts: DashMap::new(),
        }
    }

    /// Drive a withdrawal to completion or early rejection
    ///
    /// # Returns
    ///
    /// * `Ok(WithdrawalOutcome::Accepted)` - guards passed and a settlement
    ///   pass ran; consult [`Self::attempts`] for its terminal state
    /// * `Ok(WithdrawalOutcome::PendingProvisioning)` - provisioning was
    ///   kicked off in the background, retry later
    /// * `Err(EngineError::InvalidAmount)` - non-positive or
    ///   unrepresentable amount
    /// * `Err(EngineError::InsufficientBalance)` - balance does not cover
    ///   the amount (snapshot or fresh check)
    /// * `Err(EngineError::NotConnected)` - payout connection never
    ///   requested
    /// * `Err(EngineError::PayoutAccountMissing)` - stale snapshot, the
    ///   store has no account id
    ///
    /// Settlement failures after acceptance are never returned; they are
    /// logged and recorded in the attempt log.
    pub async fn withdraw(
        &self,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalOutcome, EngineError> {
        let user = &request.user;

        if request.amount <= Decimal::ZERO {
            return Err(EngineError::invalid_amount(request.amount));
        }
        let amount_minor = to_minor_units(request.amount)
            .ok_or_else(|| EngineError::invalid_amount(request.amount))?;

        // Guard: the caller-supplied snapshot must cover the amount.
        // No external calls are made when this fails.
        if user.balance < request.amount {
            tracing::warn!(
                user = %user.id,
                available = %user.balance,
                requested = %request.amount,
                "withdrawal rejected: insufficient balance"
            );
            return Err(EngineError::insufficient_balance(
                &user.id,
                user.balance,
                request.amount,
            ));
        }

        // Guard: the user must have requested a payout connection.
        if !user.payout_connection_requested {
            return Err(EngineError::not_connected(&user.id));
        }

        // Connection requested but no account yet: kick off provisioning as
        // a detached task and tell the caller to retry later. The task's
        // outcome is observable via the provisioner status map and logs.
        if user.payout_account_id.is_none() {
            let provisioner = Arc::clone(&self.provisioner);
            let user_id = user.id.clone();
            tokio::spawn(async move {
                provisioner.ensure_payout_account(&user_id).await;
            });
            return Ok(WithdrawalOutcome::PendingProvisioning);
        }

        // Steps from the fresh re-check through the ledger debit are
        // serialized per user.
        let lock = self.settlement_lock(&user.id);
        let _guard = lock.lock().await;

        // Fresh read: the snapshot may be stale, the store is authoritative.
        let state = self
            .store
            .payout_state(&user.id)
            .await?
            .ok_or_else(|| StoreError::user_not_found(&user.id))?;
        let account_id = state
            .payout_account_id
            .clone()
            .ok_or_else(|| EngineError::payout_account_missing(&user.id))?;
        if state.balance < request.amount {
            return Err(EngineError::insufficient_balance(
                &user.id,
                state.balance,
                request.amount,
            ));
        }

        self.settle(&request, amount_minor, &account_id).await;
        Ok(WithdrawalOutcome::Accepted)
    }

    /// Withdrawal attempts recorded for a user, oldest first
    pub fn attempts(&self, user_id: &str) -> Vec<WithdrawalAttempt> {
        self.attempts
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Run the absorbed settlement phase: transfer, balance retrieval,
    /// payout, ledger debit
    ///
    /// Every exit path records a terminal [`WithdrawalAttempt`]; failures
    /// are logged and swallowed.
    async fn settle(&self, request: &WithdrawalRequest, amount_minor: i64, account_id: &str) {
        let user = &request.user;
        let currency = self.config.currency.as_str();
        let description = format!(
            "Transfer to {}",
            user.email.as_deref().unwrap_or(user.id.as_str())
        );

        tracing::debug!(user = %user.id, amount = %request.amount, "transferring to connected account");
        if let Err(error) = self
            .provider
            .create_transfer(amount_minor, currency, account_id, &description)
            .await
        {
            tracing::error!(user = %user.id, error = %error, "transfer to connected account failed");
            self.record(
                user,
                request.amount,
                AttemptState::TransferFailed,
                Some(error.to_string()),
            );
            return;
        }

        tracing::debug!(user = %user.id, account = account_id, "retrieving available balance");
        let balances = match self.provider.available_balance(account_id).await {
            Ok(balances) => balances,
            Err(error) => {
                tracing::error!(user = %user.id, error = %error, "balance retrieval failed");
                self.record(
                    user,
                    request.amount,
                    AttemptState::BalanceUnavailable,
                    Some(error.to_string()),
                );
                return;
            }
        };

        let available_minor = balances
            .iter()
            .find(|balance| balance.currency == currency)
            .map(|balance| balance.amount_minor)
            .filter(|amount| *amount > 0);
        let Some(available_minor) = available_minor else {
            let error = EngineError::missing_currency_balance(account_id, currency);
            tracing::error!(user = %user.id, error = %error, "no settlement balance after transfer");
            self.record(
                user,
                request.amount,
                AttemptState::BalanceUnavailable,
                Some(error.to_string()),
            );
            return;
        };

        // Pays out the retrieved balance, not the requested amount.
        tracing::debug!(user = %user.id, paid_out_minor = available_minor, "creating payout");
        if let Err(error) = self
            .provider
            .create_payout(available_minor, currency, account_id)
            .await
        {
            tracing::error!(user = %user.id, error = %error, "payout from connected account failed");
            self.record(
                user,
                request.amount,
                AttemptState::PayoutFailed,
                Some(error.to_string()),
            );
            return;
        }

        // Ledger debit happens last, by the originally requested amount.
        if let Err(error) = self.store.debit_balance(&user.id, request.amount).await {
            tracing::error!(
                user = %user.id,
                error = %error,
                "payout succeeded but ledger debit failed"
            );
            self.record(
                user,
                request.amount,
                AttemptState::LedgerUpdateFailed,
                Some(error.to_string()),
            );
            return;
        }

        tracing::info!(
            user = %user.id,
            amount = %request.amount,
            paid_out_minor = available_minor,
            "withdrawal completed"
        );
        self.record(
            user,
            request.amount,
            AttemptState::Completed,
            Some(format!("paid out {available_minor} minor units")),
        );
    }

    fn settlement_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.settlement_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn record(
        &self,
        user: &UserSnapshot,
        amount: Decimal,
        state: AttemptState,
        detail: Option<String>,
    ) {
        self.attempts
            .entry(user.id.clone())
            .or_insert_with(Vec::new)
            .push(WithdrawalAttempt {
                amount,
                state,
                detail,
                at: Utc::now(),
            });
    }
}
