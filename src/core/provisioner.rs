//! Payout-account provisioning
//!
//! [`PayoutAccountProvisioner`] ensures a user has a payout-provider
//! account, idempotently. It runs as a best-effort background step: the
//! withdrawal orchestrator spawns it and never awaits it, so failures are
//! observable only via logs and the per-user status map.

use crate::core::traits::{PaymentProvider, RecordStore};
use crate::types::{EngineError, ProvisioningStatus, StoreError, UserId};
use dashmap::DashMap;
use std::sync::Arc;

/// Idempotently provisions payout-provider accounts
///
/// Thread-safe and cheap to share behind `Arc`; the status map uses
/// fine-grained per-key locking.
pub struct PayoutAccountProvisioner {
    store: Arc<dyn RecordStore>,
    provider: Arc<dyn PaymentProvider>,
    status: DashMap<UserId, ProvisioningStatus>,
}

impl PayoutAccountProvisioner {
    /// Create a new provisioner over the given collaborators
    pub fn new(store: Arc<dyn RecordStore>, provider: Arc<dyn PaymentProvider>) -> Self {
        PayoutAccountProvisioner {
            store,
            provider,
            status: DashMap::new(),
        }
    }

    /// Out-of-band status of the last provisioning task for a user
    pub fn status(&self, user_id: &str) -> ProvisioningStatus {
        self.status
            .get(user_id)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Ensure the user has a payout-provider account
    ///
    /// No-op when an account id is already persisted. Otherwise creates a
    /// payout-capable account with the provider and persists the returned
    /// id on the user record. All failures are logged and swallowed; the
    /// triggering withdrawal has already returned by the time this runs.
    pub async fn ensure_payout_account(&self, user_id: &str) {
        self.status
            .insert(user_id.to_string(), ProvisioningStatus::InProgress);

        match self.provision(user_id).await {
            Ok(()) => {
                self.status
                    .insert(user_id.to_string(), ProvisioningStatus::Succeeded);
            }
            Err(error) => {
                self.status
                    .insert(user_id.to_string(), ProvisioningStatus::Failed);
                tracing::error!(user = user_id, error = %error, "payout account provisioning failed");
            }
        }
    }

    async fn provision(&self, user_id: &str) -> Result<(), EngineError> {
        let state = self
            .store
            .payout_state(user_id)
            .await?
            .ok_or_else(|| StoreError::user_not_found(user_id))?;

        if state.payout_account_id.is_some() {
            // already provisioned
            return Ok(());
        }

        let account_id = self.provider.create_account(state.email.as_deref()).await?;
        self.store.set_payout_account(user_id, &account_id).await?;

        tracing::info!(user = user_id, account = %account_id, "created payout account");
        Ok(())
    }
}
