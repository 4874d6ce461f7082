//! Error types for the analytics and payout engine
//!
//! This module defines all error types that can occur while computing
//! dashboard metrics or driving a withdrawal.
//!
//! # Error Categories
//!
//! - **Store Errors**: record-store query or update failures
//! - **Provider Errors**: payment-provider call failures
//! - **Engine Errors**: guard rejections surfaced to the caller plus wrapped
//!   collaborator failures
//!
//! Guard rejections (insufficient balance, missing payout connection) are the
//! only errors a withdrawal caller ever sees; settlement-phase provider
//! failures are absorbed by the orchestrator and recorded in its attempt log.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by the record store collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A query against the store failed
    #[error("Store query failed: {message}")]
    QueryFailed {
        /// Description of the query failure
        message: String,
    },

    /// The referenced user record does not exist
    #[error("User {user} not found")]
    UserNotFound {
        /// User id that was not found
        user: String,
    },

    /// An update was refused because it would violate a store invariant
    ///
    /// The primary case is a ledger debit that would drive a balance
    /// negative.
    #[error("Store constraint violated: {message}")]
    ConstraintViolation {
        /// Description of the violated constraint
        message: String,
    },
}

/// Errors produced by the payment provider collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The provider rejected an operation
    #[error("Payment provider rejected {operation}: {message}")]
    Rejected {
        /// Operation the provider rejected
        operation: String,
        /// Provider-supplied reason
        message: String,
    },

    /// The provider could not be reached
    #[error("Payment provider unreachable: {message}")]
    Unreachable {
        /// Description of the transport failure
        message: String,
    },
}

/// Main error type for the analytics and payout engine
///
/// Guard variants carry enough context to produce a client-facing rejection
/// message; collaborator failures are wrapped transparently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Requested withdrawal amount is zero, negative, or not representable
    /// in minor currency units
    #[error("Invalid withdrawal amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// The user's balance does not cover the requested amount
    ///
    /// Raised both on the caller-supplied snapshot and on the fresh
    /// pre-settlement re-check.
    #[error(
        "Insufficient balance for user {user}: available {available}, requested {requested}"
    )]
    InsufficientBalance {
        /// User id
        user: String,
        /// Balance known at check time
        available: Decimal,
        /// Requested withdrawal amount
        requested: Decimal,
    },

    /// The user has not requested a payout-provider connection
    #[error("User {user} has not connected a payout account")]
    NotConnected {
        /// User id
        user: String,
    },

    /// The fresh store read has no payout account id for the user
    ///
    /// The caller-supplied snapshot claimed one existed, so the snapshot is
    /// stale. The withdrawal is rejected before any provider call.
    #[error("No payout account recorded for user {user}")]
    PayoutAccountMissing {
        /// User id
        user: String,
    },

    /// The connected account has no available balance entry in the
    /// settlement currency
    #[error("No {currency} balance available on account {account}")]
    MissingCurrencyBalance {
        /// Provider account id
        account: String,
        /// Settlement currency
        currency: String,
    },

    /// A record store call failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A payment provider call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

// Helper functions for creating common errors

impl StoreError {
    /// Create a QueryFailed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        StoreError::QueryFailed {
            message: message.into(),
        }
    }

    /// Create a UserNotFound error
    pub fn user_not_found(user: &str) -> Self {
        StoreError::UserNotFound {
            user: user.to_string(),
        }
    }

    /// Create a ConstraintViolation error
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        StoreError::ConstraintViolation {
            message: message.into(),
        }
    }
}

impl ProviderError {
    /// Create a Rejected error
    pub fn rejected(operation: &str, message: impl Into<String>) -> Self {
        ProviderError::Rejected {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Create an Unreachable error
    pub fn unreachable(message: impl Into<String>) -> Self {
        ProviderError::Unreachable {
            message: message.into(),
        }
    }
}

impl EngineError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        EngineError::InvalidAmount { amount }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user: &str, available: Decimal, requested: Decimal) -> Self {
        EngineError::InsufficientBalance {
            user: user.to_string(),
            available,
            requested,
        }
    }

    /// Create a NotConnected error
    pub fn not_connected(user: &str) -> Self {
        EngineError::NotConnected {
            user: user.to_string(),
        }
    }

    /// Create a PayoutAccountMissing error
    pub fn payout_account_missing(user: &str) -> Self {
        EngineError::PayoutAccountMissing {
            user: user.to_string(),
        }
    }

    /// Create a MissingCurrencyBalance error
    pub fn missing_currency_balance(account: &str, currency: &str) -> Self {
        EngineError::MissingCurrencyBalance {
            account: account.to_string(),
            currency: currency.to_string(),
        }
    }
}
