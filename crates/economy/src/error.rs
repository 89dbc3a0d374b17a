use chrono::{DateTime, Utc};
use thiserror::Error;

use pteronest_core::{Money, UserId};

/// Business-rule failures of a wallet operation.
///
/// A failed operation has no effect: nothing is appended and the balance is
/// untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EconomyError {
    #[error("insufficient funds for {user_id}: requested {requested}, available {available}")]
    InsufficientFunds {
        user_id: UserId,
        requested: Money,
        available: Money,
    },

    #[error("invalid amount {amount}: must be greater than zero")]
    InvalidAmount { amount: Money },

    #[error("daily reward for {user_id} already claimed; next claim at {next_claim_at}")]
    CooldownActive {
        user_id: UserId,
        next_claim_at: DateTime<Utc>,
    },

    #[error("balance of {user_id} would overflow")]
    BalanceOverflow { user_id: UserId },

    #[error("command for {found} routed to the wallet of {expected}")]
    AccountMismatch { expected: UserId, found: UserId },
}
