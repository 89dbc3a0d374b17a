use thiserror::Error;

use pteronest_core::{Money, UserId};
use pteronest_economy::EconomyError;

use crate::transaction_log::TransactionLogError;

/// Error returned by `Ledger` operations.
///
/// The ledger hands every failure back to its caller; it does not log,
/// retry, or swallow them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A business rule rejected the operation (insufficient funds, invalid
    /// amount, cooldown…).
    #[error(transparent)]
    Economy(#[from] EconomyError),

    #[error(transparent)]
    Log(#[from] TransactionLogError),

    #[error("ledger inconsistency for {user_id}: index has {indexed}, log replays to {replayed}")]
    Inconsistent {
        user_id: UserId,
        indexed: Money,
        replayed: Money,
    },
}

impl LedgerError {
    /// The business-rule error, if that is what this is.
    pub fn as_economy(&self) -> Option<&EconomyError> {
        match self {
            LedgerError::Economy(e) => Some(e),
            _ => None,
        }
    }
}
