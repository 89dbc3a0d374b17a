use std::sync::Arc;

use thiserror::Error;

use pteronest_core::{ExpectedVersion, UserId};
use pteronest_economy::{EconomyEvent, Transaction};

/// Transaction log operation error.
///
/// These are infrastructure failures, as opposed to the business-rule
/// failures in `EconomyError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionLogError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("stream mismatch: {0}")]
    StreamMismatch(String),

    #[error("transaction log lock poisoned")]
    Poisoned,
}

/// Append-only, per-user transaction log.
///
/// Each user owns one stream. Within a stream, transactions get sequence
/// numbers 1, 2, 3, … with no gaps. Nothing is ever modified or removed.
///
/// `append()`:
/// - rejects events that belong to another user's stream
/// - checks `expected_version` against the current stream length
/// - assigns sequence numbers starting at `current_version + 1`
/// - commits the whole batch or nothing
///
/// Reads of an unknown user return an empty history, never an error.
pub trait TransactionLog: Send + Sync {
    fn append(
        &self,
        user_id: &UserId,
        events: Vec<EconomyEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<Transaction>, TransactionLogError>;

    /// Full history of a user, oldest first.
    fn load_stream(&self, user_id: &UserId) -> Result<Vec<Transaction>, TransactionLogError>;

    /// Up to `limit` most recent transactions of a user, newest first.
    fn recent(&self, user_id: &UserId, limit: usize) -> Result<Vec<Transaction>, TransactionLogError>;

    /// Number of transactions committed across all users.
    fn total_len(&self) -> Result<usize, TransactionLogError>;
}

impl<S> TransactionLog for Arc<S>
where
    S: TransactionLog + ?Sized,
{
    fn append(
        &self,
        user_id: &UserId,
        events: Vec<EconomyEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<Transaction>, TransactionLogError> {
        (**self).append(user_id, events, expected_version)
    }

    fn load_stream(&self, user_id: &UserId) -> Result<Vec<Transaction>, TransactionLogError> {
        (**self).load_stream(user_id)
    }

    fn recent(&self, user_id: &UserId, limit: usize) -> Result<Vec<Transaction>, TransactionLogError> {
        (**self).recent(user_id, limit)
    }

    fn total_len(&self) -> Result<usize, TransactionLogError> {
        (**self).total_len()
    }
}
