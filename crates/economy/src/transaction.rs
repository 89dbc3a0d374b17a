use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pteronest_core::{Money, TransactionId, UserId};

use crate::wallet::{Credited, Debited, EconomyEvent};

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

/// Why a transaction happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionReason {
    /// Plain credit or debit requested by a caller.
    Adjustment,
    /// Payout of the daily reward.
    DailyReward,
}

/// One committed, immutable entry of a user's transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    /// Always positive; direction comes from `kind`.
    pub amount: Money,
    pub reason: TransactionReason,
    /// Position in the user's stream, starting at 1.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub resulting_balance: Money,
}

impl Transaction {
    /// Materialize a committed event at `sequence` in its stream.
    pub fn from_event(sequence: u64, event: &EconomyEvent) -> Self {
        match event {
            EconomyEvent::Credited(e) => Self {
                id: e.transaction_id,
                user_id: e.user_id.clone(),
                kind: TransactionKind::Credit,
                amount: e.amount,
                reason: e.reason,
                sequence,
                timestamp: e.occurred_at,
                resulting_balance: e.resulting_balance,
            },
            EconomyEvent::Debited(e) => Self {
                id: e.transaction_id,
                user_id: e.user_id.clone(),
                kind: TransactionKind::Debit,
                amount: e.amount,
                reason: e.reason,
                sequence,
                timestamp: e.occurred_at,
                resulting_balance: e.resulting_balance,
            },
        }
    }

    /// The event this transaction was committed from.
    pub fn to_event(&self) -> EconomyEvent {
        match self.kind {
            TransactionKind::Credit => EconomyEvent::Credited(Credited {
                user_id: self.user_id.clone(),
                transaction_id: self.id,
                amount: self.amount,
                reason: self.reason,
                resulting_balance: self.resulting_balance,
                occurred_at: self.timestamp,
            }),
            TransactionKind::Debit => EconomyEvent::Debited(Debited {
                user_id: self.user_id.clone(),
                transaction_id: self.id,
                amount: self.amount,
                reason: self.reason,
                resulting_balance: self.resulting_balance,
                occurred_at: self.timestamp,
            }),
        }
    }

    /// `+amount` for credits, `-amount` for debits.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Credit => self.amount,
            TransactionKind::Debit => Money::from_minor(-self.amount.minor()),
        }
    }
}
