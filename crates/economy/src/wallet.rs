use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pteronest_core::{Aggregate, AggregateRoot, Money, TransactionId, UserId};
use pteronest_events::Event;

use crate::error::EconomyError;
use crate::policy::DailyRewardPolicy;
use crate::transaction::{Transaction, TransactionReason};

/// Aggregate root: one user's wallet.
///
/// The wallet is derived state. Its balance always equals the signed sum of
/// the user's transactions, and `rehydrate` rebuilds it from that history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    user_id: UserId,
    balance: Money,
    version: u64,
    last_daily_claim: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Empty wallet for a user with no history.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Money::ZERO,
            version: 0,
            last_daily_claim: None,
        }
    }

    /// Replay a user's committed history, oldest first.
    pub fn rehydrate(user_id: UserId, history: &[Transaction]) -> Self {
        let mut wallet = Self::empty(user_id);
        for tx in history {
            wallet.apply(&tx.to_event());
        }
        wallet
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn last_daily_claim(&self) -> Option<DateTime<Utc>> {
        self.last_daily_claim
    }
}

impl AggregateRoot for Wallet {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.user_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: Credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub user_id: UserId,
    pub transaction_id: TransactionId,
    pub amount: Money,
    pub reason: TransactionReason,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debit {
    pub user_id: UserId,
    pub transaction_id: TransactionId,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClaimDaily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimDaily {
    pub user_id: UserId,
    pub transaction_id: TransactionId,
    pub policy: DailyRewardPolicy,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCommand {
    Credit(Credit),
    Debit(Debit),
    ClaimDaily(ClaimDaily),
}

impl WalletCommand {
    pub fn user_id(&self) -> &UserId {
        match self {
            WalletCommand::Credit(c) => &c.user_id,
            WalletCommand::Debit(c) => &c.user_id,
            WalletCommand::ClaimDaily(c) => &c.user_id,
        }
    }
}

/// Event: Credited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credited {
    pub user_id: UserId,
    pub transaction_id: TransactionId,
    pub amount: Money,
    pub reason: TransactionReason,
    pub resulting_balance: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: Debited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debited {
    pub user_id: UserId,
    pub transaction_id: TransactionId,
    pub amount: Money,
    pub reason: TransactionReason,
    pub resulting_balance: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    Credited(Credited),
    Debited(Debited),
}

impl EconomyEvent {
    pub fn user_id(&self) -> &UserId {
        match self {
            EconomyEvent::Credited(e) => &e.user_id,
            EconomyEvent::Debited(e) => &e.user_id,
        }
    }

    pub fn transaction_id(&self) -> TransactionId {
        match self {
            EconomyEvent::Credited(e) => e.transaction_id,
            EconomyEvent::Debited(e) => e.transaction_id,
        }
    }

    pub fn resulting_balance(&self) -> Money {
        match self {
            EconomyEvent::Credited(e) => e.resulting_balance,
            EconomyEvent::Debited(e) => e.resulting_balance,
        }
    }
}

impl Event for EconomyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EconomyEvent::Credited(_) => "economy.wallet.credited",
            EconomyEvent::Debited(_) => "economy.wallet.debited",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EconomyEvent::Credited(e) => e.occurred_at,
            EconomyEvent::Debited(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Wallet {
    type Command = WalletCommand;
    type Event = EconomyEvent;
    type Error = EconomyError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            EconomyEvent::Credited(e) => {
                // handle() rejects overflowing credits before they are committed.
                self.balance = self.balance.checked_add(e.amount).unwrap_or(e.resulting_balance);
                if e.reason == TransactionReason::DailyReward {
                    self.last_daily_claim = Some(e.occurred_at);
                }
            }
            EconomyEvent::Debited(e) => {
                self.balance = self.balance.checked_sub(e.amount).unwrap_or(e.resulting_balance);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_account(command.user_id())?;

        match command {
            WalletCommand::Credit(cmd) => self.credited(cmd.transaction_id, cmd.amount, cmd.reason, cmd.occurred_at),
            WalletCommand::Debit(cmd) => self.handle_debit(cmd),
            WalletCommand::ClaimDaily(cmd) => self.handle_claim_daily(cmd),
        }
    }
}

impl Wallet {
    fn ensure_account(&self, user_id: &UserId) -> Result<(), EconomyError> {
        if user_id != &self.user_id {
            return Err(EconomyError::AccountMismatch {
                expected: self.user_id.clone(),
                found: user_id.clone(),
            });
        }
        Ok(())
    }

    fn credited(
        &self,
        transaction_id: TransactionId,
        amount: Money,
        reason: TransactionReason,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<EconomyEvent>, EconomyError> {
        if !amount.is_positive() {
            return Err(EconomyError::InvalidAmount { amount });
        }

        let resulting_balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| EconomyError::BalanceOverflow {
                user_id: self.user_id.clone(),
            })?;

        Ok(vec![EconomyEvent::Credited(Credited {
            user_id: self.user_id.clone(),
            transaction_id,
            amount,
            reason,
            resulting_balance,
            occurred_at,
        })])
    }

    fn handle_debit(&self, cmd: &Debit) -> Result<Vec<EconomyEvent>, EconomyError> {
        if !cmd.amount.is_positive() {
            return Err(EconomyError::InvalidAmount { amount: cmd.amount });
        }
        if cmd.amount > self.balance {
            return Err(EconomyError::InsufficientFunds {
                user_id: self.user_id.clone(),
                requested: cmd.amount,
                available: self.balance,
            });
        }

        let resulting_balance = self
            .balance
            .checked_sub(cmd.amount)
            .ok_or_else(|| EconomyError::BalanceOverflow {
                user_id: self.user_id.clone(),
            })?;

        Ok(vec![EconomyEvent::Debited(Debited {
            user_id: self.user_id.clone(),
            transaction_id: cmd.transaction_id,
            amount: cmd.amount,
            reason: TransactionReason::Adjustment,
            resulting_balance,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_claim_daily(&self, cmd: &ClaimDaily) -> Result<Vec<EconomyEvent>, EconomyError> {
        if let Some(next_claim_at) = cmd.policy.next_claim_at(self.last_daily_claim) {
            if cmd.occurred_at < next_claim_at {
                return Err(EconomyError::CooldownActive {
                    user_id: self.user_id.clone(),
                    next_claim_at,
                });
            }
        }

        self.credited(
            cmd.transaction_id,
            cmd.policy.amount,
            TransactionReason::DailyReward,
            cmd.occurred_at,
        )
    }
}
