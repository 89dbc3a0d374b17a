//! The economy ledger service.
//!
//! Owns the balance index and the transaction log, and is the only thing that
//! mutates them. Every mutating operation runs this pipeline while holding the
//! user's wallet slot:
//!
//! ```text
//! lock wallet slot
//!   ↓
//! 1. Build the command (fresh transaction id, clock reading)
//!   ↓
//! 2. Handle it against the wallet (pure decision, may reject)
//!   ↓
//! 3. Append the resulting events to the log (expected version = wallet version)
//!   ↓
//! 4. Apply the events to the wallet
//! ```
//!
//! A rejected command stops at step 2, so nothing is appended and the balance
//! is unchanged. Operations on different users proceed concurrently.

use std::sync::PoisonError;

use chrono::{DateTime, Utc};

use pteronest_core::{Aggregate, AggregateRoot, ExpectedVersion, Money, TransactionId, UserId};
use pteronest_economy::{
    ClaimDaily, Credit, DailyRewardPolicy, Debit, Transaction, TransactionReason, Wallet,
    WalletCommand,
};

use crate::balance_index::BalanceIndex;
use crate::clock::{Clock, MonotonicClock, SystemClock};
use crate::error::LedgerError;
use crate::transaction_log::{InMemoryTransactionLog, TransactionLog, TransactionLogError};

/// Number of entries `/transactions` shows.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Per-user balances plus their append-only history.
///
/// Construct one at process start and share it (`Arc<Ledger>`) with whatever
/// adapts it to the chat platform. Tests build their own isolated instances.
pub struct Ledger<L = InMemoryTransactionLog, C = MonotonicClock<SystemClock>> {
    index: BalanceIndex,
    log: L,
    clock: C,
    policy: DailyRewardPolicy,
}

impl Ledger {
    /// In-memory ledger with the default daily policy (10.00, no cooldown).
    pub fn new() -> Self {
        Self::with_policy(DailyRewardPolicy::default())
    }

    pub fn with_policy(policy: DailyRewardPolicy) -> Self {
        Self::from_parts(
            InMemoryTransactionLog::new(),
            MonotonicClock::new(SystemClock),
            policy,
        )
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, C> Ledger<L, C>
where
    L: TransactionLog,
    C: Clock,
{
    pub fn from_parts(log: L, clock: C, policy: DailyRewardPolicy) -> Self {
        Self {
            index: BalanceIndex::new(),
            log,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &DailyRewardPolicy {
        &self.policy
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Current balance; 0 for a user never seen before.
    pub fn balance(&self, user_id: &UserId) -> Money {
        self.index.balance(user_id)
    }

    /// Add `amount` to the user's balance and return the new balance.
    pub fn credit(&self, user_id: &UserId, amount: Money) -> Result<Money, LedgerError> {
        let tx = self.execute(user_id, |transaction_id, occurred_at| {
            WalletCommand::Credit(Credit {
                user_id: user_id.clone(),
                transaction_id,
                amount,
                reason: TransactionReason::Adjustment,
                occurred_at,
            })
        })?;
        Ok(tx.resulting_balance)
    }

    /// Take `amount` from the user's balance and return the new balance.
    ///
    /// Fails with `InsufficientFunds` when the balance is smaller than
    /// `amount`; the log and balance are then left untouched.
    pub fn debit(&self, user_id: &UserId, amount: Money) -> Result<Money, LedgerError> {
        let tx = self.execute(user_id, |transaction_id, occurred_at| {
            WalletCommand::Debit(Debit {
                user_id: user_id.clone(),
                transaction_id,
                amount,
                occurred_at,
            })
        })?;
        Ok(tx.resulting_balance)
    }

    /// Pay out the daily reward and return the new balance.
    pub fn claim_daily(&self, user_id: &UserId) -> Result<Money, LedgerError> {
        let policy = self.policy;
        let tx = self.execute(user_id, |transaction_id, occurred_at| {
            WalletCommand::ClaimDaily(ClaimDaily {
                user_id: user_id.clone(),
                transaction_id,
                policy,
                occurred_at,
            })
        })?;
        Ok(tx.resulting_balance)
    }

    /// Instant from which the next daily claim succeeds, if it is not
    /// claimable right now.
    pub fn next_daily_claim(&self, user_id: &UserId) -> Option<DateTime<Utc>> {
        let slot = self.index.get(user_id)?;
        let last_claim = slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_daily_claim();
        let next = self.policy.next_claim_at(last_claim)?;
        (next > self.clock.now()).then_some(next)
    }

    /// Up to `limit` most recent transactions of the user, newest first.
    pub fn recent_transactions(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.log.recent(user_id, limit)?)
    }

    /// Replay the user's history and check it against the index.
    ///
    /// Returns the verified balance.
    pub fn verify(&self, user_id: &UserId) -> Result<Money, LedgerError> {
        let slot = self.index.get(user_id);
        // Hold the slot so no transaction lands between the two reads.
        let wallet = slot
            .as_ref()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner));

        let history = self.log.load_stream(user_id)?;
        let indexed = wallet.as_ref().map(|w| w.balance()).unwrap_or(Money::ZERO);

        let mut running = Money::ZERO;
        for tx in &history {
            running = running
                .checked_add(tx.signed_amount())
                .filter(|r| *r == tx.resulting_balance)
                .ok_or_else(|| LedgerError::Inconsistent {
                    user_id: user_id.clone(),
                    indexed: tx.resulting_balance,
                    replayed: running,
                })?;
        }

        let replayed = Wallet::rehydrate(user_id.clone(), &history).balance();
        if replayed != indexed || running != indexed {
            return Err(LedgerError::Inconsistent {
                user_id: user_id.clone(),
                indexed,
                replayed,
            });
        }

        Ok(indexed)
    }

    fn execute<F>(&self, user_id: &UserId, build: F) -> Result<Transaction, LedgerError>
    where
        F: FnOnce(TransactionId, DateTime<Utc>) -> WalletCommand,
    {
        let slot = self.index.slot(user_id);
        let mut wallet = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let command = build(TransactionId::new(), self.clock.now());
        let events = wallet.handle(&command)?;

        let mut committed = self.log.append(
            user_id,
            events.clone(),
            ExpectedVersion::Exact(wallet.version()),
        )?;
        for e in &events {
            wallet.apply(e);
        }

        let tx = committed.pop().ok_or_else(|| {
            TransactionLogError::StreamMismatch(format!("append for '{user_id}' committed nothing"))
        })?;

        tracing::debug!(
            user_id = %tx.user_id,
            kind = ?tx.kind,
            reason = ?tx.reason,
            amount = %tx.amount,
            balance = %tx.resulting_balance,
            sequence = tx.sequence,
            "transaction committed"
        );

        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    use pteronest_economy::{EconomyError, TransactionKind};

    use super::*;
    use crate::clock::ManualClock;

    fn user(raw: &str) -> UserId {
        UserId::new(raw).unwrap()
    }

    fn units(n: i64) -> Money {
        Money::from_units(n)
    }

    fn manual_ledger(policy: DailyRewardPolicy) -> (Ledger<InMemoryTransactionLog, Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()));
        let ledger = Ledger::from_parts(InMemoryTransactionLog::new(), clock.clone(), policy);
        (ledger, clock)
    }

    #[test]
    fn unseen_user_has_zero_balance() {
        let ledger = Ledger::new();
        assert_eq!(ledger.balance(&user("nobody")), Money::ZERO);
        assert!(ledger.recent_transactions(&user("nobody"), 10).unwrap().is_empty());
    }

    #[test]
    fn credit_debit_history_scenario() {
        let ledger = Ledger::new();
        let u1 = user("u1");

        assert_eq!(ledger.credit(&u1, units(10)).unwrap(), units(10));
        assert_eq!(ledger.credit(&u1, units(5)).unwrap(), units(15));

        let err = ledger.debit(&u1, units(20)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Economy(EconomyError::InsufficientFunds {
                user_id: u1.clone(),
                requested: units(20),
                available: units(15),
            })
        );
        assert_eq!(ledger.balance(&u1), units(15));

        assert_eq!(ledger.debit(&u1, units(15)).unwrap(), Money::ZERO);

        let history = ledger.recent_transactions(&u1, DEFAULT_HISTORY_LIMIT).unwrap();
        let summary: Vec<_> = history
            .iter()
            .map(|t| (t.kind, t.amount, t.resulting_balance))
            .collect();
        assert_eq!(
            summary,
            vec![
                (TransactionKind::Debit, units(15), Money::ZERO),
                (TransactionKind::Credit, units(5), units(15)),
                (TransactionKind::Credit, units(10), units(10)),
            ]
        );
    }

    #[test]
    fn failed_debit_appends_nothing() {
        let ledger = Ledger::new();
        let u = user("u1");
        ledger.credit(&u, units(3)).unwrap();

        assert!(ledger.debit(&u, units(4)).is_err());

        assert_eq!(ledger.log().total_len().unwrap(), 1);
        assert_eq!(ledger.balance(&u), units(3));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let ledger = Ledger::new();
        let u = user("u1");

        for amount in [Money::ZERO, Money::from_minor(-1)] {
            assert_eq!(
                ledger.credit(&u, amount).unwrap_err().as_economy(),
                Some(&EconomyError::InvalidAmount { amount })
            );
            assert_eq!(
                ledger.debit(&u, amount).unwrap_err().as_economy(),
                Some(&EconomyError::InvalidAmount { amount })
            );
        }
        assert_eq!(ledger.log().total_len().unwrap(), 0);
    }

    #[test]
    fn daily_claims_without_cooldown_both_succeed() {
        let ledger = Ledger::new();
        let u2 = user("u2");

        assert_eq!(ledger.claim_daily(&u2).unwrap(), units(10));
        assert_eq!(ledger.claim_daily(&u2).unwrap(), units(20));
        assert_eq!(ledger.next_daily_claim(&u2), None);

        let history = ledger.recent_transactions(&u2, 10).unwrap();
        assert!(history.iter().all(|t| t.reason == TransactionReason::DailyReward));
    }

    #[test]
    fn daily_claim_respects_configured_cooldown() {
        let (ledger, clock) = manual_ledger(DailyRewardPolicy::once_per_day(units(10)));
        let u2 = user("u2");
        let first_claim = clock.now();

        assert_eq!(ledger.claim_daily(&u2).unwrap(), units(10));
        assert_eq!(ledger.next_daily_claim(&u2), Some(first_claim + Duration::hours(24)));

        clock.advance(Duration::hours(1));
        let err = ledger.claim_daily(&u2).unwrap_err();
        assert_eq!(
            err.as_economy(),
            Some(&EconomyError::CooldownActive {
                user_id: u2.clone(),
                next_claim_at: first_claim + Duration::hours(24),
            })
        );
        assert_eq!(ledger.balance(&u2), units(10));
        assert_eq!(ledger.recent_transactions(&u2, 10).unwrap().len(), 1);

        clock.advance(Duration::hours(23));
        assert_eq!(ledger.next_daily_claim(&u2), None);
        assert_eq!(ledger.claim_daily(&u2).unwrap(), units(20));
    }

    #[test]
    fn timestamps_are_non_decreasing() {
        let ledger = Ledger::new();
        let u = user("u1");
        for _ in 0..20 {
            ledger.credit(&u, units(1)).unwrap();
        }

        let history = ledger.recent_transactions(&u, 20).unwrap();
        assert!(history.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(history.windows(2).all(|w| w[0].sequence == w[1].sequence + 1));
    }

    #[test]
    fn verify_matches_replayed_history() {
        let ledger = Ledger::new();
        let u = user("u1");
        ledger.credit(&u, units(7)).unwrap();
        ledger.claim_daily(&u).unwrap();
        ledger.debit(&u, Money::from_minor(350)).unwrap();

        assert_eq!(ledger.verify(&u).unwrap(), Money::from_minor(1350));
        assert_eq!(ledger.verify(&user("nobody")).unwrap(), Money::ZERO);
    }

    #[test]
    fn concurrent_credits_on_one_user_are_all_applied() {
        const N: usize = 64;
        let ledger = Ledger::new();
        let u = user("busy");

        std::thread::scope(|s| {
            for _ in 0..N {
                s.spawn(|| ledger.credit(&u, units(1)).unwrap());
            }
        });

        assert_eq!(ledger.balance(&u), units(N as i64));
        let history = ledger.recent_transactions(&u, usize::MAX).unwrap();
        assert_eq!(history.len(), N);
        assert_eq!(ledger.log().total_len().unwrap(), N);

        let mut sequences: Vec<u64> = history.iter().map(|t| t.sequence).collect();
        sequences.sort_unstable();
        assert_eq!(sequences, (1..=N as u64).collect::<Vec<_>>());
        assert_eq!(ledger.verify(&u).unwrap(), units(N as i64));
    }

    #[test]
    fn concurrent_debits_never_overdraw() {
        let ledger = Ledger::new();
        let u = user("race");
        ledger.credit(&u, units(10)).unwrap();

        let successes = std::thread::scope(|s| {
            let handles: Vec<_> = (0..32)
                .map(|_| s.spawn(|| ledger.debit(&u, units(1)).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(successes, 10);
        assert_eq!(ledger.balance(&u), Money::ZERO);
        assert_eq!(ledger.verify(&u).unwrap(), Money::ZERO);
    }

    #[test]
    fn users_are_isolated() {
        let ledger = Ledger::new();
        let (a, b) = (user("a"), user("b"));

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..50 {
                    ledger.credit(&a, units(2)).unwrap();
                }
            });
            s.spawn(|| {
                for _ in 0..50 {
                    ledger.claim_daily(&b).unwrap();
                }
            });
        });

        assert_eq!(ledger.balance(&a), units(100));
        assert_eq!(ledger.balance(&b), units(500));
        assert_eq!(ledger.log().total_len().unwrap(), 100);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: the balance after each step equals the running sum of
        /// accepted signed amounts, and the log holds exactly the accepted
        /// transactions.
        #[test]
        fn balance_equals_running_sum(
            ops in prop::collection::vec((any::<bool>(), 1i64..5_000i64), 1..50)
        ) {
            let ledger = Ledger::new();
            let u = user("prop");
            let mut expected: i64 = 0;
            let mut accepted = 0usize;

            for (is_credit, minor) in ops {
                let amount = Money::from_minor(minor);
                let result = if is_credit {
                    ledger.credit(&u, amount)
                } else {
                    ledger.debit(&u, amount)
                };

                match result {
                    Ok(balance) => {
                        expected += if is_credit { minor } else { -minor };
                        accepted += 1;
                        prop_assert_eq!(balance, Money::from_minor(expected));
                    }
                    Err(e) => {
                        let is_insufficient = matches!(
                            e.as_economy(),
                            Some(EconomyError::InsufficientFunds { .. })
                        );
                        prop_assert!(is_insufficient);
                    }
                }

                prop_assert_eq!(ledger.balance(&u), Money::from_minor(expected));
                prop_assert_eq!(ledger.log().total_len().unwrap(), accepted);
            }

            prop_assert_eq!(ledger.verify(&u).unwrap(), Money::from_minor(expected));
        }
    }
}
