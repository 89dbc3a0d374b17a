//! Economy module (virtual-currency wallets, event-sourced).
//!
//! Pure domain logic only: no IO, no locking, no clock. The `Ledger` in
//! `pteronest-infra` drives these types.

pub mod error;
pub mod policy;
pub mod transaction;
pub mod wallet;

pub use error::EconomyError;
pub use policy::{DEFAULT_DAILY_AMOUNT, DailyRewardPolicy};
pub use transaction::{Transaction, TransactionKind, TransactionReason};
pub use wallet::{
    ClaimDaily, Credit, Credited, Debit, Debited, EconomyEvent, Wallet, WalletCommand,
};
