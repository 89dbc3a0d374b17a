//! Infrastructure layer: in-memory transaction log, balance index, clocks,
//! and the `Ledger` that ties them together.

pub mod balance_index;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod transaction_log;

pub use balance_index::BalanceIndex;
pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use error::LedgerError;
pub use ledger::{DEFAULT_HISTORY_LIMIT, Ledger};
pub use transaction_log::{
    InMemoryTransactionLog, PublishingTransactionLog, TransactionEnvelope, TransactionLog,
    TransactionLogError,
};
