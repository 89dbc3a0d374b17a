//! Append-only transaction log boundary.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryTransactionLog;
pub use r#trait::{TransactionLog, TransactionLogError};

use pteronest_core::{ExpectedVersion, UserId};
use pteronest_economy::{EconomyEvent, Transaction};
use pteronest_events::{Event, EventBus, EventEnvelope};

/// Envelope type published for every committed transaction.
pub type TransactionEnvelope = EventEnvelope<EconomyEvent>;

/// Adapter that publishes committed transactions to an `EventBus` after a
/// successful append.
///
/// Publication happens only after the append succeeded. A committed
/// transaction is never rolled back, so a failed publish is logged and the
/// append still reports success.
pub struct PublishingTransactionLog<L, B> {
    log: L,
    bus: B,
}

impl<L, B> PublishingTransactionLog<L, B> {
    pub fn new(log: L, bus: B) -> Self {
        Self { log, bus }
    }

    pub fn into_parts(self) -> (L, B) {
        (self.log, self.bus)
    }
}

impl<L, B> TransactionLog for PublishingTransactionLog<L, B>
where
    L: TransactionLog,
    B: EventBus<TransactionEnvelope>,
{
    fn append(
        &self,
        user_id: &UserId,
        events: Vec<EconomyEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<Transaction>, TransactionLogError> {
        let committed = self.log.append(user_id, events, expected_version)?;

        for tx in &committed {
            let event = tx.to_event();
            let envelope = EventEnvelope::new(
                *tx.id.as_uuid(),
                tx.user_id.clone(),
                event.event_type(),
                tx.sequence,
                event,
            );
            if let Err(err) = self.bus.publish(envelope) {
                tracing::warn!(
                    user_id = %tx.user_id,
                    transaction_id = %tx.id,
                    error = %err,
                    "failed to publish committed transaction"
                );
            }
        }

        Ok(committed)
    }

    fn load_stream(&self, user_id: &UserId) -> Result<Vec<Transaction>, TransactionLogError> {
        self.log.load_stream(user_id)
    }

    fn recent(&self, user_id: &UserId, limit: usize) -> Result<Vec<Transaction>, TransactionLogError> {
        self.log.recent(user_id, limit)
    }

    fn total_len(&self) -> Result<usize, TransactionLogError> {
        self.log.total_len()
    }
}
