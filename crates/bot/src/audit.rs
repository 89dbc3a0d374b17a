//! Audit trail of committed transactions.
//!
//! Consumes envelopes from the event bus and writes one `info` line per
//! transaction under the `pteronest::audit` target.

use pteronest_economy::EconomyEvent;
use pteronest_events::Subscription;
use pteronest_infra::TransactionEnvelope;

pub const AUDIT_TARGET: &str = "pteronest::audit";

/// Block on `subscription` until every publisher is gone.
///
/// Meant for `tokio::task::spawn_blocking` or a dedicated thread. Returns the
/// number of envelopes recorded.
pub fn run(subscription: Subscription<TransactionEnvelope>) -> usize {
    let mut recorded = 0;
    while let Ok(envelope) = subscription.recv() {
        record(&envelope);
        recorded += 1;
    }
    tracing::debug!(recorded, "audit subscription closed");
    recorded
}

pub fn record(envelope: &TransactionEnvelope) {
    let (direction, amount, reason, balance) = match envelope.payload() {
        EconomyEvent::Credited(e) => ("credit", e.amount, e.reason, e.resulting_balance),
        EconomyEvent::Debited(e) => ("debit", e.amount, e.reason, e.resulting_balance),
    };

    tracing::info!(
        target: AUDIT_TARGET,
        event_id = %envelope.event_id(),
        event_type = envelope.event_type(),
        user_id = %envelope.user_id(),
        sequence = envelope.sequence_number(),
        direction,
        amount = %amount,
        reason = ?reason,
        resulting_balance = %balance,
        "transaction committed"
    );
}
