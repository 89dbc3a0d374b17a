use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use pteronest_core::{ExpectedVersion, UserId};
use pteronest_economy::{EconomyEvent, Transaction};

use super::r#trait::{TransactionLog, TransactionLogError};

type Stream = Arc<RwLock<Vec<Transaction>>>;

/// In-memory append-only transaction log.
///
/// Lives for the process lifetime; nothing is persisted. Each user's stream
/// has its own lock, so appends for different users do not serialize on
/// anything but the brief stream lookup.
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    streams: RwLock<HashMap<UserId, Stream>>,
    total: AtomicUsize,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[Transaction]) -> u64 {
        stream.last().map(|t| t.sequence).unwrap_or(0)
    }

    fn existing_stream(&self, user_id: &UserId) -> Result<Option<Stream>, TransactionLogError> {
        let streams = self.streams.read().map_err(|_| TransactionLogError::Poisoned)?;
        Ok(streams.get(user_id).cloned())
    }

    fn stream_for_append(&self, user_id: &UserId) -> Result<Stream, TransactionLogError> {
        if let Some(stream) = self.existing_stream(user_id)? {
            return Ok(stream);
        }
        let mut streams = self.streams.write().map_err(|_| TransactionLogError::Poisoned)?;
        Ok(streams.entry(user_id.clone()).or_default().clone())
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(
        &self,
        user_id: &UserId,
        events: Vec<EconomyEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<Transaction>, TransactionLogError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        for (idx, e) in events.iter().enumerate() {
            if e.user_id() != user_id {
                return Err(TransactionLogError::StreamMismatch(format!(
                    "event for '{}' appended to stream of '{user_id}' (index {idx})",
                    e.user_id()
                )));
            }
        }

        let stream = self.stream_for_append(user_id)?;
        let mut stream = stream.write().map_err(|_| TransactionLogError::Poisoned)?;
        let current = Self::current_version(&stream);

        expected_version
            .check(current)
            .map_err(|e| TransactionLogError::Concurrency(e.to_string()))?;

        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for e in &events {
            let tx = Transaction::from_event(next, e);
            next += 1;
            stream.push(tx.clone());
            committed.push(tx);
        }
        self.total.fetch_add(committed.len(), Ordering::Relaxed);

        Ok(committed)
    }

    fn load_stream(&self, user_id: &UserId) -> Result<Vec<Transaction>, TransactionLogError> {
        match self.existing_stream(user_id)? {
            Some(stream) => {
                let stream = stream.read().map_err(|_| TransactionLogError::Poisoned)?;
                Ok(stream.clone())
            }
            None => Ok(vec![]),
        }
    }

    fn recent(&self, user_id: &UserId, limit: usize) -> Result<Vec<Transaction>, TransactionLogError> {
        match self.existing_stream(user_id)? {
            Some(stream) => {
                let stream = stream.read().map_err(|_| TransactionLogError::Poisoned)?;
                Ok(stream.iter().rev().take(limit).cloned().collect())
            }
            None => Ok(vec![]),
        }
    }

    fn total_len(&self) -> Result<usize, TransactionLogError> {
        Ok(self.total.load(Ordering::Relaxed))
    }
}
