//! Current-balance index: one wallet slot per user.
//!
//! Each slot is a mutex around the user's `Wallet`. Holding the slot lock is
//! what makes a read-check-append-apply sequence atomic for that user; other
//! users only share the brief map lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use pteronest_core::{Money, UserId};
use pteronest_economy::Wallet;

pub type WalletSlot = Arc<Mutex<Wallet>>;

#[derive(Debug, Default)]
pub struct BalanceIndex {
    wallets: RwLock<HashMap<UserId, WalletSlot>>,
}

impl BalanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance; 0 for users without a wallet. Never creates one.
    pub fn balance(&self, user_id: &UserId) -> Money {
        match self.get(user_id) {
            Some(slot) => slot.lock().unwrap_or_else(PoisonError::into_inner).balance(),
            None => Money::ZERO,
        }
    }

    /// Slot of an existing wallet.
    pub fn get(&self, user_id: &UserId) -> Option<WalletSlot> {
        let wallets = self.wallets.read().unwrap_or_else(PoisonError::into_inner);
        wallets.get(user_id).cloned()
    }

    /// Slot for a user, creating an empty wallet on first use.
    pub fn slot(&self, user_id: &UserId) -> WalletSlot {
        if let Some(slot) = self.get(user_id) {
            return slot;
        }
        let mut wallets = self.wallets.write().unwrap_or_else(PoisonError::into_inner);
        wallets
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Wallet::empty(user_id.clone()))))
            .clone()
    }

    /// Users that have a wallet slot, in no particular order.
    pub fn users(&self) -> Vec<UserId> {
        let wallets = self.wallets.read().unwrap_or_else(PoisonError::into_inner);
        wallets.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.wallets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_of_unknown_user_is_zero_and_creates_nothing() {
        let index = BalanceIndex::new();
        let u = UserId::new("ghost").unwrap();

        assert_eq!(index.balance(&u), Money::ZERO);
        assert!(index.get(&u).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn slot_is_shared_between_lookups() {
        let index = BalanceIndex::new();
        let u = UserId::new("u1").unwrap();

        let a = index.slot(&u);
        let b = index.slot(&u);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(index.users(), vec![u]);
    }
}
