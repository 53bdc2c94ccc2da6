use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// `TransactionLocks` serializes state transitions per transaction id
///
/// Different transaction ids never contend with each other. Entries no longer held by anyone are
/// pruned when a new lock is acquired.
#[derive(Clone, Default)]
pub struct TransactionLocks {
    slots: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TransactionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, transaction_id: &str) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().await;
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        slots
            .entry(transaction_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn acquire(&self, transaction_id: &str) -> OwnedMutexGuard<()> {
        self.slot(transaction_id).await.lock_owned().await
    }

    /// `try_acquire` returns `None` when the id is already held, it never waits for the holder
    pub async fn try_acquire(&self, transaction_id: &str) -> Option<OwnedMutexGuard<()>> {
        self.slot(transaction_id).await.try_lock_owned().ok()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}
