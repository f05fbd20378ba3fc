//! In-memory store of draft orders keyed by conversation session.
//!
//! Nothing here is persisted: drafts live until the order is completed or the
//! process exits. There is no expiry, so abandoned drafts accumulate.
//!
//! Reads and writes of the map are individually atomic. Handlers that
//! read-modify-write a draft take [`SessionStore::lock`] first so that two
//! requests for the same session never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::order::DraftOrder;
use crate::domain::session::SessionId;

type LockTable = StdMutex<HashMap<SessionId, Arc<Mutex<()>>>>;

#[derive(Clone, Default)]
pub struct SessionStore {
    orders: Arc<RwLock<HashMap<SessionId, DraftOrder>>>,
    locks: Arc<LockTable>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, session_id: &SessionId) -> Option<DraftOrder> {
        let orders = self.orders.read().await;
        orders.get(session_id).cloned()
    }

    pub async fn put(&self, session_id: SessionId, order: DraftOrder) {
        let mut orders = self.orders.write().await;
        orders.insert(session_id, order);
    }

    pub async fn delete(&self, session_id: &SessionId) -> Option<DraftOrder> {
        let mut orders = self.orders.write().await;
        orders.remove(session_id)
    }

    pub async fn contains(&self, session_id: &SessionId) -> bool {
        let orders = self.orders.read().await;
        orders.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Waits for exclusive access to one session. Other sessions are not
    /// affected. Access is released when the guard is dropped.
    ///
    /// Cancelling the wait (a dropped request future) still prunes the slot.
    pub async fn lock(&self, session_id: &SessionId) -> SessionGuard {
        let slot = {
            let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(session_id.clone()).or_default())
        };
        // The pending wait owns `slot` and is dropped before `pending` on cancel.
        let mut pending = SessionGuard {
            session_id: session_id.clone(),
            guard: None,
            locks: Arc::clone(&self.locks),
        };
        pending.guard = Some(slot.lock_owned().await);
        pending
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct SessionGuard {
    session_id: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
}

impl SessionGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Only the table still references the slot: nobody holds or awaits it.
        let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = table.get(&self.session_id).is_some_and(|slot| Arc::strong_count(slot) == 1);
        if idle {
            table.remove(&self.session_id);
        }
    }
}
