use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::session::SessionId;

/// One async mutex per session id, so a session has at most one turn in flight.
/// Idle slots are pruned on the next acquisition.
#[derive(Default)]
pub struct SessionLocks {
    slots: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(id.clone()).or_default())
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_session_is_serialized() {
        let locks = Arc::new(SessionLocks::new());
        let id = SessionId::generate();

        let guard = locks.acquire(&id).await;
        let waiter = {
            let locks = Arc::clone(&locks);
            let id = id.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _first = locks.acquire(&SessionId::generate()).await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&SessionId::generate()),
        )
        .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_idle_slots_are_pruned() {
        let locks = SessionLocks::new();
        let first = SessionId::generate();
        drop(locks.acquire(&first).await);

        let second: SessionId = "0000000000000000000000ff".parse().unwrap();
        let _held = locks.acquire(&second).await;
        assert_eq!(locks.tracked(), 1);
    }
}
