//! Session Store
//!
//! Holds every live `SessionState`, one async mutex per session id. A turn
//! holds its session's lock from lookup to reply, so messages for the same id
//! are processed one at a time while different ids proceed in parallel.

use crate::session::SessionState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Exclusive access to one session for the duration of a turn.
pub type SessionGuard = OwnedMutexGuard<SessionState>;

struct Slot {
    state: Arc<Mutex<SessionState>>,
    last_seen: Instant,
}

/// Keyed table of sessions with optional idle eviction.
#[derive(Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<String, Slot>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    /// A store that keeps sessions for the lifetime of the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose sessions may be evicted after `ttl` without activity.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Locks the session for `session_id`, creating it on first use.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        let state = {
            let mut slots = self.slots.lock().await;
            let slot = slots.entry(session_id.to_string()).or_insert_with(|| {
                debug!(session_id, "Creating new session");
                Slot {
                    state: Arc::new(Mutex::new(SessionState::new())),
                    last_seen: Instant::now(),
                }
            });
            slot.last_seen = Instant::now();
            slot.state.clone()
        };
        state.lock_owned().await
    }

    /// Returns a copy of the session, waiting for any in-flight turn on it.
    pub async fn snapshot(&self, session_id: &str) -> Option<SessionState> {
        let state = self.slots.lock().await.get(session_id)?.state.clone();
        let guard = state.lock().await;
        Some(guard.clone())
    }

    /// Drops sessions idle for longer than the TTL.
    ///
    /// A session that a turn currently holds or waits on is never evicted.
    pub async fn evict_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| {
            Arc::strong_count(&slot.state) > 1 || slot.last_seen.elapsed() < ttl
        });
        let evicted = before - slots.len();
        if evicted > 0 {
            debug!(evicted, remaining = slots.len(), "Evicted idle sessions");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
