/// Live sessions keyed by user, with idle eviction
///
/// Sessions exist only in memory. A background reaper forgets the ones
/// nobody has touched within the configured timeout.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::EditorConfig;
use crate::raster::EncodedImage;

use super::data::SessionId;
use super::session::EditSession;

/// A session plus the bookkeeping the store needs for eviction
#[derive(Debug)]
pub struct SessionSlot {
    pub session: EditSession,
    last_active: DateTime<Utc>,
}

impl SessionSlot {
    fn new(history_limit: Option<usize>) -> Self {
        Self {
            session: EditSession::new(history_limit),
            last_active: Utc::now(),
        }
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }
}

/// Exclusive access to one session for the duration of a transition
pub type SessionGuard = OwnedMutexGuard<SessionSlot>;

type SessionHandle = Arc<Mutex<SessionSlot>>;

/// The SessionStore owns every live editing session, keyed by user.
///
/// Each session sits behind its own mutex, so one user's events run strictly
/// one after another while different users proceed in parallel. Nothing is
/// persisted: evicting a session simply forgets it.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    history_limit: Option<usize>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(history_limit: Option<usize>, idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            history_limit,
            idle_timeout,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.history_limit, config.idle_timeout())
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Handle to the existing session for `id`, or a freshly created empty one
    pub async fn get_or_create(&self, id: SessionId) -> Arc<Mutex<SessionSlot>> {
        if let Some(handle) = self.sessions.read().await.get(&id) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(id).or_insert_with(|| {
            debug!(session = %id, "session created");
            Arc::new(Mutex::new(SessionSlot::new(self.history_limit)))
        });
        Arc::clone(handle)
    }

    /// Handle to an existing session, without creating one
    pub async fn get(&self, id: SessionId) -> Option<Arc<Mutex<SessionSlot>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Lock the session for `id` (creating it if needed) and mark it active
    ///
    /// Waits behind any in-flight operation on the same session.
    pub async fn checkout(&self, id: SessionId) -> SessionGuard {
        let mut slot = self.get_or_create(id).await.lock_owned().await;
        slot.touch(Utc::now());
        slot
    }

    /// New upload: replace the committed image and reset history and menus
    pub async fn replace(&self, id: SessionId, image: EncodedImage) {
        let mut slot = self.checkout(id).await;
        slot.session.replace_image(image);
    }

    /// Forget a session. Returns false if it did not exist.
    pub async fn remove(&self, id: SessionId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop every session idle for longer than the timeout as of `now`
    ///
    /// Sessions that are checked out or locked are skipped this round.
    /// Returns the number of sessions evicted.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, handle| {
            // Someone outside the map holds a handle: in use
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            let Ok(slot) = handle.try_lock() else {
                return true;
            };
            let idle = now - slot.last_active;
            if idle > self.idle_timeout {
                debug!(session = %id, idle_secs = idle.num_seconds(), "evicting idle session");
                false
            } else {
                true
            }
        });

        before - sessions.len()
    }

    /// Run `evict_idle` every `every` until the returned task is aborted
    pub fn spawn_reaper(self: &Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(Utc::now()).await;
                if evicted > 0 {
                    let remaining = store.len().await;
                    info!(evicted, remaining, "idle sessions evicted");
                }
            }
        })
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("history_limit", &self.history_limit)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
