//! In-memory session store
//!
//! Each session is an append-only sequence of messages plus lifecycle
//! stamps. The store is the only shared mutable state in the system:
//! - mutation happens exclusively through `append`/`append_all`
//! - a per-session turn lock serializes turns touching the same id
//! - sessions disappear only through eviction (idle TTL or capacity),
//!   and an in-flight turn observes that as `SessionError::NotFound`
//!
//! Turn operations carry the lock handle they acquired at `get_or_create`.
//! If the session is evicted and recreated while a turn is in flight, the
//! recreated entry holds a different lock, so the stale turn's reads and
//! writes are rejected instead of landing in the new conversation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use thiserror::Error;

use crate::config::SessionConfig;
use crate::types::Message;

/// Serializes turns for one session; held across the whole turn
pub type TurnLock = Arc<tokio::sync::Mutex<()>>;

/// Errors raised by session store operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session does not exist: never created, or already evicted
    #[error("session `{id}` not found")]
    NotFound { id: String },
}

impl SessionError {
    /// Create a not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        SessionError::NotFound { id: id.into() }
    }
}

/// One conversation: ordered messages plus lifecycle stamps
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub created_at: Instant,
    pub last_activity: Instant,
}

impl Session {
    fn new(id: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }
}

struct SessionEntry {
    session: Session,
    turn_lock: TurnLock,
}

impl SessionEntry {
    fn new(id: &str) -> Self {
        Self {
            session: Session::new(id),
            turn_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

/// In-memory store of conversations keyed by opaque session id
pub struct SessionStore {
    config: SessionConfig,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the turn lock for a session, creating the session if absent
    ///
    /// Idempotent: calling this for an existing session refreshes its
    /// activity stamp and returns the same lock. Creating a session beyond
    /// the configured capacity evicts the least recently active one.
    pub fn get_or_create(&self, id: &str) -> TurnLock {
        let mut sessions = self.sessions.lock();
        let entry = sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionEntry::new(id));
        entry.session.last_activity = Instant::now();
        let lock = Arc::clone(&entry.turn_lock);
        evict_over_capacity(&mut sessions, self.config.max_sessions);
        lock
    }

    /// Append one message to a session's history
    ///
    /// `lock` must be the turn lock this turn obtained from `get_or_create`;
    /// a stale hold on an evicted-and-recreated session is rejected.
    pub fn append(&self, id: &str, lock: &TurnLock, message: Message) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock();
        let entry = live_entry(&mut sessions, id, lock)?;
        entry.session.messages.push(message);
        entry.session.last_activity = Instant::now();
        Ok(())
    }

    /// Append a batch of messages; all-or-nothing
    ///
    /// Either every message lands, in order, or the session was already gone
    /// and none of them do.
    pub fn append_all(
        &self,
        id: &str,
        lock: &TurnLock,
        messages: Vec<Message>,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock();
        let entry = live_entry(&mut sessions, id, lock)?;
        entry.session.messages.extend(messages);
        entry.session.last_activity = Instant::now();
        Ok(())
    }

    /// Full ordered history of a session, for a turn holding its lock
    pub fn history(&self, id: &str, lock: &TurnLock) -> Result<Vec<Message>, SessionError> {
        let mut sessions = self.sessions.lock();
        let entry = live_entry(&mut sessions, id, lock)?;
        Ok(entry.session.messages.clone())
    }

    /// Full ordered history of a session, without a turn lock
    ///
    /// Read-only inspection for tests and operational surfaces; turns use
    /// `history` so a recreated session cannot be mistaken for the original.
    pub fn snapshot(&self, id: &str) -> Result<Vec<Message>, SessionError> {
        let sessions = self.sessions.lock();
        let entry = sessions.get(id).ok_or_else(|| SessionError::not_found(id))?;
        Ok(entry.session.messages.clone())
    }

    /// Whether a session currently exists
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.lock().contains_key(id)
    }

    /// Remove one session explicitly
    pub fn evict(&self, id: &str) -> bool {
        let removed = self.sessions.lock().remove(id);
        if let Some(entry) = &removed {
            tracing::info!(
                session = %id,
                age_secs = entry.session.created_at.elapsed().as_secs(),
                messages = entry.session.messages.len(),
                "evicted session"
            );
        }
        removed.is_some()
    }

    /// Evict sessions idle beyond the TTL, then enforce the capacity bound
    ///
    /// Returns the number of sessions removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();

        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, e)| now.duration_since(e.session.last_activity) > self.config.ttl)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            if let Some(entry) = sessions.remove(id) {
                tracing::info!(
                    session = %id,
                    age_secs = entry.session.created_at.elapsed().as_secs(),
                    "evicted idle session"
                );
            }
        }

        expired.len() + evict_over_capacity(&mut sessions, self.config.max_sessions)
    }

    /// Drop every session; used on shutdown
    pub fn clear(&self) -> usize {
        let mut sessions = self.sessions.lock();
        let drained = sessions.len();
        sessions.clear();
        drained
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether the store has no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Run the eviction sweep on the configured interval
    ///
    /// Consumes an `Arc` handle; clone one first to keep using the store.
    pub fn spawn_sweeper(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.sweep_interval);
            loop {
                interval.tick().await;
                let evicted = self.sweep();
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = self.len(), "session sweep finished");
                }
            }
        })
    }
}

/// Look up a session, rejecting a turn lock from a prior incarnation
fn live_entry<'a>(
    sessions: &'a mut HashMap<String, SessionEntry>,
    id: &str,
    lock: &TurnLock,
) -> Result<&'a mut SessionEntry, SessionError> {
    let entry = sessions
        .get_mut(id)
        .ok_or_else(|| SessionError::not_found(id))?;
    if !Arc::ptr_eq(&entry.turn_lock, lock) {
        return Err(SessionError::not_found(id));
    }
    Ok(entry)
}

/// Remove least-recently-active sessions until the map fits the capacity
fn evict_over_capacity(sessions: &mut HashMap<String, SessionEntry>, max: usize) -> usize {
    let mut evicted = 0;
    while sessions.len() > max {
        let oldest = sessions
            .iter()
            .min_by_key(|(_, e)| e.session.last_activity)
            .map(|(id, _)| id.clone());
        match oldest {
            Some(id) => {
                if let Some(entry) = sessions.remove(&id) {
                    tracing::info!(
                        session = %id,
                        age_secs = entry.session.created_at.elapsed().as_secs(),
                        "evicted session over capacity"
                    );
                    evicted += 1;
                }
            }
            None => break,
        }
    }
    evicted
}
