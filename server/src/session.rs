//! In-memory per-client session store holding each client's todo lists.
//!
//! # Architecture
//!
//! The store maps opaque session tokens to a collection of [`TodoList`]s.
//! A session is created on a client's first request and lives until it has
//! been idle for the configured TTL. Nothing is persisted; restarting the
//! server drops every session.
//!
//! The store is an ordinary value owned by the application state and passed
//! explicitly to whoever needs it. Cloning it is cheap and shares the same
//! underlying map.
//!
//! # Token Format
//!
//! Session tokens are 32 bytes of random data, base64-url encoded without
//! padding, resulting in 43 character tokens.
//!
//! # Thread Safety
//!
//! All reads and writes of a session's lists go through
//! [`SessionStore::with_lists`], which holds the store's write lock for the
//! duration of the callback. Concurrent requests against the same session
//! therefore see each other's changes in order.
//!
//! # Example
//!
//! ```rust
//! use todolists_server::session::{SessionStore, SessionStoreConfig};
//! use todolists_server::types::TodoList;
//!
//! let store = SessionStore::new(SessionStoreConfig::default());
//! let token = store.create_session().expect("store has capacity");
//!
//! store
//!     .with_lists(&token, |lists| lists.push(TodoList::new("Groceries")))
//!     .expect("session is live");
//!
//! let count = store.with_lists(&token, |lists| lists.len()).unwrap();
//! assert_eq!(count, 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::types::TodoList;

/// Default idle TTL (1 hour).
pub const DEFAULT_IDLE_TTL_SECS: u64 = 3600;

/// Default maximum number of sessions.
pub const DEFAULT_MAX_CAPACITY: usize = 10_000;

/// Size of the random token in bytes.
const TOKEN_BYTES: usize = 32;

/// Expected length of base64-url encoded token (43 characters).
pub const TOKEN_LENGTH: usize = 43;

/// Errors that can occur during session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session store has reached maximum capacity.
    #[error("session store at maximum capacity ({max_capacity} sessions)")]
    AtCapacity {
        /// The maximum number of sessions allowed.
        max_capacity: usize,
    },

    /// The session token was not found or has expired.
    #[error("session not found or expired")]
    NotFound,
}

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// Maximum number of concurrent sessions.
    pub max_capacity: usize,

    /// How long a session survives without being accessed.
    pub idle_ttl: Duration,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            idle_ttl: Duration::from_secs(DEFAULT_IDLE_TTL_SECS),
        }
    }
}

impl SessionStoreConfig {
    pub fn new(max_capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            max_capacity,
            idle_ttl,
        }
    }
}

/// One client's session data.
#[derive(Debug, Clone)]
struct Session {
    lists: Vec<TodoList>,
    created_at: Instant,
    last_access: Instant,
}

impl Session {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            lists: Vec::new(),
            created_at: now,
            last_access: now,
        }
    }

    fn is_expired(&self, idle_ttl: Duration) -> bool {
        self.last_access.elapsed() >= idle_ttl
    }

    fn touch(&mut self) {
        self.last_access = Instant::now();
    }
}

/// Thread-safe in-memory session store.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    config: SessionStoreConfig,
}

impl SessionStore {
    /// Creates a new, empty session store.
    pub fn new(config: SessionStoreConfig) -> Self {
        debug!(
            max_capacity = config.max_capacity,
            idle_ttl_secs = config.idle_ttl.as_secs(),
            "Creating new session store"
        );
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    // A panic inside a `with_lists` callback poisons the lock. The map itself
    // is still structurally valid, so keep serving.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a new session with no lists and returns its token.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AtCapacity`] if the store is full.
    pub fn create_session(&self) -> Result<String, SessionError> {
        // Generate token first (outside of lock)
        let token = generate_session_token();

        let mut sessions = self.write();

        if sessions.len() >= self.config.max_capacity {
            warn!(
                capacity = sessions.len(),
                max_capacity = self.config.max_capacity,
                "Session store at capacity, rejecting new session"
            );
            return Err(SessionError::AtCapacity {
                max_capacity: self.config.max_capacity,
            });
        }

        sessions.insert(token.clone(), Session::new());
        trace!(session_count = sessions.len(), "Created new session");

        Ok(token)
    }

    /// Returns `true` if `token` names a live session.
    ///
    /// An expired session found here is removed.
    pub fn contains(&self, token: &str) -> bool {
        if token.len() != TOKEN_LENGTH {
            trace!(token_len = token.len(), "Invalid token length");
            return false;
        }

        {
            let sessions = self.read();
            match sessions.get(token) {
                Some(session) if !session.is_expired(self.config.idle_ttl) => return true,
                Some(_) => {}
                None => return false,
            }
        }

        self.write().remove(token);
        trace!("Removed expired session during lookup");
        false
    }

    /// Resets the idle timer of the session named by `token`.
    ///
    /// Returns `false` if the token is unknown or the session had already
    /// expired, in which case it is removed.
    pub fn touch(&self, token: &str) -> bool {
        if token.len() != TOKEN_LENGTH {
            return false;
        }
        self.with_lists(token, |_| ()).is_ok()
    }

    /// Runs `f` against the lists of the session named by `token`.
    ///
    /// The store's write lock is held while `f` runs, so `f` must not call
    /// back into the store. Accessing a session resets its idle timer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the token is unknown or the
    /// session has expired.
    pub fn with_lists<R>(
        &self,
        token: &str,
        f: impl FnOnce(&mut Vec<TodoList>) -> R,
    ) -> Result<R, SessionError> {
        let mut sessions = self.write();

        let session = sessions.get_mut(token).ok_or(SessionError::NotFound)?;
        if session.is_expired(self.config.idle_ttl) {
            sessions.remove(token);
            trace!("Removed expired session during access");
            return Err(SessionError::NotFound);
        }

        session.touch();
        Ok(f(&mut session.lists))
    }

    /// Removes a session, returning its lists if it existed.
    pub fn remove_session(&self, token: &str) -> Option<Vec<TodoList>> {
        let removed = self.write().remove(token);
        if let Some(ref session) = removed {
            trace!(
                age_secs = session.created_at.elapsed().as_secs(),
                list_count = session.lists.len(),
                "Session removed"
            );
        }
        removed.map(|session| session.lists)
    }

    /// Current number of sessions, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of sessions that have expired but are still stored.
    pub fn count_expired(&self) -> usize {
        self.read()
            .values()
            .filter(|s| s.is_expired(self.config.idle_ttl))
            .count()
    }

    pub fn max_capacity(&self) -> usize {
        self.config.max_capacity
    }

    /// Removes all expired sessions and returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.write();
        let initial_len = sessions.len();

        sessions.retain(|_, session| !session.is_expired(self.config.idle_ttl));

        let removed = initial_len - sessions.len();
        if removed > 0 {
            debug!(
                removed_count = removed,
                remaining_count = sessions.len(),
                "Cleaned up expired sessions"
            );
        }

        removed
    }

    /// Clears all sessions from the store.
    pub fn clear(&self) {
        let mut sessions = self.write();
        let count = sessions.len();
        sessions.clear();
        debug!(cleared_count = count, "Cleared all sessions");
    }

    /// Spawns a background task that sweeps expired sessions every
    /// `cleanup_interval`.
    ///
    /// The task runs until the returned handle is aborted.
    pub fn spawn_cleanup_task(&self, cleanup_interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(cleanup_interval);

            loop {
                interval.tick().await;
                store.cleanup_expired();
            }
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionStoreConfig::default())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session_count", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Generates a random session token.
fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
