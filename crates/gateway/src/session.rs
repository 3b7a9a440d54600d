//! Server-side session storage.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

pub type SessionResult<T> = Result<T, SessionStoreError>;

/// A live login session. Carries only the provider id; the user record is
/// reloaded from the directory whenever it is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Token issued by the backend of record, when the login was relayed.
    pub backend_token: Option<String>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a provider id
    fn create(&self, provider_id: &str, backend_token: Option<String>) -> SessionResult<Session>;

    /// Get a live session. Expired sessions are dropped and reported as absent.
    fn get(&self, session_id: &str) -> SessionResult<Option<Session>>;

    /// Destroy a session. Destroying an unknown session is not an error.
    fn destroy(&self, session_id: &str) -> SessionResult<()>;
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn read(&self) -> SessionResult<RwLockReadGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .read()
            .map_err(|_| SessionStoreError::Unavailable("session map lock poisoned".to_string()))
    }

    fn write(&self) -> SessionResult<RwLockWriteGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .write()
            .map_err(|_| SessionStoreError::Unavailable("session map lock poisoned".to_string()))
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, provider_id: &str, backend_token: Option<String>) -> SessionResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            provider_id: provider_id.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
            backend_token,
        };

        let mut sessions = self.write()?;
        // Expired sessions are swept whenever a new one is created.
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &str) -> SessionResult<Option<Session>> {
        let now = Utc::now();
        let session = self.read()?.get(session_id).cloned();
        match session {
            Some(s) if s.is_expired(now) => {
                self.write()?.remove(session_id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn destroy(&self, session_id: &str) -> SessionResult<()> {
        self.write()?.remove(session_id);
        Ok(())
    }
}
