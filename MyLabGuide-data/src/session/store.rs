use async_trait::async_trait;
use chrono::Duration;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::reference::Gender;
use crate::models::session::WizardSession;
use crate::session::errors::SessionStoreError;

/// Idle lifetime applied when no explicit TTL is configured.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 1800;

/// Storage abstraction for wizard sessions.
///
/// Implementations are shared across handlers behind an `Arc`, so every
/// method takes `&self` and returns owned snapshots.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Creates a new session and returns it.
    async fn create(
        &self,
        age: Option<u32>,
        gender: Option<Gender>,
    ) -> Result<WizardSession, SessionStoreError>;

    /// Fetches a live session. Expired sessions are dropped and read as
    /// absent.
    async fn get(&self, id: Uuid) -> Result<Option<WizardSession>, SessionStoreError>;

    /// Replaces the demographic answers of an existing session.
    async fn set_demographics(
        &self,
        id: Uuid,
        age: u32,
        gender: Gender,
    ) -> Result<WizardSession, SessionStoreError>;

    /// Merges laboratory values into an existing session.
    async fn merge_values(
        &self,
        id: Uuid,
        values: IndexMap<String, f64>,
    ) -> Result<WizardSession, SessionStoreError>;

    /// Removes a session. Removing an absent session is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), SessionStoreError>;

    /// Number of live sessions. Expired entries are swept out first.
    async fn count(&self) -> Result<usize, SessionStoreError>;
}

/// In-memory session store backed by a mutex-guarded map.
///
/// Sessions expire lazily: an expired entry is removed the next time it
/// is touched, there is no background sweeper.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, WizardSession>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    /// Creates an empty store whose sessions expire after `ttl` of
    /// inactivity.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// The configured idle lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, WizardSession>>, SessionStoreError> {
        self.sessions
            .lock()
            .map_err(|e| SessionStoreError::MutexLock(e.to_string()))
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_SESSION_TTL_SECS))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    #[instrument(skip(self))]
    async fn create(
        &self,
        age: Option<u32>,
        gender: Option<Gender>,
    ) -> Result<WizardSession, SessionStoreError> {
        let session = WizardSession::new(age, gender);
        let mut sessions = self.lock()?;
        sessions.insert(session.id, session.clone());
        debug!(session_id = %session.id, "created wizard session");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<WizardSession>, SessionStoreError> {
        let mut sessions = self.lock()?;
        match sessions.get(&id) {
            Some(session) if session.is_expired(self.ttl) => {
                sessions.remove(&id);
                debug!(session_id = %id, "dropped expired wizard session");
                Ok(None)
            }
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn set_demographics(
        &self,
        id: Uuid,
        age: u32,
        gender: Gender,
    ) -> Result<WizardSession, SessionStoreError> {
        let mut sessions = self.lock()?;
        match sessions.get_mut(&id) {
            Some(session) if session.is_expired(self.ttl) => {
                sessions.remove(&id);
                Err(SessionStoreError::NotFound(id))
            }
            Some(session) => {
                session.set_demographics(age, gender);
                debug!(session_id = %id, "updated session demographics");
                Ok(session.clone())
            }
            None => Err(SessionStoreError::NotFound(id)),
        }
    }

    #[instrument(skip(self, values))]
    async fn merge_values(
        &self,
        id: Uuid,
        values: IndexMap<String, f64>,
    ) -> Result<WizardSession, SessionStoreError> {
        let mut sessions = self.lock()?;
        match sessions.get_mut(&id) {
            Some(session) if session.is_expired(self.ttl) => {
                sessions.remove(&id);
                warn!(session_id = %id, "values submitted to an expired session");
                Err(SessionStoreError::NotFound(id))
            }
            Some(session) => {
                session.merge_values(values);
                debug!(
                    session_id = %id,
                    value_count = session.values.len(),
                    "merged laboratory values into session"
                );
                Ok(session.clone())
            }
            None => Err(SessionStoreError::NotFound(id)),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), SessionStoreError> {
        let mut sessions = self.lock()?;
        if sessions.remove(&id).is_some() {
            debug!(session_id = %id, "deleted wizard session");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> Result<usize, SessionStoreError> {
        let mut sessions = self.lock()?;
        let ttl = self.ttl;
        sessions.retain(|_, session| !session.is_expired(ttl));
        Ok(sessions.len())
    }
}
