//! Call-session store implementation
//!
//! Create/read/update/delete for live call sessions. A session only exists
//! between creation by the matcher and its terminal transition; compound
//! check-then-mutate operations run under one write lock so a session cannot
//! change phase between the check and the update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::records::EmergencyId;
use crate::registry::ProviderId;

use super::error::SessionError;
use super::state::{CallSession, SessionId, UserId};

/// Process-wide store of live call sessions
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, CallSession>>,
    next_id: AtomicU64,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new ringing session and return a snapshot of it
    pub async fn create(
        &self,
        emergency_id: EmergencyId,
        provider_id: ProviderId,
        provider_name: String,
        user_id: UserId,
    ) -> CallSession {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let session = CallSession::new(id, emergency_id, provider_id, provider_name, user_id);

        self.sessions.write().await.insert(id, session.clone());

        tracing::info!(
            session_id = %id,
            provider_id = %session.provider_id,
            user_id = %session.user_id,
            "Session created"
        );

        session
    }

    /// Snapshot of a session by id
    pub async fn get(&self, id: SessionId) -> Option<CallSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Transition a session to accepted
    ///
    /// Fails if the session is absent, past ringing, or assigned to a
    /// different provider. Returns the updated snapshot on success.
    pub async fn accept(
        &self,
        id: SessionId,
        provider_id: &ProviderId,
    ) -> Result<CallSession, SessionError> {
        let mut sessions = self.sessions.write().await;

        let session = sessions
            .get_mut(&id)
            .ok_or(SessionError::UnknownSession(id))?;

        if &session.provider_id != provider_id {
            return Err(SessionError::ProviderMismatch(id));
        }
        if !session.accept() {
            return Err(SessionError::NotRinging(id));
        }

        Ok(session.clone())
    }

    /// Remove a session unconditionally
    pub async fn remove(&self, id: SessionId) -> Option<CallSession> {
        self.sessions.write().await.remove(&id)
    }

    /// Remove a session only while it is still ringing
    pub async fn remove_if_ringing(&self, id: SessionId) -> Option<CallSession> {
        let mut sessions = self.sessions.write().await;

        if sessions.get(&id).map(|s| s.is_ringing()) == Some(true) {
            sessions.remove(&id)
        } else {
            None
        }
    }

    /// Remove every session involving one of the given providers or the user
    ///
    /// Disconnect cleanup: a vanished party takes its sessions with it.
    pub async fn remove_for_participants(
        &self,
        providers: &[ProviderId],
        user: Option<&UserId>,
    ) -> Vec<CallSession> {
        let mut sessions = self.sessions.write().await;

        let doomed: Vec<SessionId> = sessions
            .values()
            .filter(|s| {
                providers.contains(&s.provider_id) || user.map(|u| u == &s.user_id).unwrap_or(false)
            })
            .map(|s| s.id)
            .collect();

        doomed
            .into_iter()
            .filter_map(|id| sessions.remove(&id))
            .collect()
    }

    /// Sessions still ringing past the given age
    pub async fn expired_ringing(&self, timeout: Duration) -> Vec<SessionId> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_ringing() && s.created_at.elapsed() > timeout)
            .map(|s| s.id)
            .collect()
    }

    /// Number of live sessions
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
