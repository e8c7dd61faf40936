//! Call-session record and state machine
//!
//! A session moves `Ringing -> Accepted`; rejection and ending are terminal
//! and remove the record from the store, so neither is a stored state.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::records::EmergencyId;
use crate::registry::ProviderId;

/// Unique identifier for a call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        SessionId(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call_{}", self.0)
    }
}

/// Identity of a requesting party
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create an id from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Live phase of a call session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// Provider notified, waiting for accept/reject
    Ringing,
    /// Provider accepted; parties exchange handshake messages
    Accepted,
}

impl std::fmt::Display for CallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallPhase::Ringing => write!(f, "ringing"),
            CallPhase::Accepted => write!(f, "accepted"),
        }
    }
}

/// The stateful record of one patient-provider pairing
#[derive(Debug, Clone)]
pub struct CallSession {
    pub id: SessionId,
    pub emergency_id: EmergencyId,
    pub provider_id: ProviderId,
    /// Cached for notifications so lookups stay out of the hot path
    pub provider_name: String,
    pub user_id: UserId,
    pub phase: CallPhase,
    pub created_at: Instant,
}

impl CallSession {
    pub(crate) fn new(
        id: SessionId,
        emergency_id: EmergencyId,
        provider_id: ProviderId,
        provider_name: String,
        user_id: UserId,
    ) -> Self {
        Self {
            id,
            emergency_id,
            provider_id,
            provider_name,
            user_id,
            phase: CallPhase::Ringing,
            created_at: Instant::now(),
        }
    }

    /// Whether the session is still waiting on the provider
    pub fn is_ringing(&self) -> bool {
        self.phase == CallPhase::Ringing
    }

    /// Transition `Ringing -> Accepted`; false if not ringing
    pub fn accept(&mut self) -> bool {
        if self.phase == CallPhase::Ringing {
            self.phase = CallPhase::Accepted;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CallSession {
        CallSession::new(
            SessionId(1),
            EmergencyId::new("em_1"),
            ProviderId::new("doc1"),
            "Dr. Sarah Johnson".to_string(),
            UserId::new("u1"),
        )
    }

    #[test]
    fn test_new_session_is_ringing() {
        let s = session();
        assert!(s.is_ringing());
        assert_eq!(s.phase, CallPhase::Ringing);
    }

    #[test]
    fn test_accept_transition() {
        let mut s = session();

        assert!(s.accept());
        assert_eq!(s.phase, CallPhase::Accepted);

        // Accepting twice is rejected by the state machine
        assert!(!s.accept());
        assert_eq!(s.phase, CallPhase::Accepted);
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId(42).to_string(), "call_42");
    }
}
