//! Session store error types

use super::state::SessionId;

/// Error type for session store operations
///
/// These are never surfaced to a connected party: sessions legitimately
/// disappear (already rejected, already ended), so callers log and no-op.
#[derive(Debug, Clone)]
pub enum SessionError {
    /// No session with this id
    UnknownSession(SessionId),
    /// Session exists but is past ringing
    NotRinging(SessionId),
    /// Accepting provider is not the one assigned to the session
    ProviderMismatch(SessionId),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::UnknownSession(id) => write!(f, "Unknown session: {}", id),
            SessionError::NotRinging(id) => write!(f, "Session not ringing: {}", id),
            SessionError::ProviderMismatch(id) => {
                write!(f, "Provider mismatch for session: {}", id)
            }
        }
    }
}

impl std::error::Error for SessionError {}
