//! Crate-wide error types
//!
//! Most dispatch operations deliberately do not fail: handlers no-op on
//! missing state (a session that already ended, a provider that never
//! registered) and log instead of surfacing an error. The variants here are
//! the ones callers can actually observe.

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Error type for dispatch operations
#[derive(Debug)]
pub enum DispatchError {
    /// No provider of the requested kind is connected and available
    NoProviderAvailable,
    /// I/O error from the server boundary (bind/accept/socket)
    Io(std::io::Error),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::NoProviderAvailable => write!(f, "No provider available"),
            DispatchError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(e: std::io::Error) -> Self {
        DispatchError::Io(e)
    }
}
