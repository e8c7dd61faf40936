//! Provider identity and record types

use serde::{Deserialize, Serialize};

use crate::geo::Location;
use crate::notify::ClientHandle;

/// Unique identifier for a provider (doctor or ambulance)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Create an id from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of provider this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Doctor,
    Ambulance,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Doctor => write!(f, "doctor"),
            ProviderKind::Ambulance => write!(f, "ambulance"),
        }
    }
}

/// One provider known to the registry
///
/// The handle is present iff the provider is currently connected. A provider
/// without a handle is never assignable, whatever its availability flag says.
#[derive(Debug, Clone)]
pub struct Provider {
    pub id: ProviderId,
    pub kind: ProviderKind,
    /// Display name (doctor name or ambulance unit label)
    pub name: String,
    /// Medical specialty, doctors only
    pub specialty: Option<String>,
    pub location: Location,
    pub available: bool,
    pub handle: Option<ClientHandle>,
}

impl Provider {
    /// Seed a doctor record
    pub fn doctor(
        id: impl Into<String>,
        name: impl Into<String>,
        specialty: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            id: ProviderId::new(id),
            kind: ProviderKind::Doctor,
            name: name.into(),
            specialty: Some(specialty.into()),
            location,
            available: true,
            handle: None,
        }
    }

    /// Seed an ambulance record
    pub fn ambulance(id: impl Into<String>, name: impl Into<String>, location: Location) -> Self {
        Self {
            id: ProviderId::new(id),
            kind: ProviderKind::Ambulance,
            name: name.into(),
            specialty: None,
            location,
            available: true,
            handle: None,
        }
    }

    /// Whether the provider can receive notifications right now
    pub fn is_reachable(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the matcher may assign this provider
    pub fn is_assignable(&self) -> bool {
        self.available && self.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ClientHandle, HandleId};

    #[test]
    fn test_seeded_provider_is_not_assignable() {
        let doc = Provider::doctor(
            "doc1",
            "Dr. Sarah Johnson",
            "Emergency Medicine",
            Location::new(40.7128, -74.006),
        );

        // Available but unreachable until a connection registers
        assert!(doc.available);
        assert!(!doc.is_reachable());
        assert!(!doc.is_assignable());
    }

    #[test]
    fn test_connected_provider_is_assignable() {
        let (handle, _rx) = ClientHandle::channel(HandleId(1));
        let mut amb = Provider::ambulance("amb1", "Ambulance Unit 1", Location::new(0.0, 0.0));
        amb.handle = Some(handle);

        assert!(amb.is_assignable());
        assert!(amb.specialty.is_none());
    }
}
