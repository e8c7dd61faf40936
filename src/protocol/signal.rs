//! Peer-connection signaling message types
//!
//! Offers, answers and network-path candidates are relayed between the two
//! session participants without inspection. The payload stays an opaque JSON
//! value end to end.

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// Which side of a call session a message comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    /// The party that requested the consultation
    Requester,
    /// The provider assigned to the session
    Provider,
}

impl PartyRole {
    /// The other side of the session
    pub fn opposite(self) -> Self {
        match self {
            PartyRole::Requester => PartyRole::Provider,
            PartyRole::Provider => PartyRole::Requester,
        }
    }
}

impl std::fmt::Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartyRole::Requester => write!(f, "requester"),
            PartyRole::Provider => write!(f, "provider"),
        }
    }
}

/// Kind of handshake message being relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Session description offer
    Offer,
    /// Session description answer
    Answer,
    /// Network-path candidate
    Candidate,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Offer => write!(f, "offer"),
            SignalKind::Answer => write!(f, "answer"),
            SignalKind::Candidate => write!(f, "candidate"),
        }
    }
}

/// One handshake message in flight through the relay
///
/// Not stored anywhere: routed to the opposite role's handle and discarded.
#[derive(Debug, Clone)]
pub struct SignalMessage {
    pub kind: SignalKind,
    pub session_id: SessionId,
    pub from_role: PartyRole,
    /// Opaque payload, forwarded unmodified
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_role() {
        assert_eq!(PartyRole::Requester.opposite(), PartyRole::Provider);
        assert_eq!(PartyRole::Provider.opposite(), PartyRole::Requester);
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&PartyRole::Requester).unwrap(),
            "\"requester\""
        );
        let role: PartyRole = serde_json::from_str("\"provider\"").unwrap();
        assert_eq!(role, PartyRole::Provider);
    }
}
