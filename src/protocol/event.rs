//! Inbound events and outbound notifications
//!
//! Every message on the wire is one JSON object per line with an `event`
//! name and a `data` object. [`InboundEvent`] covers everything a connected
//! party may send; [`OutboundEvent`] covers everything the core pushes back.

use serde::{Deserialize, Serialize};

use crate::records::{Emergency, EmergencyId};
use crate::registry::ProviderId;
use crate::session::{SessionId, UserId};

use super::signal::{PartyRole, SignalKind};

/// Events consumed by the dispatch core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum InboundEvent {
    /// A provider announces itself on this connection
    #[serde(rename = "provider:register")]
    ProviderRegister { provider_id: ProviderId },

    /// Explicit availability update for a provider
    #[serde(rename = "provider:status")]
    ProviderStatus {
        provider_id: ProviderId,
        available: bool,
    },

    /// Provider location update, broadcast to everyone connected
    #[serde(rename = "provider:location")]
    ProviderLocation {
        provider_id: ProviderId,
        latitude: f64,
        longitude: f64,
    },

    /// A requester announces itself on this connection
    #[serde(rename = "user:register")]
    UserRegister { user_id: UserId },

    /// Create an emergency record
    #[serde(rename = "emergency:report")]
    EmergencyReport {
        user_id: UserId,
        latitude: f64,
        longitude: f64,
        description: String,
    },

    /// Ask for a doctor consultation for an existing emergency
    #[serde(rename = "consult:request")]
    ConsultRequest {
        emergency_id: EmergencyId,
        user_id: UserId,
        latitude: f64,
        longitude: f64,
    },

    /// Provider accepts a ringing call
    #[serde(rename = "call:accept")]
    CallAccept {
        session_id: SessionId,
        provider_id: ProviderId,
    },

    /// Provider rejects a ringing call
    #[serde(rename = "call:reject")]
    CallReject { session_id: SessionId },

    /// Either party ends a call
    #[serde(rename = "call:end")]
    CallEnd { session_id: SessionId },

    /// Handshake offer to relay to the opposite role
    #[serde(rename = "signal:offer")]
    SignalOffer {
        session_id: SessionId,
        from_role: PartyRole,
        payload: serde_json::Value,
    },

    /// Handshake answer to relay to the opposite role
    #[serde(rename = "signal:answer")]
    SignalAnswer {
        session_id: SessionId,
        from_role: PartyRole,
        payload: serde_json::Value,
    },

    /// Network-path candidate to relay to the opposite role
    #[serde(rename = "signal:candidate")]
    SignalCandidate {
        session_id: SessionId,
        from_role: PartyRole,
        payload: serde_json::Value,
    },
}

impl InboundEvent {
    /// Wire name of this event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::ProviderRegister { .. } => "provider:register",
            InboundEvent::ProviderStatus { .. } => "provider:status",
            InboundEvent::ProviderLocation { .. } => "provider:location",
            InboundEvent::UserRegister { .. } => "user:register",
            InboundEvent::EmergencyReport { .. } => "emergency:report",
            InboundEvent::ConsultRequest { .. } => "consult:request",
            InboundEvent::CallAccept { .. } => "call:accept",
            InboundEvent::CallReject { .. } => "call:reject",
            InboundEvent::CallEnd { .. } => "call:end",
            InboundEvent::SignalOffer { .. } => "signal:offer",
            InboundEvent::SignalAnswer { .. } => "signal:answer",
            InboundEvent::SignalCandidate { .. } => "signal:candidate",
        }
    }
}

/// Notifications produced by the dispatch core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEvent {
    /// Registration ack to the provider
    #[serde(rename = "provider:registered")]
    ProviderRegistered { provider_id: ProviderId },

    /// New emergency record, broadcast to everyone connected
    #[serde(rename = "emergency:reported")]
    EmergencyReported { emergency: Emergency },

    /// Incoming-call alert to the chosen provider
    #[serde(rename = "call:incoming")]
    IncomingCall {
        session_id: SessionId,
        emergency_id: EmergencyId,
        user_id: UserId,
        latitude: f64,
        longitude: f64,
    },

    /// A provider was found for the requester's consultation
    #[serde(rename = "consult:found")]
    ConsultFound {
        session_id: SessionId,
        provider_name: String,
    },

    /// No provider is available right now
    #[serde(rename = "consult:unavailable")]
    ConsultUnavailable { message: String },

    /// Accept ack to the provider
    #[serde(rename = "call:accepted")]
    CallAccepted { session_id: SessionId },

    /// The provider joined; sent to the requester
    #[serde(rename = "call:joined")]
    ProviderJoined {
        session_id: SessionId,
        provider_name: String,
        message: String,
    },

    /// The provider rejected the call; sent to the requester
    #[serde(rename = "call:rejected")]
    CallRejected { message: String },

    /// The session ended; sent to both parties
    #[serde(rename = "call:ended")]
    CallEnded { session_id: SessionId },

    /// Relayed handshake offer
    #[serde(rename = "signal:offer")]
    SignalOffer {
        session_id: SessionId,
        payload: serde_json::Value,
    },

    /// Relayed handshake answer
    #[serde(rename = "signal:answer")]
    SignalAnswer {
        session_id: SessionId,
        payload: serde_json::Value,
    },

    /// Relayed network-path candidate
    #[serde(rename = "signal:candidate")]
    SignalCandidate {
        session_id: SessionId,
        payload: serde_json::Value,
    },

    /// Provider location change, broadcast to everyone connected
    #[serde(rename = "provider:location-updated")]
    LocationUpdated {
        provider_id: ProviderId,
        latitude: f64,
        longitude: f64,
    },
}

impl OutboundEvent {
    /// Build the relayed form of a handshake message
    pub fn signal(kind: SignalKind, session_id: SessionId, payload: serde_json::Value) -> Self {
        match kind {
            SignalKind::Offer => OutboundEvent::SignalOffer {
                session_id,
                payload,
            },
            SignalKind::Answer => OutboundEvent::SignalAnswer {
                session_id,
                payload,
            },
            SignalKind::Candidate => OutboundEvent::SignalCandidate {
                session_id,
                payload,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_consult_request_wire_format() {
        let json = r#"{
            "event": "consult:request",
            "data": {
                "emergency_id": "em_1",
                "user_id": "u1",
                "latitude": 40.7128,
                "longitude": -74.006
            }
        }"#;

        let event: InboundEvent = serde_json::from_str(json).unwrap();
        match event {
            InboundEvent::ConsultRequest {
                emergency_id,
                user_id,
                latitude,
                ..
            } => {
                assert_eq!(emergency_id, EmergencyId::new("em_1"));
                assert_eq!(user_id, UserId::new("u1"));
                assert!((latitude - 40.7128).abs() < 1e-9);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_inbound_signal_payload_is_opaque() {
        let json = r#"{
            "event": "signal:offer",
            "data": {
                "session_id": 3,
                "from_role": "requester",
                "payload": {"sdp": "v=0...", "type": "offer"}
            }
        }"#;

        let event: InboundEvent = serde_json::from_str(json).unwrap();
        match event {
            InboundEvent::SignalOffer {
                session_id,
                from_role,
                payload,
            } => {
                assert_eq!(session_id, 3.into());
                assert_eq!(from_role, PartyRole::Requester);
                assert_eq!(payload["type"], "offer");
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_an_error() {
        let json = r#"{"event": "no:such-event", "data": {}}"#;
        assert!(serde_json::from_str::<InboundEvent>(json).is_err());
    }

    #[test]
    fn test_outbound_round_trip() {
        let event = OutboundEvent::ConsultFound {
            session_id: 1.into(),
            provider_name: "Dr. Sarah Johnson".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"consult:found\""));

        let back: OutboundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_outbound_signal_constructor() {
        let payload = serde_json::json!({"candidate": "candidate:0 1 UDP ..."});
        let event = OutboundEvent::signal(SignalKind::Candidate, 9.into(), payload.clone());

        match event {
            OutboundEvent::SignalCandidate {
                session_id,
                payload: p,
            } => {
                assert_eq!(session_id, 9.into());
                assert_eq!(p, payload);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }
}
