//! Wire protocol types
//!
//! The dispatch core is transport-agnostic: it consumes [`event::InboundEvent`]
//! values and produces [`event::OutboundEvent`] notifications. The bundled TCP
//! transport frames these as newline-delimited JSON with an
//! `{"event": "...", "data": {...}}` envelope, but anything able to construct
//! the enums can drive the core directly.

pub mod event;
pub mod signal;

pub use event::{InboundEvent, OutboundEvent};
pub use signal::{PartyRole, SignalKind, SignalMessage};
