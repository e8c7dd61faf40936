//! Emergency dispatch signaling server
//!
//! Matches patients reporting emergencies to available doctors and relays the
//! peer-connection handshake (offers, answers, network candidates) between
//! the two parties of a call session. Media flows peer-to-peer afterwards;
//! this crate never touches it.
//!
//! # Architecture
//!
//! ```text
//!   [patient conn] ──┐                       ┌── [doctor conn]
//!   [patient conn] ──┤   DispatchServer      ├── [doctor conn]
//!                    │        │              │
//!                    ▼        ▼              ▼
//!                 Connection (JSON line framing)
//!                          │
//!                          ▼ InboundEvent
//!                    Arc<Dispatcher>
//!            ┌─────────────┼──────────────┐
//!            ▼             ▼              ▼
//!         Matcher      Lifecycle        Relay
//!            │             │              │
//!            └──────┬──────┴───────┬──────┘
//!                   ▼              ▼
//!           ProviderRegistry  SessionStore
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use dispatch_rs::{DispatchConfig, DispatchServer, Location, Provider, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> dispatch_rs::Result<()> {
//!     let providers = vec![
//!         Provider::doctor(
//!             "doc1",
//!             "Dr. Sarah Johnson",
//!             "Emergency Medicine",
//!             Location::new(40.7128, -74.006),
//!         ),
//!     ];
//!
//!     let server = DispatchServer::new(
//!         ServerConfig::default(),
//!         DispatchConfig::default(),
//!         providers,
//!     );
//!     server.run().await
//! }
//! ```
//!
//! # Wire format
//!
//! One JSON object per line, with an `event` name and a `data` object:
//!
//! ```text
//! -> {"event":"provider:register","data":{"provider_id":"doc1"}}
//! <- {"event":"provider:registered","data":{"provider_id":"doc1"}}
//! -> {"event":"consult:request","data":{"emergency_id":"em_1","user_id":"u1","latitude":40.7,"longitude":-74.0}}
//! <- {"event":"consult:found","data":{"session_id":1,"provider_name":"Dr. Sarah Johnson"}}
//! ```

pub mod dispatch;
pub mod error;
pub mod geo;
pub mod notify;
pub mod protocol;
pub mod records;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use dispatch::{ConsultMatch, DispatchConfig, Dispatcher, SelectionPolicy};
pub use error::{DispatchError, Result};
pub use geo::{distance_km, Location};
pub use notify::{ClientHandle, HandleId};
pub use protocol::{InboundEvent, OutboundEvent, PartyRole, SignalKind, SignalMessage};
pub use records::{Emergency, EmergencyId, EmergencyStatus, EmergencyStore};
pub use registry::{Provider, ProviderId, ProviderKind, ProviderRegistry};
pub use server::{DispatchServer, ServerConfig};
pub use session::{CallPhase, CallSession, SessionError, SessionId, SessionStore, UserId};
pub use stats::{DispatchStats, StatsSnapshot};
