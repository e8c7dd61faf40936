//! Dispatch core
//!
//! The coordinator that owns all process-wide state and reacts to inbound
//! events. Transport-agnostic: anything that can build an
//! [`InboundEvent`](crate::protocol::InboundEvent) and hold a
//! [`ClientHandle`](crate::notify::ClientHandle) can drive it.
//!
//! # Architecture
//!
//! ```text
//!                              Arc<Dispatcher>
//!                  ┌────────────────────────────────────┐
//!                  │ registry:    ProviderRegistry      │
//!                  │ sessions:    SessionStore          │
//!                  │ emergencies: EmergencyStore        │
//!                  │ users:       UserId -> Handle      │
//!                  │ peers:       HandleId -> Handle    │
//!                  └──────────────────┬─────────────────┘
//!                                     │ handle_event()
//!            ┌────────────────────────┼───────────────────────┐
//!            │                        │                       │
//!            ▼                        ▼                       ▼
//!        [Matcher]              [Lifecycle]               [Relay]
//!        request_consultation   accept/reject/end         route_signal
//!                               on_disconnect
//! ```
//!
//! Each inbound event is handled to completion before its connection reads
//! the next one, and compound mutations take a single write lock, which
//! together give the assignment and cleanup invariants their guarantee.

pub mod config;
pub mod lifecycle;
pub mod matcher;
pub mod relay;

pub use config::{DispatchConfig, SelectionPolicy};
pub use matcher::ConsultMatch;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::geo::Location;
use crate::notify::{ClientHandle, HandleId};
use crate::protocol::event::{InboundEvent, OutboundEvent};
use crate::protocol::signal::{SignalKind, SignalMessage};
use crate::records::EmergencyStore;
use crate::registry::{Provider, ProviderRegistry};
use crate::session::{SessionStore, UserId};
use crate::stats::DispatchStats;

/// Process-wide dispatch state and event handling
pub struct Dispatcher {
    config: DispatchConfig,
    registry: ProviderRegistry,
    sessions: SessionStore,
    emergencies: EmergencyStore,
    /// Requesting parties currently connected, by identity
    users: RwLock<HashMap<UserId, ClientHandle>>,
    /// Every connected party, for broadcasts
    peers: RwLock<HashMap<HandleId, ClientHandle>>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Create a dispatcher with the given provider seed list
    pub fn new(config: DispatchConfig, providers: Vec<Provider>) -> Self {
        Self {
            config,
            registry: ProviderRegistry::with_providers(providers),
            sessions: SessionStore::new(),
            emergencies: EmergencyStore::new(),
            users: RwLock::new(HashMap::new()),
            peers: RwLock::new(HashMap::new()),
            stats: DispatchStats::new(),
        }
    }

    /// The provider registry
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The call-session store
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// The emergency record store
    pub fn emergencies(&self) -> &EmergencyStore {
        &self.emergencies
    }

    /// The dispatch counters
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// A new connection opened
    pub async fn connect(&self, handle: ClientHandle) {
        tracing::debug!(handle_id = %handle.id(), "Client connected");
        self.peers.write().await.insert(handle.id(), handle);
    }

    /// A connection dropped
    pub async fn disconnect(&self, handle_id: HandleId) {
        tracing::debug!(handle_id = %handle_id, "Client disconnected");
        self.peers.write().await.remove(&handle_id);
        self.on_disconnect(handle_id).await;
    }

    /// React to one inbound event from the given connection
    pub async fn handle_event(&self, sender: &ClientHandle, event: InboundEvent) {
        match event {
            InboundEvent::ProviderRegister { provider_id } => {
                if self.registry.register(&provider_id, sender.clone()).await {
                    sender.notify(OutboundEvent::ProviderRegistered { provider_id });
                }
            }

            InboundEvent::ProviderStatus {
                provider_id,
                available,
            } => {
                self.registry.set_availability(&provider_id, available).await;
            }

            InboundEvent::ProviderLocation {
                provider_id,
                latitude,
                longitude,
            } => {
                let location = Location::new(latitude, longitude);
                if self.registry.update_location(&provider_id, location).await {
                    DispatchStats::inc(&self.stats.location_updates);
                    self.broadcast(OutboundEvent::LocationUpdated {
                        provider_id,
                        latitude,
                        longitude,
                    })
                    .await;
                }
            }

            InboundEvent::UserRegister { user_id } => {
                tracing::info!(user_id = %user_id, handle_id = %sender.id(), "User registered");
                self.users.write().await.insert(user_id, sender.clone());
            }

            InboundEvent::EmergencyReport {
                user_id,
                latitude,
                longitude,
                description,
            } => {
                let emergency = self
                    .emergencies
                    .report(user_id, Location::new(latitude, longitude), description)
                    .await;
                DispatchStats::inc(&self.stats.emergencies_reported);
                self.broadcast(OutboundEvent::EmergencyReported { emergency }).await;
            }

            InboundEvent::ConsultRequest {
                emergency_id,
                user_id,
                latitude,
                longitude,
            } => {
                let location = Location::new(latitude, longitude);
                match self
                    .request_consultation(emergency_id, user_id, location)
                    .await
                {
                    Ok(found) => sender.notify(OutboundEvent::ConsultFound {
                        session_id: found.session_id,
                        provider_name: found.provider_name,
                    }),
                    Err(_) => sender.notify(OutboundEvent::ConsultUnavailable {
                        message: "No doctors available".to_string(),
                    }),
                }
            }

            InboundEvent::CallAccept {
                session_id,
                provider_id,
            } => {
                self.accept_call(session_id, provider_id).await;
            }

            InboundEvent::CallReject { session_id } => {
                self.reject_call(session_id).await;
            }

            InboundEvent::CallEnd { session_id } => {
                self.end_call(session_id).await;
            }

            InboundEvent::SignalOffer {
                session_id,
                from_role,
                payload,
            } => {
                self.route_signal(SignalMessage {
                    kind: SignalKind::Offer,
                    session_id,
                    from_role,
                    payload,
                })
                .await;
            }

            InboundEvent::SignalAnswer {
                session_id,
                from_role,
                payload,
            } => {
                self.route_signal(SignalMessage {
                    kind: SignalKind::Answer,
                    session_id,
                    from_role,
                    payload,
                })
                .await;
            }

            InboundEvent::SignalCandidate {
                session_id,
                from_role,
                payload,
            } => {
                self.route_signal(SignalMessage {
                    kind: SignalKind::Candidate,
                    session_id,
                    from_role,
                    payload,
                })
                .await;
            }
        }
    }

    /// Expire ringing sessions past the configured ring timeout
    ///
    /// No-op unless a ring timeout is configured. Expired sessions go through
    /// the normal reject path: provider freed, requester told to retry.
    pub async fn sweep_ring_timeouts(&self) {
        let timeout = match self.config.ring_timeout {
            Some(timeout) => timeout,
            None => return,
        };

        for session_id in self.sessions.expired_ringing(timeout).await {
            tracing::warn!(session_id = %session_id, "Ring timeout");
            self.reject_call(session_id).await;
        }
    }

    /// Spawn the background ring-timeout sweep
    ///
    /// Returns None when no ring timeout is configured. The handle can be
    /// used to abort the task on shutdown.
    pub fn spawn_sweep_task(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        self.config.ring_timeout?;

        let dispatcher = Arc::clone(self);
        let interval = dispatcher.config.sweep_interval;

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                dispatcher.sweep_ring_timeouts().await;
            }
        }))
    }

    /// Push a notification to every connected party
    async fn broadcast(&self, event: OutboundEvent) {
        let peers = self.peers.read().await;
        for handle in peers.values() {
            handle.notify(event.clone());
        }
    }

    /// Push a notification to a requesting party by identity
    pub(crate) async fn notify_user(&self, user_id: &UserId, event: OutboundEvent) -> bool {
        match self.user_handle(user_id).await {
            Some(handle) => {
                handle.notify(event);
                true
            }
            None => {
                tracing::debug!(user_id = %user_id, "User unreachable, dropping notification");
                false
            }
        }
    }

    /// Current handle for a requesting party, if connected
    pub(crate) async fn user_handle(&self, user_id: &UserId) -> Option<ClientHandle> {
        self.users.read().await.get(user_id).cloned()
    }

    /// Drop the user directory entry held by a vanished connection
    pub(crate) async fn remove_user_by_handle(&self, handle_id: HandleId) -> Option<UserId> {
        let mut users = self.users.write().await;

        let found = users
            .iter()
            .find(|(_, handle)| handle.id() == handle_id)
            .map(|(user_id, _)| user_id.clone());

        if let Some(user_id) = &found {
            users.remove(user_id);
            tracing::debug!(user_id = %user_id, "User directory entry removed");
        }

        found
    }
}
