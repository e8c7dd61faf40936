//! Signaling relay
//!
//! Pure message router for peer-connection handshake traffic. Looks up the
//! session, flips the role, and forwards the payload untouched. No buffering,
//! no retry: a message for a gone session or an unreachable target is
//! dropped, and the peer-connection layer above renegotiates.

use crate::protocol::event::OutboundEvent;
use crate::protocol::signal::{PartyRole, SignalMessage};
use crate::stats::DispatchStats;

use super::Dispatcher;

impl Dispatcher {
    /// Relay one handshake message to the opposite role
    pub async fn route_signal(&self, message: SignalMessage) {
        let session = match self.sessions.get(message.session_id).await {
            Some(session) => session,
            None => {
                DispatchStats::inc(&self.stats.signals_dropped);
                tracing::debug!(
                    session_id = %message.session_id,
                    kind = %message.kind,
                    "Signal for unknown session, dropping"
                );
                return;
            }
        };

        let target = match message.from_role {
            PartyRole::Requester => self.registry.handle_of(&session.provider_id).await,
            PartyRole::Provider => self.user_handle(&session.user_id).await,
        };

        let handle = match target {
            Some(handle) => handle,
            None => {
                DispatchStats::inc(&self.stats.signals_dropped);
                tracing::debug!(
                    session_id = %message.session_id,
                    kind = %message.kind,
                    target = %message.from_role.opposite(),
                    "Signal target unreachable, dropping"
                );
                return;
            }
        };

        handle.notify(OutboundEvent::signal(
            message.kind,
            message.session_id,
            message.payload,
        ));

        DispatchStats::inc(&self.stats.signals_relayed);
        tracing::trace!(
            session_id = %message.session_id,
            kind = %message.kind,
            from = %message.from_role,
            "Signal relayed"
        );
    }
}
