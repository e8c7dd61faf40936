//! Call lifecycle transitions
//!
//! Accept, reject, end, and disconnect cleanup. Every transition restores the
//! registry state it owes: a freed provider becomes assignable again, a
//! terminal session leaves the store in the same operation.

use crate::notify::HandleId;
use crate::protocol::event::OutboundEvent;
use crate::records::EmergencyStatus;
use crate::registry::ProviderId;
use crate::session::SessionId;
use crate::stats::DispatchStats;

use super::Dispatcher;

impl Dispatcher {
    /// Provider accepts a ringing call
    ///
    /// Absent session, wrong phase, or wrong provider: logged and ignored.
    /// On success the requester is told the provider joined and the provider
    /// gets an ack.
    pub async fn accept_call(&self, session_id: SessionId, provider_id: ProviderId) {
        let session = match self.sessions.accept(session_id, &provider_id).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Accept ignored");
                return;
            }
        };

        self.emergencies
            .mark_accepted(&session.emergency_id, &session.provider_id)
            .await;

        self.notify_user(
            &session.user_id,
            OutboundEvent::ProviderJoined {
                session_id,
                provider_name: session.provider_name.clone(),
                message: "Doctor will join the video call soon".to_string(),
            },
        )
        .await;

        if let Some(handle) = self.registry.handle_of(&session.provider_id).await {
            handle.notify(OutboundEvent::CallAccepted { session_id });
        }

        DispatchStats::inc(&self.stats.calls_accepted);
        tracing::info!(
            session_id = %session_id,
            provider_id = %session.provider_id,
            "Call accepted"
        );
    }

    /// Provider rejects a ringing call
    ///
    /// Frees the provider, tells the requester, and removes the session.
    /// Silent no-op if the session is gone or already accepted.
    pub async fn reject_call(&self, session_id: SessionId) {
        let session = match self.sessions.remove_if_ringing(session_id).await {
            Some(session) => session,
            None => {
                tracing::debug!(session_id = %session_id, "Reject for unknown or non-ringing session");
                return;
            }
        };

        self.registry
            .set_availability(&session.provider_id, true)
            .await;

        self.notify_user(
            &session.user_id,
            OutboundEvent::CallRejected {
                message: "Doctor is unavailable, searching for another doctor...".to_string(),
            },
        )
        .await;

        DispatchStats::inc(&self.stats.calls_rejected);
        tracing::info!(
            session_id = %session_id,
            provider_id = %session.provider_id,
            "Call rejected"
        );
    }

    /// Either party ends a call
    ///
    /// Idempotent: an absent session is a no-op. Frees the provider, marks
    /// the emergency completed, notifies both parties, removes the session.
    pub async fn end_call(&self, session_id: SessionId) {
        let session = match self.sessions.remove(session_id).await {
            Some(session) => session,
            None => {
                tracing::debug!(session_id = %session_id, "End for unknown session");
                return;
            }
        };

        self.registry
            .set_availability(&session.provider_id, true)
            .await;
        self.emergencies
            .set_status(&session.emergency_id, EmergencyStatus::Completed)
            .await;

        self.notify_user(&session.user_id, OutboundEvent::CallEnded { session_id })
            .await;
        if let Some(handle) = self.registry.handle_of(&session.provider_id).await {
            handle.notify(OutboundEvent::CallEnded { session_id });
        }

        DispatchStats::inc(&self.stats.calls_ended);
        tracing::info!(session_id = %session_id, "Call ended");
    }

    /// Best-effort cleanup when a connection drops
    ///
    /// Clears the registry handle (forcing the provider unavailable), drops
    /// the user directory entry, and removes every session the vanished party
    /// was in. Nobody is notified; the survivor's peer-connection layer
    /// detects the drop itself. A provider whose requester vanished is freed
    /// normally; a provider that itself vanished stays unavailable.
    pub async fn on_disconnect(&self, handle_id: HandleId) {
        let cleared = self.registry.clear_handle(handle_id).await;
        let user = self.remove_user_by_handle(handle_id).await;

        let orphaned = self
            .sessions
            .remove_for_participants(&cleared, user.as_ref())
            .await;

        for session in orphaned {
            if !cleared.contains(&session.provider_id) {
                self.registry
                    .set_availability(&session.provider_id, true)
                    .await;
            }

            DispatchStats::inc(&self.stats.calls_ended);
            tracing::info!(
                session_id = %session.id,
                phase = %session.phase,
                "Session ended by disconnect"
            );
        }
    }
}
