//! Consultation matching
//!
//! Turns a consultation request into a ringing call session: claims an
//! assignable doctor from the registry, creates the session, and alerts the
//! chosen provider.

use crate::error::{DispatchError, Result};
use crate::geo::Location;
use crate::protocol::event::OutboundEvent;
use crate::records::EmergencyId;
use crate::registry::ProviderKind;
use crate::session::{SessionId, UserId};
use crate::stats::DispatchStats;

use super::Dispatcher;

/// Successful consultation match, returned to the requester
#[derive(Debug, Clone)]
pub struct ConsultMatch {
    pub session_id: SessionId,
    pub provider_name: String,
}

impl Dispatcher {
    /// Match a consultation request to an available doctor
    ///
    /// Claims a provider (selection and the availability flip are atomic),
    /// creates a ringing session, and pushes an incoming-call alert to the
    /// provider. Fails with [`DispatchError::NoProviderAvailable`] when no
    /// doctor is both available and connected; no session is created then.
    pub async fn request_consultation(
        &self,
        emergency_id: EmergencyId,
        user_id: UserId,
        location: Location,
    ) -> Result<ConsultMatch> {
        DispatchStats::inc(&self.stats.consult_requests);

        let provider = match self
            .registry
            .claim(ProviderKind::Doctor, self.config.selection, Some(&location))
            .await
        {
            Some(provider) => provider,
            None => {
                DispatchStats::inc(&self.stats.consult_misses);
                tracing::info!(
                    emergency_id = %emergency_id,
                    user_id = %user_id,
                    "No doctor available for consultation"
                );
                return Err(DispatchError::NoProviderAvailable);
            }
        };

        let session = self
            .sessions
            .create(
                emergency_id.clone(),
                provider.id.clone(),
                provider.name.clone(),
                user_id.clone(),
            )
            .await;

        DispatchStats::inc(&self.stats.consult_matches);
        tracing::info!(
            session_id = %session.id,
            provider_id = %provider.id,
            emergency_id = %emergency_id,
            "Consultation matched"
        );

        // claim() only returns reachable providers, but check anyway
        if let Some(handle) = &provider.handle {
            handle.notify(OutboundEvent::IncomingCall {
                session_id: session.id,
                emergency_id,
                user_id,
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }

        Ok(ConsultMatch {
            session_id: session.id,
            provider_name: provider.name,
        })
    }
}
