//! Provider registry implementation
//!
//! The central map from provider identity to connectivity handle and
//! availability. Registration, availability updates and disconnect cleanup
//! all funnel through here; compound mutations happen under a single write
//! lock so assignment and the availability flag can never be observed apart.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::dispatch::SelectionPolicy;
use crate::geo::Location;
use crate::notify::{ClientHandle, HandleId};

use super::provider::{Provider, ProviderId, ProviderKind};

/// Central registry of all known providers
///
/// Thread-safe via `RwLock`. The provider set itself is fixed at construction
/// from a seed list; connections, availability and locations mutate over time.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<ProviderId, Provider>>,
}

impl ProviderRegistry {
    /// Create a registry from a seed list
    pub fn with_providers(seed: impl IntoIterator<Item = Provider>) -> Self {
        let providers = seed
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect::<HashMap<_, _>>();

        Self {
            providers: RwLock::new(providers),
        }
    }

    /// Attach a connectivity handle to a provider
    ///
    /// An unknown id is logged and otherwise ignored; the connection simply
    /// never becomes a provider. Returns whether the id was known.
    pub async fn register(&self, id: &ProviderId, handle: ClientHandle) -> bool {
        let mut providers = self.providers.write().await;

        if let Some(provider) = providers.get_mut(id) {
            provider.handle = Some(handle.clone());

            tracing::info!(
                provider_id = %id,
                kind = %provider.kind,
                handle_id = %handle.id(),
                "Provider registered"
            );
            true
        } else {
            tracing::warn!(provider_id = %id, "Registration for unknown provider");
            false
        }
    }

    /// Set a provider's availability flag
    ///
    /// Idempotent; an unknown id is a no-op.
    pub async fn set_availability(&self, id: &ProviderId, available: bool) {
        let mut providers = self.providers.write().await;

        if let Some(provider) = providers.get_mut(id) {
            provider.available = available;
            tracing::debug!(provider_id = %id, available = available, "Availability updated");
        } else {
            tracing::debug!(provider_id = %id, "Availability update for unknown provider");
        }
    }

    /// Detach a handle on disconnect
    ///
    /// Scans every provider holding this handle (at most one in practice),
    /// clears it and forces availability off: a disconnected provider must
    /// never be assigned. Returns the ids that were cleared so session cleanup
    /// knows not to re-free them.
    pub async fn clear_handle(&self, handle_id: HandleId) -> Vec<ProviderId> {
        let mut providers = self.providers.write().await;
        let mut cleared = Vec::new();

        for provider in providers.values_mut() {
            if provider.handle.as_ref().map(|h| h.id()) == Some(handle_id) {
                provider.handle = None;
                provider.available = false;
                cleared.push(provider.id.clone());

                tracing::info!(
                    provider_id = %provider.id,
                    handle_id = %handle_id,
                    "Provider disconnected"
                );
            }
        }

        cleared
    }

    /// Providers of the given kind that are available and reachable
    ///
    /// Order is unspecified; callers rank by distance themselves if they care.
    pub async fn find_available(&self, kind: ProviderKind) -> Vec<Provider> {
        self.providers
            .read()
            .await
            .values()
            .filter(|p| p.kind == kind && p.is_assignable())
            .cloned()
            .collect()
    }

    /// Select one assignable provider and mark it unavailable, atomically
    ///
    /// The selection and the flag change happen under one write lock so a
    /// concurrent request can never claim the same provider. `origin` feeds
    /// the nearest-provider policy and is ignored by first-available.
    pub async fn claim(
        &self,
        kind: ProviderKind,
        policy: SelectionPolicy,
        origin: Option<&Location>,
    ) -> Option<Provider> {
        let mut providers = self.providers.write().await;

        let chosen_id = match policy {
            SelectionPolicy::FirstAvailable => providers
                .values()
                .find(|p| p.kind == kind && p.is_assignable())
                .map(|p| p.id.clone()),
            SelectionPolicy::Nearest => {
                let mut candidates: Vec<&Provider> = providers
                    .values()
                    .filter(|p| p.kind == kind && p.is_assignable())
                    .collect();

                if let Some(origin) = origin {
                    candidates.sort_by(|a, b| {
                        let da = origin.distance_to(&a.location);
                        let db = origin.distance_to(&b.location);
                        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                    });
                }

                candidates.first().map(|p| p.id.clone())
            }
        };

        let id = chosen_id?;
        let provider = providers.get_mut(&id)?;
        provider.available = false;

        Some(provider.clone())
    }

    /// Update a provider's last known location; unknown id is a no-op
    pub async fn update_location(&self, id: &ProviderId, location: Location) -> bool {
        let mut providers = self.providers.write().await;

        if let Some(provider) = providers.get_mut(id) {
            provider.location = location;
            tracing::debug!(provider_id = %id, location = %location, "Location updated");
            true
        } else {
            tracing::debug!(provider_id = %id, "Location update for unknown provider");
            false
        }
    }

    /// Look up one provider by id
    pub async fn get(&self, id: &ProviderId) -> Option<Provider> {
        self.providers.read().await.get(id).cloned()
    }

    /// Current connectivity handle for a provider, if any
    pub async fn handle_of(&self, id: &ProviderId) -> Option<ClientHandle> {
        self.providers
            .read()
            .await
            .get(id)
            .and_then(|p| p.handle.clone())
    }

    /// Total number of seeded providers
    pub async fn count(&self) -> usize {
        self.providers.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Vec<Provider> {
        vec![
            Provider::doctor(
                "doc1",
                "Dr. Sarah Johnson",
                "Emergency Medicine",
                Location::new(40.7128, -74.006),
            ),
            Provider::doctor(
                "doc2",
                "Dr. Michael Chen",
                "Cardiology",
                Location::new(40.715, -74.008),
            ),
            Provider::ambulance("amb1", "Ambulance Unit 1", Location::new(40.7114, -74.003)),
        ]
    }

    #[tokio::test]
    async fn test_register_known_provider() {
        let registry = ProviderRegistry::with_providers(seed());
        let (handle, _rx) = ClientHandle::channel(HandleId(1));

        assert!(registry.register(&ProviderId::new("doc1"), handle).await);

        let doc = registry.get(&ProviderId::new("doc1")).await.unwrap();
        assert!(doc.is_reachable());
    }

    #[tokio::test]
    async fn test_register_unknown_provider_is_silent() {
        let registry = ProviderRegistry::with_providers(seed());
        let (handle, _rx) = ClientHandle::channel(HandleId(1));

        assert!(!registry.register(&ProviderId::new("doc99"), handle).await);
    }

    #[tokio::test]
    async fn test_find_available_requires_handle() {
        let registry = ProviderRegistry::with_providers(seed());

        // Everyone is available but nobody is connected
        assert!(registry.find_available(ProviderKind::Doctor).await.is_empty());

        let (handle, _rx) = ClientHandle::channel(HandleId(1));
        registry.register(&ProviderId::new("doc1"), handle).await;

        let available = registry.find_available(ProviderKind::Doctor).await;
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, ProviderId::new("doc1"));
    }

    #[tokio::test]
    async fn test_find_available_filters_kind() {
        let registry = ProviderRegistry::with_providers(seed());
        let (handle, _rx) = ClientHandle::channel(HandleId(1));
        registry.register(&ProviderId::new("amb1"), handle).await;

        assert!(registry.find_available(ProviderKind::Doctor).await.is_empty());
        assert_eq!(
            registry.find_available(ProviderKind::Ambulance).await.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_claim_marks_unavailable() {
        let registry = ProviderRegistry::with_providers(seed());
        let (handle, _rx) = ClientHandle::channel(HandleId(1));
        registry.register(&ProviderId::new("doc1"), handle).await;

        let claimed = registry
            .claim(ProviderKind::Doctor, SelectionPolicy::FirstAvailable, None)
            .await
            .unwrap();
        assert_eq!(claimed.id, ProviderId::new("doc1"));
        assert!(claimed.handle.is_some());

        // The claimed provider is no longer assignable
        assert!(registry.find_available(ProviderKind::Doctor).await.is_empty());
        let second = registry
            .claim(ProviderKind::Doctor, SelectionPolicy::FirstAvailable, None)
            .await;
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_claim_nearest_prefers_closer_provider() {
        let registry = ProviderRegistry::with_providers(vec![
            Provider::doctor("far", "Dr. Far", "General", Location::new(41.0, -75.0)),
            Provider::doctor("near", "Dr. Near", "General", Location::new(40.713, -74.006)),
        ]);

        let (h1, _rx1) = ClientHandle::channel(HandleId(1));
        let (h2, _rx2) = ClientHandle::channel(HandleId(2));
        registry.register(&ProviderId::new("far"), h1).await;
        registry.register(&ProviderId::new("near"), h2).await;

        let origin = Location::new(40.7128, -74.006);
        let claimed = registry
            .claim(ProviderKind::Doctor, SelectionPolicy::Nearest, Some(&origin))
            .await
            .unwrap();

        assert_eq!(claimed.id, ProviderId::new("near"));
    }

    #[tokio::test]
    async fn test_clear_handle_forces_unavailable() {
        let registry = ProviderRegistry::with_providers(seed());
        let (handle, _rx) = ClientHandle::channel(HandleId(7));
        registry.register(&ProviderId::new("doc1"), handle).await;

        let cleared = registry.clear_handle(HandleId(7)).await;
        assert_eq!(cleared, vec![ProviderId::new("doc1")]);

        let doc = registry.get(&ProviderId::new("doc1")).await.unwrap();
        assert!(doc.handle.is_none());
        assert!(!doc.available);
    }

    #[tokio::test]
    async fn test_clear_unknown_handle_is_noop() {
        let registry = ProviderRegistry::with_providers(seed());
        assert!(registry.clear_handle(HandleId(42)).await.is_empty());
    }

    #[tokio::test]
    async fn test_set_availability_is_idempotent() {
        let registry = ProviderRegistry::with_providers(seed());
        let id = ProviderId::new("doc1");

        registry.set_availability(&id, false).await;
        registry.set_availability(&id, false).await;
        assert!(!registry.get(&id).await.unwrap().available);

        registry.set_availability(&id, true).await;
        assert!(registry.get(&id).await.unwrap().available);

        // Unknown id must not panic
        registry
            .set_availability(&ProviderId::new("doc99"), true)
            .await;
    }

    #[tokio::test]
    async fn test_update_location() {
        let registry = ProviderRegistry::with_providers(seed());
        let id = ProviderId::new("amb1");

        assert!(
            registry
                .update_location(&id, Location::new(40.72, -74.01))
                .await
        );
        let amb = registry.get(&id).await.unwrap();
        assert!((amb.location.latitude - 40.72).abs() < 1e-9);

        assert!(
            !registry
                .update_location(&ProviderId::new("amb99"), Location::new(0.0, 0.0))
                .await
        );
    }
}
