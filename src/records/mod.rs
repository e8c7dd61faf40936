//! In-memory emergency record store
//!
//! The dispatch core treats the record store as an external collaborator:
//! simple create/read/update calls, no durability. This implementation keeps
//! everything in a process-wide map, which is also what makes the rest of the
//! crate testable without infrastructure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::geo::Location;
use crate::registry::ProviderId;
use crate::session::UserId;

/// Unique identifier for an emergency record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmergencyId(String);

impl EmergencyId {
    /// Create an id from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmergencyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an emergency record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyStatus {
    /// Reported, nobody assigned yet
    Reported,
    /// A provider accepted the consultation
    Accepted,
    /// Consultation finished
    Completed,
    /// Abandoned before completion
    Cancelled,
}

impl std::fmt::Display for EmergencyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmergencyStatus::Reported => write!(f, "reported"),
            EmergencyStatus::Accepted => write!(f, "accepted"),
            EmergencyStatus::Completed => write!(f, "completed"),
            EmergencyStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One reported emergency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emergency {
    pub id: EmergencyId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub location: Location,
    pub description: String,
    pub status: EmergencyStatus,
    /// Provider assigned once a consultation is accepted
    pub assigned_provider: Option<ProviderId>,
    /// Unix timestamp in milliseconds
    pub reported_at: u64,
}

/// Process-wide emergency record store
pub struct EmergencyStore {
    records: RwLock<HashMap<EmergencyId, Emergency>>,
    next_id: AtomicU64,
}

impl EmergencyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new emergency record
    pub async fn report(
        &self,
        user_id: UserId,
        location: Location,
        description: impl Into<String>,
    ) -> Emergency {
        let id = EmergencyId::new(format!(
            "em_{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));

        let emergency = Emergency {
            id: id.clone(),
            user_id,
            location,
            description: description.into(),
            status: EmergencyStatus::Reported,
            assigned_provider: None,
            reported_at: unix_millis(),
        };

        self.records
            .write()
            .await
            .insert(id.clone(), emergency.clone());

        tracing::info!(emergency_id = %id, "Emergency reported");
        emergency
    }

    /// Look up a record by id
    pub async fn get(&self, id: &EmergencyId) -> Option<Emergency> {
        self.records.read().await.get(id).cloned()
    }

    /// Update a record's status; unknown id is a no-op
    pub async fn set_status(&self, id: &EmergencyId, status: EmergencyStatus) -> bool {
        let mut records = self.records.write().await;

        if let Some(record) = records.get_mut(id) {
            record.status = status;
            true
        } else {
            tracing::debug!(emergency_id = %id, "Status update for unknown emergency");
            false
        }
    }

    /// Mark a record accepted and remember which provider took it
    pub async fn mark_accepted(&self, id: &EmergencyId, provider_id: &ProviderId) -> bool {
        let mut records = self.records.write().await;

        if let Some(record) = records.get_mut(id) {
            record.status = EmergencyStatus::Accepted;
            record.assigned_provider = Some(provider_id.clone());
            true
        } else {
            false
        }
    }

    /// All records reported by one user
    pub async fn for_user(&self, user_id: &UserId) -> Vec<Emergency> {
        self.records
            .read()
            .await
            .values()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of records in the store
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for EmergencyStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_and_get() {
        let store = EmergencyStore::new();
        let emergency = store
            .report(
                UserId::new("u1"),
                Location::new(40.7128, -74.006),
                "chest pain",
            )
            .await;

        assert_eq!(emergency.status, EmergencyStatus::Reported);
        assert!(emergency.assigned_provider.is_none());

        let fetched = store.get(&emergency.id).await.unwrap();
        assert_eq!(fetched, emergency);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = EmergencyStore::new();
        let a = store
            .report(UserId::new("u1"), Location::new(0.0, 0.0), "a")
            .await;
        let b = store
            .report(UserId::new("u1"), Location::new(0.0, 0.0), "b")
            .await;

        assert_ne!(a.id, b.id);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_mark_accepted() {
        let store = EmergencyStore::new();
        let emergency = store
            .report(UserId::new("u1"), Location::new(0.0, 0.0), "fall")
            .await;

        assert!(store.mark_accepted(&emergency.id, &ProviderId::new("doc1")).await);

        let fetched = store.get(&emergency.id).await.unwrap();
        assert_eq!(fetched.status, EmergencyStatus::Accepted);
        assert_eq!(fetched.assigned_provider, Some(ProviderId::new("doc1")));
    }

    #[tokio::test]
    async fn test_set_status_unknown_is_noop() {
        let store = EmergencyStore::new();
        assert!(
            !store
                .set_status(&EmergencyId::new("em_404"), EmergencyStatus::Completed)
                .await
        );
    }

    #[tokio::test]
    async fn test_for_user_filters() {
        let store = EmergencyStore::new();
        store
            .report(UserId::new("u1"), Location::new(0.0, 0.0), "a")
            .await;
        store
            .report(UserId::new("u2"), Location::new(0.0, 0.0), "b")
            .await;
        store
            .report(UserId::new("u1"), Location::new(0.0, 0.0), "c")
            .await;

        assert_eq!(store.for_user(&UserId::new("u1")).await.len(), 2);
        assert_eq!(store.for_user(&UserId::new("u3")).await.len(), 0);
    }
}
