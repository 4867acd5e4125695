//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is
//! concrete types. Ports exist for:
//! - Document storage (the host supplies its own persistence engine)
//! - Change notification (so external mutations reach the engine)
//! - Clock (for testing and effect expiry)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use garrison_domain::{
    DomainEvent, GuardModifier, GuardOrganization, ModifierId, OrganizationId, Patrol, PatrolId,
    Reputation, ReputationId, Resource, ResourceId,
};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Not found")]
    NotFound,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// Document Store Ports (one per record kind)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepo: Send + Sync {
    async fn get(&self, id: OrganizationId) -> Result<Option<GuardOrganization>, RepoError>;
    async fn save(&self, organization: &GuardOrganization) -> Result<(), RepoError>;
    async fn delete(&self, id: OrganizationId) -> Result<(), RepoError>;
    async fn list_all(&self) -> Result<Vec<GuardOrganization>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModifierRepo: Send + Sync {
    async fn get(&self, id: ModifierId) -> Result<Option<GuardModifier>, RepoError>;
    async fn save(&self, modifier: &GuardModifier) -> Result<(), RepoError>;
    async fn delete(&self, id: ModifierId) -> Result<(), RepoError>;
    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<GuardModifier>, RepoError>;
    /// Resolve ids in input order; missing records are skipped.
    async fn get_many(&self, ids: &[ModifierId]) -> Result<Vec<GuardModifier>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatrolRepo: Send + Sync {
    async fn get(&self, id: PatrolId) -> Result<Option<Patrol>, RepoError>;
    async fn save(&self, patrol: &Patrol) -> Result<(), RepoError>;
    async fn delete(&self, id: PatrolId) -> Result<(), RepoError>;
    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Patrol>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceRepo: Send + Sync {
    async fn get(&self, id: ResourceId) -> Result<Option<Resource>, RepoError>;
    async fn save(&self, resource: &Resource) -> Result<(), RepoError>;
    async fn delete(&self, id: ResourceId) -> Result<(), RepoError>;
    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Resource>, RepoError>;
    /// Find a resource by name within an organization (for transfer credits).
    async fn find_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> Result<Option<Resource>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReputationRepo: Send + Sync {
    async fn get(&self, id: ReputationId) -> Result<Option<Reputation>, RepoError>;
    async fn save(&self, reputation: &Reputation) -> Result<(), RepoError>;
    async fn delete(&self, id: ReputationId) -> Result<(), RepoError>;
    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Reputation>, RepoError>;
}

// =============================================================================
// Change Notification Port
// =============================================================================

/// Publish/subscribe channel for [`DomainEvent`]s.
///
/// `publish` is fire-and-forget: an event with no subscribers is dropped,
/// which is fine - the engine recomputes synchronously for its own writes
/// and the bus only serves externally-observed changes.
#[cfg_attr(test, mockall::automock)]
pub trait EventBusPort: Send + Sync {
    fn publish(&self, event: DomainEvent);
    fn subscribe(&self) -> broadcast::Receiver<DomainEvent>;
}

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
