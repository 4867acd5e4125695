//! In-memory document store and event bus.
//!
//! Default adapter for embedding hosts without their own persistence
//! engine, and the backing store for integration tests. One `DashMap` per
//! record kind; change notification rides a `tokio::sync::broadcast`
//! channel.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;

use garrison_domain::{
    DomainEvent, GuardModifier, GuardOrganization, ModifierId, OrganizationId, Patrol, PatrolId,
    Reputation, ReputationId, Resource, ResourceId,
};

use crate::infrastructure::ports::{
    EventBusPort, ModifierRepo, OrganizationRepo, PatrolRepo, RepoError, ReputationRepo,
    ResourceRepo,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct InMemoryStore {
    organizations: DashMap<OrganizationId, GuardOrganization>,
    modifiers: DashMap<ModifierId, GuardModifier>,
    patrols: DashMap<PatrolId, Patrol>,
    resources: DashMap<ResourceId, Resource>,
    reputation: DashMap<ReputationId, Reputation>,
    events: broadcast::Sender<DomainEvent>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            organizations: DashMap::new(),
            modifiers: DashMap::new(),
            patrols: DashMap::new(),
            resources: DashMap::new(),
            reputation: DashMap::new(),
            events,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganizationRepo for InMemoryStore {
    async fn get(&self, id: OrganizationId) -> Result<Option<GuardOrganization>, RepoError> {
        Ok(self.organizations.get(&id).map(|entry| entry.clone()))
    }

    async fn save(&self, organization: &GuardOrganization) -> Result<(), RepoError> {
        self.organizations
            .insert(organization.id(), organization.clone());
        Ok(())
    }

    async fn delete(&self, id: OrganizationId) -> Result<(), RepoError> {
        self.organizations
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<GuardOrganization>, RepoError> {
        Ok(self
            .organizations
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[async_trait]
impl ModifierRepo for InMemoryStore {
    async fn get(&self, id: ModifierId) -> Result<Option<GuardModifier>, RepoError> {
        Ok(self.modifiers.get(&id).map(|entry| entry.clone()))
    }

    async fn save(&self, modifier: &GuardModifier) -> Result<(), RepoError> {
        self.modifiers.insert(modifier.id(), modifier.clone());
        Ok(())
    }

    async fn delete(&self, id: ModifierId) -> Result<(), RepoError> {
        self.modifiers
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<GuardModifier>, RepoError> {
        Ok(self
            .modifiers
            .iter()
            .filter(|entry| entry.organization_id() == organization_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get_many(&self, ids: &[ModifierId]) -> Result<Vec<GuardModifier>, RepoError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.modifiers.get(id).map(|entry| entry.clone()))
            .collect())
    }
}

#[async_trait]
impl PatrolRepo for InMemoryStore {
    async fn get(&self, id: PatrolId) -> Result<Option<Patrol>, RepoError> {
        Ok(self.patrols.get(&id).map(|entry| entry.clone()))
    }

    async fn save(&self, patrol: &Patrol) -> Result<(), RepoError> {
        self.patrols.insert(patrol.id(), patrol.clone());
        Ok(())
    }

    async fn delete(&self, id: PatrolId) -> Result<(), RepoError> {
        self.patrols
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Patrol>, RepoError> {
        Ok(self
            .patrols
            .iter()
            .filter(|entry| entry.organization_id() == organization_id)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[async_trait]
impl ResourceRepo for InMemoryStore {
    async fn get(&self, id: ResourceId) -> Result<Option<Resource>, RepoError> {
        Ok(self.resources.get(&id).map(|entry| entry.clone()))
    }

    async fn save(&self, resource: &Resource) -> Result<(), RepoError> {
        self.resources.insert(resource.id(), resource.clone());
        Ok(())
    }

    async fn delete(&self, id: ResourceId) -> Result<(), RepoError> {
        self.resources
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Resource>, RepoError> {
        Ok(self
            .resources
            .iter()
            .filter(|entry| entry.organization_id() == organization_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> Result<Option<Resource>, RepoError> {
        Ok(self
            .resources
            .iter()
            .find(|entry| entry.organization_id() == organization_id && entry.name() == name)
            .map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl ReputationRepo for InMemoryStore {
    async fn get(&self, id: ReputationId) -> Result<Option<Reputation>, RepoError> {
        Ok(self.reputation.get(&id).map(|entry| entry.clone()))
    }

    async fn save(&self, reputation: &Reputation) -> Result<(), RepoError> {
        self.reputation.insert(reputation.id(), reputation.clone());
        Ok(())
    }

    async fn delete(&self, id: ReputationId) -> Result<(), RepoError> {
        self.reputation
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Reputation>, RepoError> {
        Ok(self
            .reputation
            .iter()
            .filter(|entry| entry.organization_id() == organization_id)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

impl EventBusPort for InMemoryStore {
    fn publish(&self, event: DomainEvent) {
        // A send error just means no live subscribers
        let _ = self.events.send(event);
    }

    fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }
}
