//! Faction reputation management.
//!
//! Level moves are single steps on the seven-point scale; a step past
//! either end is declined and the record keeps its version.

use std::sync::Arc;

use tracing::info;

use garrison_domain::{
    DomainEvent, OrganizationId, Reputation, ReputationId, ReputationLevel,
};

use crate::infrastructure::ports::{EventBusPort, OrganizationRepo, ReputationRepo};
use crate::use_cases::management::ManagementError;

pub struct ReputationCrud {
    reputation: Arc<dyn ReputationRepo>,
    organizations: Arc<dyn OrganizationRepo>,
    events: Arc<dyn EventBusPort>,
}

impl ReputationCrud {
    pub fn new(
        reputation: Arc<dyn ReputationRepo>,
        organizations: Arc<dyn OrganizationRepo>,
        events: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            reputation,
            organizations,
            events,
        }
    }

    pub async fn create(
        &self,
        organization_id: OrganizationId,
        faction_name: impl Into<String>,
        level: ReputationLevel,
        description: Option<String>,
    ) -> Result<Reputation, ManagementError> {
        let mut organization = self
            .organizations
            .get(organization_id)
            .await?
            .ok_or_else(|| ManagementError::not_found("GuardOrganization", organization_id))?;

        let mut entry = Reputation::new(organization_id, faction_name, level)?;
        if let Some(description) = description {
            entry = entry.with_description(description);
        }

        // Record before reference.
        self.reputation.save(&entry).await?;
        if organization.link_reputation(entry.id()) {
            self.organizations.save(&organization).await?;
        }
        info!(
            organization_id = %organization_id,
            reputation_id = %entry.id(),
            faction = entry.name(),
            "Created reputation entry"
        );
        self.publish_changed(organization_id, entry.id());
        Ok(entry)
    }

    pub async fn get(&self, id: ReputationId) -> Result<Option<Reputation>, ManagementError> {
        Ok(self.reputation.get(id).await?)
    }

    pub async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Reputation>, ManagementError> {
        Ok(self.reputation.list_for_organization(organization_id).await?)
    }

    pub async fn update(
        &self,
        id: ReputationId,
        faction_name: Option<String>,
        description: Option<String>,
    ) -> Result<Reputation, ManagementError> {
        let mut entry = self.load(id).await?;
        if let Some(faction_name) = faction_name {
            entry.set_name(faction_name)?;
        }
        if let Some(description) = description {
            entry.set_description(description);
        }
        self.reputation.save(&entry).await?;
        self.publish_changed(entry.organization_id(), id);
        Ok(entry)
    }

    /// Delete the entry, removing the owner's reference first.
    pub async fn delete(&self, id: ReputationId) -> Result<(), ManagementError> {
        let entry = self.load(id).await?;
        let organization_id = entry.organization_id();

        if let Some(mut organization) = self.organizations.get(organization_id).await? {
            if organization.unlink_reputation(id) {
                self.organizations.save(&organization).await?;
            }
        }
        self.reputation.delete(id).await?;
        info!(organization_id = %organization_id, reputation_id = %id, "Deleted reputation entry");
        self.publish_changed(organization_id, id);
        Ok(())
    }

    /// Step one level toward Allied. Declined at the top of the scale.
    pub async fn improve(&self, id: ReputationId) -> Result<Reputation, ManagementError> {
        let mut entry = self.load(id).await?;
        entry.improve()?;
        self.reputation.save(&entry).await?;
        self.publish_changed(entry.organization_id(), id);
        Ok(entry)
    }

    /// Step one level toward Enemies. Declined at the bottom of the scale.
    pub async fn worsen(&self, id: ReputationId) -> Result<Reputation, ManagementError> {
        let mut entry = self.load(id).await?;
        entry.worsen()?;
        self.reputation.save(&entry).await?;
        self.publish_changed(entry.organization_id(), id);
        Ok(entry)
    }

    /// Jump straight to a numeric level (1-7), validating the value.
    pub async fn set_level(&self, id: ReputationId, value: i32) -> Result<Reputation, ManagementError> {
        let level = ReputationLevel::from_value(value)?;
        let mut entry = self.load(id).await?;
        entry.set_level(level);
        self.reputation.save(&entry).await?;
        self.publish_changed(entry.organization_id(), id);
        Ok(entry)
    }

    async fn load(&self, id: ReputationId) -> Result<Reputation, ManagementError> {
        self.reputation
            .get(id)
            .await?
            .ok_or_else(|| ManagementError::not_found("Reputation", id))
    }

    fn publish_changed(&self, organization_id: OrganizationId, reputation_id: ReputationId) {
        self.events.publish(DomainEvent::ReputationChanged {
            organization_id,
            reputation_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garrison_domain::{GuardOrganization, StatBlock};

    use crate::infrastructure::ports::{
        MockEventBusPort, MockOrganizationRepo, MockReputationRepo,
    };

    struct Mocks {
        reputation: MockReputationRepo,
        organizations: MockOrganizationRepo,
        events: MockEventBusPort,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                reputation: MockReputationRepo::new(),
                organizations: MockOrganizationRepo::new(),
                events: MockEventBusPort::new(),
            }
        }

        fn into_crud(self) -> ReputationCrud {
            ReputationCrud::new(
                Arc::new(self.reputation),
                Arc::new(self.organizations),
                Arc::new(self.events),
            )
        }
    }

    fn entry_at(level: ReputationLevel) -> Reputation {
        Reputation::new(OrganizationId::new(), "Thieves' Guild", level).unwrap()
    }

    #[tokio::test]
    async fn improve_steps_one_level_and_saves() {
        let entry = entry_at(ReputationLevel::Neutral);
        let id = entry.id();

        let mut mocks = Mocks::new();
        let entry_clone = entry.clone();
        mocks
            .reputation
            .expect_get()
            .returning(move |_| Ok(Some(entry_clone.clone())));
        mocks
            .reputation
            .expect_save()
            .withf(|e| e.level() == ReputationLevel::Friendly)
            .times(1)
            .returning(|_| Ok(()));
        mocks.events.expect_publish().times(1).return_const(());

        let crud = mocks.into_crud();
        let updated = crud.improve(id).await.unwrap();
        assert_eq!(updated.level().modifier(), 1);
        assert!(updated.can_trade());
    }

    #[tokio::test]
    async fn improve_past_allied_is_declined_without_save() {
        let entry = entry_at(ReputationLevel::Allied);
        let id = entry.id();

        let mut mocks = Mocks::new();
        let entry_clone = entry.clone();
        mocks
            .reputation
            .expect_get()
            .returning(move |_| Ok(Some(entry_clone.clone())));
        mocks.reputation.expect_save().never();
        mocks.events.expect_publish().never();

        let crud = mocks.into_crud();
        let result = crud.improve(id).await;
        assert!(matches!(result, Err(ManagementError::Domain(_))));
    }

    #[tokio::test]
    async fn set_level_rejects_values_off_the_scale() {
        let mut mocks = Mocks::new();
        mocks.reputation.expect_get().never();
        mocks.reputation.expect_save().never();

        let crud = mocks.into_crud();
        let result = crud.set_level(ReputationId::new(), 8).await;
        assert!(matches!(result, Err(ManagementError::Domain(_))));
    }

    #[tokio::test]
    async fn create_links_the_owner_reference() {
        let org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let organization_id = org.id();

        let mut mocks = Mocks::new();
        let org_clone = org.clone();
        mocks
            .organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));
        mocks.reputation.expect_save().times(1).returning(|_| Ok(()));
        mocks
            .organizations
            .expect_save()
            .withf(|o| o.reputation().len() == 1)
            .times(1)
            .returning(|_| Ok(()));
        mocks.events.expect_publish().times(1).return_const(());

        let crud = mocks.into_crud();
        let entry = crud
            .create(
                organization_id,
                "Merchant League",
                ReputationLevel::Friendly,
                None,
            )
            .await
            .unwrap();
        assert!(entry.can_request_aid());
    }
}
