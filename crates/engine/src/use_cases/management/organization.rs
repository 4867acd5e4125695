//! Organization CRUD and cascade delete.

use std::sync::Arc;

use tracing::{debug, error, info};

use garrison_domain::{
    DomainEvent, GuardOrganization, OrganizationId, PatrolId, ReputationId, ResourceId, StatBlock,
};

use crate::infrastructure::ports::{
    EventBusPort, ModifierRepo, OrganizationRepo, PatrolRepo, RepoError, ReputationRepo,
    ResourceRepo,
};
use crate::use_cases::derivation::StatRecalculator;
use crate::use_cases::management::ManagementError;

pub struct OrganizationCrud {
    organizations: Arc<dyn OrganizationRepo>,
    modifiers: Arc<dyn ModifierRepo>,
    patrols: Arc<dyn PatrolRepo>,
    resources: Arc<dyn ResourceRepo>,
    reputation: Arc<dyn ReputationRepo>,
    recalculator: Arc<StatRecalculator>,
    events: Arc<dyn EventBusPort>,
}

impl OrganizationCrud {
    pub fn new(
        organizations: Arc<dyn OrganizationRepo>,
        modifiers: Arc<dyn ModifierRepo>,
        patrols: Arc<dyn PatrolRepo>,
        resources: Arc<dyn ResourceRepo>,
        reputation: Arc<dyn ReputationRepo>,
        recalculator: Arc<StatRecalculator>,
        events: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            organizations,
            modifiers,
            patrols,
            resources,
            reputation,
            recalculator,
            events,
        }
    }

    pub async fn create(
        &self,
        name: impl Into<String>,
        subtitle: Option<String>,
        base_stats: StatBlock,
    ) -> Result<GuardOrganization, ManagementError> {
        let mut organization = GuardOrganization::new(name, base_stats)?;
        if let Some(subtitle) = subtitle {
            organization = organization.with_subtitle(subtitle);
        }
        self.organizations.save(&organization).await?;
        info!(organization_id = %organization.id(), name = organization.name(), "Created organization");
        self.events.publish(DomainEvent::OrganizationChanged {
            organization_id: organization.id(),
        });
        Ok(organization)
    }

    pub async fn get(
        &self,
        id: OrganizationId,
    ) -> Result<Option<GuardOrganization>, ManagementError> {
        Ok(self.organizations.get(id).await?)
    }

    pub async fn list(&self) -> Result<Vec<GuardOrganization>, ManagementError> {
        Ok(self.organizations.list_all().await?)
    }

    pub async fn update(
        &self,
        id: OrganizationId,
        name: Option<String>,
        subtitle: Option<String>,
    ) -> Result<GuardOrganization, ManagementError> {
        let mut organization = self.load(id).await?;
        if let Some(name) = name {
            organization.set_name(name)?;
        }
        if let Some(subtitle) = subtitle {
            organization.set_subtitle(subtitle);
        }
        self.organizations.save(&organization).await?;
        self.publish_changed(id);
        Ok(organization)
    }

    /// Set one base statistic and refresh the derived caches of every
    /// patrol in the organization.
    pub async fn set_base_stat(
        &self,
        id: OrganizationId,
        stat: impl Into<String>,
        value: i32,
    ) -> Result<GuardOrganization, ManagementError> {
        let mut organization = self.load(id).await?;
        organization.set_base_stat(stat, value)?;
        self.organizations.save(&organization).await?;
        self.recalculator.recompute_for_organization(id).await?;
        self.publish_changed(id);
        Ok(organization)
    }

    /// Attach an existing patrol to the organization's reference set.
    ///
    /// Declined if the patrol record does not exist or belongs to another
    /// organization. Returns `false` when the reference was already present
    /// (no version bump).
    pub async fn attach_patrol(
        &self,
        id: OrganizationId,
        patrol_id: PatrolId,
    ) -> Result<bool, ManagementError> {
        let patrol = self
            .patrols
            .get(patrol_id)
            .await?
            .ok_or_else(|| ManagementError::not_found("Patrol", patrol_id))?;
        if patrol.organization_id() != id {
            return Err(ManagementError::InvalidInput(format!(
                "Patrol {} belongs to organization {}",
                patrol_id,
                patrol.organization_id()
            )));
        }
        let mut organization = self.load(id).await?;
        let linked = organization.link_patrol(patrol_id);
        if linked {
            self.organizations.save(&organization).await?;
            self.publish_changed(id);
        }
        Ok(linked)
    }

    /// Detach a patrol reference without deleting the patrol record.
    pub async fn detach_patrol(
        &self,
        id: OrganizationId,
        patrol_id: PatrolId,
    ) -> Result<bool, ManagementError> {
        let mut organization = self.load(id).await?;
        let unlinked = organization.unlink_patrol(patrol_id);
        if unlinked {
            self.organizations.save(&organization).await?;
            self.publish_changed(id);
        }
        Ok(unlinked)
    }

    pub async fn attach_resource(
        &self,
        id: OrganizationId,
        resource_id: ResourceId,
    ) -> Result<bool, ManagementError> {
        let resource = self
            .resources
            .get(resource_id)
            .await?
            .ok_or_else(|| ManagementError::not_found("Resource", resource_id))?;
        if resource.organization_id() != id {
            return Err(ManagementError::InvalidInput(format!(
                "Resource {} belongs to organization {}",
                resource_id,
                resource.organization_id()
            )));
        }
        let mut organization = self.load(id).await?;
        let linked = organization.link_resource(resource_id);
        if linked {
            self.organizations.save(&organization).await?;
            self.publish_changed(id);
        }
        Ok(linked)
    }

    pub async fn detach_resource(
        &self,
        id: OrganizationId,
        resource_id: ResourceId,
    ) -> Result<bool, ManagementError> {
        let mut organization = self.load(id).await?;
        let unlinked = organization.unlink_resource(resource_id);
        if unlinked {
            self.organizations.save(&organization).await?;
            self.publish_changed(id);
        }
        Ok(unlinked)
    }

    pub async fn attach_reputation(
        &self,
        id: OrganizationId,
        reputation_id: ReputationId,
    ) -> Result<bool, ManagementError> {
        let entry = self
            .reputation
            .get(reputation_id)
            .await?
            .ok_or_else(|| ManagementError::not_found("Reputation", reputation_id))?;
        if entry.organization_id() != id {
            return Err(ManagementError::InvalidInput(format!(
                "Reputation {} belongs to organization {}",
                reputation_id,
                entry.organization_id()
            )));
        }
        let mut organization = self.load(id).await?;
        let linked = organization.link_reputation(reputation_id);
        if linked {
            self.organizations.save(&organization).await?;
            self.publish_changed(id);
        }
        Ok(linked)
    }

    pub async fn detach_reputation(
        &self,
        id: OrganizationId,
        reputation_id: ReputationId,
    ) -> Result<bool, ManagementError> {
        let mut organization = self.load(id).await?;
        let unlinked = organization.unlink_reputation(reputation_id);
        if unlinked {
            self.organizations.save(&organization).await?;
            self.publish_changed(id);
        }
        Ok(unlinked)
    }

    /// Delete the organization and every record it owns, children first.
    ///
    /// Children are looked up by owner, not by the reference sets, so
    /// orphaned records from interrupted earlier runs get swept too. The
    /// reference sets are cleared and saved before any record delete, so
    /// no reader ever observes a reference to a deleted record. If a child
    /// delete fails the cascade stops and the parent record stays; the
    /// remaining children are still reachable by owner for a retry.
    pub async fn delete(&self, id: OrganizationId) -> Result<(), ManagementError> {
        // Existence check up front so a missing organization is NotFound,
        // not a silent empty cascade.
        let mut organization = self.load(id).await?;

        let cascade = |source: RepoError| {
            error!(
                organization_id = %id,
                error = %source,
                "Cascade delete failed partway; organization record left intact"
            );
            ManagementError::CascadeFailed {
                organization_id: id,
                source,
            }
        };

        let patrols = self.patrols.list_for_organization(id).await?;
        let resources = self.resources.list_for_organization(id).await?;
        let reputation = self.reputation.list_for_organization(id).await?;
        let modifiers = self.modifiers.list_for_organization(id).await?;

        // References first.
        let mut unlinked = false;
        for patrol in &patrols {
            unlinked |= organization.unlink_patrol(patrol.id());
        }
        for resource in &resources {
            unlinked |= organization.unlink_resource(resource.id());
        }
        for entry in &reputation {
            unlinked |= organization.unlink_reputation(entry.id());
        }
        for modifier in &modifiers {
            unlinked |= organization.deactivate_modifier(modifier.id());
        }
        if unlinked {
            self.organizations
                .save(&organization)
                .await
                .map_err(cascade)?;
        }

        for patrol in &patrols {
            self.patrols.delete(patrol.id()).await.map_err(cascade)?;
        }
        for resource in &resources {
            self.resources
                .delete(resource.id())
                .await
                .map_err(cascade)?;
        }
        for entry in &reputation {
            self.reputation.delete(entry.id()).await.map_err(cascade)?;
        }
        for modifier in &modifiers {
            self.modifiers
                .delete(modifier.id())
                .await
                .map_err(cascade)?;
        }

        self.organizations.delete(id).await.map_err(cascade)?;
        info!(organization_id = %id, "Deleted organization and owned records");
        self.events.publish(DomainEvent::OrganizationDeleted {
            organization_id: id,
        });
        Ok(())
    }

    async fn load(&self, id: OrganizationId) -> Result<GuardOrganization, ManagementError> {
        self.organizations
            .get(id)
            .await?
            .ok_or_else(|| ManagementError::not_found("GuardOrganization", id))
    }

    fn publish_changed(&self, id: OrganizationId) {
        debug!(organization_id = %id, "Organization changed");
        self.events.publish(DomainEvent::OrganizationChanged {
            organization_id: id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garrison_domain::{GuardModifier, ModifierKind, Patrol, Reputation, ReputationLevel, Resource};

    use crate::infrastructure::ports::{
        MockClockPort, MockEventBusPort, MockModifierRepo, MockOrganizationRepo, MockPatrolRepo,
        MockReputationRepo, MockResourceRepo,
    };

    struct Mocks {
        organizations: MockOrganizationRepo,
        modifiers: MockModifierRepo,
        patrols: MockPatrolRepo,
        resources: MockResourceRepo,
        reputation: MockReputationRepo,
        events: MockEventBusPort,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                organizations: MockOrganizationRepo::new(),
                modifiers: MockModifierRepo::new(),
                patrols: MockPatrolRepo::new(),
                resources: MockResourceRepo::new(),
                reputation: MockReputationRepo::new(),
                events: MockEventBusPort::new(),
            }
        }

        fn into_crud(self) -> OrganizationCrud {
            let organizations: Arc<dyn OrganizationRepo> = Arc::new(self.organizations);
            let modifiers: Arc<dyn ModifierRepo> = Arc::new(self.modifiers);
            let patrols: Arc<dyn PatrolRepo> = Arc::new(self.patrols);
            let recalculator = Arc::new(StatRecalculator::new(
                Arc::clone(&organizations),
                Arc::clone(&modifiers),
                Arc::clone(&patrols),
                Arc::new(MockClockPort::new()),
            ));
            OrganizationCrud::new(
                organizations,
                modifiers,
                patrols,
                Arc::new(self.resources),
                Arc::new(self.reputation),
                recalculator,
                Arc::new(self.events),
            )
        }
    }

    #[tokio::test]
    async fn create_persists_and_publishes() {
        let mut mocks = Mocks::new();
        mocks
            .organizations
            .expect_save()
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .events
            .expect_publish()
            .withf(|e| matches!(e, DomainEvent::OrganizationChanged { .. }))
            .times(1)
            .return_const(());

        let crud = mocks.into_crud();
        let organization = crud
            .create("City Watch", Some("Night division".into()), StatBlock::new())
            .await
            .unwrap();
        assert_eq!(organization.name(), "City Watch");
        assert_eq!(organization.subtitle(), "Night division");
        assert_eq!(organization.version(), 1);
    }

    #[tokio::test]
    async fn attach_patrol_from_another_organization_is_declined() {
        let org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let foreign =
            Patrol::new(OrganizationId::new(), "Outsiders", StatBlock::new()).unwrap();
        let foreign_id = foreign.id();

        let mut mocks = Mocks::new();
        mocks
            .patrols
            .expect_get()
            .returning(move |_| Ok(Some(foreign.clone())));
        mocks.organizations.expect_save().never();

        let crud = mocks.into_crud();
        let result = crud.attach_patrol(org.id(), foreign_id).await;
        assert!(matches!(result, Err(ManagementError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn attach_existing_reference_does_not_save() {
        let mut org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let patrol = Patrol::new(org.id(), "Night Shift", StatBlock::new()).unwrap();
        let patrol_id = patrol.id();
        org.link_patrol(patrol_id);

        let mut mocks = Mocks::new();
        mocks
            .patrols
            .expect_get()
            .returning(move |_| Ok(Some(patrol.clone())));
        let org_clone = org.clone();
        mocks
            .organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));
        mocks.organizations.expect_save().never();
        mocks.events.expect_publish().never();

        let crud = mocks.into_crud();
        let linked = crud.attach_patrol(org.id(), patrol_id).await.unwrap();
        assert!(!linked);
    }

    #[tokio::test]
    async fn cascade_delete_removes_children_before_parent() {
        let org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let id = org.id();
        let patrol = Patrol::new(id, "Night Shift", StatBlock::new()).unwrap();
        let resource = Resource::new(id, "Rations", 10).unwrap();
        let entry = Reputation::new(id, "Thieves' Guild", ReputationLevel::Neutral).unwrap();
        let modifier = GuardModifier::new(id, "Drilled", ModifierKind::Positive).unwrap();

        let mut mocks = Mocks::new();
        let org_clone = org.clone();
        mocks
            .organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));

        let listed = vec![patrol.clone()];
        mocks
            .patrols
            .expect_list_for_organization()
            .returning(move |_| Ok(listed.clone()));
        mocks
            .patrols
            .expect_delete()
            .times(1)
            .returning(|_| Ok(()));

        let listed = vec![resource.clone()];
        mocks
            .resources
            .expect_list_for_organization()
            .returning(move |_| Ok(listed.clone()));
        mocks
            .resources
            .expect_delete()
            .times(1)
            .returning(|_| Ok(()));

        let listed = vec![entry.clone()];
        mocks
            .reputation
            .expect_list_for_organization()
            .returning(move |_| Ok(listed.clone()));
        mocks
            .reputation
            .expect_delete()
            .times(1)
            .returning(|_| Ok(()));

        let listed = vec![modifier.clone()];
        mocks
            .modifiers
            .expect_list_for_organization()
            .returning(move |_| Ok(listed.clone()));
        mocks
            .modifiers
            .expect_delete()
            .times(1)
            .returning(|_| Ok(()));

        mocks
            .organizations
            .expect_delete()
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .events
            .expect_publish()
            .withf(|e| matches!(e, DomainEvent::OrganizationDeleted { .. }))
            .times(1)
            .return_const(());

        let crud = mocks.into_crud();
        crud.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn cascade_abort_leaves_parent_record_intact() {
        let org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let id = org.id();
        let patrol = Patrol::new(id, "Night Shift", StatBlock::new()).unwrap();

        let mut mocks = Mocks::new();
        let org_clone = org.clone();
        mocks
            .organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));

        let listed = vec![patrol.clone()];
        mocks
            .patrols
            .expect_list_for_organization()
            .returning(move |_| Ok(listed.clone()));
        mocks
            .resources
            .expect_list_for_organization()
            .returning(|_| Ok(Vec::new()));
        mocks
            .reputation
            .expect_list_for_organization()
            .returning(|_| Ok(Vec::new()));
        mocks
            .modifiers
            .expect_list_for_organization()
            .returning(|_| Ok(Vec::new()));
        mocks
            .patrols
            .expect_delete()
            .returning(|_| Err(RepoError::Storage("disk unhappy".into())));

        // Parent delete must never run after a failed child delete.
        mocks.organizations.expect_delete().never();
        mocks.events.expect_publish().never();

        let crud = mocks.into_crud();
        let result = crud.delete(id).await;
        assert!(matches!(
            result,
            Err(ManagementError::CascadeFailed { organization_id, .. }) if organization_id == id
        ));
    }

    #[tokio::test]
    async fn cascade_abort_never_leaves_references_to_deleted_children() {
        let mut org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let id = org.id();
        let first = Patrol::new(id, "Day Shift", StatBlock::new()).unwrap();
        let second = Patrol::new(id, "Night Shift", StatBlock::new()).unwrap();
        org.link_patrol(first.id());
        org.link_patrol(second.id());

        let mut mocks = Mocks::new();
        let org_clone = org.clone();
        mocks
            .organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));
        let listed = vec![first.clone(), second.clone()];
        mocks
            .patrols
            .expect_list_for_organization()
            .returning(move |_| Ok(listed.clone()));
        mocks
            .resources
            .expect_list_for_organization()
            .returning(|_| Ok(Vec::new()));
        mocks
            .reputation
            .expect_list_for_organization()
            .returning(|_| Ok(Vec::new()));
        mocks
            .modifiers
            .expect_list_for_organization()
            .returning(|_| Ok(Vec::new()));

        // The surviving organization is saved with no patrol references
        // before any record delete runs.
        mocks
            .organizations
            .expect_save()
            .withf(|o| o.patrols().is_empty())
            .times(1)
            .returning(|_| Ok(()));

        // First record delete succeeds, second fails mid-cascade.
        let first_id = first.id();
        mocks
            .patrols
            .expect_delete()
            .withf(move |patrol_id| *patrol_id == first_id)
            .times(1)
            .returning(|_| Ok(()));
        let second_id = second.id();
        mocks
            .patrols
            .expect_delete()
            .withf(move |patrol_id| *patrol_id == second_id)
            .times(1)
            .returning(|_| Err(RepoError::Storage("disk unhappy".into())));

        mocks.organizations.expect_delete().never();
        mocks.events.expect_publish().never();

        let crud = mocks.into_crud();
        let result = crud.delete(id).await;
        assert!(matches!(
            result,
            Err(ManagementError::CascadeFailed { organization_id, .. }) if organization_id == id
        ));
    }

    #[tokio::test]
    async fn delete_missing_organization_is_not_found() {
        let mut mocks = Mocks::new();
        mocks.organizations.expect_get().returning(|_| Ok(None));

        let crud = mocks.into_crud();
        let result = crud.delete(OrganizationId::new()).await;
        assert!(matches!(result, Err(ManagementError::NotFound { .. })));
    }
}
