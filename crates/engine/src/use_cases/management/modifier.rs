//! Organization modifier management.
//!
//! A modifier record can exist without being applied; only ids in the
//! organization's `active_modifiers` list feed derivation. Content changes
//! to an active modifier trigger a recompute of the organization's patrols.

use std::sync::Arc;

use tracing::info;

use garrison_domain::{
    DomainEvent, GuardModifier, ModifierId, ModifierKind, OrganizationId, StatModification,
};

use crate::infrastructure::ports::{EventBusPort, ModifierRepo, OrganizationRepo};
use crate::use_cases::derivation::StatRecalculator;
use crate::use_cases::management::ManagementError;

pub struct ModifierCrud {
    modifiers: Arc<dyn ModifierRepo>,
    organizations: Arc<dyn OrganizationRepo>,
    recalculator: Arc<StatRecalculator>,
    events: Arc<dyn EventBusPort>,
}

impl ModifierCrud {
    pub fn new(
        modifiers: Arc<dyn ModifierRepo>,
        organizations: Arc<dyn OrganizationRepo>,
        recalculator: Arc<StatRecalculator>,
        events: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            modifiers,
            organizations,
            recalculator,
            events,
        }
    }

    /// Create a modifier and immediately activate it on its organization.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        description: impl Into<String>,
        kind: ModifierKind,
        modifications: Vec<StatModification>,
    ) -> Result<GuardModifier, ManagementError> {
        let mut organization = self
            .organizations
            .get(organization_id)
            .await?
            .ok_or_else(|| ManagementError::not_found("GuardOrganization", organization_id))?;

        let mut modifier = GuardModifier::new(organization_id, description, kind)?;
        for modification in modifications {
            modifier = modifier.with_modification(modification);
        }

        // Record before reference, so the activation never dangles.
        self.modifiers.save(&modifier).await?;
        if organization.activate_modifier(modifier.id()) {
            self.organizations.save(&organization).await?;
        }
        self.recalculator
            .recompute_for_organization(organization_id)
            .await?;
        info!(
            organization_id = %organization_id,
            modifier_id = %modifier.id(),
            "Created and activated modifier"
        );
        self.publish_changed(organization_id, modifier.id());
        Ok(modifier)
    }

    pub async fn get(&self, id: ModifierId) -> Result<Option<GuardModifier>, ManagementError> {
        Ok(self.modifiers.get(id).await?)
    }

    pub async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<GuardModifier>, ManagementError> {
        Ok(self.modifiers.list_for_organization(organization_id).await?)
    }

    pub async fn update(
        &self,
        id: ModifierId,
        description: Option<String>,
        kind: Option<ModifierKind>,
    ) -> Result<GuardModifier, ManagementError> {
        let mut modifier = self.load(id).await?;
        if let Some(description) = description {
            modifier.set_description(description)?;
        }
        if let Some(kind) = kind {
            modifier.set_kind(kind);
        }
        self.save_and_refresh(&modifier).await?;
        Ok(modifier)
    }

    pub async fn add_modification(
        &self,
        id: ModifierId,
        modification: StatModification,
    ) -> Result<GuardModifier, ManagementError> {
        let mut modifier = self.load(id).await?;
        modifier.add_modification(modification);
        self.save_and_refresh(&modifier).await?;
        Ok(modifier)
    }

    pub async fn remove_modification(
        &self,
        id: ModifierId,
        index: usize,
    ) -> Result<GuardModifier, ManagementError> {
        let mut modifier = self.load(id).await?;
        modifier.remove_modification(index)?;
        self.save_and_refresh(&modifier).await?;
        Ok(modifier)
    }

    /// Toggle whether the modifier feeds its organization's derivation.
    ///
    /// Returns `false` when the modifier was already in the requested
    /// state (no version bump, no recompute).
    pub async fn set_active(&self, id: ModifierId, active: bool) -> Result<bool, ManagementError> {
        let modifier = self.load(id).await?;
        let organization_id = modifier.organization_id();
        let mut organization = self
            .organizations
            .get(organization_id)
            .await?
            .ok_or_else(|| ManagementError::not_found("GuardOrganization", organization_id))?;

        let changed = if active {
            organization.activate_modifier(id)
        } else {
            organization.deactivate_modifier(id)
        };
        if changed {
            self.organizations.save(&organization).await?;
            self.recalculator
                .recompute_for_organization(organization_id)
                .await?;
            self.publish_changed(organization_id, id);
        }
        Ok(changed)
    }

    /// Delete the record, deactivating it first if needed.
    pub async fn delete(&self, id: ModifierId) -> Result<(), ManagementError> {
        let modifier = self.load(id).await?;
        let organization_id = modifier.organization_id();

        // Reference before record, so the list never points at a ghost.
        if let Some(mut organization) = self.organizations.get(organization_id).await? {
            if organization.deactivate_modifier(id) {
                self.organizations.save(&organization).await?;
            }
        }
        self.modifiers.delete(id).await?;
        self.recalculator
            .recompute_for_organization(organization_id)
            .await?;
        info!(organization_id = %organization_id, modifier_id = %id, "Deleted modifier");
        self.publish_changed(organization_id, id);
        Ok(())
    }

    async fn load(&self, id: ModifierId) -> Result<GuardModifier, ManagementError> {
        self.modifiers
            .get(id)
            .await?
            .ok_or_else(|| ManagementError::not_found("GuardModifier", id))
    }

    /// Persist a content change and, if the modifier is active, refresh
    /// the derived caches that depend on it.
    async fn save_and_refresh(&self, modifier: &GuardModifier) -> Result<(), ManagementError> {
        self.modifiers.save(modifier).await?;
        let organization_id = modifier.organization_id();
        let is_active = self
            .organizations
            .get(organization_id)
            .await?
            .is_some_and(|org| org.active_modifiers().contains(&modifier.id()));
        if is_active {
            self.recalculator
                .recompute_for_organization(organization_id)
                .await?;
        }
        self.publish_changed(organization_id, modifier.id());
        Ok(())
    }

    fn publish_changed(&self, organization_id: OrganizationId, modifier_id: ModifierId) {
        self.events.publish(DomainEvent::ModifierChanged {
            organization_id,
            modifier_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garrison_domain::{GuardOrganization, StatBlock};

    use crate::infrastructure::ports::{
        MockClockPort, MockEventBusPort, MockModifierRepo, MockOrganizationRepo, MockPatrolRepo,
    };

    struct Mocks {
        modifiers: MockModifierRepo,
        organizations: MockOrganizationRepo,
        patrols: MockPatrolRepo,
        events: MockEventBusPort,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                modifiers: MockModifierRepo::new(),
                organizations: MockOrganizationRepo::new(),
                patrols: MockPatrolRepo::new(),
                events: MockEventBusPort::new(),
            }
        }

        fn into_crud(self) -> ModifierCrud {
            let modifiers: Arc<dyn ModifierRepo> = Arc::new(self.modifiers);
            let organizations: Arc<dyn OrganizationRepo> = Arc::new(self.organizations);
            let recalculator = Arc::new(StatRecalculator::new(
                Arc::clone(&organizations),
                Arc::clone(&modifiers),
                Arc::new(self.patrols),
                Arc::new(MockClockPort::new()),
            ));
            ModifierCrud::new(modifiers, organizations, recalculator, Arc::new(self.events))
        }
    }

    #[tokio::test]
    async fn create_activates_on_the_organization() {
        let org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let organization_id = org.id();

        let mut mocks = Mocks::new();
        let org_clone = org.clone();
        mocks
            .organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));
        mocks.modifiers.expect_save().times(1).returning(|_| Ok(()));
        mocks
            .organizations
            .expect_save()
            .withf(move |o| o.active_modifiers().len() == 1)
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .patrols
            .expect_list_for_organization()
            .returning(|_| Ok(Vec::new()));
        mocks
            .events
            .expect_publish()
            .withf(|e| matches!(e, DomainEvent::ModifierChanged { .. }))
            .times(1)
            .return_const(());

        let crud = mocks.into_crud();
        let modifier = crud
            .create(
                organization_id,
                "Armory upgrade",
                ModifierKind::Positive,
                vec![StatModification::new("robustismo", 2)],
            )
            .await
            .unwrap();
        assert_eq!(modifier.value_for("robustismo"), 2);
    }

    #[tokio::test]
    async fn set_active_is_idempotent_without_recompute() {
        let org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let modifier =
            GuardModifier::new(org.id(), "Drilled", ModifierKind::Positive).unwrap();

        let mut mocks = Mocks::new();
        let modifier_clone = modifier.clone();
        mocks
            .modifiers
            .expect_get()
            .returning(move |_| Ok(Some(modifier_clone.clone())));
        let org_clone = org.clone();
        mocks
            .organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));
        // Already inactive: nothing saved, nothing recomputed, no event.
        mocks.organizations.expect_save().never();
        mocks.patrols.expect_list_for_organization().never();
        mocks.events.expect_publish().never();

        let crud = mocks.into_crud();
        let changed = crud.set_active(modifier.id(), false).await.unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn delete_deactivates_before_removing_the_record() {
        let mut org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let modifier =
            GuardModifier::new(org.id(), "Drilled", ModifierKind::Positive).unwrap();
        org.activate_modifier(modifier.id());
        let modifier_id = modifier.id();

        let mut mocks = Mocks::new();
        let modifier_clone = modifier.clone();
        mocks
            .modifiers
            .expect_get()
            .returning(move |_| Ok(Some(modifier_clone.clone())));
        let org_clone = org.clone();
        mocks
            .organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));
        mocks
            .organizations
            .expect_save()
            .withf(move |o| !o.active_modifiers().contains(&modifier_id))
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .modifiers
            .expect_delete()
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .patrols
            .expect_list_for_organization()
            .returning(|_| Ok(Vec::new()));
        mocks.events.expect_publish().times(1).return_const(());

        let crud = mocks.into_crud();
        crud.delete(modifier_id).await.unwrap();
    }
}
