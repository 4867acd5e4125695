//! Patrol management: CRUD, stat inputs, effects, and roster operations.
//!
//! Every mutation that can move a derived stat goes through
//! [`StatRecalculator::refresh_patrol`] before the save, so the persisted
//! record always carries a cache consistent with its inputs.

use std::sync::Arc;

use tracing::info;

use garrison_domain::{
    ActorId, DomainEvent, EffectId, GuardOrganization, OrganizationId, Patrol, PatrolEffect,
    PatrolId, StatBlock, StatModification,
};

use crate::infrastructure::ports::{ClockPort, EventBusPort, OrganizationRepo, PatrolRepo};
use crate::use_cases::derivation::StatRecalculator;
use crate::use_cases::management::ManagementError;

pub struct PatrolCrud {
    patrols: Arc<dyn PatrolRepo>,
    organizations: Arc<dyn OrganizationRepo>,
    recalculator: Arc<StatRecalculator>,
    events: Arc<dyn EventBusPort>,
    clock: Arc<dyn ClockPort>,
}

impl PatrolCrud {
    pub fn new(
        patrols: Arc<dyn PatrolRepo>,
        organizations: Arc<dyn OrganizationRepo>,
        recalculator: Arc<StatRecalculator>,
        events: Arc<dyn EventBusPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            patrols,
            organizations,
            recalculator,
            events,
            clock,
        }
    }

    /// Create a patrol under an organization and link it.
    ///
    /// When `base_stats` is `None` the patrol starts from a copy of the
    /// organization's base stats.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        name: impl Into<String>,
        base_stats: Option<StatBlock>,
    ) -> Result<Patrol, ManagementError> {
        let mut organization = self.load_organization(organization_id).await?;
        let base_stats = base_stats.unwrap_or_else(|| organization.base_stats().clone());
        let mut patrol = Patrol::new(organization_id, name, base_stats)?;
        self.recalculator
            .refresh_patrol(&mut patrol, &organization)
            .await?;

        // Record before reference.
        self.patrols.save(&patrol).await?;
        if organization.link_patrol(patrol.id()) {
            self.organizations.save(&organization).await?;
        }
        info!(
            organization_id = %organization_id,
            patrol_id = %patrol.id(),
            name = patrol.name(),
            "Created patrol"
        );
        self.publish_changed(organization_id, patrol.id());
        Ok(patrol)
    }

    pub async fn get(&self, id: PatrolId) -> Result<Option<Patrol>, ManagementError> {
        Ok(self.patrols.get(id).await?)
    }

    pub async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Patrol>, ManagementError> {
        Ok(self.patrols.list_for_organization(organization_id).await?)
    }

    pub async fn rename(
        &self,
        id: PatrolId,
        name: impl Into<String>,
    ) -> Result<Patrol, ManagementError> {
        let mut patrol = self.load(id).await?;
        patrol.set_name(name)?;
        self.patrols.save(&patrol).await?;
        self.publish_changed(patrol.organization_id(), id);
        Ok(patrol)
    }

    /// Delete the patrol, removing the owner's reference first.
    pub async fn delete(&self, id: PatrolId) -> Result<(), ManagementError> {
        let patrol = self.load(id).await?;
        let organization_id = patrol.organization_id();

        if let Some(mut organization) = self.organizations.get(organization_id).await? {
            if organization.unlink_patrol(id) {
                self.organizations.save(&organization).await?;
            }
        }
        self.patrols.delete(id).await?;
        info!(organization_id = %organization_id, patrol_id = %id, "Deleted patrol");
        self.publish_changed(organization_id, id);
        Ok(())
    }

    pub async fn set_base_stat(
        &self,
        id: PatrolId,
        stat: impl Into<String>,
        value: i32,
    ) -> Result<Patrol, ManagementError> {
        self.mutate_stats(id, |patrol| patrol.set_base_stat(stat, value))
            .await
    }

    pub async fn add_custom_modifier(
        &self,
        id: PatrolId,
        modification: StatModification,
    ) -> Result<Patrol, ManagementError> {
        self.mutate_stats(id, |patrol| {
            patrol.add_custom_modifier(modification);
            Ok(())
        })
        .await
    }

    pub async fn remove_custom_modifier(
        &self,
        id: PatrolId,
        index: usize,
    ) -> Result<Patrol, ManagementError> {
        self.mutate_stats(id, |patrol| patrol.remove_custom_modifier(index).map(|_| ()))
            .await
    }

    pub async fn add_effect(
        &self,
        id: PatrolId,
        effect: PatrolEffect,
    ) -> Result<Patrol, ManagementError> {
        self.mutate_stats(id, |patrol| {
            patrol.add_effect(effect);
            Ok(())
        })
        .await
    }

    pub async fn remove_effect(
        &self,
        id: PatrolId,
        effect_id: EffectId,
    ) -> Result<Patrol, ManagementError> {
        self.mutate_stats(id, |patrol| {
            if patrol.remove_effect(effect_id) {
                Ok(())
            } else {
                Err(garrison_domain::DomainError::not_found(
                    "PatrolEffect",
                    effect_id.to_string(),
                ))
            }
        })
        .await
    }

    /// Drop every expired effect in one pass. Returns how many were removed.
    pub async fn remove_expired_effects(&self, id: PatrolId) -> Result<usize, ManagementError> {
        let mut patrol = self.load(id).await?;
        let removed = patrol.remove_expired_effects(self.clock.now());
        if removed > 0 {
            let organization = self.load_organization(patrol.organization_id()).await?;
            self.recalculator
                .refresh_patrol(&mut patrol, &organization)
                .await?;
            self.patrols.save(&patrol).await?;
            self.publish_changed(patrol.organization_id(), id);
        }
        Ok(removed)
    }

    /// Returns `false` when the actor was already the officer.
    pub async fn assign_officer(
        &self,
        id: PatrolId,
        officer: ActorId,
    ) -> Result<bool, ManagementError> {
        let mut patrol = self.load(id).await?;
        let changed = patrol.assign_officer(officer);
        if changed {
            self.patrols.save(&patrol).await?;
            self.publish_changed(patrol.organization_id(), id);
        }
        Ok(changed)
    }

    pub async fn clear_officer(&self, id: PatrolId) -> Result<bool, ManagementError> {
        let mut patrol = self.load(id).await?;
        let changed = patrol.clear_officer();
        if changed {
            self.patrols.save(&patrol).await?;
            self.publish_changed(patrol.organization_id(), id);
        }
        Ok(changed)
    }

    pub async fn add_soldier(&self, id: PatrolId, soldier: ActorId) -> Result<Patrol, ManagementError> {
        let mut patrol = self.load(id).await?;
        patrol.add_soldier(soldier);
        self.patrols.save(&patrol).await?;
        self.publish_changed(patrol.organization_id(), id);
        Ok(patrol)
    }

    /// Remove one occurrence of the actor. Returns `false` when absent.
    pub async fn remove_soldier(
        &self,
        id: PatrolId,
        soldier: ActorId,
    ) -> Result<bool, ManagementError> {
        let mut patrol = self.load(id).await?;
        let changed = patrol.remove_soldier(soldier);
        if changed {
            self.patrols.save(&patrol).await?;
            self.publish_changed(patrol.organization_id(), id);
        }
        Ok(changed)
    }

    /// Record a standing order, stamped with the current time.
    pub async fn issue_order(
        &self,
        id: PatrolId,
        text: impl Into<String>,
    ) -> Result<Patrol, ManagementError> {
        let mut patrol = self.load(id).await?;
        patrol.issue_order(text, self.clock.now())?;
        self.patrols.save(&patrol).await?;
        self.publish_changed(patrol.organization_id(), id);
        Ok(patrol)
    }

    /// Apply a stat-input mutation, refresh the derived cache, persist.
    async fn mutate_stats<F>(&self, id: PatrolId, mutate: F) -> Result<Patrol, ManagementError>
    where
        F: FnOnce(&mut Patrol) -> Result<(), garrison_domain::DomainError>,
    {
        let mut patrol = self.load(id).await?;
        mutate(&mut patrol)?;
        let organization = self.load_organization(patrol.organization_id()).await?;
        self.recalculator
            .refresh_patrol(&mut patrol, &organization)
            .await?;
        self.patrols.save(&patrol).await?;
        self.publish_changed(patrol.organization_id(), id);
        Ok(patrol)
    }

    async fn load(&self, id: PatrolId) -> Result<Patrol, ManagementError> {
        self.patrols
            .get(id)
            .await?
            .ok_or_else(|| ManagementError::not_found("Patrol", id))
    }

    async fn load_organization(
        &self,
        id: OrganizationId,
    ) -> Result<GuardOrganization, ManagementError> {
        self.organizations
            .get(id)
            .await?
            .ok_or_else(|| ManagementError::not_found("GuardOrganization", id))
    }

    fn publish_changed(&self, organization_id: OrganizationId, patrol_id: PatrolId) {
        self.events.publish(DomainEvent::PatrolChanged {
            organization_id,
            patrol_id,
        });
    }
}
