//! Resource ledger operations.
//!
//! Quantities are unsigned; a mutation that would need a negative quantity
//! is declined before anything is persisted. Transfers are symmetric: the
//! debited amount is credited to a same-named resource in the target
//! organization, created on the fly when none exists.

use std::sync::Arc;

use tracing::{error, info};

use garrison_domain::{DomainEvent, OrganizationId, Resource, ResourceId};

use crate::infrastructure::ports::{EventBusPort, OrganizationRepo, ResourceRepo};
use crate::use_cases::management::ManagementError;

/// Both sides of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub debited: Resource,
    pub credited: Resource,
    /// True when the credit side was created by this transfer.
    pub created_target: bool,
}

pub struct ResourceCrud {
    resources: Arc<dyn ResourceRepo>,
    organizations: Arc<dyn OrganizationRepo>,
    events: Arc<dyn EventBusPort>,
}

impl ResourceCrud {
    pub fn new(
        resources: Arc<dyn ResourceRepo>,
        organizations: Arc<dyn OrganizationRepo>,
        events: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            resources,
            organizations,
            events,
        }
    }

    pub async fn create(
        &self,
        organization_id: OrganizationId,
        name: impl Into<String>,
        description: Option<String>,
        quantity: u32,
    ) -> Result<Resource, ManagementError> {
        let mut organization = self
            .organizations
            .get(organization_id)
            .await?
            .ok_or_else(|| ManagementError::not_found("GuardOrganization", organization_id))?;

        let mut resource = Resource::new(organization_id, name, quantity)?;
        if let Some(description) = description {
            resource = resource.with_description(description);
        }

        // Record before reference.
        self.resources.save(&resource).await?;
        if organization.link_resource(resource.id()) {
            self.organizations.save(&organization).await?;
        }
        info!(
            organization_id = %organization_id,
            resource_id = %resource.id(),
            name = resource.name(),
            "Created resource"
        );
        self.publish_changed(organization_id, resource.id());
        Ok(resource)
    }

    pub async fn get(&self, id: ResourceId) -> Result<Option<Resource>, ManagementError> {
        Ok(self.resources.get(id).await?)
    }

    pub async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Resource>, ManagementError> {
        Ok(self.resources.list_for_organization(organization_id).await?)
    }

    pub async fn update(
        &self,
        id: ResourceId,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Resource, ManagementError> {
        let mut resource = self.load(id).await?;
        if let Some(name) = name {
            resource.set_name(name)?;
        }
        if let Some(description) = description {
            resource.set_description(description);
        }
        self.resources.save(&resource).await?;
        self.publish_changed(resource.organization_id(), id);
        Ok(resource)
    }

    /// Delete the resource, removing the owner's reference first.
    pub async fn delete(&self, id: ResourceId) -> Result<(), ManagementError> {
        let resource = self.load(id).await?;
        let organization_id = resource.organization_id();

        if let Some(mut organization) = self.organizations.get(organization_id).await? {
            if organization.unlink_resource(id) {
                self.organizations.save(&organization).await?;
            }
        }
        self.resources.delete(id).await?;
        info!(organization_id = %organization_id, resource_id = %id, "Deleted resource");
        self.publish_changed(organization_id, id);
        Ok(())
    }

    /// Spend `amount` units. Declined when the stock is insufficient; the
    /// stored record is untouched on decline.
    pub async fn consume(&self, id: ResourceId, amount: u32) -> Result<Resource, ManagementError> {
        let mut resource = self.load(id).await?;
        resource.consume(amount)?;
        self.resources.save(&resource).await?;
        self.publish_changed(resource.organization_id(), id);
        Ok(resource)
    }

    pub async fn add(&self, id: ResourceId, amount: u32) -> Result<Resource, ManagementError> {
        let mut resource = self.load(id).await?;
        resource.add(amount)?;
        self.resources.save(&resource).await?;
        self.publish_changed(resource.organization_id(), id);
        Ok(resource)
    }

    /// Overwrite the quantity outright (GM correction, not a ledger move).
    pub async fn set_quantity(
        &self,
        id: ResourceId,
        quantity: u32,
    ) -> Result<Resource, ManagementError> {
        let mut resource = self.load(id).await?;
        resource.set_quantity(quantity);
        self.resources.save(&resource).await?;
        self.publish_changed(resource.organization_id(), id);
        Ok(resource)
    }

    /// Move `amount` units to another organization.
    ///
    /// The target organization is checked and both sides are mutated in
    /// memory before anything is saved, so a declined transfer (missing
    /// target, insufficient stock, credit overflow) leaves both ledgers
    /// untouched. The credit lands on the target's same-named resource,
    /// created and linked when absent.
    pub async fn transfer(
        &self,
        source_id: ResourceId,
        target_organization_id: OrganizationId,
        amount: u32,
    ) -> Result<TransferOutcome, ManagementError> {
        let mut source = self.load(source_id).await?;
        if source.organization_id() == target_organization_id {
            return Err(ManagementError::InvalidInput(
                "Cannot transfer a resource to its own organization".into(),
            ));
        }
        let mut target_organization = self
            .organizations
            .get(target_organization_id)
            .await?
            .ok_or_else(|| {
                ManagementError::not_found("GuardOrganization", target_organization_id)
            })?;

        source.consume(amount)?;

        let existing = self
            .resources
            .find_by_name(target_organization_id, source.name())
            .await?;
        let created_target = existing.is_none();
        let mut credited = match existing {
            Some(resource) => resource,
            None => Resource::new(target_organization_id, source.name(), 0)?,
        };
        credited.add(amount)?;

        // All checks passed; persist debit, credit, then the link.
        self.resources.save(&source).await?;
        if let Err(err) = self.resources.save(&credited).await {
            // Debit is already stored. Surface loudly so the GM can
            // reconcile by hand.
            error!(
                source_id = %source_id,
                target_organization_id = %target_organization_id,
                amount,
                error = %err,
                "Transfer credit failed after debit was stored"
            );
            return Err(err.into());
        }
        if created_target && target_organization.link_resource(credited.id()) {
            self.organizations.save(&target_organization).await?;
        }

        info!(
            source_id = %source_id,
            target_organization_id = %target_organization_id,
            amount,
            created_target,
            "Transferred resource units"
        );
        self.publish_changed(source.organization_id(), source_id);
        self.publish_changed(target_organization_id, credited.id());
        Ok(TransferOutcome {
            debited: source,
            credited,
            created_target,
        })
    }

    async fn load(&self, id: ResourceId) -> Result<Resource, ManagementError> {
        self.resources
            .get(id)
            .await?
            .ok_or_else(|| ManagementError::not_found("Resource", id))
    }

    fn publish_changed(&self, organization_id: OrganizationId, resource_id: ResourceId) {
        self.events.publish(DomainEvent::ResourceChanged {
            organization_id,
            resource_id,
        });
    }
}
