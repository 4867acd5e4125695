//! Resource entity - quantity tracking for a single consumable record
//!
//! The ledger invariant is `quantity >= 0` at all times, enforced by
//! declining mutations rather than clamping. Clamping is reserved for data
//! hydrated from storage with an out-of-range value. Unlike derived stats,
//! which may go negative by design, a resource can never be overdrawn.

use serde::{Deserialize, Serialize};

use crate::{DomainError, OrganizationId, ResourceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    id: ResourceId,
    organization_id: OrganizationId,
    name: String,
    description: String,
    quantity: u32,
    version: u32,
}

impl Resource {
    /// Create a resource bound to its owning organization.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `name` is empty.
    pub fn new(
        organization_id: OrganizationId,
        name: impl Into<String>,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Resource name cannot be empty"));
        }
        Ok(Self {
            id: ResourceId::new(),
            organization_id,
            name,
            description: String::new(),
            quantity,
            version: 1,
        })
    }

    /// Reconstruct from storage, clamping a negative stored quantity to 0.
    pub fn from_storage(
        id: ResourceId,
        organization_id: OrganizationId,
        name: String,
        description: String,
        quantity: i64,
        version: u32,
    ) -> Self {
        Self {
            id,
            organization_id,
            name,
            description,
            quantity: u32::try_from(quantity.max(0)).unwrap_or(u32::MAX),
            version: version.max(1),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Resource name cannot be empty"));
        }
        self.name = name;
        self.version += 1;
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.version += 1;
    }

    /// Decrement the quantity by `amount`.
    ///
    /// # Errors
    ///
    /// Declined (record untouched, no version bump) if `amount` is zero or
    /// exceeds the current quantity.
    pub fn consume(&mut self, amount: u32) -> Result<(), DomainError> {
        if amount == 0 {
            return Err(DomainError::validation("Amount must be positive"));
        }
        if amount > self.quantity {
            return Err(DomainError::constraint(format!(
                "Cannot consume {} of '{}': only {} available",
                amount, self.name, self.quantity
            )));
        }
        self.quantity -= amount;
        self.version += 1;
        Ok(())
    }

    /// Increment the quantity by `amount`.
    ///
    /// # Errors
    ///
    /// Declined if `amount` is zero or the addition would overflow.
    pub fn add(&mut self, amount: u32) -> Result<(), DomainError> {
        if amount == 0 {
            return Err(DomainError::validation("Amount must be positive"));
        }
        let new_quantity = self
            .quantity
            .checked_add(amount)
            .ok_or_else(|| DomainError::constraint("Quantity overflow"))?;
        self.quantity = new_quantity;
        self.version += 1;
        Ok(())
    }

    /// Overwrite the quantity. Unsigned input makes a negative target
    /// unrepresentable.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.version += 1;
    }
}
