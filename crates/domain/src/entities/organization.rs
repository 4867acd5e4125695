//! GuardOrganization entity - the top-level owning record
//!
//! The organization holds the reference sets for its patrols, resources,
//! reputation entries, and active modifiers. Bidirectional consistency
//! (every referenced child's `organization_id` points back here) is the
//! lifecycle manager's job; this entity only guarantees the sets stay
//! duplicate-free and that reference changes are idempotent.

use serde::{Deserialize, Serialize};

use crate::value_objects::StatBlock;
use crate::{DomainError, ModifierId, OrganizationId, PatrolId, ReputationId, ResourceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardOrganization {
    id: OrganizationId,
    name: String,
    subtitle: String,
    base_stats: StatBlock,
    active_modifiers: Vec<ModifierId>,
    patrols: Vec<PatrolId>,
    resources: Vec<ResourceId>,
    reputation: Vec<ReputationId>,
    version: u32,
}

impl GuardOrganization {
    /// Create an organization with empty reference sets and `version = 1`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `name` is empty.
    pub fn new(name: impl Into<String>, base_stats: StatBlock) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Organization name cannot be empty"));
        }
        Ok(Self {
            id: OrganizationId::new(),
            name,
            subtitle: String::new(),
            base_stats,
            active_modifiers: Vec::new(),
            patrols: Vec::new(),
            resources: Vec::new(),
            reputation: Vec::new(),
            version: 1,
        })
    }

    /// Reconstruct from storage.
    pub fn from_storage(
        id: OrganizationId,
        name: String,
        subtitle: String,
        base_stats: StatBlock,
        active_modifiers: Vec<ModifierId>,
        patrols: Vec<PatrolId>,
        resources: Vec<ResourceId>,
        reputation: Vec<ReputationId>,
        version: u32,
    ) -> Self {
        Self {
            id,
            name,
            subtitle,
            base_stats,
            active_modifiers,
            patrols,
            resources,
            reputation,
            version: version.max(1),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn id(&self) -> OrganizationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn base_stats(&self) -> &StatBlock {
        &self.base_stats
    }

    /// Active modifier references, in activation order.
    pub fn active_modifiers(&self) -> &[ModifierId] {
        &self.active_modifiers
    }

    pub fn patrols(&self) -> &[PatrolId] {
        &self.patrols
    }

    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    pub fn reputation(&self) -> &[ReputationId] {
        &self.reputation
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Organization name cannot be empty"));
        }
        self.name = name;
        self.version += 1;
        Ok(())
    }

    pub fn set_subtitle(&mut self, subtitle: impl Into<String>) {
        self.subtitle = subtitle.into();
        self.version += 1;
    }

    /// Set one base statistic, rejecting out-of-range values.
    pub fn set_base_stat(&mut self, stat: impl Into<String>, value: i32) -> Result<(), DomainError> {
        self.base_stats.set(stat, value)?;
        self.version += 1;
        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    // Reference sets. Appends are idempotent: adding an id that is already
    // present changes nothing and does not bump the version.
    // ──────────────────────────────────────────────────────────────────────

    pub fn link_patrol(&mut self, id: PatrolId) -> bool {
        Self::link(&mut self.patrols, id, &mut self.version)
    }

    pub fn unlink_patrol(&mut self, id: PatrolId) -> bool {
        Self::unlink(&mut self.patrols, id, &mut self.version)
    }

    pub fn link_resource(&mut self, id: ResourceId) -> bool {
        Self::link(&mut self.resources, id, &mut self.version)
    }

    pub fn unlink_resource(&mut self, id: ResourceId) -> bool {
        Self::unlink(&mut self.resources, id, &mut self.version)
    }

    pub fn link_reputation(&mut self, id: ReputationId) -> bool {
        Self::link(&mut self.reputation, id, &mut self.version)
    }

    pub fn unlink_reputation(&mut self, id: ReputationId) -> bool {
        Self::unlink(&mut self.reputation, id, &mut self.version)
    }

    pub fn activate_modifier(&mut self, id: ModifierId) -> bool {
        Self::link(&mut self.active_modifiers, id, &mut self.version)
    }

    pub fn deactivate_modifier(&mut self, id: ModifierId) -> bool {
        Self::unlink(&mut self.active_modifiers, id, &mut self.version)
    }

    fn link<T: PartialEq + Copy>(set: &mut Vec<T>, id: T, version: &mut u32) -> bool {
        if set.contains(&id) {
            return false;
        }
        set.push(id);
        *version += 1;
        true
    }

    fn unlink<T: PartialEq>(set: &mut Vec<T>, id: T, version: &mut u32) -> bool {
        let len_before = set.len();
        set.retain(|existing| *existing != id);
        if set.len() < len_before {
            *version += 1;
            true
        } else {
            false
        }
    }
}
