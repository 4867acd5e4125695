//! Reputation entity - relationship record toward one faction
//!
//! The discrete level lives in [`ReputationLevel`]; this record binds it to
//! an owning organization and tracks the version counter.

use serde::{Deserialize, Serialize};

use crate::value_objects::{ReputationLevel, Standing};
use crate::{DomainError, OrganizationId, ReputationId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reputation {
    id: ReputationId,
    organization_id: OrganizationId,
    name: String,
    description: String,
    level: ReputationLevel,
    version: u32,
}

impl Reputation {
    /// Create a reputation record bound to its owning organization.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the faction `name` is empty.
    pub fn new(
        organization_id: OrganizationId,
        name: impl Into<String>,
        level: ReputationLevel,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Faction name cannot be empty"));
        }
        Ok(Self {
            id: ReputationId::new(),
            organization_id,
            name,
            description: String::new(),
            level,
            version: 1,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> ReputationId {
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

    pub fn level(&self) -> ReputationLevel {
        self.level
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    // Derived values, always recomputed from the level.

    pub fn modifier(&self) -> i32 {
        self.level.modifier()
    }

    pub fn standing(&self) -> Standing {
        self.level.standing()
    }

    pub fn can_trade(&self) -> bool {
        self.level.can_trade()
    }

    pub fn can_request_aid(&self) -> bool {
        self.level.can_request_aid()
    }

    pub fn can_form_alliance(&self) -> bool {
        self.level.can_form_alliance()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Faction name cannot be empty"));
        }
        self.name = name;
        self.version += 1;
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.version += 1;
    }

    /// Move one level up.
    ///
    /// # Errors
    ///
    /// Declined (no mutation, no version bump) when already at Allied.
    pub fn improve(&mut self) -> Result<ReputationLevel, DomainError> {
        match self.level.improved() {
            Some(level) => {
                self.level = level;
                self.version += 1;
                Ok(level)
            }
            None => Err(DomainError::invalid_state_transition(format!(
                "Reputation with '{}' is already Allied",
                self.name
            ))),
        }
    }

    /// Move one level down.
    ///
    /// # Errors
    ///
    /// Declined when already at Enemies.
    pub fn worsen(&mut self) -> Result<ReputationLevel, DomainError> {
        match self.level.worsened() {
            Some(level) => {
                self.level = level;
                self.version += 1;
                Ok(level)
            }
            None => Err(DomainError::invalid_state_transition(format!(
                "Reputation with '{}' is already Enemies",
                self.name
            ))),
        }
    }

    /// Set the level directly.
    pub fn set_level(&mut self, level: ReputationLevel) {
        self.level = level;
        self.version += 1;
    }
}
