//! GuardModifier entity - an organization-scoped set of stat adjustments
//!
//! Modifiers are their own records; an organization's `active_modifiers`
//! list references the ones currently applied to its patrols.

use serde::{Deserialize, Serialize};

use crate::value_objects::StatModification;
use crate::{DomainError, ModifierId, OrganizationId};

/// Descriptive classification of a modifier.
///
/// Purely presentational - a `Positive` modifier may carry negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl std::fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "Positive"),
            Self::Negative => write!(f, "Negative"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// An organization-scoped, named list of signed per-statistic adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardModifier {
    id: ModifierId,
    organization_id: OrganizationId,
    description: String,
    kind: ModifierKind,
    modifications: Vec<StatModification>,
    version: u32,
}

impl GuardModifier {
    /// Create a modifier bound to its owning organization.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `description` is empty.
    pub fn new(
        organization_id: OrganizationId,
        description: impl Into<String>,
        kind: ModifierKind,
    ) -> Result<Self, DomainError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::validation(
                "Modifier description cannot be empty",
            ));
        }
        Ok(Self {
            id: ModifierId::new(),
            organization_id,
            description,
            kind,
            modifications: Vec::new(),
            version: 1,
        })
    }

    /// Reconstruct from storage.
    pub fn from_storage(
        id: ModifierId,
        organization_id: OrganizationId,
        description: String,
        kind: ModifierKind,
        modifications: Vec<StatModification>,
        version: u32,
    ) -> Self {
        Self {
            id,
            organization_id,
            description,
            kind,
            modifications,
            version: version.max(1),
        }
    }

    /// Builder-style modification append for construction.
    pub fn with_modification(mut self, modification: StatModification) -> Self {
        self.modifications.push(modification);
        self
    }

    pub fn id(&self) -> ModifierId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    /// Adjustments in input order.
    pub fn modifications(&self) -> &[StatModification] {
        &self.modifications
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Sum of this modifier's adjustments for one statistic.
    pub fn value_for(&self, stat: &str) -> i32 {
        self.modifications
            .iter()
            .filter(|m| m.stat() == stat)
            .map(|m| m.value())
            .sum()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), DomainError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::validation(
                "Modifier description cannot be empty",
            ));
        }
        self.description = description;
        self.version += 1;
        Ok(())
    }

    pub fn set_kind(&mut self, kind: ModifierKind) {
        self.kind = kind;
        self.version += 1;
    }

    pub fn add_modification(&mut self, modification: StatModification) {
        self.modifications.push(modification);
        self.version += 1;
    }

    /// Remove the adjustment at `index`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `index` is out of bounds; the record is
    /// untouched.
    pub fn remove_modification(&mut self, index: usize) -> Result<StatModification, DomainError> {
        if index >= self.modifications.len() {
            return Err(DomainError::validation(format!(
                "No stat modification at index {}",
                index
            )));
        }
        let removed = self.modifications.remove(index);
        self.version += 1;
        Ok(removed)
    }
}
