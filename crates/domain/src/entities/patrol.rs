//! Patrol entity - an operational sub-unit of a guard organization
//!
//! Patrols carry their own base stats (independently editable from the
//! organization's), an ordered list of custom modifiers, stacked effects
//! with optional expiry, a roster (one optional officer, any number of
//! soldiers), and a cache of derived stats maintained by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::derivation::DerivedStats;
use crate::value_objects::{StatBlock, StatModification};
use crate::{ActorId, DomainError, EffectId, OrganizationId, PatrolId};

/// A patrol-scoped, possibly time-limited set of stat adjustments.
///
/// Effects stack: several effects may touch the same statistic. An effect
/// past its `expires_at` stops contributing but is only deleted by an
/// explicit operation, never by the derivation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolEffect {
    id: EffectId,
    label: String,
    image: Option<String>,
    description: Option<String>,
    modifications: Vec<StatModification>,
    expires_at: Option<DateTime<Utc>>,
}

impl PatrolEffect {
    /// Create an effect with the given display label.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `label` is empty.
    pub fn new(label: impl Into<String>) -> Result<Self, DomainError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(DomainError::validation("Effect label cannot be empty"));
        }
        Ok(Self {
            id: EffectId::new(),
            label,
            image: None,
            description: None,
            modifications: Vec::new(),
            expires_at: None,
        })
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_modification(mut self, modification: StatModification) -> Self {
        self.modifications.push(modification);
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn modifications(&self) -> &[StatModification] {
        &self.modifications
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the effect still contributes at `now`. Only effects whose
    /// expiry lies strictly in the past are excluded.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry >= now,
            None => true,
        }
    }

    /// Sum of this effect's adjustments for one statistic.
    pub fn value_for(&self, stat: &str) -> i32 {
        self.modifications
            .iter()
            .filter(|m| m.stat() == stat)
            .map(|m| m.value())
            .sum()
    }
}

/// The most recent order issued to a patrol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolOrder {
    pub text: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patrol {
    id: PatrolId,
    organization_id: OrganizationId,
    name: String,
    base_stats: StatBlock,
    /// Cache of the derivation engine's output. Never hand-edited; see
    /// [`Patrol::set_derived_stats`].
    derived_stats: DerivedStats,
    custom_modifiers: Vec<StatModification>,
    effects: Vec<PatrolEffect>,
    officer: Option<ActorId>,
    soldiers: Vec<ActorId>,
    last_order: Option<PatrolOrder>,
    version: u32,
}

impl Patrol {
    /// Create a patrol bound to its owning organization.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `name` is empty.
    pub fn new(
        organization_id: OrganizationId,
        name: impl Into<String>,
        base_stats: StatBlock,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Patrol name cannot be empty"));
        }
        Ok(Self {
            id: PatrolId::new(),
            organization_id,
            name,
            base_stats,
            derived_stats: DerivedStats::default(),
            custom_modifiers: Vec::new(),
            effects: Vec::new(),
            officer: None,
            soldiers: Vec::new(),
            last_order: None,
            version: 1,
        })
    }

    pub fn id(&self) -> PatrolId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_stats(&self) -> &StatBlock {
        &self.base_stats
    }

    pub fn derived_stats(&self) -> &DerivedStats {
        &self.derived_stats
    }

    /// Custom modifiers in input order.
    pub fn custom_modifiers(&self) -> &[StatModification] {
        &self.custom_modifiers
    }

    /// Effects in application order.
    pub fn effects(&self) -> &[PatrolEffect] {
        &self.effects
    }

    pub fn officer(&self) -> Option<ActorId> {
        self.officer
    }

    /// Soldier roster; duplicates are permitted.
    pub fn soldiers(&self) -> &[ActorId] {
        &self.soldiers
    }

    pub fn last_order(&self) -> Option<&PatrolOrder> {
        self.last_order.as_ref()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Patrol name cannot be empty"));
        }
        self.name = name;
        self.version += 1;
        Ok(())
    }

    /// Set one base statistic, rejecting out-of-range values.
    pub fn set_base_stat(&mut self, stat: impl Into<String>, value: i32) -> Result<(), DomainError> {
        self.base_stats.set(stat, value)?;
        self.version += 1;
        Ok(())
    }

    /// Replace the derived-stats cache.
    ///
    /// Only bumps the version when the cache actually changes, so repeated
    /// recomputation with unchanged inputs is a no-op.
    pub fn set_derived_stats(&mut self, derived: DerivedStats) -> bool {
        if self.derived_stats == derived {
            return false;
        }
        self.derived_stats = derived;
        self.version += 1;
        true
    }

    pub fn add_custom_modifier(&mut self, modification: StatModification) {
        self.custom_modifiers.push(modification);
        self.version += 1;
    }

    /// Remove the custom modifier at `index`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `index` is out of bounds.
    pub fn remove_custom_modifier(&mut self, index: usize) -> Result<StatModification, DomainError> {
        if index >= self.custom_modifiers.len() {
            return Err(DomainError::validation(format!(
                "No custom modifier at index {}",
                index
            )));
        }
        let removed = self.custom_modifiers.remove(index);
        self.version += 1;
        Ok(removed)
    }

    pub fn add_effect(&mut self, effect: PatrolEffect) {
        self.effects.push(effect);
        self.version += 1;
    }

    /// Remove one effect by id. Returns `false` (no bump) if absent.
    pub fn remove_effect(&mut self, effect_id: EffectId) -> bool {
        let len_before = self.effects.len();
        self.effects.retain(|e| e.id() != effect_id);
        if self.effects.len() < len_before {
            self.version += 1;
            true
        } else {
            false
        }
    }

    /// Delete every effect expired at `now`. Returns how many were removed;
    /// a single version bump covers the whole sweep.
    pub fn remove_expired_effects(&mut self, now: DateTime<Utc>) -> usize {
        let len_before = self.effects.len();
        self.effects.retain(|e| e.is_active(now));
        let removed = len_before - self.effects.len();
        if removed > 0 {
            self.version += 1;
        }
        removed
    }

    /// Assign the officer. No-op (no bump) if already assigned.
    pub fn assign_officer(&mut self, officer: ActorId) -> bool {
        if self.officer == Some(officer) {
            return false;
        }
        self.officer = Some(officer);
        self.version += 1;
        true
    }

    pub fn clear_officer(&mut self) -> bool {
        if self.officer.is_none() {
            return false;
        }
        self.officer = None;
        self.version += 1;
        true
    }

    /// Add a soldier to the roster. Duplicates are permitted.
    pub fn add_soldier(&mut self, soldier: ActorId) {
        self.soldiers.push(soldier);
        self.version += 1;
    }

    /// Remove one occurrence of a soldier. Returns `false` if absent.
    pub fn remove_soldier(&mut self, soldier: ActorId) -> bool {
        if let Some(index) = self.soldiers.iter().position(|s| *s == soldier) {
            self.soldiers.remove(index);
            self.version += 1;
            true
        } else {
            false
        }
    }

    /// Record the most recent order.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `text` is empty.
    pub fn issue_order(&mut self, text: impl Into<String>, now: DateTime<Utc>) -> Result<(), DomainError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DomainError::validation("Order text cannot be empty"));
        }
        self.last_order = Some(PatrolOrder {
            text,
            issued_at: now,
        });
        self.version += 1;
        Ok(())
    }
}
