//! Stat derivation - composes base stats, modifiers, and effects
//!
//! [`derive_patrol_stats`] is a pure function of its inputs: the same
//! patrol base stats, custom modifiers, effects, active organization
//! modifiers, and `now` always produce the same output. Callers recompute
//! whenever any input changes; the engine itself holds no state and does
//! no I/O.
//!
//! The attributed total for a statistic is
//!
//! ```text
//! total = base (patrol base + custom modifiers)
//!       + Σ effect contributions (active, non-expired)
//!       + Σ organization modifier contributions
//! ```
//!
//! Integer arithmetic throughout, and totals may go negative - the ledger's
//! non-negative rule applies to resources, not to derived stats.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{GuardModifier, PatrolEffect};
use crate::value_objects::{StatBlock, StatModification};

/// One contributor to a statistic, for display attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    source: String,
    image: Option<String>,
    value: i32,
}

impl Contributor {
    pub fn new(source: impl Into<String>, image: Option<String>, value: i32) -> Self {
        Self {
            source: source.into(),
            image,
            value,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn value(&self) -> i32 {
        self.value
    }
}

/// A layer's total plus its ordered contributor list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatContribution {
    total: i32,
    contributors: Vec<Contributor>,
}

impl StatContribution {
    fn push(&mut self, contributor: Contributor) {
        self.total += contributor.value;
        self.contributors.push(contributor);
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    /// Contributors in input order.
    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }
}

/// Per-statistic attribution breakdown.
///
/// `base` already folds in the patrol's custom modifiers. The grand total
/// is always computed from the parts - it is never stored, so breakdown and
/// total cannot disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatBreakdown {
    base: i32,
    effects: StatContribution,
    org: StatContribution,
}

impl StatBreakdown {
    pub fn base(&self) -> i32 {
        self.base
    }

    pub fn effects(&self) -> &StatContribution {
        &self.effects
    }

    pub fn org(&self) -> &StatContribution {
        &self.org
    }

    /// `base + Σeffects + Σorg`, recomputed on every call.
    pub fn total(&self) -> i32 {
        self.base + self.effects.total + self.org.total
    }
}

/// Derived values for every statistic in a patrol's base-stat set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedStats {
    stats: BTreeMap<String, StatBreakdown>,
}

impl DerivedStats {
    pub fn get(&self, stat: &str) -> Option<&StatBreakdown> {
        self.stats.get(stat)
    }

    /// Final value for one statistic, if present.
    pub fn total_for(&self, stat: &str) -> Option<i32> {
        self.stats.get(stat).map(StatBreakdown::total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatBreakdown)> {
        self.stats.iter().map(|(name, b)| (name.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

/// Derive attributed stats for a patrol.
///
/// Only statistics present in `patrol_base` are derived. Effects whose
/// expiry lies before `now` are skipped (not deleted - expiry sweeps are
/// an explicit operation elsewhere); an effect expiring exactly at `now`
/// still contributes. Contributors that touch a
/// statistic with a zero sum still appear in the breakdown so removal
/// deltas stay exact.
pub fn derive_patrol_stats(
    patrol_base: &StatBlock,
    custom_modifiers: &[StatModification],
    effects: &[PatrolEffect],
    active_modifiers: &[GuardModifier],
    now: DateTime<Utc>,
) -> DerivedStats {
    let mut stats = BTreeMap::new();

    for (stat, base_value) in patrol_base.iter() {
        let custom_total: i32 = custom_modifiers
            .iter()
            .filter(|m| m.stat() == stat)
            .map(|m| m.value())
            .sum();

        let mut breakdown = StatBreakdown {
            base: base_value + custom_total,
            ..StatBreakdown::default()
        };

        for effect in effects.iter().filter(|e| e.is_active(now)) {
            if effect.modifications().iter().any(|m| m.stat() == stat) {
                breakdown.effects.push(Contributor::new(
                    effect.label(),
                    effect.image().map(str::to_string),
                    effect.value_for(stat),
                ));
            }
        }

        for modifier in active_modifiers {
            if modifier.modifications().iter().any(|m| m.stat() == stat) {
                breakdown.org.push(Contributor::new(
                    modifier.description(),
                    None,
                    modifier.value_for(stat),
                ));
            }
        }

        stats.insert(stat.to_string(), breakdown);
    }

    DerivedStats { stats }
}
