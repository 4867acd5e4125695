//! StatBlock - bounded base statistics for organizations and patrols
//!
//! Statistic names are campaign vocabulary (e.g., "robustismo"); the block
//! treats them as opaque keys. Values are bounded signed integers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Lowest value a base statistic may take.
pub const STAT_MIN: i32 = -99;
/// Highest value a base statistic may take.
pub const STAT_MAX: i32 = 99;

/// Named base statistics with bounded values.
///
/// Mutation through [`StatBlock::set`] rejects out-of-range values. Data
/// hydrated from storage goes through [`StatBlock::from_storage`], which
/// clamps instead - stored documents may predate the bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatBlock {
    stats: BTreeMap<String, i32>,
}

impl StatBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert for constructing blocks in one expression.
    pub fn with_stat(mut self, name: impl Into<String>, value: i32) -> Result<Self, DomainError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Reconstruct from storage, clamping out-of-range values.
    pub fn from_storage(stats: impl IntoIterator<Item = (String, i32)>) -> Self {
        Self {
            stats: stats
                .into_iter()
                .map(|(name, value)| (name, value.clamp(STAT_MIN, STAT_MAX)))
                .collect(),
        }
    }

    /// Set the base value of a statistic.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `value` is outside `[STAT_MIN, STAT_MAX]`
    /// or `name` is empty. The block is left untouched on error.
    pub fn set(&mut self, name: impl Into<String>, value: i32) -> Result<(), DomainError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::validation("Statistic name cannot be empty"));
        }
        if !(STAT_MIN..=STAT_MAX).contains(&value) {
            return Err(DomainError::validation(format!(
                "Statistic '{}' value {} outside [{}, {}]",
                name, value, STAT_MIN, STAT_MAX
            )));
        }
        self.stats.insert(name, value);
        Ok(())
    }

    /// Get the base value of a statistic.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.stats.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stats.contains_key(name)
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.stats.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Statistic names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
