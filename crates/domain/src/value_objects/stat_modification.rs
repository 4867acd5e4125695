//! StatModification - a signed per-statistic adjustment
//!
//! Shared by organization modifiers and patrol custom modifiers. Order is
//! significant wherever these appear in a list, so lists keep input order.

use serde::{Deserialize, Serialize};

/// A `(statistic, signed value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatModification {
    stat: String,
    value: i32,
}

impl StatModification {
    pub fn new(stat: impl Into<String>, value: i32) -> Self {
        Self {
            stat: stat.into(),
            value,
        }
    }

    /// The statistic this modification applies to.
    pub fn stat(&self) -> &str {
        &self.stat
    }

    /// The value to add (positive = bonus, negative = penalty).
    pub fn value(&self) -> i32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_stat_and_value() {
        let modification = StatModification::new("robustismo", -2);
        assert_eq!(modification.stat(), "robustismo");
        assert_eq!(modification.value(), -2);
    }
}
