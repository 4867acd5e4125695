//! ReputationLevel - the 7-point faction relationship scale
//!
//! Levels are ordinal (1..=7). Everything else about a reputation record -
//! the signed modifier, the standing classification, the permission gates -
//! is derived from the level and never stored independently.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Relationship level toward a faction, from open war to formal alliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReputationLevel {
    Enemies,
    Hostile,
    Distrustful,
    #[default]
    Neutral,
    Friendly,
    Trusting,
    Allied,
}

/// Three-way classification derived from the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Hostile,
    Neutral,
    Friendly,
}

impl Standing {
    /// Display color for panels and chat cards.
    pub fn color(&self) -> &'static str {
        match self {
            Standing::Hostile => "#d9534f",
            Standing::Neutral => "#f0ad4e",
            Standing::Friendly => "#5cb85c",
        }
    }
}

impl ReputationLevel {
    /// All levels in ascending order, for UI dropdowns.
    pub fn all() -> &'static [ReputationLevel] {
        &[
            ReputationLevel::Enemies,
            ReputationLevel::Hostile,
            ReputationLevel::Distrustful,
            ReputationLevel::Neutral,
            ReputationLevel::Friendly,
            ReputationLevel::Trusting,
            ReputationLevel::Allied,
        ]
    }

    /// Ordinal value in 1..=7.
    pub fn value(&self) -> i32 {
        match self {
            ReputationLevel::Enemies => 1,
            ReputationLevel::Hostile => 2,
            ReputationLevel::Distrustful => 3,
            ReputationLevel::Neutral => 4,
            ReputationLevel::Friendly => 5,
            ReputationLevel::Trusting => 6,
            ReputationLevel::Allied => 7,
        }
    }

    /// Parse an ordinal in 1..=7.
    ///
    /// # Errors
    ///
    /// Returns a validation error for values outside the scale.
    pub fn from_value(value: i32) -> Result<Self, DomainError> {
        match value {
            1 => Ok(ReputationLevel::Enemies),
            2 => Ok(ReputationLevel::Hostile),
            3 => Ok(ReputationLevel::Distrustful),
            4 => Ok(ReputationLevel::Neutral),
            5 => Ok(ReputationLevel::Friendly),
            6 => Ok(ReputationLevel::Trusting),
            7 => Ok(ReputationLevel::Allied),
            _ => Err(DomainError::validation(format!(
                "Reputation level {} outside [1, 7]",
                value
            ))),
        }
    }

    /// Signed modifier in [-3, +3]; Neutral maps to 0.
    pub fn modifier(&self) -> i32 {
        self.value() - 4
    }

    /// Classification driving the color code and permission gates.
    pub fn standing(&self) -> Standing {
        match self.value() {
            v if v <= 2 => Standing::Hostile,
            3 | 4 => Standing::Neutral,
            _ => Standing::Friendly,
        }
    }

    /// Trade is open from Neutral upward.
    pub fn can_trade(&self) -> bool {
        self.value() >= 4
    }

    /// Aid requests are open from Friendly upward.
    pub fn can_request_aid(&self) -> bool {
        self.value() >= 5
    }

    /// Alliances are open from Trusting upward.
    pub fn can_form_alliance(&self) -> bool {
        self.value() >= 6
    }

    /// The next level up, or `None` at Allied.
    pub fn improved(&self) -> Option<Self> {
        Self::from_value(self.value() + 1).ok()
    }

    /// The next level down, or `None` at Enemies.
    pub fn worsened(&self) -> Option<Self> {
        Self::from_value(self.value() - 1).ok()
    }
}

impl fmt::Display for ReputationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReputationLevel::Enemies => "Enemies",
            ReputationLevel::Hostile => "Hostile",
            ReputationLevel::Distrustful => "Distrustful",
            ReputationLevel::Neutral => "Neutral",
            ReputationLevel::Friendly => "Friendly",
            ReputationLevel::Trusting => "Trusting",
            ReputationLevel::Allied => "Allied",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_round_trips_through_from_value() {
        for level in ReputationLevel::all() {
            assert_eq!(ReputationLevel::from_value(level.value()), Ok(*level));
        }
    }

    #[test]
    fn from_value_rejects_out_of_scale() {
        assert!(ReputationLevel::from_value(0).is_err());
        assert!(ReputationLevel::from_value(8).is_err());
        assert!(ReputationLevel::from_value(-1).is_err());
    }

    #[test]
    fn modifier_maps_level_minus_four() {
        assert_eq!(ReputationLevel::Enemies.modifier(), -3);
        assert_eq!(ReputationLevel::Neutral.modifier(), 0);
        assert_eq!(ReputationLevel::Allied.modifier(), 3);
    }

    #[test]
    fn standing_cut_points_are_exact() {
        assert_eq!(ReputationLevel::Enemies.standing(), Standing::Hostile);
        assert_eq!(ReputationLevel::Hostile.standing(), Standing::Hostile);
        assert_eq!(ReputationLevel::Distrustful.standing(), Standing::Neutral);
        assert_eq!(ReputationLevel::Neutral.standing(), Standing::Neutral);
        assert_eq!(ReputationLevel::Friendly.standing(), Standing::Friendly);
        assert_eq!(ReputationLevel::Trusting.standing(), Standing::Friendly);
        assert_eq!(ReputationLevel::Allied.standing(), Standing::Friendly);
    }

    #[test]
    fn can_trade_from_neutral_upward() {
        for level in ReputationLevel::all() {
            assert_eq!(level.can_trade(), level.value() >= 4, "level {}", level);
        }
    }

    #[test]
    fn can_request_aid_from_friendly_upward() {
        for level in ReputationLevel::all() {
            assert_eq!(level.can_request_aid(), level.value() >= 5, "level {}", level);
        }
    }

    #[test]
    fn can_form_alliance_only_trusting_and_allied() {
        let open: Vec<i32> = ReputationLevel::all()
            .iter()
            .filter(|l| l.can_form_alliance())
            .map(|l| l.value())
            .collect();
        assert_eq!(open, vec![6, 7]);
    }

    #[test]
    fn improved_stops_at_allied() {
        assert_eq!(
            ReputationLevel::Neutral.improved(),
            Some(ReputationLevel::Friendly)
        );
        assert_eq!(ReputationLevel::Allied.improved(), None);
    }

    #[test]
    fn worsened_stops_at_enemies() {
        assert_eq!(
            ReputationLevel::Neutral.worsened(),
            Some(ReputationLevel::Distrustful)
        );
        assert_eq!(ReputationLevel::Enemies.worsened(), None);
    }

    #[test]
    fn standing_colors_are_distinct() {
        assert_ne!(Standing::Hostile.color(), Standing::Neutral.color());
        assert_ne!(Standing::Neutral.color(), Standing::Friendly.color());
    }
}
