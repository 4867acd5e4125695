//! Value objects - immutable domain values with their invariants.

pub mod reputation_level;
pub mod stat_block;
pub mod stat_modification;

pub use reputation_level::{ReputationLevel, Standing};
pub use stat_block::{StatBlock, STAT_MAX, STAT_MIN};
pub use stat_modification::StatModification;
