//! Garrison domain - organizations, patrols, resources, and reputation.
//!
//! Pure domain model: no I/O, no storage, no globals. The engine crate
//! wires these types to a document store and an event bus.

extern crate self as garrison_domain;

pub mod derivation;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use entities::{
    GuardModifier, GuardOrganization, ModifierKind, Patrol, PatrolEffect, PatrolOrder, Reputation,
    Resource,
};

pub use error::DomainError;
pub use events::DomainEvent;

pub use derivation::{
    derive_patrol_stats, Contributor, DerivedStats, StatBreakdown, StatContribution,
};

// Re-export ID types
pub use ids::{
    ActorId, EffectId, ModifierId, OrganizationId, PatrolId, ReputationId, ResourceId,
};

pub use value_objects::{
    ReputationLevel, Standing, StatBlock, StatModification, STAT_MAX, STAT_MIN,
};
