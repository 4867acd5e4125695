//! Domain entities - records with identity and version counters.

pub mod modifier;
pub mod organization;
pub mod patrol;
pub mod reputation;
pub mod resource;

pub use modifier::{GuardModifier, ModifierKind};
pub use organization::GuardOrganization;
pub use patrol::{Patrol, PatrolEffect, PatrolOrder};
pub use reputation::Reputation;
pub use resource::Resource;
