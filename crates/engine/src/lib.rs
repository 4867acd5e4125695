//! Garrison engine: use cases and infrastructure around the domain model.
//!
//! The engine owns orchestration - loading records, applying domain
//! mutations, keeping derived-stat caches fresh, and publishing change
//! events. Persistence and time are behind port traits so embedding hosts
//! can bring their own.

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::{App, AppPorts};
pub use infrastructure::clock::SystemClock;
pub use infrastructure::memory::InMemoryStore;
pub use infrastructure::ports::{
    ClockPort, EventBusPort, ModifierRepo, OrganizationRepo, PatrolRepo, RepoError,
    ReputationRepo, ResourceRepo,
};
pub use use_cases::derivation::{DerivationSubscriber, StatRecalculator};
pub use use_cases::management::{
    ManagementError, ManagementUseCases, ModifierCrud, OrganizationCrud, PatrolCrud,
    ReputationCrud, ResourceCrud, TransferOutcome,
};
