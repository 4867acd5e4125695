//! Use case layer.

pub mod derivation;
pub mod management;

pub use derivation::{DerivationSubscriber, StatRecalculator};
pub use management::{ManagementError, ManagementUseCases};
