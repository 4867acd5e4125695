//! Management use cases for CRUD-style operations.
//!
//! These use cases keep the host's dialog handlers thin while maintaining
//! the ownership graph: every child create/delete also updates the owning
//! organization's reference set, so a reference never outlives (or
//! predates) its record.

use garrison_domain::{DomainError, OrganizationId};

use crate::infrastructure::ports::RepoError;

pub mod modifier;
pub mod organization;
pub mod patrol;
pub mod reputation;
pub mod resource;

pub use modifier::ModifierCrud;
pub use organization::OrganizationCrud;
pub use patrol::PatrolCrud;
pub use reputation::ReputationCrud;
pub use resource::{ResourceCrud, TransferOutcome};

/// Shared error type for management use cases.
#[derive(Debug, thiserror::Error)]
pub enum ManagementError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    /// A multi-record cascade failed partway. The parent record is left
    /// intact; the caller decides whether to retry.
    #[error("Cascade failed for organization {organization_id}: {source}")]
    CascadeFailed {
        organization_id: OrganizationId,
        #[source]
        source: RepoError,
    },
}

impl ManagementError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Container for management use cases.
pub struct ManagementUseCases {
    pub organization: OrganizationCrud,
    pub modifier: ModifierCrud,
    pub patrol: PatrolCrud,
    pub resource: ResourceCrud,
    pub reputation: ReputationCrud,
}

impl ManagementUseCases {
    pub fn new(
        organization: OrganizationCrud,
        modifier: ModifierCrud,
        patrol: PatrolCrud,
        resource: ResourceCrud,
        reputation: ReputationCrud,
    ) -> Self {
        Self {
            organization,
            modifier,
            patrol,
            resource,
            reputation,
        }
    }
}
