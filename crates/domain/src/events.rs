//! Domain Events
//!
//! Coarse-grained events representing record changes. The engine publishes
//! them on its event bus so collaborators (panels, the derivation
//! subscriber) can react to mutations they did not perform themselves.

use serde::{Deserialize, Serialize};

use crate::{ModifierId, OrganizationId, PatrolId, ReputationId, ResourceId};

/// Domain event for record changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainEvent {
    OrganizationChanged {
        organization_id: OrganizationId,
    },
    OrganizationDeleted {
        organization_id: OrganizationId,
    },
    ModifierChanged {
        organization_id: OrganizationId,
        modifier_id: ModifierId,
    },
    PatrolChanged {
        organization_id: OrganizationId,
        patrol_id: PatrolId,
    },
    ResourceChanged {
        organization_id: OrganizationId,
        resource_id: ResourceId,
    },
    ReputationChanged {
        organization_id: OrganizationId,
        reputation_id: ReputationId,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OrganizationChanged { .. } => "organization_changed",
            Self::OrganizationDeleted { .. } => "organization_deleted",
            Self::ModifierChanged { .. } => "modifier_changed",
            Self::PatrolChanged { .. } => "patrol_changed",
            Self::ResourceChanged { .. } => "resource_changed",
            Self::ReputationChanged { .. } => "reputation_changed",
        }
    }

    /// The organization whose graph the event belongs to.
    pub fn organization_id(&self) -> OrganizationId {
        match self {
            Self::OrganizationChanged { organization_id }
            | Self::OrganizationDeleted { organization_id }
            | Self::ModifierChanged { organization_id, .. }
            | Self::PatrolChanged { organization_id, .. }
            | Self::ResourceChanged { organization_id, .. }
            | Self::ReputationChanged { organization_id, .. } => *organization_id,
        }
    }

    /// Whether this event can change a patrol's derived stats.
    pub fn affects_derivation(&self) -> bool {
        matches!(
            self,
            Self::OrganizationChanged { .. } | Self::ModifierChanged { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_id_is_exposed_for_every_variant() {
        let organization_id = OrganizationId::new();
        let event = DomainEvent::ModifierChanged {
            organization_id,
            modifier_id: ModifierId::new(),
        };
        assert_eq!(event.organization_id(), organization_id);
        assert_eq!(event.event_type(), "modifier_changed");
    }

    #[test]
    fn only_organization_and_modifier_changes_affect_derivation() {
        let organization_id = OrganizationId::new();
        assert!(DomainEvent::OrganizationChanged { organization_id }.affects_derivation());
        assert!(DomainEvent::ModifierChanged {
            organization_id,
            modifier_id: ModifierId::new()
        }
        .affects_derivation());
        assert!(!DomainEvent::ResourceChanged {
            organization_id,
            resource_id: ResourceId::new()
        }
        .affects_derivation());
    }
}
