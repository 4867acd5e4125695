//! Application composition.
//!
//! Wires repositories, clock, event bus, recalculator, and the management
//! use cases together. Hosts with their own persistence implement the port
//! traits and call [`App::with_ports`]; [`App::in_memory`] backs everything
//! with the built-in store.

use std::sync::Arc;

use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::ports::{
    ClockPort, EventBusPort, ModifierRepo, OrganizationRepo, PatrolRepo, ReputationRepo,
    ResourceRepo,
};
use crate::use_cases::derivation::{DerivationSubscriber, StatRecalculator};
use crate::use_cases::management::{
    ManagementUseCases, ModifierCrud, OrganizationCrud, PatrolCrud, ReputationCrud, ResourceCrud,
};

pub struct App {
    pub management: ManagementUseCases,
    pub recalculator: Arc<StatRecalculator>,
    pub events: Arc<dyn EventBusPort>,
}

pub struct AppPorts {
    pub organizations: Arc<dyn OrganizationRepo>,
    pub modifiers: Arc<dyn ModifierRepo>,
    pub patrols: Arc<dyn PatrolRepo>,
    pub resources: Arc<dyn ResourceRepo>,
    pub reputation: Arc<dyn ReputationRepo>,
    pub events: Arc<dyn EventBusPort>,
    pub clock: Arc<dyn ClockPort>,
}

impl App {
    pub fn with_ports(ports: AppPorts) -> Self {
        let AppPorts {
            organizations,
            modifiers,
            patrols,
            resources,
            reputation,
            events,
            clock,
        } = ports;

        let recalculator = Arc::new(StatRecalculator::new(
            Arc::clone(&organizations),
            Arc::clone(&modifiers),
            Arc::clone(&patrols),
            Arc::clone(&clock),
        ));

        let management = ManagementUseCases::new(
            OrganizationCrud::new(
                Arc::clone(&organizations),
                Arc::clone(&modifiers),
                Arc::clone(&patrols),
                Arc::clone(&resources),
                Arc::clone(&reputation),
                Arc::clone(&recalculator),
                Arc::clone(&events),
            ),
            ModifierCrud::new(
                Arc::clone(&modifiers),
                Arc::clone(&organizations),
                Arc::clone(&recalculator),
                Arc::clone(&events),
            ),
            PatrolCrud::new(
                Arc::clone(&patrols),
                Arc::clone(&organizations),
                Arc::clone(&recalculator),
                Arc::clone(&events),
                Arc::clone(&clock),
            ),
            ResourceCrud::new(
                Arc::clone(&resources),
                Arc::clone(&organizations),
                Arc::clone(&events),
            ),
            ReputationCrud::new(
                Arc::clone(&reputation),
                Arc::clone(&organizations),
                Arc::clone(&events),
            ),
        );

        Self {
            management,
            recalculator,
            events,
        }
    }

    /// Compose against the built-in in-memory store and the system clock.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self::with_ports(AppPorts {
            organizations: Arc::clone(&store) as Arc<dyn OrganizationRepo>,
            modifiers: Arc::clone(&store) as Arc<dyn ModifierRepo>,
            patrols: Arc::clone(&store) as Arc<dyn PatrolRepo>,
            resources: Arc::clone(&store) as Arc<dyn ResourceRepo>,
            reputation: Arc::clone(&store) as Arc<dyn ReputationRepo>,
            events: store as Arc<dyn EventBusPort>,
            clock: Arc::new(SystemClock::new()),
        })
    }

    /// Spawn the background subscriber that keeps derived caches fresh
    /// when mutations arrive from outside the use cases.
    pub fn spawn_derivation_subscriber(&self) -> tokio::task::JoinHandle<()> {
        DerivationSubscriber::new(Arc::clone(&self.recalculator), Arc::clone(&self.events)).spawn()
    }
}
