//! Derived-stat recomputation.
//!
//! Derived stats are a cache: the source of truth is patrol base stats,
//! custom modifiers, active effects, and the organization's active
//! modifiers. The [`StatRecalculator`] rebuilds that cache; the
//! [`DerivationSubscriber`] keeps it fresh when mutations arrive from
//! outside the management use cases (e.g. another host process writing
//! through the same store).

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use garrison_domain::{derive_patrol_stats, GuardOrganization, OrganizationId, Patrol};

use crate::infrastructure::ports::{
    ClockPort, EventBusPort, ModifierRepo, OrganizationRepo, PatrolRepo,
};
use crate::use_cases::management::ManagementError;

/// Rebuilds patrol derived-stat caches from their inputs.
pub struct StatRecalculator {
    organizations: Arc<dyn OrganizationRepo>,
    modifiers: Arc<dyn ModifierRepo>,
    patrols: Arc<dyn PatrolRepo>,
    clock: Arc<dyn ClockPort>,
}

impl StatRecalculator {
    pub fn new(
        organizations: Arc<dyn OrganizationRepo>,
        modifiers: Arc<dyn ModifierRepo>,
        patrols: Arc<dyn PatrolRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            organizations,
            modifiers,
            patrols,
            clock,
        }
    }

    /// Recompute one patrol's derived stats in place.
    ///
    /// Returns `true` if the cache actually changed. Does not persist;
    /// the caller decides when to save.
    pub async fn refresh_patrol(
        &self,
        patrol: &mut Patrol,
        organization: &GuardOrganization,
    ) -> Result<bool, ManagementError> {
        let active = self
            .modifiers
            .get_many(organization.active_modifiers())
            .await?;
        let derived = derive_patrol_stats(
            patrol.base_stats(),
            patrol.custom_modifiers(),
            patrol.effects(),
            &active,
            self.clock.now(),
        );
        Ok(patrol.set_derived_stats(derived))
    }

    /// Recompute and persist every patrol of an organization.
    ///
    /// Returns the number of patrols whose cache changed. An organization
    /// that no longer exists yields `Ok(0)`; the bus can deliver events
    /// that race with a cascade delete.
    pub async fn recompute_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<usize, ManagementError> {
        let Some(organization) = self.organizations.get(organization_id).await? else {
            debug!(
                organization_id = %organization_id,
                "Skipping recompute for missing organization"
            );
            return Ok(0);
        };

        let mut changed = 0;
        for mut patrol in self.patrols.list_for_organization(organization_id).await? {
            if self.refresh_patrol(&mut patrol, &organization).await? {
                self.patrols.save(&patrol).await?;
                changed += 1;
            }
        }
        debug!(
            organization_id = %organization_id,
            changed,
            "Recomputed patrol stats"
        );
        Ok(changed)
    }
}

/// Background listener that recomputes derived stats when a change event
/// arrives for an organization or one of its modifiers.
pub struct DerivationSubscriber {
    recalculator: Arc<StatRecalculator>,
    events: Arc<dyn EventBusPort>,
}

impl DerivationSubscriber {
    pub fn new(recalculator: Arc<StatRecalculator>, events: Arc<dyn EventBusPort>) -> Self {
        Self {
            recalculator,
            events,
        }
    }

    /// Run the listener on the current task until the bus closes.
    pub async fn run(self) {
        let mut receiver = self.events.subscribe();
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if !event.affects_derivation() {
                        continue;
                    }
                    let organization_id = event.organization_id();
                    if let Err(error) = self
                        .recalculator
                        .recompute_for_organization(organization_id)
                        .await
                    {
                        warn!(
                            organization_id = %organization_id,
                            error = %error,
                            "Failed to recompute derived stats"
                        );
                    }
                }
                // Slow consumer; skipped events are safe to drop because
                // the next recompute reads current state anyway.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Derivation subscriber lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Spawn the listener onto the tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use garrison_domain::{GuardModifier, ModifierKind, StatBlock, StatModification};

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        MockClockPort, MockModifierRepo, MockOrganizationRepo, MockPatrolRepo,
    };

    fn fixed_clock() -> Arc<dyn ClockPort> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn refresh_patrol_folds_in_active_modifiers() {
        let mut org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let modifier = GuardModifier::new(org.id(), "Well rested", ModifierKind::Positive)
            .unwrap()
            .with_modification(StatModification::new("vigilance", 2));
        org.activate_modifier(modifier.id());

        let base = StatBlock::new().with_stat("vigilance", 5).unwrap();
        let mut patrol = Patrol::new(org.id(), "Night Shift", base).unwrap();

        let mut modifiers = MockModifierRepo::new();
        let resolved = vec![modifier];
        modifiers
            .expect_get_many()
            .returning(move |_| Ok(resolved.clone()));

        let recalculator = StatRecalculator::new(
            Arc::new(MockOrganizationRepo::new()),
            Arc::new(modifiers),
            Arc::new(MockPatrolRepo::new()),
            fixed_clock(),
        );

        let changed = recalculator
            .refresh_patrol(&mut patrol, &org)
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(patrol.derived_stats().total_for("vigilance"), Some(7));
    }

    #[tokio::test]
    async fn refresh_with_unchanged_inputs_does_not_bump_version() {
        let org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let base = StatBlock::new().with_stat("vigilance", 5).unwrap();
        let mut patrol = Patrol::new(org.id(), "Night Shift", base).unwrap();

        let mut modifiers = MockModifierRepo::new();
        modifiers.expect_get_many().returning(|_| Ok(Vec::new()));

        let recalculator = StatRecalculator::new(
            Arc::new(MockOrganizationRepo::new()),
            Arc::new(modifiers),
            Arc::new(MockPatrolRepo::new()),
            fixed_clock(),
        );

        assert!(recalculator
            .refresh_patrol(&mut patrol, &org)
            .await
            .unwrap());
        let version_after_first = patrol.version();

        assert!(!recalculator
            .refresh_patrol(&mut patrol, &org)
            .await
            .unwrap());
        assert_eq!(patrol.version(), version_after_first);
    }

    #[tokio::test]
    async fn recompute_for_missing_organization_is_a_no_op() {
        let mut organizations = MockOrganizationRepo::new();
        organizations.expect_get().returning(|_| Ok(None));

        let mut patrols = MockPatrolRepo::new();
        patrols.expect_list_for_organization().never();

        let recalculator = StatRecalculator::new(
            Arc::new(organizations),
            Arc::new(MockModifierRepo::new()),
            Arc::new(patrols),
            Arc::new(MockClockPort::new()),
        );

        let changed = recalculator
            .recompute_for_organization(OrganizationId::new())
            .await
            .unwrap();
        assert_eq!(changed, 0);
    }

    #[tokio::test]
    async fn recompute_saves_only_changed_patrols() {
        let mut org = GuardOrganization::new("City Watch", StatBlock::new()).unwrap();
        let modifier = GuardModifier::new(org.id(), "Drilled", ModifierKind::Positive)
            .unwrap()
            .with_modification(StatModification::new("discipline", 1));
        org.activate_modifier(modifier.id());
        let organization_id = org.id();

        // Stale patrol: cache was built before the modifier existed.
        let base = StatBlock::new().with_stat("discipline", 4).unwrap();
        let stale = Patrol::new(organization_id, "Day Shift", base).unwrap();

        // Fresh patrol: cache already reflects the modifier.
        let base = StatBlock::new().with_stat("discipline", 4).unwrap();
        let mut fresh = Patrol::new(organization_id, "Night Shift", base).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        fresh.set_derived_stats(derive_patrol_stats(
            fresh.base_stats(),
            fresh.custom_modifiers(),
            fresh.effects(),
            std::slice::from_ref(&modifier),
            now,
        ));

        let mut organizations = MockOrganizationRepo::new();
        let org_clone = org.clone();
        organizations
            .expect_get()
            .returning(move |_| Ok(Some(org_clone.clone())));

        let mut modifiers = MockModifierRepo::new();
        let resolved = vec![modifier];
        modifiers
            .expect_get_many()
            .returning(move |_| Ok(resolved.clone()));

        let mut patrols = MockPatrolRepo::new();
        let listed = vec![stale.clone(), fresh.clone()];
        patrols
            .expect_list_for_organization()
            .returning(move |_| Ok(listed.clone()));
        let stale_id = stale.id();
        patrols
            .expect_save()
            .withf(move |p| p.id() == stale_id)
            .times(1)
            .returning(|_| Ok(()));

        let recalculator = StatRecalculator::new(
            Arc::new(organizations),
            Arc::new(modifiers),
            Arc::new(patrols),
            fixed_clock(),
        );

        let changed = recalculator
            .recompute_for_organization(organization_id)
            .await
            .unwrap();
        assert_eq!(changed, 1);
    }
}
