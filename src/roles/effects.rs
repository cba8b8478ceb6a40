//! Infinite effect maintenance
//!
//! The native effect system expires effects on its own schedule. The sweep
//! notices lapsed infinite effects and re-enables them.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::types::INFINITE_DURATION;

use super::RoleRegistry;

/// Re-applies lapsed infinite effects across every registered instance
#[derive(Debug, Default)]
pub struct EffectMaintainer {
    reapplied_total: AtomicU64,
}

impl EffectMaintainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one sweep in registry order. Returns how many effects were
    /// re-applied. Effects already active are left alone.
    pub fn sweep(&self, registry: &RoleRegistry) -> usize {
        let mut reapplied = 0;

        for instance in registry.all() {
            let player = instance.player();
            for effect in instance.infinite_effects() {
                if player.has_effect(effect.effect_type) {
                    continue;
                }
                player.enable_effect(effect.effect_type, effect.intensity, INFINITE_DURATION);
                reapplied += 1;
                debug!(
                    player = %instance.player_id(),
                    effect = %effect.effect_type,
                    intensity = effect.intensity,
                    "Infinite effect re-applied"
                );
            }
        }

        self.reapplied_total
            .fetch_add(reapplied as u64, Ordering::Relaxed);
        reapplied
    }

    /// Re-applications over the maintainer's lifetime
    pub fn reapplied_total(&self) -> u64 {
        self.reapplied_total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::host::{Player, PlayerInfoArea};
    use crate::roles::instance::InstanceParts;
    use crate::roles::{InstanceId, ModuleSet, RoleInstance};
    use crate::sim::SimPlayer;
    use crate::types::{CustomRole, EffectDefinition, EffectType, RoleTypeId};

    fn register(registry: &RoleRegistry, player: Arc<SimPlayer>, effects: Vec<EffectDefinition>) {
        let role = Arc::new(CustomRole::new(1, "Ghost", RoleTypeId::ClassD));
        registry.add(Arc::new(RoleInstance::new(
            InstanceId::new(),
            InstanceParts {
                player,
                role,
                spawn_time: Utc::now(),
                badge: None,
                infinite_effects: effects,
                is_custom_nickname: false,
                info_area: PlayerInfoArea::ALL,
            },
            ModuleSet::default(),
            None,
        )));
    }

    #[test]
    fn test_sweep_restores_missing_effects() {
        let registry = RoleRegistry::new();
        let player = Arc::new(SimPlayer::new(1, "ghost", RoleTypeId::ClassD));
        register(
            &registry,
            player.clone(),
            vec![
                EffectDefinition::infinite(EffectType::SilentWalk, 1),
                EffectDefinition::infinite(EffectType::MovementBoost, 20),
            ],
        );

        let maintainer = EffectMaintainer::new();
        assert_eq!(maintainer.sweep(&registry), 2);
        assert!(player.has_effect(EffectType::SilentWalk));
        assert_eq!(player.effect(EffectType::MovementBoost), Some((20, INFINITE_DURATION)));
    }

    #[test]
    fn test_repeated_sweeps_do_not_reapply() {
        let registry = RoleRegistry::new();
        let player = Arc::new(SimPlayer::new(1, "ghost", RoleTypeId::ClassD));
        register(
            &registry,
            player.clone(),
            vec![EffectDefinition::infinite(EffectType::Invisible, 1)],
        );

        let maintainer = EffectMaintainer::new();
        assert_eq!(maintainer.sweep(&registry), 1);
        assert_eq!(maintainer.sweep(&registry), 0);
        assert_eq!(maintainer.sweep(&registry), 0);
        assert_eq!(player.enable_count(EffectType::Invisible), 1);

        player.expire_effect(EffectType::Invisible);
        assert_eq!(maintainer.sweep(&registry), 1);
        assert_eq!(player.enable_count(EffectType::Invisible), 2);
        assert_eq!(maintainer.reapplied_total(), 2);
    }

    #[test]
    fn test_empty_registry() {
        let maintainer = EffectMaintainer::new();
        assert_eq!(maintainer.sweep(&RoleRegistry::new()), 0);
    }
}
