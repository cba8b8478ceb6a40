//! Simulated spawner
//!
//! Applies a role's native type and cosmetics onto a player and reports what
//! it captured, the way a host spawning subsystem would.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::host::{Badge, Player, PlayerInfoArea, SpawnReport, Spawner};
use crate::types::CustomRole;

/// Spawner that applies roles directly onto any [`Player`]
#[derive(Debug, Default)]
pub struct SimSpawner {
    decline: AtomicBool,
    subclass_calls: AtomicU32,
    apply_calls: AtomicU32,
}

impl SimSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A spawner that refuses every spawn
    pub fn declining() -> Self {
        let spawner = Self::default();
        spawner.set_declining(true);
        spawner
    }

    /// Start or stop refusing spawns
    pub fn set_declining(&self, decline: bool) {
        self.decline.store(decline, Ordering::Relaxed);
    }

    /// Calls through the spawn-settings path
    pub fn subclass_calls(&self) -> u32 {
        self.subclass_calls.load(Ordering::Relaxed)
    }

    /// Calls through the direct path
    pub fn apply_calls(&self) -> u32 {
        self.apply_calls.load(Ordering::Relaxed)
    }

    fn spawn(&self, player: &Arc<dyn Player>, role: &CustomRole) -> Option<SpawnReport> {
        if self.decline.load(Ordering::Relaxed) {
            return None;
        }

        let info_area = player.info_area();
        player.set_role_type(role.role);

        let badge = if role.has_custom_badge() {
            // No rank yet: an empty badge makes teardown clear the role's badge
            let previous = player.rank().unwrap_or_else(|| Badge::new("", "", false));
            player.set_rank(
                role.badge_name.as_deref().unwrap_or_default(),
                role.badge_color.as_deref().unwrap_or_default(),
            );
            player.refresh_tag();
            Some(previous)
        } else {
            None
        };

        let is_custom_nickname = match &role.nickname {
            Some(nickname) => {
                player.set_display_nickname(Some(nickname));
                true
            }
            None => false,
        };

        if let Some(info) = &role.custom_info {
            player.set_custom_info(info);
            player.set_info_area(info_area.without(PlayerInfoArea::ROLE));
        }

        if let Some(scale) = role.scale {
            player.set_scale(scale);
        }

        if role.infinite_stamina {
            player.set_using_stamina(false);
        }

        player.set_hume_shield(role.hume_shield_capacity());

        for effect in &role.effects {
            player.enable_effect(effect.effect_type, effect.intensity, effect.applied_duration());
        }

        debug!(
            player = %player.id(),
            role_id = role.id,
            native = %role.role,
            "Role applied"
        );

        Some(SpawnReport {
            badge,
            infinite_effects: role.infinite_effects(),
            is_custom_nickname,
            info_area,
        })
    }
}

impl Spawner for SimSpawner {
    fn spawn_custom_subclass(&self, player: &Arc<dyn Player>, role: &CustomRole) -> Option<SpawnReport> {
        self.subclass_calls.fetch_add(1, Ordering::Relaxed);
        self.spawn(player, role)
    }

    fn apply_subclass(&self, player: &Arc<dyn Player>, role: &CustomRole) -> Option<SpawnReport> {
        self.apply_calls.fetch_add(1, Ordering::Relaxed);
        self.spawn(player, role)
    }
}
