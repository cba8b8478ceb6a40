//! Custom role definitions
//!
//! A [`CustomRole`] is the read-only description of a role as it comes out of
//! the role catalogue: stats, team, badge strings, effects, module flags and
//! optional spawn settings. Instances share it through an `Arc`.

use serde::{Deserialize, Serialize};

use crate::host::Scale;
use crate::roles::CustomFlags;

use super::{EffectDefinition, RoleTypeId, Team};

// ─────────────────────────────────────────────────────────────────
// Health Settings
// ─────────────────────────────────────────────────────────────────

/// Health and hume shield stats of a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Health on spawn
    pub amount: f32,

    /// Maximum health
    pub maximum: f32,

    /// Hume shield capacity (0 = no shield)
    pub hume_shield: f32,

    /// Shield restored per regeneration step
    pub hume_shield_regeneration_amount: f32,

    /// Seconds without damage before regeneration may start
    pub hume_shield_regeneration_delay: f32,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            amount: 100.0,
            maximum: 100.0,
            hume_shield: 0.0,
            hume_shield_regeneration_amount: 0.0,
            hume_shield_regeneration_delay: 0.0,
        }
    }
}

/// Spawn policy of a role. Its presence selects the catalogue spawn path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Chance (0-100) for the role to be picked on a matching spawn
    pub spawn_chance: u8,

    /// Minimum players on the server before the role can spawn
    pub min_players: u32,

    /// Maximum concurrent holders (0 = unlimited)
    pub max_players: u32,

    /// Native roles this role can replace
    pub can_replace: Vec<RoleTypeId>,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            spawn_chance: 100,
            min_players: 1,
            max_players: 0,
            can_replace: vec![],
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Custom Role
// ─────────────────────────────────────────────────────────────────

/// A custom role definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRole {
    /// Catalogue identifier
    pub id: i32,

    /// Display name
    pub name: String,

    /// Nickname shown instead of the player's own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    /// Custom info text shown under the player's name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_info: Option<String>,

    /// Badge text shown in the player list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_name: Option<String>,

    /// Badge color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_color: Option<String>,

    /// Underlying native role type
    pub role: RoleTypeId,

    /// Declared custom team (None = the native role's team)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,

    /// Health and hume shield stats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthSettings>,

    /// Visual scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,

    /// Effects granted on spawn
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,

    /// Capability modules to attach
    #[serde(default)]
    pub custom_flags: CustomFlags,

    /// Spawn policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_settings: Option<SpawnSettings>,

    /// Disable stamina usage while the role is held
    #[serde(default)]
    pub infinite_stamina: bool,
}

impl CustomRole {
    /// Create a bare role on top of a native role type
    pub fn new(id: i32, name: impl Into<String>, role: RoleTypeId) -> Self {
        Self {
            id,
            name: name.into(),
            nickname: None,
            custom_info: None,
            badge_name: None,
            badge_color: None,
            role,
            team: None,
            health: None,
            scale: None,
            effects: vec![],
            custom_flags: CustomFlags::NONE,
            spawn_settings: None,
            infinite_stamina: false,
        }
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_health(mut self, health: HealthSettings) -> Self {
        self.health = Some(health);
        self
    }

    /// Set hume shield capacity, regeneration amount and delay (seconds)
    pub fn with_hume_shield(mut self, capacity: f32, amount: f32, delay: f32) -> Self {
        let mut health = self.health.take().unwrap_or_default();
        health.hume_shield = capacity;
        health.hume_shield_regeneration_amount = amount;
        health.hume_shield_regeneration_delay = delay;
        self.health = Some(health);
        self
    }

    pub fn with_badge(mut self, name: impl Into<String>, color: impl Into<String>) -> Self {
        self.badge_name = Some(name.into());
        self.badge_color = Some(color.into());
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_custom_info(mut self, info: impl Into<String>) -> Self {
        self.custom_info = Some(info.into());
        self
    }

    pub fn with_effect(mut self, effect: EffectDefinition) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_flags(mut self, flags: CustomFlags) -> Self {
        self.custom_flags = flags;
        self
    }

    pub fn with_spawn_settings(mut self, settings: SpawnSettings) -> Self {
        self.spawn_settings = Some(settings);
        self
    }

    /// Team implied by the underlying native role type
    pub fn native_team(&self) -> Team {
        self.role.team()
    }

    /// Team the role is scored under
    pub fn effective_team(&self) -> Team {
        self.team.unwrap_or_else(|| self.native_team())
    }

    /// Declared custom team, only when it differs from the native one
    pub fn custom_team_override(&self) -> Option<Team> {
        self.team.filter(|team| *team != self.native_team())
    }

    /// Hume shield capacity (0 when the role has none)
    pub fn hume_shield_capacity(&self) -> f32 {
        self.health.as_ref().map(|h| h.hume_shield).unwrap_or(0.0)
    }

    /// Shield restored per regeneration step
    pub fn hume_shield_regeneration_amount(&self) -> f32 {
        self.health
            .as_ref()
            .map(|h| h.hume_shield_regeneration_amount)
            .unwrap_or(0.0)
    }

    /// Time without damage required before regeneration
    pub fn hume_shield_regeneration_delay(&self) -> chrono::Duration {
        let secs = self
            .health
            .as_ref()
            .map(|h| h.hume_shield_regeneration_delay)
            .unwrap_or(0.0)
            .max(0.0);
        chrono::Duration::milliseconds((secs * 1000.0) as i64)
    }

    /// Whether holders of this role need the periodic shield tick
    pub fn is_coroutine_role(&self) -> bool {
        self.hume_shield_capacity() > 0.0 && self.hume_shield_regeneration_amount() > 0.0
    }

    /// Whether the role replaces the player's badge
    pub fn has_custom_badge(&self) -> bool {
        let name_ok = self.badge_name.as_ref().map(|n| n.len() > 1).unwrap_or(false);
        let color_ok = self.badge_color.as_ref().map(|c| c.len() > 2).unwrap_or(false);
        name_ok && color_ok
    }

    /// Effects that must be kept alive for the whole life of an instance
    pub fn infinite_effects(&self) -> Vec<EffectDefinition> {
        self.effects
            .iter()
            .filter(|e| e.is_infinite())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EffectType;

    #[test]
    fn test_coroutine_role_requires_capacity_and_amount() {
        let role = CustomRole::new(1, "Shielded", RoleTypeId::ClassD);
        assert!(!role.is_coroutine_role());

        let role = role.with_hume_shield(50.0, 0.0, 5.0);
        assert!(!role.is_coroutine_role());

        let role = role.with_hume_shield(50.0, 5.0, 5.0);
        assert!(role.is_coroutine_role());

        let role = role.with_hume_shield(0.0, 5.0, 5.0);
        assert!(!role.is_coroutine_role());
    }

    #[test]
    fn test_custom_team_override() {
        let role = CustomRole::new(2, "Guard", RoleTypeId::FacilityGuard);
        assert_eq!(role.custom_team_override(), None);
        assert_eq!(role.effective_team(), Team::FoundationForces);

        let same = role.clone().with_team(Team::FoundationForces);
        assert_eq!(same.custom_team_override(), None);

        let traitor = role.with_team(Team::ChaosInsurgency);
        assert_eq!(traitor.custom_team_override(), Some(Team::ChaosInsurgency));
        assert_eq!(traitor.effective_team(), Team::ChaosInsurgency);
    }

    #[test]
    fn test_badge_thresholds() {
        let role = CustomRole::new(3, "Badge", RoleTypeId::Scientist);
        assert!(!role.has_custom_badge());
        assert!(!role.clone().with_badge("X", "red").has_custom_badge());
        assert!(!role.clone().with_badge("Boss", "rd").has_custom_badge());
        assert!(role.with_badge("Boss", "red").has_custom_badge());
    }

    #[test]
    fn test_regeneration_delay_conversion() {
        let role = CustomRole::new(4, "Delay", RoleTypeId::ClassD).with_hume_shield(10.0, 1.0, 2.5);
        assert_eq!(role.hume_shield_regeneration_delay(), chrono::Duration::milliseconds(2500));
    }

    #[test]
    fn test_infinite_effects_filter() {
        let role = CustomRole::new(5, "Fx", RoleTypeId::ClassD)
            .with_effect(EffectDefinition::infinite(EffectType::MovementBoost, 20))
            .with_effect(EffectDefinition::new(EffectType::Blinded, 1, 3.0));
        let infinite = role.infinite_effects();
        assert_eq!(infinite.len(), 1);
        assert_eq!(infinite[0].effect_type, EffectType::MovementBoost);
    }
}
