//! Host collaborator interfaces
//!
//! The runtime never owns players or performs spawns itself. The host game
//! hands it handles implementing [`Player`], a [`Spawner`] that physically
//! assigns native roles, and optionally an [`EventBinder`] that wires
//! per-instance event handling.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::roles::RoleInstance;
use crate::types::{CustomRole, EffectDefinition, EffectType, RoleTypeId};

// ─────────────────────────────────────────────────────────────────
// Player Identity & Cosmetics
// ─────────────────────────────────────────────────────────────────

/// Session-scoped player identifier assigned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Visual scale of a player model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Scale {
    /// Unit scale every teardown restores
    pub const ONE: Scale = Scale {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::ONE
    }
}

/// A player's rank badge as shown in the player list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Rank text
    pub name: String,

    /// Rank color
    pub color: String,

    /// Whether the badge was hidden by the player
    pub hidden: bool,
}

impl Badge {
    pub fn new(name: impl Into<String>, color: impl Into<String>, hidden: bool) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            hidden,
        }
    }
}

/// Bitmask of the info sections shown above a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerInfoArea(pub u16);

impl PlayerInfoArea {
    pub const NONE: PlayerInfoArea = PlayerInfoArea(0);
    pub const NICKNAME: PlayerInfoArea = PlayerInfoArea(1);
    pub const BADGE: PlayerInfoArea = PlayerInfoArea(1 << 1);
    pub const CUSTOM_INFO: PlayerInfoArea = PlayerInfoArea(1 << 2);
    pub const ROLE: PlayerInfoArea = PlayerInfoArea(1 << 3);
    pub const UNIT_NAME: PlayerInfoArea = PlayerInfoArea(1 << 4);
    pub const POWER_STATUS: PlayerInfoArea = PlayerInfoArea(1 << 5);
    pub const ALL: PlayerInfoArea = PlayerInfoArea(0b11_1111);

    pub fn contains(&self, other: PlayerInfoArea) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: PlayerInfoArea) -> Self {
        PlayerInfoArea(self.0 | other.0)
    }

    pub fn without(self, other: PlayerInfoArea) -> Self {
        PlayerInfoArea(self.0 & !other.0)
    }
}

impl Default for PlayerInfoArea {
    fn default() -> Self {
        Self::ALL
    }
}

// ─────────────────────────────────────────────────────────────────
// Player
// ─────────────────────────────────────────────────────────────────

/// Handle to a live player owned by the host game.
///
/// All methods take `&self`: the handle is a view onto host state, and the
/// runtime only ever calls into it from the host's logical thread.
pub trait Player: Send + Sync {
    /// Session identifier
    fn id(&self) -> PlayerId;

    /// Whether the player is currently alive
    fn is_alive(&self) -> bool;

    /// Current native role type
    fn role_type(&self) -> RoleTypeId;

    /// Assign a native role type
    fn set_role_type(&self, role: RoleTypeId);

    /// Current hume shield value
    fn hume_shield(&self) -> f32;

    /// Set the hume shield value
    fn set_hume_shield(&self, value: f32);

    /// Current rank badge, if the player has one
    fn rank(&self) -> Option<Badge>;

    /// Set rank name and color
    fn set_rank(&self, name: &str, color: &str);

    /// Push the rank badge to clients
    fn refresh_tag(&self);

    /// Enable or disable stamina usage
    fn set_using_stamina(&self, enabled: bool);

    /// Set the custom info text (empty clears it)
    fn set_custom_info(&self, text: &str);

    /// Set the visual scale
    fn set_scale(&self, scale: Scale);

    /// Override the displayed nickname (None clears the override)
    fn set_display_nickname(&self, nickname: Option<&str>);

    /// Info sections currently shown
    fn info_area(&self) -> PlayerInfoArea;

    /// Set the info sections shown
    fn set_info_area(&self, area: PlayerInfoArea);

    /// Whether the effect is currently active
    fn has_effect(&self, effect: EffectType) -> bool;

    /// Enable an effect at the given intensity for `duration` seconds
    fn enable_effect(&self, effect: EffectType, intensity: u8, duration: f32);
}

// ─────────────────────────────────────────────────────────────────
// Spawner
// ─────────────────────────────────────────────────────────────────

/// What the spawner captured while physically applying a role
#[derive(Debug, Clone, Default)]
pub struct SpawnReport {
    /// Badge the player had before the role replaced it
    pub badge: Option<Badge>,

    /// Effects that must be kept alive
    pub infinite_effects: Vec<EffectDefinition>,

    /// Whether the spawn changed the displayed nickname
    pub is_custom_nickname: bool,

    /// Info sections shown before the spawn changed them
    pub info_area: PlayerInfoArea,
}

/// Physically assigns native roles and role cosmetics.
///
/// Returns `None` when the spawn did not happen (player left, role refused).
pub trait Spawner: Send + Sync {
    /// Spawn through the catalogue path (roles with spawn settings)
    fn spawn_custom_subclass(&self, player: &Arc<dyn Player>, role: &CustomRole) -> Option<SpawnReport>;

    /// Apply the role directly onto the player
    fn apply_subclass(&self, player: &Arc<dyn Player>, role: &CustomRole) -> Option<SpawnReport>;
}

/// Per-instance event wiring owned by the host
pub trait EventBinder: Send + Sync {
    /// Called once an instance is constructed
    fn bind(&self, instance: &Arc<RoleInstance>);

    /// Called when an instance is destroyed
    fn unbind(&self, instance: &Arc<RoleInstance>);
}
