//! Simulated player
//!
//! In-memory implementation of [`Player`] used by the host binary's simulated
//! rounds and by tests.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

use crate::host::{Badge, Player, PlayerId, PlayerInfoArea, Scale};
use crate::types::{EffectType, RoleTypeId};

#[derive(Debug)]
struct PlayerState {
    nickname: String,
    role: RoleTypeId,
    alive: bool,
    hume_shield: f32,
    health: f32,
    rank: Option<Badge>,
    tag_refreshes: u32,
    using_stamina: bool,
    custom_info: String,
    scale: Scale,
    display_nickname: Option<String>,
    info_area: PlayerInfoArea,
    effects: HashMap<EffectType, (u8, f32)>,
    enable_counts: HashMap<EffectType, u32>,
}

/// Observable state of a simulated player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub id: u32,
    pub nickname: String,
    pub role: RoleTypeId,
    pub alive: bool,
    pub hume_shield: f32,
    pub health: f32,
    pub rank_name: Option<String>,
    pub rank_color: Option<String>,
    pub tag_refreshes: u32,
    pub using_stamina: bool,
    pub custom_info: String,
    pub scale: Scale,
    pub display_nickname: Option<String>,
    pub info_area: PlayerInfoArea,
    pub active_effects: usize,
}

/// A player living entirely in memory
#[derive(Debug)]
pub struct SimPlayer {
    id: PlayerId,
    state: Mutex<PlayerState>,
}

impl SimPlayer {
    /// Create an alive player holding `role`
    pub fn new(id: u32, nickname: impl Into<String>, role: RoleTypeId) -> Self {
        Self {
            id: PlayerId(id),
            state: Mutex::new(PlayerState {
                nickname: nickname.into(),
                role,
                alive: true,
                hume_shield: 0.0,
                health: 100.0,
                rank: None,
                tag_refreshes: 0,
                using_stamina: true,
                custom_info: String::new(),
                scale: Scale::ONE,
                display_nickname: None,
                info_area: PlayerInfoArea::ALL,
                effects: HashMap::new(),
                enable_counts: HashMap::new(),
            }),
        }
    }

    /// Kill the player; they become a spectator
    pub fn kill(&self) {
        let mut state = self.state.lock();
        state.alive = false;
        state.role = RoleTypeId::Spectator;
        state.hume_shield = 0.0;
        state.effects.clear();
    }

    /// Apply damage, shield first. Returns the damage the shield absorbed.
    pub fn take_damage(&self, amount: f32) -> f32 {
        let mut state = self.state.lock();
        let absorbed = amount.min(state.hume_shield);
        state.hume_shield -= absorbed;
        state.health = (state.health - (amount - absorbed)).max(0.0);
        absorbed
    }

    /// Intensity and duration of an active effect
    pub fn effect(&self, effect: EffectType) -> Option<(u8, f32)> {
        self.state.lock().effects.get(&effect).copied()
    }

    /// How many times the effect was enabled
    pub fn enable_count(&self, effect: EffectType) -> u32 {
        self.state.lock().enable_counts.get(&effect).copied().unwrap_or(0)
    }

    /// Let one effect lapse, as the native effect system would
    pub fn expire_effect(&self, effect: EffectType) -> bool {
        self.state.lock().effects.remove(&effect).is_some()
    }

    /// Let every active effect lapse. Returns how many did.
    pub fn expire_all_effects(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.effects.len();
        state.effects.clear();
        count
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let state = self.state.lock();
        PlayerSnapshot {
            id: self.id.0,
            nickname: state.nickname.clone(),
            role: state.role,
            alive: state.alive,
            hume_shield: state.hume_shield,
            health: state.health,
            rank_name: state.rank.as_ref().map(|b| b.name.clone()),
            rank_color: state.rank.as_ref().map(|b| b.color.clone()),
            tag_refreshes: state.tag_refreshes,
            using_stamina: state.using_stamina,
            custom_info: state.custom_info.clone(),
            scale: state.scale,
            display_nickname: state.display_nickname.clone(),
            info_area: state.info_area,
            active_effects: state.effects.len(),
        }
    }
}

impl Player for SimPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn is_alive(&self) -> bool {
        let state = self.state.lock();
        state.alive && state.role.is_alive()
    }

    fn role_type(&self) -> RoleTypeId {
        self.state.lock().role
    }

    fn set_role_type(&self, role: RoleTypeId) {
        let mut state = self.state.lock();
        state.role = role;
        state.alive = role.is_alive();
    }

    fn hume_shield(&self) -> f32 {
        self.state.lock().hume_shield
    }

    fn set_hume_shield(&self, value: f32) {
        self.state.lock().hume_shield = value;
    }

    fn rank(&self) -> Option<Badge> {
        self.state.lock().rank.clone()
    }

    fn set_rank(&self, name: &str, color: &str) {
        let mut state = self.state.lock();
        state.rank = if name.is_empty() {
            None
        } else {
            Some(Badge::new(name, color, false))
        };
    }

    fn refresh_tag(&self) {
        self.state.lock().tag_refreshes += 1;
    }

    fn set_using_stamina(&self, enabled: bool) {
        self.state.lock().using_stamina = enabled;
    }

    fn set_custom_info(&self, text: &str) {
        self.state.lock().custom_info = text.to_string();
    }

    fn set_scale(&self, scale: Scale) {
        self.state.lock().scale = scale;
    }

    fn set_display_nickname(&self, nickname: Option<&str>) {
        self.state.lock().display_nickname = nickname.map(str::to_string);
    }

    fn info_area(&self) -> PlayerInfoArea {
        self.state.lock().info_area
    }

    fn set_info_area(&self, area: PlayerInfoArea) {
        self.state.lock().info_area = area;
    }

    fn has_effect(&self, effect: EffectType) -> bool {
        self.state.lock().effects.contains_key(&effect)
    }

    fn enable_effect(&self, effect: EffectType, intensity: u8, duration: f32) {
        let mut state = self.state.lock();
        state.effects.insert(effect, (intensity, duration));
        *state.enable_counts.entry(effect).or_insert(0) += 1;
    }
}
