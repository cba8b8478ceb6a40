//! Role instances
//!
//! One [`RoleInstance`] exists per active custom-role holder. It is shared via
//! `Arc` between the registry and the scheduler tasks, so every field that
//! changes after construction uses interior mutability.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::host::{Badge, Player, PlayerId, PlayerInfoArea};
use crate::types::{CustomRole, EffectDefinition, RoleBaseOverride};

use super::modules::{CustomModule, ModuleKind, ModuleSet};

/// Per-tick callback contributed by modules or extensions
pub type CustomHook = Arc<dyn Fn(&RoleInstance) -> bool + Send + Sync>;

// ─────────────────────────────────────────────────────────────────
// Instance Id
// ─────────────────────────────────────────────────────────────────

/// Opaque identifier of a role instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the string form
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────
// Hook Policy
// ─────────────────────────────────────────────────────────────────

/// How the results of the per-tick custom hooks combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookPolicy {
    /// Every hook must return true (no hooks = approved)
    #[default]
    AllApprove,
    /// AND-accumulate from a false seed. Never approves; kept for hosts that
    /// depend on regeneration being driven only by their own hooks.
    FalseSeeded,
}

impl HookPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            HookPolicy::AllApprove => "all-approve",
            HookPolicy::FalseSeeded => "false-seeded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all-approve" | "all" => Some(HookPolicy::AllApprove),
            "false-seeded" | "legacy" => Some(HookPolicy::FalseSeeded),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Role Instance
// ─────────────────────────────────────────────────────────────────

/// Everything the spawn captured, handed to the instance at construction
pub(crate) struct InstanceParts {
    pub player: Arc<dyn Player>,
    pub role: Arc<CustomRole>,
    pub spawn_time: DateTime<Utc>,
    pub badge: Option<Badge>,
    pub infinite_effects: Vec<EffectDefinition>,
    pub is_custom_nickname: bool,
    pub info_area: PlayerInfoArea,
}

/// An active custom role bound to one player
pub struct RoleInstance {
    id: InstanceId,
    player: Arc<dyn Player>,
    role: Arc<CustomRole>,
    spawn_time: DateTime<Utc>,
    badge: Option<Badge>,
    infinite_effects: Vec<EffectDefinition>,
    is_custom_nickname: bool,
    info_area: PlayerInfoArea,
    candy_count: AtomicU32,
    last_damage: RwLock<Option<DateTime<Utc>>>,
    regenerating: AtomicBool,
    hooks: RwLock<Vec<CustomHook>>,
    role_base_override: Option<RoleBaseOverride>,
    valid: AtomicBool,
    modules: ModuleSet,
}

impl RoleInstance {
    pub(crate) fn new(
        id: InstanceId,
        parts: InstanceParts,
        modules: ModuleSet,
        role_base_override: Option<RoleBaseOverride>,
    ) -> Self {
        Self {
            id,
            player: parts.player,
            role: parts.role,
            spawn_time: parts.spawn_time,
            badge: parts.badge,
            infinite_effects: parts.infinite_effects,
            is_custom_nickname: parts.is_custom_nickname,
            info_area: parts.info_area,
            candy_count: AtomicU32::new(0),
            last_damage: RwLock::new(None),
            regenerating: AtomicBool::new(false),
            hooks: RwLock::new(Vec::new()),
            role_base_override,
            valid: AtomicBool::new(true),
            modules,
        }
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn player(&self) -> &Arc<dyn Player> {
        &self.player
    }

    pub fn player_id(&self) -> PlayerId {
        self.player.id()
    }

    pub fn role(&self) -> &Arc<CustomRole> {
        &self.role
    }

    pub fn spawn_time(&self) -> DateTime<Utc> {
        self.spawn_time
    }

    /// Badge captured before the role replaced it
    pub fn badge(&self) -> Option<&Badge> {
        self.badge.as_ref()
    }

    pub fn infinite_effects(&self) -> &[EffectDefinition] {
        &self.infinite_effects
    }

    pub fn is_custom_nickname(&self) -> bool {
        self.is_custom_nickname
    }

    /// Info sections shown before the spawn changed them
    pub fn info_area(&self) -> PlayerInfoArea {
        self.info_area
    }

    // ─────────────────────────────────────────────────────────────
    // Validity
    // ─────────────────────────────────────────────────────────────

    /// Not destroyed and the player is alive
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire) && self.player.is_alive()
    }

    pub(crate) fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }

    // ─────────────────────────────────────────────────────────────
    // Role Classification
    // ─────────────────────────────────────────────────────────────

    /// Whether the role needs the periodic shield tick
    pub fn is_coroutine_role(&self) -> bool {
        self.role.is_coroutine_role()
    }

    /// Whether a role base override was captured at creation
    pub fn is_overwritten_role(&self) -> bool {
        self.role_base_override.is_some()
    }

    pub fn role_base_override(&self) -> Option<RoleBaseOverride> {
        self.role_base_override
    }

    // ─────────────────────────────────────────────────────────────
    // External Event State
    // ─────────────────────────────────────────────────────────────

    pub fn candy_count(&self) -> u32 {
        self.candy_count.load(Ordering::Relaxed)
    }

    /// Count one more consumable interaction, returning the new total
    pub fn increment_candy(&self) -> u32 {
        self.candy_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn last_damage(&self) -> Option<DateTime<Utc>> {
        *self.last_damage.read()
    }

    /// Record that the holder took damage at `at`
    pub fn record_damage(&self, at: DateTime<Utc>) {
        *self.last_damage.write() = Some(at);
    }

    // ─────────────────────────────────────────────────────────────
    // Shield Regeneration State
    // ─────────────────────────────────────────────────────────────

    /// Whether a regeneration task currently owns the shield value
    pub fn is_regenerating(&self) -> bool {
        self.regenerating.load(Ordering::Acquire)
    }

    /// Claim the regeneration guard. Returns false if a task already holds it.
    pub(crate) fn begin_regeneration(&self) -> bool {
        self.regenerating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn end_regeneration(&self) {
        self.regenerating.store(false, Ordering::Release);
    }

    /// Current shield is below the role's capacity
    pub fn shield_below_capacity(&self) -> bool {
        self.player.hume_shield() < self.role.hume_shield_capacity()
    }

    /// Enough time passed since the last damage for regeneration
    pub fn regeneration_delay_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.last_damage() {
            Some(at) => now.signed_duration_since(at) >= self.role.hume_shield_regeneration_delay(),
            None => true,
        }
    }

    /// Shield below capacity and the damage delay satisfied
    pub fn can_regenerate(&self, now: DateTime<Utc>) -> bool {
        self.shield_below_capacity() && self.regeneration_delay_elapsed(now)
    }

    // ─────────────────────────────────────────────────────────────
    // Custom Hooks
    // ─────────────────────────────────────────────────────────────

    /// Append a hook evaluated once per scheduler tick
    pub fn add_hook(&self, hook: CustomHook) {
        self.hooks.write().push(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.read().len()
    }

    /// Run every hook in order and combine the results under `policy`.
    ///
    /// All hooks run even once the outcome is decided.
    pub fn evaluate_hooks(&self, policy: HookPolicy) -> bool {
        // Snapshot so hooks may add hooks without deadlocking
        let hooks: Vec<CustomHook> = self.hooks.read().clone();

        let mut result = match policy {
            HookPolicy::AllApprove => true,
            HookPolicy::FalseSeeded => false,
        };
        for hook in &hooks {
            result &= hook(self);
        }
        result
    }

    // ─────────────────────────────────────────────────────────────
    // Modules
    // ─────────────────────────────────────────────────────────────

    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    pub fn get_module(&self, kind: ModuleKind) -> Option<&dyn CustomModule> {
        self.modules.get(kind)
    }

    pub fn has_module(&self, kind: ModuleKind) -> bool {
        self.modules.has(kind)
    }
}

impl fmt::Debug for RoleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleInstance")
            .field("id", &self.id)
            .field("player", &self.player.id())
            .field("role", &self.role.id)
            .field("spawn_time", &self.spawn_time)
            .field("valid", &self.valid.load(Ordering::Relaxed))
            .field("regenerating", &self.is_regenerating())
            .field("role_base_override", &self.role_base_override)
            .field("modules", &self.modules.kinds())
            .finish()
    }
}
