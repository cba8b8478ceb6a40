//! Role lifecycle manager
//!
//! Owns the registry and the scheduler and runs the creation, cosmetic
//! teardown and destruction protocols. Hosts interact with the runtime through
//! [`RoleManager`] only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::host::{EventBinder, Player, PlayerId, Scale, SpawnReport, Spawner};
use crate::roles::instance::InstanceParts;
use crate::scheduler::{RegenerationScheduler, SchedulerConfig, StatsSnapshot};
use crate::types::CustomRole;

use super::{
    evaluate_role_base, ChaosModifier, ChaosTally, CustomHook, EffectMaintainer, InstanceId,
    ModuleCatalogue, ModuleContext, OverrideResolver, RoleInstance, RoleRegistry,
};

// ─────────────────────────────────────────────────────────────────
// Manager Settings
// ─────────────────────────────────────────────────────────────────

/// What `summon` does when the player already holds a custom role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Retire the existing instance once the new spawn succeeded
    #[default]
    Replace,
    /// Refuse with [`Error::DuplicateAssignment`] while the existing
    /// instance is still valid
    Reject,
    /// Register a second instance; player lookups return the oldest
    Allow,
}

impl DuplicatePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            DuplicatePolicy::Replace => "replace",
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::Allow => "allow",
        }
    }
}

/// Settings for the lifecycle manager
#[derive(Debug, Clone, Default)]
pub struct ManagerSettings {
    pub scheduler: SchedulerConfig,
    pub duplicate_policy: DuplicatePolicy,
}

// ─────────────────────────────────────────────────────────────────
// Role Manager
// ─────────────────────────────────────────────────────────────────

/// Creates, tracks and tears down custom role instances
pub struct RoleManager {
    registry: RoleRegistry,
    scheduler: RegenerationScheduler,
    modules: ModuleCatalogue,
    maintainer: EffectMaintainer,
    spawner: Arc<dyn Spawner>,
    events: Option<Arc<dyn EventBinder>>,
    chaos: Arc<dyn ChaosModifier>,
    duplicate_policy: DuplicatePolicy,
}

impl RoleManager {
    /// Create a manager spawning through `spawner`
    pub fn new(spawner: Arc<dyn Spawner>, settings: ManagerSettings) -> Self {
        Self {
            registry: RoleRegistry::new(),
            scheduler: RegenerationScheduler::new(settings.scheduler),
            modules: ModuleCatalogue::with_defaults(),
            maintainer: EffectMaintainer::new(),
            spawner,
            events: None,
            chaos: Arc::new(ChaosTally::new()),
            duplicate_policy: settings.duplicate_policy,
        }
    }

    /// Bind every new instance to the host's event handling
    pub fn with_event_binder(mut self, events: Arc<dyn EventBinder>) -> Self {
        self.events = Some(events);
        self
    }

    /// Replace the default chaos tally
    pub fn with_chaos_modifier(mut self, chaos: Arc<dyn ChaosModifier>) -> Self {
        self.chaos = chaos;
        self
    }

    /// Replace the default module catalogue
    pub fn with_module_catalogue(mut self, modules: ModuleCatalogue) -> Self {
        self.modules = modules;
        self
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &RegenerationScheduler {
        &self.scheduler
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    // ─────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────

    /// Spawn `role` onto `player` and attach a new instance.
    ///
    /// Roles with spawn settings go through the spawner's subclass path,
    /// everything else is applied directly. An instance the player already
    /// holds is retired only after the spawn succeeded; a stale one (destroyed
    /// or dead player) is always replaced, whatever the duplicate policy.
    /// Returns the instance found for the player afterwards.
    pub fn summon(
        &self,
        player: &Arc<dyn Player>,
        role: &Arc<CustomRole>,
        now: DateTime<Utc>,
    ) -> Result<Arc<RoleInstance>> {
        let player_id = player.id();

        // Validity is read before the spawn, which may revive the player
        let existing = self
            .registry
            .by_player(player_id)
            .map(|instance| {
                let stale = !instance.is_valid();
                (instance, stale)
            });

        if let Some((existing, false)) = &existing {
            if self.duplicate_policy == DuplicatePolicy::Reject {
                return Err(Error::duplicate_assignment(player_id, existing.role().id));
            }
        }

        let report = if role.spawn_settings.is_some() {
            self.spawner.spawn_custom_subclass(player, role)
        } else {
            self.spawner.apply_subclass(player, role)
        };
        let mut report = report.ok_or_else(|| Error::spawn_declined(player_id, role.id))?;

        if let Some((existing, stale)) = existing {
            if stale || self.duplicate_policy == DuplicatePolicy::Replace {
                debug!(
                    player = %player_id,
                    previous = existing.role().id,
                    stale,
                    "Replacing existing custom role"
                );
                self.hand_over(&existing, role, &mut report);
            } else {
                warn!(
                    player = %player_id,
                    existing = existing.role().id,
                    "Player already holds a custom role"
                );
            }
        }

        let instance = self.attach(player.clone(), role.clone(), report, now);
        Ok(self.registry.by_player(player_id).unwrap_or(instance))
    }

    /// Retire `previous` once `role` has been spawned over it.
    ///
    /// The new cosmetics are already on the player, so only what `role` did
    /// not set is reset. The badge and info area captured before the first
    /// role carry over into `report`.
    fn hand_over(&self, previous: &Arc<RoleInstance>, role: &CustomRole, report: &mut SpawnReport) {
        let player = previous.player();
        let old = previous.role();

        if old.has_custom_badge() {
            if let Some(badge) = previous.badge() {
                if role.has_custom_badge() {
                    report.badge = Some(badge.clone());
                } else {
                    player.set_rank(&badge.name, &badge.color);
                    player.refresh_tag();
                }
            }
        }

        report.info_area = previous.info_area();
        if role.custom_info.is_none() {
            player.set_info_area(previous.info_area());
            player.set_custom_info("");
        }
        if !role.infinite_stamina {
            player.set_using_stamina(true);
        }
        if role.scale.is_none() {
            player.set_scale(Scale::ONE);
        }
        if previous.is_custom_nickname() && role.nickname.is_none() {
            player.set_display_nickname(None);
        }

        self.retire(previous);
    }

    /// Construct and register an instance for a completed native spawn
    pub fn attach(
        &self,
        player: Arc<dyn Player>,
        role: Arc<CustomRole>,
        report: SpawnReport,
        now: DateTime<Utc>,
    ) -> Arc<RoleInstance> {
        let id = InstanceId::new();

        let modules = self.modules.load(
            role.custom_flags,
            &ModuleContext {
                instance: &id,
                player: player.id(),
                role: &role,
            },
        );
        let role_base_override = evaluate_role_base(&role, player.as_ref());

        let parts = InstanceParts {
            player,
            role,
            spawn_time: now,
            badge: report.badge,
            infinite_effects: report.infinite_effects,
            is_custom_nickname: report.is_custom_nickname,
            info_area: report.info_area,
        };
        let instance = Arc::new(RoleInstance::new(id, parts, modules, role_base_override));

        if instance.is_coroutine_role() {
            self.scheduler.start_role_tick(instance.clone(), now);
        }

        if let Some(events) = &self.events {
            events.bind(&instance);
        }

        self.registry.add(instance.clone());
        self.chaos.recompute(&self.registry.all());

        info!(
            instance = %instance.id(),
            player = %instance.player_id(),
            role_id = instance.role().id,
            role = %instance.role().name,
            overridden = instance.is_overwritten_role(),
            regenerates = instance.is_coroutine_role(),
            "Custom role attached"
        );

        instance
    }

    // ─────────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────────

    /// Restore the player's cosmetics. The instance stays valid and
    /// registered; calling this twice changes nothing further.
    pub fn remove(&self, instance: &RoleInstance) {
        let player = instance.player();
        let role = instance.role();

        if role.has_custom_badge() {
            if let Some(badge) = instance.badge() {
                player.set_rank(&badge.name, &badge.color);
                player.refresh_tag();
            }
        }

        player.set_info_area(instance.info_area());
        player.set_using_stamina(true);
        player.set_custom_info("");
        player.set_scale(Scale::ONE);

        if instance.is_custom_nickname() {
            player.set_display_nickname(None);
        }

        debug!(
            instance = %instance.id(),
            player = %instance.player_id(),
            "Role cosmetics removed"
        );
    }

    /// Restore cosmetics, invalidate and unregister the instance
    pub fn destroy(&self, instance: &Arc<RoleInstance>) {
        self.remove(instance);
        self.retire(instance);
    }

    /// Invalidate, unregister and unbind without touching cosmetics
    fn retire(&self, instance: &Arc<RoleInstance>) {
        instance.invalidate();
        let was_registered = self.registry.remove(instance);

        if let Some(events) = &self.events {
            events.unbind(instance);
        }
        self.chaos.recompute(&self.registry.all());

        info!(
            instance = %instance.id(),
            player = %instance.player_id(),
            role_id = instance.role().id,
            was_registered,
            "Custom role destroyed"
        );
    }

    /// Destroy every registered instance, oldest first
    pub fn destroy_all(&self) -> usize {
        let instances = self.registry.all();
        for instance in &instances {
            self.destroy(instance);
        }
        instances.len()
    }

    // ─────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────

    pub fn get_by_player(&self, player: PlayerId) -> Option<Arc<RoleInstance>> {
        self.registry.by_player(player)
    }

    pub fn get_by_id(&self, id: &InstanceId) -> Option<Arc<RoleInstance>> {
        self.registry.by_id(id)
    }

    pub fn get_by_role(&self, role: &Arc<CustomRole>) -> Vec<Arc<RoleInstance>> {
        self.registry.by_role(role)
    }

    /// Instance held by the player behind this handle
    pub fn try_get(&self, player: &dyn Player) -> Option<Arc<RoleInstance>> {
        self.registry.by_player(player.id())
    }

    pub fn count(&self, role: &Arc<CustomRole>) -> usize {
        self.registry.count_by_role(role)
    }

    pub fn count_by_role_id(&self, role_id: i32) -> usize {
        self.registry.count_by_role_id(role_id)
    }

    /// Team and role-base queries for native system patches
    pub fn resolver(&self) -> OverrideResolver<'_> {
        OverrideResolver::new(&self.registry)
    }

    // ─────────────────────────────────────────────────────────────
    // Host Tick Sources
    // ─────────────────────────────────────────────────────────────

    /// Resume scheduler tasks due at `now`
    pub fn tick(&self, now: DateTime<Utc>) -> usize {
        self.scheduler.run_due(now)
    }

    /// Re-apply every lapsed infinite effect
    pub fn run_infinite_effect_sweep(&self) -> usize {
        self.maintainer.sweep(&self.registry)
    }

    pub fn scheduler_stats(&self) -> StatsSnapshot {
        self.scheduler.stats()
    }

    pub fn effects_reapplied(&self) -> u64 {
        self.maintainer.reapplied_total()
    }

    // ─────────────────────────────────────────────────────────────
    // Host Events
    // ─────────────────────────────────────────────────────────────

    /// The player took damage at `at`. Returns whether they hold a role.
    pub fn record_damage(&self, player: PlayerId, at: DateTime<Utc>) -> bool {
        match self.registry.by_player(player) {
            Some(instance) => {
                instance.record_damage(at);
                true
            }
            None => false,
        }
    }

    /// The player interacted with a candy bowl. Returns the new count.
    pub fn record_candy(&self, player: PlayerId) -> Option<u32> {
        self.registry
            .by_player(player)
            .map(|instance| instance.increment_candy())
    }

    /// Attach a per-tick hook to the player's instance
    pub fn add_hook(&self, player: PlayerId, hook: CustomHook) -> bool {
        match self.registry.by_player(player) {
            Some(instance) => {
                instance.add_hook(hook);
                true
            }
            None => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PlayerInfoArea;
    use crate::roles::ModuleKind;
    use crate::sim::{SimPlayer, SimSpawner};
    use crate::types::{RoleTypeId, SpawnSettings, Team};
    use crate::roles::CustomFlags;

    fn manager() -> (Arc<SimSpawner>, RoleManager) {
        let spawner = Arc::new(SimSpawner::new());
        let manager = RoleManager::new(spawner.clone(), ManagerSettings::default());
        (spawner, manager)
    }

    fn player(id: u32) -> (Arc<SimPlayer>, Arc<dyn Player>) {
        let sim = Arc::new(SimPlayer::new(id, "player", RoleTypeId::ClassD));
        let handle: Arc<dyn Player> = sim.clone();
        (sim, handle)
    }

    #[test]
    fn test_summon_then_get() {
        let (_, manager) = manager();
        let (_, handle) = player(1);
        let role = Arc::new(CustomRole::new(5, "Janitor", RoleTypeId::ClassD));

        let instance = manager.summon(&handle, &role, Utc::now()).unwrap();
        let found = manager.get_by_player(PlayerId(1)).unwrap();

        assert_eq!(found.id(), instance.id());
        assert!(found.is_valid());
        assert!(Arc::ptr_eq(found.role(), &role));
        assert_eq!(manager.count(&role), 1);
        assert_eq!(manager.count_by_role_id(5), 1);
    }

    #[test]
    fn test_summon_picks_spawn_path() {
        let (spawner, manager) = manager();
        let plain = Arc::new(CustomRole::new(1, "Plain", RoleTypeId::ClassD));
        let spawnable = Arc::new(
            CustomRole::new(2, "Spawnable", RoleTypeId::ClassD).with_spawn_settings(SpawnSettings::default()),
        );

        manager.summon(&player(1).1, &plain, Utc::now()).unwrap();
        manager.summon(&player(2).1, &spawnable, Utc::now()).unwrap();

        assert_eq!(spawner.apply_calls(), 1);
        assert_eq!(spawner.subclass_calls(), 1);
    }

    #[test]
    fn test_declined_spawn_is_error() {
        let spawner = Arc::new(SimSpawner::declining());
        let manager = RoleManager::new(spawner, ManagerSettings::default());
        let role = Arc::new(CustomRole::new(1, "Plain", RoleTypeId::ClassD));

        let err = manager.summon(&player(1).1, &role, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::SpawnDeclined { role_id: 1, .. }));
        assert!(manager.registry().is_empty());
    }

    #[test]
    fn test_duplicate_policies() {
        let role = Arc::new(CustomRole::new(1, "A", RoleTypeId::ClassD));
        let (_, handle) = player(1);

        // Replace
        let (_, manager) = manager();
        let first = manager.summon(&handle, &role, Utc::now()).unwrap();
        let second = manager.summon(&handle, &role, Utc::now()).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(!first.is_valid());
        assert_eq!(manager.registry().len(), 1);

        // Reject
        let manager = RoleManager::new(
            Arc::new(SimSpawner::new()),
            ManagerSettings {
                duplicate_policy: DuplicatePolicy::Reject,
                ..Default::default()
            },
        );
        manager.summon(&handle, &role, Utc::now()).unwrap();
        let err = manager.summon(&handle, &role, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::DuplicateAssignment { existing_role_id: 1, .. }));

        // Allow
        let manager = RoleManager::new(
            Arc::new(SimSpawner::new()),
            ManagerSettings {
                duplicate_policy: DuplicatePolicy::Allow,
                ..Default::default()
            },
        );
        let first = manager.summon(&handle, &role, Utc::now()).unwrap();
        let again = manager.summon(&handle, &role, Utc::now()).unwrap();
        assert_eq!(manager.registry().len(), 2);
        assert_eq!(again.id(), first.id());
    }

    #[test]
    fn test_attach_loads_modules_and_override() {
        let (_, manager) = manager();
        let role = Arc::new(
            CustomRole::new(9, "Mimic", RoleTypeId::ClassD)
                .with_team(Team::Scps)
                .with_flags(CustomFlags::from_kinds(&[ModuleKind::SilentWalker])),
        );

        let instance = manager.summon(&player(1).1, &role, Utc::now()).unwrap();
        assert!(instance.has_module(ModuleKind::SilentWalker));
        assert!(!instance.has_module(ModuleKind::LifeStealer));
        assert!(instance.is_overwritten_role());
    }

    #[test]
    fn test_coroutine_role_starts_tick() {
        let (_, manager) = manager();
        let shielded = Arc::new(CustomRole::new(1, "S", RoleTypeId::ClassD).with_hume_shield(30.0, 5.0, 1.0));
        let plain = Arc::new(CustomRole::new(2, "P", RoleTypeId::ClassD));

        manager.summon(&player(1).1, &shielded, Utc::now()).unwrap();
        assert_eq!(manager.scheduler().pending(), 1);

        manager.summon(&player(2).1, &plain, Utc::now()).unwrap();
        assert_eq!(manager.scheduler().pending(), 1);
    }

    #[test]
    fn test_remove_is_idempotent_and_keeps_registration() {
        let (_, manager) = manager();
        let (sim, handle) = player(1);
        sim.set_rank("Admin", "red");
        let role = Arc::new(
            CustomRole::new(1, "Warden", RoleTypeId::ClassD)
                .with_badge("Warden", "yellow")
                .with_nickname("The Warden")
                .with_custom_info("Keeps order"),
        );

        let instance = manager.summon(&handle, &role, Utc::now()).unwrap();
        manager.remove(&instance);
        let once = sim.snapshot();
        manager.remove(&instance);
        let twice = sim.snapshot();

        assert_eq!(once.rank_name, twice.rank_name);
        assert_eq!(once.rank_color, twice.rank_color);
        assert_eq!(once.custom_info, twice.custom_info);
        assert_eq!(once.display_nickname, twice.display_nickname);
        assert_eq!(once.scale, twice.scale);
        assert_eq!(once.info_area, twice.info_area);
        assert!(instance.is_valid());
        assert!(manager.get_by_player(PlayerId(1)).is_some());
    }

    #[test]
    fn test_destroy_restores_and_unregisters() {
        let (_, manager) = manager();
        let (sim, handle) = player(1);
        sim.set_rank("Admin", "red");
        let role = Arc::new(
            CustomRole::new(1, "Warden", RoleTypeId::ClassD)
                .with_badge("Warden", "yellow")
                .with_nickname("The Warden")
                .with_custom_info("Keeps order"),
        );

        let instance = manager.summon(&handle, &role, Utc::now()).unwrap();
        assert_eq!(sim.snapshot().rank_name.as_deref(), Some("Warden"));

        manager.destroy(&instance);
        let state = sim.snapshot();
        assert!(manager.get_by_player(PlayerId(1)).is_none());
        assert!(!instance.is_valid());
        assert_eq!(state.rank_name.as_deref(), Some("Admin"));
        assert_eq!(state.rank_color.as_deref(), Some("red"));
        assert!(state.using_stamina);
        assert_eq!(state.custom_info, "");
        assert_eq!(state.scale, Scale::ONE);
        assert_eq!(state.display_nickname, None);
        assert_eq!(state.info_area, PlayerInfoArea::ALL);
    }

    #[test]
    fn test_host_events() {
        let (_, manager) = manager();
        let role = Arc::new(CustomRole::new(1, "A", RoleTypeId::ClassD));
        let instance = manager.summon(&player(1).1, &role, Utc::now()).unwrap();

        let at = Utc::now();
        assert!(manager.record_damage(PlayerId(1), at));
        assert_eq!(instance.last_damage(), Some(at));
        assert!(!manager.record_damage(PlayerId(2), at));

        assert_eq!(manager.record_candy(PlayerId(1)), Some(1));
        assert_eq!(manager.record_candy(PlayerId(2)), None);

        assert!(manager.add_hook(PlayerId(1), Arc::new(|_: &RoleInstance| true)));
        assert_eq!(instance.hook_count(), 1);
    }

    #[test]
    fn test_chaos_recomputed_on_population_change() {
        let spawner = Arc::new(SimSpawner::new());
        let tally = Arc::new(ChaosTally::new());
        let manager = RoleManager::new(spawner, ManagerSettings::default()).with_chaos_modifier(tally.clone());
        let role = Arc::new(CustomRole::new(1, "Turncoat", RoleTypeId::NtfPrivate).with_team(Team::ChaosInsurgency));

        let instance = manager.summon(&player(1).1, &role, Utc::now()).unwrap();
        assert_eq!(tally.value(), 1);

        manager.destroy(&instance);
        assert_eq!(tally.value(), 0);
        assert_eq!(tally.recomputations(), 2);
    }
}
