//! Regeneration scheduler
//!
//! Runs the per-instance role tick and the nested shield regeneration loop as
//! explicit timed tasks. The host resumes due tasks with
//! [`RegenerationScheduler::run_due`]; nothing runs between calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::roles::{HookPolicy, InstanceId, RoleInstance};

use super::{ScheduledTask, SchedulerStats, StatsSnapshot, TaskKind};

// ─────────────────────────────────────────────────────────────────
// Scheduler Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for the regeneration scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period of the outer role tick
    pub tick_interval: chrono::Duration,

    /// Period of one shield regeneration step
    pub regen_interval: chrono::Duration,

    /// How per-tick hook results combine
    pub hook_policy: HookPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: chrono::Duration::milliseconds(250),
            regen_interval: chrono::Duration::seconds(1),
            hook_policy: HookPolicy::AllApprove,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Regeneration Scheduler
// ─────────────────────────────────────────────────────────────────

/// Cooperative timed-task scheduler for role instances
pub struct RegenerationScheduler {
    config: SchedulerConfig,
    tasks: Mutex<Vec<ScheduledTask>>,
    next_id: AtomicU64,
    stats: SchedulerStats,
}

impl RegenerationScheduler {
    /// Create a new scheduler
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            stats: SchedulerStats::default(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn next_task(&self, kind: TaskKind, instance: Arc<RoleInstance>, now: DateTime<Utc>) -> ScheduledTask {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        ScheduledTask::new(id, kind, instance, now)
    }

    /// Queue the outer role tick for an instance. It first runs on the next
    /// `run_due` at or after `now`.
    pub fn start_role_tick(&self, instance: Arc<RoleInstance>, now: DateTime<Utc>) {
        let task = self.next_task(TaskKind::RoleTick, instance, now);
        debug!(
            task_id = task.id,
            instance = %task.instance.id(),
            player = %task.instance.player_id(),
            "Role tick started"
        );
        self.tasks.lock().push(task);
    }

    /// Resume every task due at `now` once, in wake order. Returns the number
    /// of steps run.
    pub fn run_due(&self, now: DateTime<Utc>) -> usize {
        let mut due: Vec<ScheduledTask> = {
            let mut tasks = self.tasks.lock();
            let (due, waiting): (Vec<_>, Vec<_>) = tasks.drain(..).partition(|t| t.is_due(now));
            *tasks = waiting;
            due
        };
        due.sort_by(|a, b| a.wake_at.cmp(&b.wake_at).then(a.id.cmp(&b.id)));

        let count = due.len();
        let mut continuations = Vec::with_capacity(count);

        for task in due {
            self.stats.record_step();
            let next = match task.kind {
                TaskKind::RoleTick => self.step_role_tick(task, now, &mut continuations),
                TaskKind::ShieldRegen => self.step_regen(task, now),
            };
            if let Some(next) = next {
                continuations.push(next);
            }
        }

        if !continuations.is_empty() {
            self.tasks.lock().extend(continuations);
        }
        count
    }

    /// One outer tick. Returns the continuation, if the tick keeps running.
    fn step_role_tick(
        &self,
        task: ScheduledTask,
        now: DateTime<Utc>,
        spawned: &mut Vec<ScheduledTask>,
    ) -> Option<ScheduledTask> {
        let instance = task.instance.clone();

        if !instance.is_valid() || !instance.is_coroutine_role() {
            debug!(
                task_id = task.id,
                instance = %instance.id(),
                steps = task.steps,
                "Role tick finished"
            );
            self.stats.record_tick_finished();
            return None;
        }

        let approved = instance.evaluate_hooks(self.config.hook_policy);
        if approved && instance.can_regenerate(now) {
            if let Some(regen) = self.start_regen(instance, now) {
                spawned.push(regen);
            }
        }

        Some(task.reschedule(now, self.config.tick_interval))
    }

    /// Claim the guard and run the first regeneration step right away.
    /// Returns the continuation, if the loop keeps running.
    fn start_regen(&self, instance: Arc<RoleInstance>, now: DateTime<Utc>) -> Option<ScheduledTask> {
        if !instance.begin_regeneration() {
            self.stats.record_regen_skipped();
            return None;
        }

        self.stats.record_regen_started();
        let task = self.next_task(TaskKind::ShieldRegen, instance, now);
        debug!(
            task_id = task.id,
            instance = %task.instance.id(),
            shield = task.instance.player().hume_shield(),
            "Shield regeneration started"
        );

        self.stats.record_step();
        self.step_regen(task, now)
    }

    /// One regeneration step. Clears the guard when the loop ends.
    fn step_regen(&self, task: ScheduledTask, now: DateTime<Utc>) -> Option<ScheduledTask> {
        let instance = &task.instance;

        if !instance.is_valid() || !instance.can_regenerate(now) {
            instance.end_regeneration();
            self.stats.record_regen_finished();
            debug!(
                task_id = task.id,
                instance = %instance.id(),
                steps = task.steps,
                shield = instance.player().hume_shield(),
                "Shield regeneration finished"
            );
            return None;
        }

        let role = instance.role();
        let player = instance.player();
        let capacity = role.hume_shield_capacity();
        let value = (player.hume_shield() + role.hume_shield_regeneration_amount()).min(capacity);
        player.set_hume_shield(value);

        trace!(
            instance = %instance.id(),
            shield = value,
            capacity,
            "Shield regenerated"
        );

        Some(task.reschedule(now, self.config.regen_interval))
    }

    /// Tasks waiting to run
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Pending tasks of `kind` bound to the instance
    pub fn pending_for(&self, instance: &InstanceId, kind: TaskKind) -> usize {
        self.tasks
            .lock()
            .iter()
            .filter(|t| t.kind == kind && t.instance.id() == instance)
            .count()
    }

    /// Earliest wake time among pending tasks
    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        self.tasks.lock().iter().map(|t| t.wake_at).min()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for RegenerationScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Player, PlayerInfoArea};
    use crate::roles::instance::InstanceParts;
    use crate::roles::ModuleSet;
    use crate::sim::SimPlayer;
    use crate::types::{CustomRole, RoleTypeId};
    use chrono::{Duration, TimeZone};

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    fn shielded(capacity: f32, amount: f32, delay: f32) -> (Arc<SimPlayer>, Arc<RoleInstance>) {
        let role = CustomRole::new(7, "Guardian", RoleTypeId::ClassD).with_hume_shield(capacity, amount, delay);
        let player = Arc::new(SimPlayer::new(1, "guardian", role.role));
        let instance = Arc::new(RoleInstance::new(
            InstanceId::new(),
            InstanceParts {
                player: player.clone(),
                role: Arc::new(role),
                spawn_time: t(0),
                badge: None,
                infinite_effects: vec![],
                is_custom_nickname: false,
                info_area: PlayerInfoArea::ALL,
            },
            ModuleSet::default(),
            None,
        ));
        (player, instance)
    }

    /// Drive the scheduler in tick-sized steps up to and including `until_ms`
    fn drive(scheduler: &RegenerationScheduler, from_ms: i64, until_ms: i64) {
        let mut now = from_ms;
        while now <= until_ms {
            scheduler.run_due(t(now));
            now += 250;
        }
    }

    #[test]
    fn test_regen_adds_amount_once_per_second_until_capacity() {
        let scheduler = RegenerationScheduler::default();
        let (player, instance) = shielded(30.0, 10.0, 0.0);
        player.set_hume_shield(0.0);
        scheduler.start_role_tick(instance.clone(), t(0));

        scheduler.run_due(t(0));
        assert_eq!(player.hume_shield(), 10.0);
        assert!(instance.is_regenerating());

        drive(&scheduler, 250, 750);
        assert_eq!(player.hume_shield(), 10.0);

        drive(&scheduler, 1000, 1750);
        assert_eq!(player.hume_shield(), 20.0);

        drive(&scheduler, 2000, 2750);
        assert_eq!(player.hume_shield(), 30.0);

        drive(&scheduler, 3000, 5000);
        assert_eq!(player.hume_shield(), 30.0);
        assert!(!instance.is_regenerating());
        assert_eq!(scheduler.stats().regen_started, 1);
        assert_eq!(scheduler.stats().regen_finished, 1);
    }

    #[test]
    fn test_at_most_one_regen_task_per_instance() {
        let scheduler = RegenerationScheduler::default();
        let (player, instance) = shielded(100.0, 5.0, 0.0);
        player.set_hume_shield(0.0);
        scheduler.start_role_tick(instance.clone(), t(0));

        let mut now = 0;
        while now <= 4000 {
            scheduler.run_due(t(now));
            assert!(scheduler.pending_for(instance.id(), TaskKind::ShieldRegen) <= 1);
            now += 250;
        }
        assert_eq!(scheduler.stats().regen_started, 1);
        // Steps at 0, 1, 2, 3, 4 s
        assert_eq!(player.hume_shield(), 25.0);
    }

    #[test]
    fn test_damage_delay_gates_regeneration() {
        let scheduler = RegenerationScheduler::default();
        let (player, instance) = shielded(50.0, 10.0, 2.0);
        player.set_hume_shield(0.0);
        instance.record_damage(t(0));
        scheduler.start_role_tick(instance.clone(), t(0));

        drive(&scheduler, 0, 1750);
        assert_eq!(player.hume_shield(), 0.0);
        assert!(!instance.is_regenerating());

        scheduler.run_due(t(2000));
        assert_eq!(player.hume_shield(), 10.0);

        // Damage during regeneration stops the loop at its next step
        instance.record_damage(t(2500));
        drive(&scheduler, 2500, 3000);
        assert_eq!(player.hume_shield(), 10.0);
        assert!(!instance.is_regenerating());
    }

    #[test]
    fn test_regen_clamps_to_capacity() {
        let scheduler = RegenerationScheduler::default();
        let (player, instance) = shielded(25.0, 10.0, 0.0);
        player.set_hume_shield(20.0);
        scheduler.start_role_tick(instance, t(0));

        scheduler.run_due(t(0));
        assert_eq!(player.hume_shield(), 25.0);
    }

    #[test]
    fn test_hooks_gate_regeneration() {
        let scheduler = RegenerationScheduler::default();
        let (player, instance) = shielded(30.0, 10.0, 0.0);
        player.set_hume_shield(0.0);
        instance.add_hook(Arc::new(|_: &RoleInstance| false));
        scheduler.start_role_tick(instance.clone(), t(0));

        drive(&scheduler, 0, 2000);
        assert_eq!(player.hume_shield(), 0.0);
        assert_eq!(scheduler.stats().regen_started, 0);
    }

    #[test]
    fn test_false_seeded_policy_never_regenerates() {
        let scheduler = RegenerationScheduler::new(SchedulerConfig {
            hook_policy: HookPolicy::FalseSeeded,
            ..SchedulerConfig::default()
        });
        let (player, instance) = shielded(30.0, 10.0, 0.0);
        player.set_hume_shield(0.0);
        instance.add_hook(Arc::new(|_: &RoleInstance| true));
        scheduler.start_role_tick(instance, t(0));

        drive(&scheduler, 0, 2000);
        assert_eq!(player.hume_shield(), 0.0);
    }

    #[test]
    fn test_tick_ends_when_instance_invalid() {
        let scheduler = RegenerationScheduler::default();
        let (player, instance) = shielded(30.0, 10.0, 0.0);
        player.set_hume_shield(0.0);
        scheduler.start_role_tick(instance.clone(), t(0));
        scheduler.run_due(t(0));
        assert_eq!(scheduler.pending(), 2);

        player.kill();
        drive(&scheduler, 250, 1000);
        assert_eq!(scheduler.pending(), 0);
        assert!(!instance.is_regenerating());
        assert_eq!(scheduler.stats().ticks_finished, 1);
    }

    #[test]
    fn test_non_coroutine_role_tick_exits() {
        let scheduler = RegenerationScheduler::default();
        let (_, instance) = shielded(0.0, 10.0, 0.0);
        scheduler.start_role_tick(instance, t(0));
        assert_eq!(scheduler.run_due(t(0)), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_nothing_due_before_wake() {
        let scheduler = RegenerationScheduler::default();
        let (_, instance) = shielded(30.0, 10.0, 0.0);
        scheduler.start_role_tick(instance, t(1000));
        assert_eq!(scheduler.run_due(t(999)), 0);
        assert_eq!(scheduler.next_wake(), Some(t(1000)));
    }
}
