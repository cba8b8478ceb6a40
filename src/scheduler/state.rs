//! Scheduled task state
//!
//! A task is a resumable unit bound to one role instance with the time it
//! next wants to run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::roles::RoleInstance;

// ─────────────────────────────────────────────────────────────────
// Task Kind
// ─────────────────────────────────────────────────────────────────

/// What a scheduled task does when resumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Outer per-instance tick: hooks and regeneration eligibility
    RoleTick,
    /// Inner shield regeneration loop
    ShieldRegen,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::RoleTick => write!(f, "role-tick"),
            TaskKind::ShieldRegen => write!(f, "shield-regen"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Scheduled Task
// ─────────────────────────────────────────────────────────────────

/// A task waiting for its wake time
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    /// Monotonic id, breaks ties between tasks due at the same instant
    pub id: u64,

    pub kind: TaskKind,

    /// Instance the task drives
    pub instance: Arc<RoleInstance>,

    /// When the task next runs
    pub wake_at: DateTime<Utc>,

    /// When the task was started
    pub started_at: DateTime<Utc>,

    /// Completed steps so far
    pub steps: u32,
}

impl ScheduledTask {
    pub fn new(id: u64, kind: TaskKind, instance: Arc<RoleInstance>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            instance,
            wake_at: now,
            started_at: now,
            steps: 0,
        }
    }

    /// Whether the task should run at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.wake_at <= now
    }

    /// Suspend until `now + period`
    pub fn reschedule(mut self, now: DateTime<Utc>, period: chrono::Duration) -> Self {
        self.steps += 1;
        self.wake_at = now + period;
        self
    }
}

// ─────────────────────────────────────────────────────────────────
// Scheduler Stats
// ─────────────────────────────────────────────────────────────────

/// Counters kept since the scheduler was created
#[derive(Debug, Default)]
pub struct SchedulerStats {
    steps: AtomicU64,
    ticks_finished: AtomicU64,
    regen_started: AtomicU64,
    regen_finished: AtomicU64,
    regen_skipped: AtomicU64,
}

impl SchedulerStats {
    pub(crate) fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tick_finished(&self) {
        self.ticks_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_regen_started(&self) {
        self.regen_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_regen_finished(&self) {
        self.regen_finished.fetch_add(1, Ordering::Relaxed);
    }

    /// A tick wanted to regenerate but the guard was already held
    pub(crate) fn record_regen_skipped(&self) {
        self.regen_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            steps: self.steps.load(Ordering::Relaxed),
            ticks_finished: self.ticks_finished.load(Ordering::Relaxed),
            regen_started: self.regen_started.load(Ordering::Relaxed),
            regen_finished: self.regen_finished.load(Ordering::Relaxed),
            regen_skipped: self.regen_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SchedulerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub steps: u64,
    pub ticks_finished: u64,
    pub regen_started: u64,
    pub regen_finished: u64,
    pub regen_skipped: u64,
}
