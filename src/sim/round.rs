//! Simulated round
//!
//! Drives a [`RoleManager`] against in-memory players: every player gets a
//! role from the catalogue, damage and effect expiry are injected on fixed
//! periods, and the round ends with a full teardown and a report.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::catalogue::RoleCatalogue;
use crate::config::SimulationSettings;
use crate::error::Result;
use crate::host::Player;
use crate::roles::{ChaosTally, ManagerSettings, RoleManager};
use crate::scheduler::StatsSnapshot;
use crate::types::RoleTypeId;

use super::{PlayerSnapshot, SimPlayer, SimSpawner};

// ─────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────

/// Simulated time running at a multiple of wall-clock time
#[derive(Debug, Clone)]
pub struct SimClock {
    origin: DateTime<Utc>,
    started: Instant,
    speed: f64,
}

impl SimClock {
    pub fn new(origin: DateTime<Utc>, speed: f64) -> Self {
        Self {
            origin,
            started: Instant::now(),
            speed,
        }
    }

    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    /// Current simulated time
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0 * self.speed;
        self.origin + Duration::milliseconds(elapsed_ms as i64)
    }
}

// ─────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────

/// Holders of one catalogue role at the end of a round
#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub id: i32,
    pub name: String,
    pub holders: usize,
}

/// Outcome of a simulated round
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub simulated_ms: i64,
    pub players: usize,
    pub roles: Vec<RoleSummary>,
    pub damage_events: u64,
    pub effect_expiries: u64,
    pub effects_reapplied: u64,
    pub chaos_value: i32,
    pub chaos_overridden: usize,
    pub scheduler: StatsSnapshot,
    pub destroyed: usize,
    pub final_players: Vec<PlayerSnapshot>,
}

// ─────────────────────────────────────────────────────────────────
// Round
// ─────────────────────────────────────────────────────────────────

/// One simulated round
pub struct Round {
    manager: RoleManager,
    spawner: Arc<SimSpawner>,
    chaos: Arc<ChaosTally>,
    catalogue: RoleCatalogue,
    players: Vec<Arc<SimPlayer>>,
    settings: SimulationSettings,
    started_at: DateTime<Utc>,
    next_damage_at: DateTime<Utc>,
    next_expire_at: DateTime<Utc>,
    damage_cursor: usize,
    expire_cursor: usize,
    damage_events: u64,
    effect_expiries: u64,
}

impl Round {
    /// Spawn the players and hand out catalogue roles round-robin
    pub fn start(
        catalogue: RoleCatalogue,
        settings: SimulationSettings,
        manager_settings: ManagerSettings,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let spawner = Arc::new(SimSpawner::new());
        let chaos = Arc::new(ChaosTally::new());
        let manager = RoleManager::new(spawner.clone(), manager_settings)
            .with_chaos_modifier(chaos.clone());

        let players: Vec<Arc<SimPlayer>> = (1..=settings.players)
            .map(|id| Arc::new(SimPlayer::new(id, format!("player-{id}"), RoleTypeId::ClassD)))
            .collect();

        if !catalogue.is_empty() {
            for (index, player) in players.iter().enumerate() {
                let role = &catalogue.roles()[index % catalogue.len()];
                let handle: Arc<dyn Player> = player.clone();
                manager.summon(&handle, role, now)?;
            }
        }

        info!(
            players = players.len(),
            roles = catalogue.len(),
            instances = manager.registry().len(),
            "Round started"
        );

        Ok(Self {
            next_damage_at: now + Duration::milliseconds(settings.damage_every_ms as i64),
            next_expire_at: now + Duration::milliseconds(settings.expire_every_ms as i64),
            manager,
            spawner,
            chaos,
            catalogue,
            players,
            settings,
            started_at: now,
            damage_cursor: 0,
            expire_cursor: 0,
            damage_events: 0,
            effect_expiries: 0,
        })
    }

    pub fn manager(&self) -> &RoleManager {
        &self.manager
    }

    pub fn spawner(&self) -> &SimSpawner {
        &self.spawner
    }

    pub fn players(&self) -> &[Arc<SimPlayer>] {
        &self.players
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the configured round length has passed
    pub fn is_over(&self, now: DateTime<Utc>) -> bool {
        now - self.started_at >= Duration::seconds(self.settings.duration_secs as i64)
    }

    /// Inject due events and run due scheduler tasks. Returns the steps run.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> usize {
        if !self.players.is_empty() {
            if self.settings.damage_every_ms > 0 {
                let period = Duration::milliseconds(self.settings.damage_every_ms as i64);
                while now >= self.next_damage_at {
                    self.inject_damage(self.next_damage_at);
                    self.next_damage_at = self.next_damage_at + period;
                }
            }
            if self.settings.expire_every_ms > 0 {
                let period = Duration::milliseconds(self.settings.expire_every_ms as i64);
                while now >= self.next_expire_at {
                    self.inject_expiry();
                    self.next_expire_at = self.next_expire_at + period;
                }
            }
        }

        self.manager.tick(now)
    }

    /// Re-apply lapsed infinite effects
    pub fn on_sweep(&self) -> usize {
        self.manager.run_infinite_effect_sweep()
    }

    fn inject_damage(&mut self, at: DateTime<Utc>) {
        let player = &self.players[self.damage_cursor % self.players.len()];
        self.damage_cursor += 1;
        let absorbed = player.take_damage(self.settings.damage_amount);
        self.manager.record_damage(player.id(), at);
        self.damage_events += 1;
        debug!(
            player = %player.id(),
            amount = self.settings.damage_amount,
            absorbed,
            "Damage injected"
        );
    }

    fn inject_expiry(&mut self) {
        let player = &self.players[self.expire_cursor % self.players.len()];
        self.expire_cursor += 1;
        let expired = player.expire_all_effects();
        self.effect_expiries += expired as u64;
        if expired > 0 {
            debug!(player = %player.id(), expired, "Effects expired");
        }
    }

    /// Tear every instance down and report
    pub fn finish(self, now: DateTime<Utc>) -> RoundReport {
        let roles = self
            .catalogue
            .roles()
            .iter()
            .map(|role| RoleSummary {
                id: role.id,
                name: role.name.clone(),
                holders: self.manager.count(role),
            })
            .collect();
        let chaos_value = self.chaos.value();
        let chaos_overridden = self.chaos.overridden();
        let scheduler = self.manager.scheduler_stats();
        let effects_reapplied = self.manager.effects_reapplied();

        let destroyed = self.manager.destroy_all();
        info!(destroyed, "Round finished");

        RoundReport {
            simulated_ms: (now - self.started_at).num_milliseconds(),
            players: self.players.len(),
            roles,
            damage_events: self.damage_events,
            effect_expiries: self.effect_expiries,
            effects_reapplied,
            chaos_value,
            chaos_overridden,
            scheduler,
            destroyed,
            final_players: self.players.iter().map(|p| p.snapshot()).collect(),
        }
    }
}
