//! Native role and team classification
//!
//! Mirrors the host game's own role table: every native role type belongs to
//! exactly one team, and the SCP team is the boundary the override resolver
//! cares about.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Team
// ─────────────────────────────────────────────────────────────────

/// Team a player is scored and balanced under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Anomalous entities
    #[serde(alias = "SCPs", alias = "Scps")]
    Scps,
    /// Guards and MTF units
    FoundationForces,
    /// Chaos Insurgency
    ChaosInsurgency,
    /// Facility scientists
    Scientists,
    /// Class-D personnel
    ClassD,
    /// Spectators and other non-playing roles
    Dead,
    /// Alive but outside every faction (tutorial and similar)
    OtherAlive,
}

impl Team {
    /// Get all teams
    pub fn all() -> &'static [Team] {
        &[
            Team::Scps,
            Team::FoundationForces,
            Team::ChaosInsurgency,
            Team::Scientists,
            Team::ClassD,
            Team::Dead,
            Team::OtherAlive,
        ]
    }

    /// Get the team name
    pub fn name(&self) -> &'static str {
        match self {
            Team::Scps => "SCPs",
            Team::FoundationForces => "FoundationForces",
            Team::ChaosInsurgency => "ChaosInsurgency",
            Team::Scientists => "Scientists",
            Team::ClassD => "ClassD",
            Team::Dead => "Dead",
            Team::OtherAlive => "OtherAlive",
        }
    }

    /// Whether this is the SCP classification
    pub fn is_scp(&self) -> bool {
        matches!(self, Team::Scps)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─────────────────────────────────────────────────────────────────
// Native Role Type
// ─────────────────────────────────────────────────────────────────

/// Native role types known to the host game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleTypeId {
    Scp173,
    Scp106,
    Scp049,
    Scp079,
    Scp096,
    Scp0492,
    Scp939,
    Scp3114,
    ClassD,
    Scientist,
    FacilityGuard,
    NtfPrivate,
    NtfSergeant,
    NtfSpecialist,
    NtfCaptain,
    ChaosConscript,
    ChaosRifleman,
    ChaosRepressor,
    ChaosMarauder,
    Tutorial,
    Spectator,
    Overwatch,
    Filmmaker,
    None,
}

impl RoleTypeId {
    /// Team implied by this native role type
    pub fn team(&self) -> Team {
        match self {
            RoleTypeId::Scp173
            | RoleTypeId::Scp106
            | RoleTypeId::Scp049
            | RoleTypeId::Scp079
            | RoleTypeId::Scp096
            | RoleTypeId::Scp0492
            | RoleTypeId::Scp939
            | RoleTypeId::Scp3114 => Team::Scps,
            RoleTypeId::ClassD => Team::ClassD,
            RoleTypeId::Scientist => Team::Scientists,
            RoleTypeId::FacilityGuard
            | RoleTypeId::NtfPrivate
            | RoleTypeId::NtfSergeant
            | RoleTypeId::NtfSpecialist
            | RoleTypeId::NtfCaptain => Team::FoundationForces,
            RoleTypeId::ChaosConscript
            | RoleTypeId::ChaosRifleman
            | RoleTypeId::ChaosRepressor
            | RoleTypeId::ChaosMarauder => Team::ChaosInsurgency,
            RoleTypeId::Tutorial => Team::OtherAlive,
            RoleTypeId::Spectator
            | RoleTypeId::Overwatch
            | RoleTypeId::Filmmaker
            | RoleTypeId::None => Team::Dead,
        }
    }

    /// Whether a player with this role counts as alive
    pub fn is_alive(&self) -> bool {
        self.team() != Team::Dead
    }
}

impl fmt::Display for RoleTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Role Base Override
// ─────────────────────────────────────────────────────────────────

/// Movement and ability profile the native game logic applies to a role object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleProfile {
    /// Standard first-person SCP logic
    Scp,
    /// Human logic
    Human,
}

/// A player's native role object captured and reinterpreted under another
/// profile, substituted into team-sensitive game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleBaseOverride {
    /// Native role the player held when the override was captured
    pub role: RoleTypeId,

    /// Profile the native role object is reinterpreted as
    pub profile: RoleProfile,
}

impl RoleBaseOverride {
    pub fn new(role: RoleTypeId, profile: RoleProfile) -> Self {
        Self { role, profile }
    }
}
