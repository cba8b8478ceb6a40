//! Team and role-base overrides
//!
//! A custom role may declare a team different from the one its native role
//! type implies. When that change crosses the SCP / non-SCP boundary, the
//! native role object is captured and reinterpreted under the other profile so
//! type-sensitive game logic behaves like the custom team. Hosts patch their
//! team checks through [`OverrideResolver`].

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::host::Player;
use crate::types::{CustomRole, RoleBaseOverride, RoleProfile, Team};

use super::{RoleInstance, RoleRegistry};

/// Decide whether `role` needs a role-base override for `player`.
///
/// Only a change that crosses the SCP boundary captures one; an undeclared
/// custom team never does.
pub fn evaluate_role_base(role: &CustomRole, player: &dyn Player) -> Option<RoleBaseOverride> {
    let native = role.native_team();
    let custom = role.team?;

    if native == custom {
        return None;
    }

    let profile = match (native.is_scp(), custom.is_scp()) {
        (false, true) => RoleProfile::Scp,
        (true, false) => RoleProfile::Human,
        _ => return None,
    };

    let captured = RoleBaseOverride::new(player.role_type(), profile);
    debug!(
        player = %player.id(),
        role_id = role.id,
        native = %native,
        custom = %custom,
        profile = ?profile,
        "Role base override captured"
    );
    Some(captured)
}

// ─────────────────────────────────────────────────────────────────
// Chaos Modifier
// ─────────────────────────────────────────────────────────────────

/// Process-wide balancing value recomputed whenever the instance population
/// changes (creation, destruction).
pub trait ChaosModifier: Send + Sync {
    fn recompute(&self, instances: &[Arc<RoleInstance>]);
}

/// Default balancing tally: valid holders whose effective team is the Chaos
/// Insurgency, plus the number of overridden instances.
#[derive(Debug, Default)]
pub struct ChaosTally {
    modifier: AtomicI32,
    overridden: AtomicUsize,
    recomputations: AtomicUsize,
}

impl ChaosTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current chaos modifier
    pub fn value(&self) -> i32 {
        self.modifier.load(Ordering::Relaxed)
    }

    /// Instances holding a role base override at the last recompute
    pub fn overridden(&self) -> usize {
        self.overridden.load(Ordering::Relaxed)
    }

    /// How many times the value was recomputed
    pub fn recomputations(&self) -> usize {
        self.recomputations.load(Ordering::Relaxed)
    }
}

impl ChaosModifier for ChaosTally {
    fn recompute(&self, instances: &[Arc<RoleInstance>]) {
        let chaos = instances
            .iter()
            .filter(|i| i.is_valid() && i.role().effective_team() == Team::ChaosInsurgency)
            .count();
        let overridden = instances.iter().filter(|i| i.is_overwritten_role()).count();

        self.modifier.store(chaos as i32, Ordering::Relaxed);
        self.overridden.store(overridden, Ordering::Relaxed);
        self.recomputations.fetch_add(1, Ordering::Relaxed);

        debug!(chaos, overridden, "Chaos modifier recomputed");
    }
}

// ─────────────────────────────────────────────────────────────────
// Override Resolver
// ─────────────────────────────────────────────────────────────────

/// Team queries for hosts patching their native team checks
pub struct OverrideResolver<'a> {
    registry: &'a RoleRegistry,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(registry: &'a RoleRegistry) -> Self {
        Self { registry }
    }

    fn custom_team(&self, player: &dyn Player) -> Option<Team> {
        self.registry
            .by_player(player.id())
            .and_then(|instance| instance.role().custom_team_override())
    }

    /// The holder's custom team if it differs from the native-implied one.
    ///
    /// Returns `(true, custom)` when overridden, otherwise `(false, team of the
    /// player's current native role)`.
    pub fn try_patch_team(&self, player: &dyn Player) -> (bool, Team) {
        match self.custom_team(player) {
            Some(team) => (true, team),
            None => (false, player.role_type().team()),
        }
    }

    /// The captured role-base override, if any
    pub fn try_patch_role_base(&self, player: &dyn Player) -> Option<RoleBaseOverride> {
        self.registry
            .by_player(player.id())
            .and_then(|instance| instance.role_base_override())
    }

    /// `Some(matches)` when the player has a custom team, `None` otherwise
    pub fn try_check_team(&self, player: &dyn Player, candidate: Team) -> Option<bool> {
        self.custom_team(player).map(|team| team == candidate)
    }

    /// Custom team when overridden, else `default`, else the native team
    pub fn team_or_default(&self, player: &dyn Player, default: Option<Team>) -> Team {
        self.custom_team(player)
            .or(default)
            .unwrap_or_else(|| player.role_type().team())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPlayer;
    use crate::types::RoleTypeId;

    fn eval(native: RoleTypeId, team: Option<Team>) -> Option<RoleBaseOverride> {
        let mut role = CustomRole::new(1, "r", native);
        role.team = team;
        let player = SimPlayer::new(1, "p", native);
        evaluate_role_base(&role, &player)
    }

    #[test]
    fn test_human_to_scp_captures_scp_profile() {
        let captured = eval(RoleTypeId::ClassD, Some(Team::Scps)).unwrap();
        assert_eq!(captured.profile, RoleProfile::Scp);
        assert_eq!(captured.role, RoleTypeId::ClassD);
    }

    #[test]
    fn test_scp_to_human_captures_human_profile() {
        let captured = eval(RoleTypeId::Scp049, Some(Team::FoundationForces)).unwrap();
        assert_eq!(captured.profile, RoleProfile::Human);
        assert_eq!(captured.role, RoleTypeId::Scp049);
    }

    #[test]
    fn test_no_override_without_boundary_crossing() {
        // Equal teams
        assert!(eval(RoleTypeId::ClassD, Some(Team::ClassD)).is_none());
        assert!(eval(RoleTypeId::Scp173, Some(Team::Scps)).is_none());
        // Both non-SCP but different
        assert!(eval(RoleTypeId::NtfSergeant, Some(Team::ChaosInsurgency)).is_none());
        assert!(eval(RoleTypeId::Scientist, Some(Team::ClassD)).is_none());
        // No declared team
        assert!(eval(RoleTypeId::Scp096, None).is_none());
        assert!(eval(RoleTypeId::ClassD, None).is_none());
    }

    #[test]
    fn test_override_iff_exactly_one_side_is_scp() {
        let natives = [
            RoleTypeId::Scp173,
            RoleTypeId::Scp939,
            RoleTypeId::ClassD,
            RoleTypeId::NtfCaptain,
            RoleTypeId::ChaosRifleman,
            RoleTypeId::Tutorial,
        ];
        for native in natives {
            for team in Team::all() {
                let captured = eval(native, Some(*team)).is_some();
                let a = native.team();
                let expected = a != *team && (a.is_scp() != team.is_scp());
                assert_eq!(captured, expected, "native {} custom {}", native, team);
            }
        }
    }

    #[test]
    fn test_chaos_tally_counts() {
        let tally = ChaosTally::new();
        tally.recompute(&[]);
        assert_eq!(tally.value(), 0);
        assert_eq!(tally.overridden(), 0);
        assert_eq!(tally.recomputations(), 1);
    }
}
