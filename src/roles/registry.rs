//! Role registry: the live set of role instances
//!
//! Lookups are linear scans over an insertion-ordered list; a session holds
//! tens of instances at most.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::host::PlayerId;
use crate::types::CustomRole;

use super::{InstanceId, RoleInstance};

/// Thread-safe, insertion-ordered registry of role instances
pub struct RoleRegistry {
    instances: RwLock<Vec<Arc<RoleInstance>>>,
}

impl RoleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(Vec::new()),
        }
    }

    /// Append an instance
    pub fn add(&self, instance: Arc<RoleInstance>) {
        self.instances.write().push(instance);
    }

    /// Remove an instance by identity. Returns whether it was registered.
    pub fn remove(&self, instance: &RoleInstance) -> bool {
        let mut instances = self.instances.write();
        let before = instances.len();
        instances.retain(|i| i.id() != instance.id());
        instances.len() != before
    }

    /// Snapshot of every registered instance in insertion order
    pub fn all(&self) -> Vec<Arc<RoleInstance>> {
        self.instances.read().clone()
    }

    /// First instance held by the player
    pub fn by_player(&self, player: PlayerId) -> Option<Arc<RoleInstance>> {
        self.instances
            .read()
            .iter()
            .find(|i| i.player_id() == player)
            .cloned()
    }

    /// Instance with the given id
    pub fn by_id(&self, id: &InstanceId) -> Option<Arc<RoleInstance>> {
        self.instances.read().iter().find(|i| i.id() == id).cloned()
    }

    /// Every instance of this exact role definition
    pub fn by_role(&self, role: &Arc<CustomRole>) -> Vec<Arc<RoleInstance>> {
        self.instances
            .read()
            .iter()
            .filter(|i| Arc::ptr_eq(i.role(), role))
            .cloned()
            .collect()
    }

    /// Number of instances of this exact role definition
    pub fn count_by_role(&self, role: &Arc<CustomRole>) -> usize {
        self.instances
            .read()
            .iter()
            .filter(|i| Arc::ptr_eq(i.role(), role))
            .count()
    }

    /// Number of instances whose role has this catalogue id
    pub fn count_by_role_id(&self, role_id: i32) -> usize {
        self.instances
            .read()
            .iter()
            .filter(|i| i.role().id == role_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
