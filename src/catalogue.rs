//! Role catalogue
//!
//! Custom role definitions are read from a TOML file holding a `[[roles]]`
//! array. A catalogue is validated as a whole when it is loaded, and each
//! role is handed out as an `Arc<CustomRole>` so instances share it.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::CustomRole;

/// Catalogue shipped with the host binary
const BUNDLED_CATALOGUE: &str = include_str!("../config/roles.toml");

#[derive(Debug, Deserialize)]
struct CatalogueFile {
    #[serde(default)]
    roles: Vec<CustomRole>,
}

/// A validated set of custom roles
#[derive(Debug, Clone, Default)]
pub struct RoleCatalogue {
    roles: Vec<Arc<CustomRole>>,
}

impl RoleCatalogue {
    /// Load and validate a catalogue file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let catalogue = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            roles = catalogue.len(),
            "Role catalogue loaded"
        );
        Ok(catalogue)
    }

    /// The catalogue bundled with the binary
    pub fn bundled() -> Result<Self> {
        Self::from_toml(BUNDLED_CATALOGUE)
    }

    /// Load from `path`, or fall back to the bundled catalogue
    pub fn load_or_bundled(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(Path::new(path)),
            None => {
                debug!("No catalogue configured, using bundled roles");
                Self::bundled()
            }
        }
    }

    /// Parse and validate catalogue text
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogueFile = toml::from_str(content).map_err(|e| Error::CatalogueParse {
            message: e.to_string(),
            source: Some(e),
        })?;
        Self::from_roles(file.roles)
    }

    /// Build a catalogue from already constructed roles
    pub fn from_roles(roles: Vec<CustomRole>) -> Result<Self> {
        let catalogue = Self {
            roles: roles.into_iter().map(Arc::new).collect(),
        };
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn roles(&self) -> &[Arc<CustomRole>] {
        &self.roles
    }

    pub fn get(&self, id: i32) -> Option<Arc<CustomRole>> {
        self.roles.iter().find(|r| r.id == id).cloned()
    }

    /// Like [`get`](Self::get), but a missing id is an error
    pub fn require(&self, id: i32) -> Result<Arc<CustomRole>> {
        self.get(id).ok_or(Error::RoleNotFound { role_id: id })
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Check every definition. Stops at the first invalid role.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for role in &self.roles {
            if !seen.insert(role.id) {
                return Err(Error::catalogue_invalid(role.id, "duplicate role id"));
            }
            validate_role(role)?;
        }
        Ok(())
    }
}

fn validate_role(role: &CustomRole) -> Result<()> {
    if role.name.trim().is_empty() {
        return Err(Error::catalogue_invalid(role.id, "name must not be empty"));
    }

    if !role.role.is_alive() {
        return Err(Error::catalogue_invalid(
            role.id,
            format!("native role {} cannot be held by a living player", role.role),
        ));
    }

    if let Some(health) = &role.health {
        if health.hume_shield < 0.0
            || health.hume_shield_regeneration_amount < 0.0
            || health.hume_shield_regeneration_delay < 0.0
        {
            return Err(Error::catalogue_invalid(
                role.id,
                "hume shield values must not be negative",
            ));
        }
        if health.amount <= 0.0 || health.maximum <= 0.0 {
            return Err(Error::catalogue_invalid(role.id, "health must be positive"));
        }
    }

    if let Some(scale) = role.scale {
        if scale.x <= 0.0 || scale.y <= 0.0 || scale.z <= 0.0 {
            return Err(Error::catalogue_invalid(
                role.id,
                "scale components must be positive",
            ));
        }
    }

    if role.badge_name.is_some() != role.badge_color.is_some() {
        return Err(Error::catalogue_invalid(
            role.id,
            "badge_name and badge_color must be set together",
        ));
    }

    if let Some(spawn) = &role.spawn_settings {
        if spawn.spawn_chance > 100 {
            return Err(Error::catalogue_invalid(
                role.id,
                "spawn_chance must be between 0 and 100",
            ));
        }
        if spawn.max_players != 0 && spawn.max_players < spawn.min_players {
            return Err(Error::catalogue_invalid(
                role.id,
                "max_players must be 0 or at least min_players",
            ));
        }
    }

    Ok(())
}
