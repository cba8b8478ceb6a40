//! Common test utilities and fixtures

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use custom_role_runtime::host::Player;
use custom_role_runtime::sim::SimPlayer;
use custom_role_runtime::types::RoleTypeId;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

pub fn valid_roles_fixture() -> PathBuf {
    fixture_path("roles_valid.toml")
}

pub fn duplicate_roles_fixture() -> PathBuf {
    fixture_path("roles_duplicate.toml")
}

/// Fixed round start used by time-driven tests
pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn at_ms(ms: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::milliseconds(ms)
}

/// A simulated player plus the trait-object handle the runtime takes
pub fn player(id: u32, role: RoleTypeId) -> (Arc<SimPlayer>, Arc<dyn Player>) {
    let sim = Arc::new(SimPlayer::new(id, format!("player-{id}"), role));
    let handle: Arc<dyn Player> = sim.clone();
    (sim, handle)
}
