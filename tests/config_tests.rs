//! Configuration system tests
//!
//! Tests configuration loading, validation, and environment overrides

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use custom_role_runtime::config::RuntimeConfig;
use custom_role_runtime::roles::{DuplicatePolicy, HookPolicy};

/// Test fixture for configuration testing
struct ConfigFixture {
    _temp_dir: TempDir,
    config_path: PathBuf,
}

impl ConfigFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        Self {
            _temp_dir: temp_dir,
            config_path,
        }
    }

    fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).unwrap();
    }

    fn path(&self) -> &str {
        self.config_path.to_str().unwrap()
    }
}

fn host_cmd() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("custom-role-host").unwrap()
}

// ─────────────────────────────────────────────────────────────────
// Valid Configuration Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_empty_config_uses_defaults() {
    let fixture = ConfigFixture::new();
    fixture.write_config("");

    let config = RuntimeConfig::load(Some(fixture.path())).unwrap();
    assert_eq!(config.scheduler.tick_interval_ms, 250);
    assert_eq!(config.scheduler.regen_interval_ms, 1000);
    assert_eq!(config.effects.sweep_interval_ms, 1000);
    assert_eq!(config.simulation.players, 8);
}

#[test]
fn test_full_config() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[scheduler]
tick_interval_ms = 500
regen_interval_ms = 2000
hook_policy = "false-seeded"

[registry]
duplicate_policy = "allow"

[effects]
sweep_interval_ms = 750

[logging]
level = "debug"
json_format = true

[simulation]
players = 12
duration_secs = 90
speed = 4.0
damage_every_ms = 1500
damage_amount = 35.0
expire_every_ms = 6000
"#,
    );

    let config = RuntimeConfig::load(Some(fixture.path())).unwrap();
    assert_eq!(config.scheduler.tick_interval_ms, 500);
    assert_eq!(config.scheduler.hook_policy, HookPolicy::FalseSeeded);
    assert_eq!(config.registry.duplicate_policy, DuplicatePolicy::Allow);
    assert_eq!(config.effects.sweep_interval_ms, 750);
    assert!(config.logging.json_format);
    assert_eq!(config.simulation.players, 12);
    assert_eq!(config.simulation.damage_amount, 35.0);

    let settings = config.manager_settings();
    assert_eq!(settings.duplicate_policy, DuplicatePolicy::Allow);
    assert_eq!(
        settings.scheduler.regen_interval,
        chrono::Duration::milliseconds(2000)
    );
}

// ─────────────────────────────────────────────────────────────────
// Invalid Configuration Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_zero_regen_interval() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[scheduler]\nregen_interval_ms = 0\n");

    host_cmd()
        .args(["config", "validate", "--config", fixture.path()])
        .assert()
        .failure()
        .stderr(predicates::str::contains("regen_interval_ms"));
}

#[test]
fn test_unknown_hook_policy() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[scheduler]\nhook_policy = \"sometimes\"\n");

    let err = RuntimeConfig::load(Some(fixture.path())).unwrap_err();
    assert_eq!(err.exit_code(), 10);
}

#[test]
fn test_invalid_log_level() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[logging]\nlevel = \"chatty\"\n");

    host_cmd()
        .args(["config", "validate", "--config", fixture.path()])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Invalid log level"));
}

#[test]
fn test_malformed_toml() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[scheduler\ntick_interval_ms = ");

    host_cmd()
        .args(["config", "validate", "--config", fixture.path()])
        .assert()
        .code(10)
        .stderr(predicates::str::contains("Failed to parse configuration"));
}

// ─────────────────────────────────────────────────────────────────
// Config Show Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_custom() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[scheduler]
tick_interval_ms = 125

[registry]
duplicate_policy = "reject"
"#,
    );

    host_cmd()
        .args(["config", "show", "--config", fixture.path()])
        .assert()
        .success()
        .stdout(predicates::str::contains("tick_interval_ms = 125"))
        .stdout(predicates::str::contains("duplicate_policy = \"reject\""));
}

// ─────────────────────────────────────────────────────────────────
// Config Init Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_init_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("runtime.toml");

    host_cmd()
        .args(["config", "init", "--path", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicates::str::contains("Configuration written"));

    assert!(config_path.exists());

    host_cmd()
        .args(["config", "validate", "--config", config_path.to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn test_config_init_refuses_overwrite() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[scheduler]\n");

    host_cmd()
        .args(["config", "init", "--path", fixture.path()])
        .assert()
        .failure()
        .stderr(predicates::str::contains("already exists"));
}

#[test]
fn test_config_init_force_overwrite() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[scheduler]\ntick_interval_ms = 4242\n");

    host_cmd()
        .args(["config", "init", "--path", fixture.path(), "--force"])
        .assert()
        .success();

    let content = fs::read_to_string(fixture.path()).unwrap();
    assert!(!content.contains("4242"));
    assert!(content.contains("tick_interval_ms = 250"));
}

// ─────────────────────────────────────────────────────────────────
// Environment Variable Override Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_env_override_beats_file() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[scheduler]\ntick_interval_ms = 300\n");

    host_cmd()
        .args(["config", "show", "--config", fixture.path()])
        .env("CUSTOM_ROLES_TICK_INTERVAL_MS", "75")
        .env("CUSTOM_ROLES_DUPLICATE_POLICY", "allow")
        .assert()
        .success()
        .stdout(predicates::str::contains("tick_interval_ms = 75"))
        .stdout(predicates::str::contains("duplicate_policy = \"allow\""));
}

#[test]
fn test_env_override_players() {
    host_cmd()
        .args(["config", "show"])
        .env("CUSTOM_ROLES_PLAYERS", "21")
        .assert()
        .success()
        .stdout(predicates::str::contains("players = 21"));
}

// ─────────────────────────────────────────────────────────────────
// Path Expansion Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_tilde_expansion() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[simulation]
catalogue = "~/custom-roles/roles.toml"
"#,
    );

    let output = host_cmd()
        .args(["config", "show", "--config", fixture.path()])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("catalogue = "));
    assert!(!stdout.contains("catalogue = \"~"));
}
