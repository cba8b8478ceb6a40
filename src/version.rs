//! Version and build information
//!
//! Build values are embedded by `build.rs`; the runtime section reports the
//! defaults this binary ships with.

use std::fmt;

use crate::catalogue::RoleCatalogue;
use crate::config::RuntimeConfig;
use crate::roles::ModuleKind;

/// Build information embedded at compile time
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Short commit hash
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    git_dirty_str: &'static str,
    pub build_timestamp: &'static str,
    /// Target triple
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc_version: &'static str,
    pub runtime: RuntimeInfo,
}

/// Defaults the runtime starts with when no configuration is given
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeInfo {
    pub tick_interval_ms: u64,
    pub regen_interval_ms: u64,
    pub sweep_interval_ms: u64,
    pub hook_policy: &'static str,
    pub duplicate_policy: &'static str,
    /// Roles in the bundled catalogue (0 if it failed to parse)
    pub bundled_roles: usize,
    /// Built-in capability module kinds
    pub module_kinds: usize,
}

impl RuntimeInfo {
    fn current() -> Self {
        let defaults = RuntimeConfig::default();
        Self {
            tick_interval_ms: defaults.scheduler.tick_interval_ms,
            regen_interval_ms: defaults.scheduler.regen_interval_ms,
            sweep_interval_ms: defaults.effects.sweep_interval_ms,
            hook_policy: defaults.scheduler.hook_policy.name(),
            duplicate_policy: defaults.registry.duplicate_policy.name(),
            bundled_roles: RoleCatalogue::bundled().map(|c| c.len()).unwrap_or(0),
            module_kinds: ModuleKind::all().len(),
        }
    }
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("CRR_GIT_HASH"),
            git_branch: env!("CRR_GIT_BRANCH"),
            git_dirty_str: env!("CRR_GIT_DIRTY"),
            build_timestamp: env!("CRR_BUILD_TIMESTAMP"),
            target: env!("CRR_TARGET"),
            profile: env!("CRR_PROFILE"),
            rustc_version: env!("CRR_RUSTC_VERSION"),
            runtime: RuntimeInfo::current(),
        }
    }

    pub fn git_dirty(&self) -> bool {
        self.git_dirty_str == "true"
    }

    /// Version with commit, e.g. "0.1.0-abc1234" (suffixed "-dirty" when needed)
    pub fn full_version(&self) -> String {
        let dirty = if self.git_dirty() { "-dirty" } else { "" };
        format!("{}-{}{}", self.version, self.git_hash, dirty)
    }

    /// Version details as JSON (`version --json`)
    pub fn to_json(&self) -> serde_json::Value {
        let rt = &self.runtime;
        serde_json::json!({
            "name": self.name,
            "version": self.version,
            "git_hash": self.git_hash,
            "git_branch": self.git_branch,
            "git_dirty": self.git_dirty(),
            "built": self.build_timestamp,
            "target": self.target,
            "profile": self.profile,
            "rustc": self.rustc_version,
            "runtime": {
                "tick_interval_ms": rt.tick_interval_ms,
                "regen_interval_ms": rt.regen_interval_ms,
                "sweep_interval_ms": rt.sweep_interval_ms,
                "hook_policy": rt.hook_policy,
                "duplicate_policy": rt.duplicate_policy,
                "bundled_roles": rt.bundled_roles,
                "module_kinds": rt.module_kinds,
            },
        })
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dirty = if self.git_dirty() { " (dirty)" } else { "" };
        let rt = &self.runtime;

        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f)?;
        writeln!(f, "Build Information:")?;
        writeln!(f, "  Git Hash:   {}{} on {}", self.git_hash, dirty, self.git_branch)?;
        writeln!(f, "  Built:      {} ({})", self.build_timestamp, self.profile)?;
        writeln!(f, "  Target:     {}", self.target)?;
        writeln!(f, "  Compiler:   {}", self.rustc_version)?;
        writeln!(f)?;
        writeln!(f, "Runtime Defaults:")?;
        writeln!(
            f,
            "  Intervals:  tick {} ms, regen {} ms, sweep {} ms",
            rt.tick_interval_ms, rt.regen_interval_ms, rt.sweep_interval_ms
        )?;
        writeln!(f, "  Hooks:      {}", rt.hook_policy)?;
        writeln!(f, "  Duplicates: {}", rt.duplicate_policy)?;
        writeln!(
            f,
            "  Catalogue:  {} bundled roles, {} module kinds",
            rt.bundled_roles, rt.module_kinds
        )?;
        Ok(())
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::current()
}

/// Print version information to stdout
pub fn print_version() {
    print!("{}", build_info());
}
