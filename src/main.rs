//! Custom role host
//!
//! Entry point of the `custom-role-host` binary. Runs simulated rounds on the
//! custom role runtime and exposes catalogue and configuration tooling.

mod cli;

use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{debug, info, warn};

use custom_role_runtime::catalogue::RoleCatalogue;
use custom_role_runtime::config::{self, RuntimeConfig};
use custom_role_runtime::error::{Error, Result};
use custom_role_runtime::logging::{self, LogGuards};
use custom_role_runtime::sim::{Round, RoundReport, SimClock};
use custom_role_runtime::version;

use crate::cli::{Cli, Commands, ConfigSubcommand, RolesSubcommand};

fn main() -> Result<()> {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    match &cli.command {
        Commands::Version { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(&version::build_info().to_json())?);
            } else {
                version::print_version();
            }
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand.clone());
        }
        Commands::Roles { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_roles_command(subcommand.clone());
        }
        Commands::Run { .. } => {}
    }

    let Commands::Run {
        config: config_path,
        catalogue,
        players,
        duration_secs,
        speed,
        json,
    } = cli.command
    else {
        return Ok(());
    };

    let mut config = match RuntimeConfig::load(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => exit_with(e),
    };

    // CLI flags take precedence over file and environment
    if catalogue.is_some() {
        config.simulation.catalogue = catalogue;
    }
    if let Some(players) = players {
        config.simulation.players = players;
    }
    if let Some(duration_secs) = duration_secs {
        config.simulation.duration_secs = duration_secs;
    }
    if let Some(speed) = speed {
        config.simulation.speed = speed;
    }
    if let Err(e) = config.validate() {
        exit_with(e);
    }

    let _log_guards = init_logging_from_config(&config, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    info!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting custom role host"
    );

    let report = run_round(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Print a formatted error and exit with its code
fn exit_with(e: Error) -> ! {
    eprint!("{}", e.format_for_terminal());
    std::process::exit(e.exit_code());
}

fn init_logging_from_config(config: &RuntimeConfig, verbose: u8, quiet: bool) -> Result<LogGuards> {
    logging::init_logging(&config.logging, verbose, quiet)
}

/// Longest wall-clock timer period the round loop will arm
const MAX_WALL_PERIOD_SECS: f64 = 3600.0;

/// Wall-clock period of a simulated period at the configured speed,
/// clamped between 1 ms and an hour
fn wall_period(simulated_ms: u64, speed: f64) -> Duration {
    let secs = simulated_ms as f64 / 1000.0 / speed;
    let secs = if secs.is_finite() {
        secs.clamp(0.001, MAX_WALL_PERIOD_SECS)
    } else {
        MAX_WALL_PERIOD_SECS
    };
    Duration::from_secs_f64(secs)
}

/// Run one simulated round on a single-threaded runtime
fn run_round(config: RuntimeConfig) -> Result<RoundReport> {
    let catalogue = match RoleCatalogue::load_or_bundled(config.simulation.catalogue.as_deref()) {
        Ok(catalogue) => catalogue,
        Err(e) => exit_with(e),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    runtime.block_on(async_round_main(config, catalogue))
}

async fn async_round_main(config: RuntimeConfig, catalogue: RoleCatalogue) -> Result<RoundReport> {
    let speed = config.simulation.speed;
    let clock = SimClock::new(Utc::now(), speed);

    info!(
        players = config.simulation.players,
        duration_secs = config.simulation.duration_secs,
        speed,
        roles = catalogue.len(),
        duplicate_policy = config.registry.duplicate_policy.name(),
        hook_policy = config.scheduler.hook_policy.name(),
        "Configuration loaded"
    );

    let mut round = Round::start(
        catalogue,
        config.simulation.clone(),
        config.manager_settings(),
        clock.now(),
    )?;

    let shutdown_signal = tokio::signal::ctrl_c();
    tokio::pin!(shutdown_signal);

    let mut tick_timer =
        tokio::time::interval(wall_period(config.scheduler.tick_interval_ms, speed));
    tick_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut sweep_timer =
        tokio::time::interval(wall_period(config.effects.sweep_interval_ms, speed));
    sweep_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!("Round event loop started");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                warn!("Shutdown signal received, ending round early");
                break;
            }

            _ = tick_timer.tick() => {
                let now = clock.now();
                let steps = round.on_tick(now);
                if steps > 0 {
                    debug!(steps, pending = round.manager().scheduler().pending(), "Scheduler steps run");
                }
                if round.is_over(now) {
                    info!("Round length reached");
                    break;
                }
            }

            _ = sweep_timer.tick() => {
                let reapplied = round.on_sweep();
                if reapplied > 0 {
                    debug!(reapplied, "Infinite effects re-applied");
                }
            }
        }
    }

    Ok(round.finish(clock.now()))
}

fn print_report(report: &RoundReport) {
    println!();
    println!("Round Report ({:.1}s simulated):", report.simulated_ms as f64 / 1000.0);
    println!("  Players:            {}", report.players);
    for role in &report.roles {
        println!("  Role {:>3} {:<20} {} holder(s)", role.id, role.name, role.holders);
    }
    println!("  Damage events:      {}", report.damage_events);
    println!("  Effects expired:    {}", report.effect_expiries);
    println!("  Effects re-applied: {}", report.effects_reapplied);
    println!("  Chaos value:        {}", report.chaos_value);
    println!(
        "  Regenerations:      {} started, {} finished, {} skipped",
        report.scheduler.regen_started, report.scheduler.regen_finished, report.scheduler.regen_skipped
    );
    println!("  Scheduler steps:    {}", report.scheduler.steps);
    println!("  Instances destroyed: {}", report.destroyed);
}

/// Handle role catalogue subcommands
fn handle_roles_command(subcommand: RolesSubcommand) -> Result<()> {
    match subcommand {
        RolesSubcommand::List { catalogue, json } => {
            let catalogue = load_catalogue_or_exit(catalogue.as_deref());
            if json {
                let roles: Vec<_> = catalogue.roles().iter().map(|r| r.as_ref()).collect();
                println!("{}", serde_json::to_string_pretty(&roles)?);
            } else {
                for role in catalogue.roles() {
                    println!(
                        "{:>4}  {:<24} {:<16} team={:<18} shield={}{}",
                        role.id,
                        role.name,
                        role.role,
                        role.effective_team(),
                        role.hume_shield_capacity(),
                        if role.spawn_settings.is_some() { " (spawnable)" } else { "" }
                    );
                }
            }
        }
        RolesSubcommand::Show { id, catalogue } => {
            let catalogue = load_catalogue_or_exit(catalogue.as_deref());
            match catalogue.require(id) {
                Ok(role) => println!("{}", toml::to_string_pretty(role.as_ref())?),
                Err(e) => exit_with(e),
            }
        }
        RolesSubcommand::Validate { catalogue } => {
            let catalogue = load_catalogue_or_exit(catalogue.as_deref());
            println!("Catalogue is valid ({} roles).", catalogue.len());
        }
    }

    Ok(())
}

fn load_catalogue_or_exit(path: Option<&str>) -> RoleCatalogue {
    match RoleCatalogue::load_or_bundled(path) {
        Ok(catalogue) => catalogue,
        Err(e) => exit_with(e),
    }
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = RuntimeConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => match config::init_config(path.as_deref(), force) {
            Ok(path) => println!("Configuration written to {}", path.display()),
            Err(e) => exit_with(e),
        },
        ConfigSubcommand::Validate { config } => match RuntimeConfig::load(config.as_deref()) {
            Ok(_) => println!("Configuration is valid."),
            Err(e) => exit_with(e),
        },
    }

    Ok(())
}
