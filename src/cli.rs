//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface of the custom role host.

use clap::{Parser, Subcommand};

/// Custom role host - runs the custom role runtime against simulated players
///
/// Loads a role catalogue, hands roles out to simulated players and drives
/// shield regeneration, effect maintenance and teardown for one round.
#[derive(Parser, Debug)]
#[command(name = "custom-role-host")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the host
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulated round
    Run {
        /// Path to configuration file
        #[arg(short, long, env = "CUSTOM_ROLES_CONFIG")]
        config: Option<String>,

        /// Role catalogue to use instead of the configured one
        #[arg(long)]
        catalogue: Option<String>,

        /// Number of simulated players
        #[arg(long)]
        players: Option<u32>,

        /// Round length in simulated seconds
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Simulated seconds per wall-clock second
        #[arg(long)]
        speed: Option<f64>,

        /// Print the round report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Role catalogue inspection
    Roles {
        #[command(subcommand)]
        subcommand: RolesSubcommand,
    },

    /// Display version and build information
    Version {
        /// Print build information as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Role catalogue subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum RolesSubcommand {
    /// List every role in the catalogue
    List {
        /// Catalogue file (defaults to the bundled catalogue)
        #[arg(long)]
        catalogue: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one role definition
    Show {
        /// Role id
        id: i32,

        /// Catalogue file (defaults to the bundled catalogue)
        #[arg(long)]
        catalogue: Option<String>,
    },

    /// Validate a catalogue file
    Validate {
        /// Catalogue file (defaults to the bundled catalogue)
        #[arg(long)]
        catalogue: Option<String>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["custom-role-host", "run"]);
        match cli.command {
            Commands::Run {
                config,
                catalogue,
                players,
                json,
                ..
            } => {
                assert!(config.is_none());
                assert!(catalogue.is_none());
                assert!(players.is_none());
                assert!(!json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_with_overrides() {
        let cli = Cli::parse_from([
            "custom-role-host",
            "run",
            "--config",
            "/path/to/config.toml",
            "--players",
            "4",
            "--duration-secs",
            "2",
            "--speed",
            "10",
            "--json",
        ]);
        match cli.command {
            Commands::Run {
                config,
                players,
                duration_secs,
                speed,
                json,
                ..
            } => {
                assert_eq!(config, Some("/path/to/config.toml".to_string()));
                assert_eq!(players, Some(4));
                assert_eq!(duration_secs, Some(2));
                assert_eq!(speed, Some(10.0));
                assert!(json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_roles_list() {
        let cli = Cli::parse_from(["custom-role-host", "roles", "list", "--json"]);
        match cli.command {
            Commands::Roles {
                subcommand: RolesSubcommand::List { catalogue, json },
            } => {
                assert!(catalogue.is_none());
                assert!(json);
            }
            _ => panic!("Expected Roles List command"),
        }
    }

    #[test]
    fn test_roles_show() {
        let cli = Cli::parse_from(["custom-role-host", "roles", "show", "3"]);
        match cli.command {
            Commands::Roles {
                subcommand: RolesSubcommand::Show { id, .. },
            } => assert_eq!(id, 3),
            _ => panic!("Expected Roles Show command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["custom-role-host", "-vv", "version"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::parse_from(["custom-role-host", "--quiet", "version"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["custom-role-host", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
