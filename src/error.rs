//! Error types for the custom role runtime
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for the host CLI
//!
//! Registry lookups never fail; they return `Option`. Errors cover loading
//! configuration and catalogues and the spawn step of `summon`.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::host::PlayerId;

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Catalogue errors (3xx)
    CatalogueParse = 300,
    CatalogueInvalid = 301,
    RoleNotFound = 302,

    // Lifecycle errors (4xx)
    SpawnDeclined = 400,
    DuplicateAssignment = 401,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Catalogue errors
            400..=499 => 40, // Lifecycle errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the runtime
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Catalogue Errors
    // ─────────────────────────────────────────────────────────────

    /// Role catalogue parse error
    #[error("Failed to parse role catalogue: {message}")]
    CatalogueParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Role catalogue contains an invalid definition
    #[error("Invalid role definition {role_id}: {message}")]
    CatalogueInvalid { role_id: i32, message: String },

    /// No role with this id in the catalogue
    #[error("Custom role not found: {role_id}")]
    RoleNotFound { role_id: i32 },

    // ─────────────────────────────────────────────────────────────
    // Lifecycle Errors
    // ─────────────────────────────────────────────────────────────

    /// The spawner did not complete the native spawn
    #[error("Spawn of role {role_id} declined for player {player}")]
    SpawnDeclined { player: PlayerId, role_id: i32 },

    /// The player already holds a custom role
    #[error("Player {player} already holds custom role {existing_role_id}")]
    DuplicateAssignment {
        player: PlayerId,
        existing_role_id: i32,
    },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::InternalError,

            Error::CatalogueParse { .. } => ErrorCode::CatalogueParse,
            Error::CatalogueInvalid { .. } => ErrorCode::CatalogueInvalid,
            Error::RoleNotFound { .. } => ErrorCode::RoleNotFound,

            Error::SpawnDeclined { .. } => ErrorCode::SpawnDeclined,
            Error::DuplicateAssignment { .. } => ErrorCode::DuplicateAssignment,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is fatal (host should exit)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::CatalogueParse { .. }
                | Error::CatalogueInvalid { .. }
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'custom-role-host config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'custom-role-host config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),

            Error::CatalogueParse { .. } => Some(
                "Check the role catalogue syntax. Each role is a [[roles]] table."
            ),
            Error::CatalogueInvalid { .. } => Some(
                "Fix the role definition, then run 'custom-role-host roles validate' to check the catalogue."
            ),
            Error::RoleNotFound { .. } => Some(
                "Run 'custom-role-host roles list' to see the available role ids."
            ),

            Error::DuplicateAssignment { .. } => Some(
                "Destroy the existing role first, or set registry.duplicate_policy to 'replace'."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid role definition error
    pub fn catalogue_invalid(role_id: i32, message: impl Into<String>) -> Self {
        Error::CatalogueInvalid {
            role_id,
            message: message.into(),
        }
    }

    /// Create a spawn declined error
    pub fn spawn_declined(player: PlayerId, role_id: i32) -> Self {
        Error::SpawnDeclined { player, role_id }
    }

    /// Create a duplicate assignment error
    pub fn duplicate_assignment(player: PlayerId, existing_role_id: i32) -> Self {
        Error::DuplicateAssignment {
            player,
            existing_role_id,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
