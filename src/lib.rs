//! Custom role runtime
//!
//! Per-player custom roles for a multiplayer game server: a registry of live
//! role instances, the lifecycle protocols that create and tear them down,
//! team and role-base override resolution for native game systems, a
//! cooperative hume shield regeneration scheduler, capability modules, and
//! infinite effect maintenance.
//!
//! Hosts plug in through the traits in [`host`]; [`sim`] provides an
//! in-memory host used by the `custom-role-host` binary and by tests.

pub mod catalogue;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod roles;
pub mod scheduler;
pub mod sim;
pub mod types;
pub mod version;

pub use error::{Error, ErrorCode, Result};
