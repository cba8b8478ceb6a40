//! Custom role instances and the components built around them
//!
//! - Instance state and per-instance hooks
//! - The live registry
//! - Capability modules
//! - Team and role-base overrides
//! - Infinite effect maintenance
//! - The lifecycle manager tying them together

mod effects;
pub(crate) mod instance;
mod manager;
mod modules;
mod overrides;
mod registry;

pub use effects::*;
pub use instance::{CustomHook, HookPolicy, InstanceId, RoleInstance};
pub use manager::*;
pub use modules::*;
pub use overrides::*;
pub use registry::*;
