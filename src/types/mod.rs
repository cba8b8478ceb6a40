//! Type definitions for the custom role runtime
//!
//! Native role/team classification, effect definitions and the custom role
//! description shared by every instance.

mod effect;
mod role;
mod team;

pub use effect::*;
pub use role::*;
pub use team::*;
