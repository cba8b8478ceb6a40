//! Regeneration scheduler module
//!
//! Drives the per-instance periodic work:
//! - The outer role tick (custom hooks, regeneration eligibility)
//! - The nested shield regeneration loop
//! - Task bookkeeping and counters

mod runner;
mod state;

pub use runner::*;
pub use state::*;
