//! In-memory host
//!
//! Simulated players, a spawner and a round driver. The host binary runs
//! rounds on these; tests use them as the host side of the runtime.

mod player;
mod round;
mod spawner;

pub use player::*;
pub use round::*;
pub use spawner::*;
