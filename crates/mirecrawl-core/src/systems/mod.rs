//! Systems - logic that operates on components

mod combat;
mod movement;
mod spawning;

pub use combat::*;
pub use movement::*;
pub use spawning::*;
