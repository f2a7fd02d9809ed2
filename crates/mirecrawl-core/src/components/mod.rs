//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod common;
mod items;
mod movers;
mod terrain;

pub use common::*;
pub use items::*;
pub use movers::*;
pub use terrain::*;
