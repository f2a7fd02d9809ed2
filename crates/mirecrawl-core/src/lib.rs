//! Mirecrawl Core - Turn-Based Dungeon Simulation Engine
//!
//! A deterministic, discrete-step simulation of a grid dungeon: one player,
//! hostile and alliable movers, pushable terrain, collectable items, and a
//! combat state machine, advanced one atomic tick at a time.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via
//! `hecs`:
//! - **Entities**: the player, creatures, terrain pieces, floor items
//! - **Components**: pure data attached to entities (Position, Health,
//!   MovementState, etc.)
//! - **Systems**: logic that queries and updates components (movement,
//!   combat, spawning)
//!
//! The [`engine::GameEngine`] orchestrates everything: it owns the world,
//! the occupancy index ([`terrain::TerrainIndex`]), the single injected
//! random source, and the rewind snapshot ring, and sequences each tick
//! deterministically. Dungeon files, goal trees, and save formats live
//! outside this crate; the engine consumes plain
//! [`generation::EntityDescriptor`] data and emits [`view::TickView`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use mirecrawl_core::prelude::*;
//! use mirecrawl_core::generation::{DescriptorKind, EntityDescriptor, ModeConfig};
//!
//! let dungeon = vec![
//!     EntityDescriptor::at(DescriptorKind::Player, 1, 1),
//!     EntityDescriptor::at(DescriptorKind::Zombie, 5, 5),
//! ];
//! let mut engine = GameEngine::new(&dungeon, ModeConfig::standard(), 42).unwrap();
//!
//! // Run the simulation.
//! loop {
//!     engine.tick(None, Some(Direction::Right)).unwrap();
//! }
//! ```

pub use hecs;

pub mod components;
pub mod engine;
pub mod error;
pub mod generation;
pub mod goals;
pub mod pathfinding;
pub mod persistence;
pub mod systems;
pub mod terrain;
pub mod view;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::GameEngine;
    pub use crate::error::{EngineError, EngineResult};
    pub use crate::view::TickView;
}
