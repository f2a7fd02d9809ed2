//! Static terrain components: walls, doors, boulders, switches, portals,
//! swamps, spawners, exits.

use serde::{Deserialize, Serialize};

/// Impassable wall tile.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Wall;

/// A door that opens permanently when the player approaches holding the
/// matching key. The key is consumed on unlock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Door {
    pub key_id: u32,
    pub open: bool,
}

impl Door {
    pub fn locked(key_id: u32) -> Self {
        Self {
            key_id,
            open: false,
        }
    }
}

/// A pushable boulder. Blocks everyone; the player may push it one tile
/// onward if the tile beyond is free or holds a switch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Boulder;

/// Pressure switch, active while a boulder rests on it. An activating
/// switch detonates cardinally adjacent placed bombs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FloorSwitch {
    pub active: bool,
}

/// One end of a portal pair. Stepping onto it teleports a mover to the
/// partner portal of the same colour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    pub colour: String,
}

/// Swamp tile: never blocks, but multiplies traversal cost. A mover leaving
/// a factor-F swamp stands still for F-1 ticks first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Swamp {
    pub factor: u32,
}

/// Spawns a zombie on an open cardinal neighbour every `interval` ticks.
/// Destroyed via `interact` by an adjacent, armed player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZombieSpawner {
    pub interval: u32,
}

/// Exit tile. Passable; only goal evaluation cares about it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Exit;

/// A bomb the player has placed. Detonates when a cardinally adjacent
/// switch activates, destroying all non-player entities in the blast.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlacedBomb {
    /// Chebyshev blast radius in tiles.
    pub radius: u32,
}
