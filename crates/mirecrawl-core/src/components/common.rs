//! Common components shared across entity types: tile coordinates,
//! directions, identity.

use serde::{Deserialize, Serialize};

/// Integer tile coordinate on the dungeon grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile one step in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The tile offset by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Cardinal neighbours in fixed Up/Down/Left/Right order.
    ///
    /// The order matters: graph searches expand neighbours in this sequence,
    /// which is what makes tie-breaking reproducible.
    pub fn cardinal_neighbours(self) -> [GridPos; 4] {
        [
            self.step(Direction::Up),
            self.step(Direction::Down),
            self.step(Direction::Left),
            self.step(Direction::Right),
        ]
    }

    /// Cardinal (taxicab) distance to another tile.
    pub fn cardinal_distance(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// A cardinal movement direction. "Stay put" is expressed as `Option::None`
/// at the interface rather than a fifth variant, so `GridPos::step` is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Tile-space delta for this direction. Up is negative y.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Direction from one tile to a cardinally adjacent one, if any.
    pub fn between(from: GridPos, to: GridPos) -> Option<Direction> {
        Direction::CARDINALS
            .into_iter()
            .find(|d| from.step(*d) == to)
    }
}

/// Dense external identity for an entity, assigned at creation and never
/// reused. All interface calls address entities by this id, not by the
/// (generation-dependent) `hecs::Entity` handle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Spatial position component - which tile an entity occupies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub tile: GridPos,
    /// Render ordering among co-occupants of one tile. Never consulted by
    /// simulation logic.
    pub layer: u8,
}

impl Position {
    pub fn new(tile: GridPos, layer: u8) -> Self {
        Self { tile, layer }
    }
}

/// Which way a mover last moved. Render-facing only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Facing(pub Direction);
