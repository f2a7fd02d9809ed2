//! Mover components: the player, creatures, stats, movement and potion
//! state machines.

use serde::{Deserialize, Serialize};

use super::{Direction, GridPos};

/// Marker component identifying the player entity. Exactly one exists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Player;

/// Kinds of non-player movers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatureKind {
    Zombie,
    Spider,
    Mercenary,
    Assassin,
    Hydra,
}

impl CreatureKind {
    pub fn base_health(self) -> f64 {
        match self {
            CreatureKind::Zombie => 15.0,
            CreatureKind::Spider => 10.0,
            CreatureKind::Mercenary => 25.0,
            CreatureKind::Assassin => 30.0,
            CreatureKind::Hydra => 40.0,
        }
    }

    pub fn base_attack(self) -> f64 {
        match self {
            CreatureKind::Zombie => 3.0,
            CreatureKind::Spider => 2.0,
            CreatureKind::Mercenary => 5.0,
            CreatureKind::Assassin => 10.0,
            CreatureKind::Hydra => 6.0,
        }
    }

    /// Movement policy a freshly spawned creature starts in.
    pub fn default_movement(self, spawn: GridPos) -> MovementState {
        match self {
            CreatureKind::Zombie | CreatureKind::Hydra => MovementState::RandomWalk,
            CreatureKind::Spider => MovementState::Patrol(Patrol::new(spawn)),
            CreatureKind::Mercenary | CreatureKind::Assassin => MovementState::Follow,
        }
    }

    /// Movers that can be bought into permanent alliance.
    pub fn is_bribable(self) -> bool {
        matches!(self, CreatureKind::Mercenary | CreatureKind::Assassin)
    }

    /// Spiders climb over walls, doors and spawners; only boulders stop
    /// them. Everyone else walks.
    pub fn climbs(self) -> bool {
        matches!(self, CreatureKind::Spider)
    }
}

/// Component attached to every non-player mover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Creature {
    pub kind: CreatureKind,
}

/// Current health. A mover at or below zero is removed from the world.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health(pub f64);

/// Base per-round attack damage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Attack(pub f64);

/// Movement-decision state machine for non-player movers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementState {
    /// Weighted shortest path toward the player.
    Follow,
    /// Neighbour tile maximising weighted path cost to the player.
    Flee,
    /// Uniform choice among unblocked cardinal neighbours.
    RandomWalk,
    /// Fixed clockwise ring around the spawn tile, reversing when blocked.
    Patrol(Patrol),
}

/// Clockwise ring of offsets around the patrol anchor, beginning directly
/// above it. The anchor itself is not part of the ring, so a patroller
/// never stands on its spawn tile again after the first step.
pub const PATROL_RING: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Progress of a circular patrol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Patrol {
    /// Spawn tile the ring is centred on.
    pub anchor: GridPos,
    /// Current ring slot, or `None` before the opening step up.
    pub index: Option<usize>,
    /// Traversal direction through the ring.
    pub reversed: bool,
}

impl Patrol {
    pub fn new(anchor: GridPos) -> Self {
        Self {
            anchor,
            index: None,
            reversed: false,
        }
    }

    /// Ring tile at `slot`.
    pub fn ring_tile(&self, slot: usize) -> GridPos {
        let (dx, dy) = PATROL_RING[slot % PATROL_RING.len()];
        self.anchor.offset(dx, dy)
    }

    /// Next slot continuing in the current traversal direction.
    pub fn next_slot(&self) -> usize {
        let len = PATROL_RING.len();
        match self.index {
            None => 0,
            Some(i) if self.reversed => (i + len - 1) % len,
            Some(i) => (i + 1) % len,
        }
    }
}

/// Sceptre effect: the mover flees the player until the counter runs out.
/// On expiry, combat resolves immediately if mover and player share a tile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MindControl {
    pub remaining: u32,
}

/// Permanent alliance marker set by a successful bribe. Allied movers never
/// enter combat with the player and contribute their attack to the player's
/// battle damage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Ally;

/// Swamp movement throttle. The counter starts at 1 and advances on each
/// attempted move from a swamp tile; the move executes only when the
/// counter has reached the tile's movement factor, then resets to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SwampThrottle {
    pub counter: u32,
}

impl Default for SwampThrottle {
    fn default() -> Self {
        Self { counter: 1 }
    }
}

/// The player's potion state machine. Only one potion is active at a time;
/// drinking a new one overrides the old.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotionState {
    Default,
    Invincible { remaining: u32 },
    Invisible { remaining: u32 },
}

impl PotionState {
    /// Advance one tick, reverting to `Default` at zero. Returns true when
    /// the state changed (callers publish the transition to movers).
    pub fn decay(&mut self) -> bool {
        match self {
            PotionState::Default => false,
            PotionState::Invincible { remaining } | PotionState::Invisible { remaining } => {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    *self = PotionState::Default;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn is_invincible(self) -> bool {
        matches!(self, PotionState::Invincible { .. })
    }

    pub fn is_invisible(self) -> bool {
        matches!(self, PotionState::Invisible { .. })
    }
}

/// Rewind ghost: replays a recorded player path, one tile per tick. It is
/// non-interactive except for colliding with the live player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shadow {
    pub path: Vec<GridPos>,
    pub next: usize,
}

/// Helper: facing derived from a step offset, defaulting to down.
pub fn facing_from_step(from: GridPos, to: GridPos) -> Direction {
    Direction::between(from, to).unwrap_or(Direction::Down)
}
