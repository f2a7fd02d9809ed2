//! Movement system: per-mover policy steps, approach reactions, and the
//! player's own move.
//!
//! Every step follows the same shape: compute the target tile, let entities
//! on it react to being approached (a boulder is pushed onward, a door is
//! unlocked), re-check passability, then relocate or stay. There are no
//! partial moves.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    facing_from_step, Ally, Boulder, Collectable, Creature, Direction, Door, EntityId, Facing,
    FloorSwitch, GridPos, Inventory, InventoryItem, ItemKind, MindControl, MovementState, Patrol,
    Player, PlacedBomb, Portal, Position, SwampThrottle,
};
use crate::pathfinding::{self, Bounds};
use crate::terrain::{MoverClass, TerrainIndex};

/// Outcome of one mover or player step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The mover stayed where it was (no target, blocked, or throttled).
    Stayed,
    /// The mover now stands on `tile`.
    Moved { tile: GridPos },
}

impl StepOutcome {
    pub fn moved(self) -> bool {
        matches!(self, StepOutcome::Moved { .. })
    }
}

/// Passability class of a non-player mover.
pub fn creature_class(world: &World, entity: Entity) -> MoverClass {
    if world.get::<&Ally>(entity).is_ok() {
        return MoverClass::Ally;
    }
    let climbs = world
        .get::<&Creature>(entity)
        .map(|c| c.kind.climbs())
        .unwrap_or(false);
    if climbs {
        MoverClass::Climber
    } else {
        MoverClass::Hostile
    }
}

/// A movement decision: where to go, plus patrol bookkeeping to commit if
/// the move actually executes.
struct Decision {
    target: GridPos,
    patrol_update: Option<Patrol>,
}

/// One policy step for a non-player mover. Applies swamp throttling, then
/// the approach/re-check/relocate sequence.
pub fn creature_step(
    world: &mut World,
    index: &mut TerrainIndex,
    bounds: Bounds,
    rng: &mut impl Rng,
    entity: Entity,
    player_pos: Option<GridPos>,
) -> StepOutcome {
    let Ok(pos) = world.get::<&Position>(entity).map(|p| p.tile) else {
        return StepOutcome::Stayed;
    };
    let class = creature_class(world, entity);

    let Some(decision) = decide(world, index, bounds, rng, entity, class, pos, player_pos) else {
        return StepOutcome::Stayed;
    };

    // Swamp throttling: attempted moves off a factor-F tile only execute
    // every F-th attempt.
    let factor = index.movement_factor(world, pos);
    if factor > 1 {
        let ready = {
            let mut throttle = match world.get::<&mut SwampThrottle>(entity) {
                Ok(t) => t,
                Err(_) => return StepOutcome::Stayed,
            };
            if throttle.counter >= factor {
                throttle.counter = 1;
                true
            } else {
                throttle.counter += 1;
                false
            }
        };
        if !ready {
            return StepOutcome::Stayed;
        }
    }

    // Approach re-check. Policies only pick unblocked tiles, but another
    // mover may have taken the tile between decision and execution.
    if index.is_blocked_for(world, class, decision.target) {
        return StepOutcome::Stayed;
    }

    if let Some(patrol) = decision.patrol_update {
        if let Ok(mut state) = world.get::<&mut MovementState>(entity) {
            *state = MovementState::Patrol(patrol);
        }
    }

    relocate_mover(world, index, entity, pos, decision.target);

    // Portals act on ground-bound movers; climbers are busy ignoring the
    // terrain they walk over.
    let mut landed = decision.target;
    if class != MoverClass::Climber {
        if let Some(dest) = portal_destination(world, index, class, pos, decision.target) {
            relocate_mover(world, index, entity, decision.target, dest);
            landed = dest;
        }
    }

    StepOutcome::Moved { tile: landed }
}

fn decide(
    world: &World,
    index: &TerrainIndex,
    bounds: Bounds,
    rng: &mut impl Rng,
    entity: Entity,
    class: MoverClass,
    pos: GridPos,
    player_pos: Option<GridPos>,
) -> Option<Decision> {
    // Mind control overrides the mover's own policy with flight.
    if world.get::<&MindControl>(entity).is_ok() {
        let target = flee_target(world, index, bounds, class, pos, player_pos?)?;
        return Some(Decision {
            target,
            patrol_update: None,
        });
    }

    let state = *world.get::<&MovementState>(entity).ok()?;
    match state {
        MovementState::Follow => {
            let target =
                pathfinding::first_step_towards(index, world, class, pos, player_pos?, bounds)?;
            Some(Decision {
                target,
                patrol_update: None,
            })
        }
        MovementState::Flee => {
            let target = flee_target(world, index, bounds, class, pos, player_pos?)?;
            Some(Decision {
                target,
                patrol_update: None,
            })
        }
        MovementState::RandomWalk => {
            let free: Vec<GridPos> = pos
                .cardinal_neighbours()
                .into_iter()
                .filter(|&n| bounds.contains(n) && !index.is_blocked_for(world, class, n))
                .collect();
            if free.is_empty() {
                return None;
            }
            let target = free[rng.gen_range(0..free.len())];
            Some(Decision {
                target,
                patrol_update: None,
            })
        }
        MovementState::Patrol(patrol) => decide_patrol(world, index, class, patrol),
    }
}

/// Patrol step: try the next ring slot in the current traversal direction;
/// when it is blocked, reverse through the ring instead of re-planning. If
/// both directions are blocked the patroller waits.
fn decide_patrol(
    world: &World,
    index: &TerrainIndex,
    class: MoverClass,
    patrol: Patrol,
) -> Option<Decision> {
    let forward_slot = patrol.next_slot();
    let forward_tile = patrol.ring_tile(forward_slot);
    if !index.is_blocked_for(world, class, forward_tile) {
        return Some(Decision {
            target: forward_tile,
            patrol_update: Some(Patrol {
                index: Some(forward_slot),
                ..patrol
            }),
        });
    }

    let mut reversed = Patrol {
        reversed: !patrol.reversed,
        ..patrol
    };
    let back_slot = reversed.next_slot();
    let back_tile = reversed.ring_tile(back_slot);
    if !index.is_blocked_for(world, class, back_tile) {
        reversed.index = Some(back_slot);
        return Some(Decision {
            target: back_tile,
            patrol_update: Some(reversed),
        });
    }
    None
}

/// Flee: among the immediately reachable neighbours pick the one with the
/// greatest weighted path cost back to the player. A neighbour the player
/// cannot be reached from at all is the best escape there is.
fn flee_target(
    world: &World,
    index: &TerrainIndex,
    bounds: Bounds,
    class: MoverClass,
    pos: GridPos,
    player_pos: GridPos,
) -> Option<GridPos> {
    let costs = pathfinding::costs_to_target(index, world, class, player_pos, bounds);

    let mut best: Option<(GridPos, Option<u32>)> = None;
    for n in pos.cardinal_neighbours() {
        if !bounds.contains(n) || index.is_blocked_for(world, class, n) {
            continue;
        }
        let cost = costs.cost_to(n);
        let better = match (&best, cost) {
            (None, _) => true,
            // Disconnected from the player beats any finite distance.
            (Some((_, Some(_))), None) => true,
            (Some((_, None)), _) => false,
            (Some((_, Some(b))), Some(c)) => c > *b,
        };
        if better {
            best = Some((n, cost));
        }
    }
    best.map(|(tile, _)| tile)
}

/// The player's tick move: approach reactions (door unlock, boulder push),
/// passability re-check, relocation, item pickup, portal hop.
pub fn player_move(
    world: &mut World,
    index: &mut TerrainIndex,
    inventory: &mut Inventory,
    player: Entity,
    direction: Direction,
) -> StepOutcome {
    let Ok(pos) = world.get::<&Position>(player).map(|p| p.tile) else {
        return StepOutcome::Stayed;
    };
    let target = pos.step(direction);

    if let Ok(mut f) = world.get::<&mut Facing>(player) {
        f.0 = direction;
    }

    // Approach reactions.
    unlock_door(world, index, inventory, target);
    push_boulder(world, index, target, direction);

    if index.is_blocked_for(world, MoverClass::Player, target) {
        return StepOutcome::Stayed;
    }

    relocate_mover(world, index, player, pos, target);
    collect_items(world, index, inventory, target);

    let mut landed = target;
    if let Some(dest) = portal_destination(world, index, MoverClass::Player, pos, target) {
        relocate_mover(world, index, player, target, dest);
        collect_items(world, index, inventory, dest);
        landed = dest;
    }

    StepOutcome::Moved { tile: landed }
}

/// Move any mover's position and occupancy entry, updating its facing.
pub fn relocate_mover(
    world: &mut World,
    index: &mut TerrainIndex,
    entity: Entity,
    from: GridPos,
    to: GridPos,
) {
    if let Ok(mut p) = world.get::<&mut Position>(entity) {
        p.tile = to;
    }
    if let Ok(mut f) = world.get::<&mut Facing>(entity) {
        f.0 = facing_from_step(from, to);
    }
    index.relocate(entity, from, to);
}

/// Open a closed door at `pos` if the player holds the matching key; the
/// key is spent.
fn unlock_door(world: &mut World, index: &TerrainIndex, inventory: &mut Inventory, pos: GridPos) {
    let Some(door_entity) = index.find_at::<Door>(world, pos) else {
        return;
    };
    let key_id = {
        let Ok(door) = world.get::<&Door>(door_entity) else {
            return;
        };
        if door.open {
            return;
        }
        door.key_id
    };
    if inventory.take_kind(ItemKind::Key { key_id }).is_some() {
        if let Ok(mut door) = world.get::<&mut Door>(door_entity) {
            door.open = true;
        }
    }
}

/// Push a boulder at `pos` one tile onward in `direction`, if the tile
/// beyond accepts it. Switch activation rides along with the boulder.
fn push_boulder(world: &mut World, index: &mut TerrainIndex, pos: GridPos, direction: Direction) {
    let Some(boulder) = index.find_at::<Boulder>(world, pos) else {
        return;
    };
    let beyond = pos.step(direction);
    if index.is_blocked_for(world, MoverClass::Boulder, beyond) {
        return;
    }

    relocate_mover(world, index, boulder, pos, beyond);
    set_switch(world, index, pos, false);
    if set_switch(world, index, beyond, true) {
        detonate_adjacent_bombs(world, index, beyond);
    }
}

/// Flip the switch on `pos`, if any. Returns true when a switch actually
/// transitioned to `active`.
fn set_switch(world: &mut World, index: &TerrainIndex, pos: GridPos, active: bool) -> bool {
    let Some(switch) = index.find_at::<FloorSwitch>(world, pos) else {
        return false;
    };
    let Ok(mut s) = world.get::<&mut FloorSwitch>(switch) else {
        return false;
    };
    let transitioned = active && !s.active;
    s.active = active;
    transitioned
}

/// Detonate every placed bomb cardinally adjacent to an activating switch.
pub fn detonate_adjacent_bombs(world: &mut World, index: &mut TerrainIndex, switch_pos: GridPos) {
    let bombs: Vec<(Entity, GridPos, u32)> = switch_pos
        .cardinal_neighbours()
        .into_iter()
        .flat_map(|n| {
            index
                .find_at::<PlacedBomb>(world, n)
                .and_then(|e| world.get::<&PlacedBomb>(e).ok().map(|b| (e, n, b.radius)))
        })
        .collect();

    for (bomb, pos, radius) in bombs {
        explode(world, index, bomb, pos, radius);
    }
}

/// Remove every non-player entity within the Chebyshev blast radius,
/// including the bomb itself.
pub fn explode(
    world: &mut World,
    index: &mut TerrainIndex,
    bomb: Entity,
    at: GridPos,
    radius: u32,
) {
    let r = radius as i32;
    let mut doomed: Vec<(Entity, GridPos)> = Vec::new();
    for dx in -r..=r {
        for dy in -r..=r {
            let tile = at.offset(dx, dy);
            for &e in index.entities_at(tile) {
                if e == bomb {
                    continue;
                }
                if world.get::<&Player>(e).is_ok() {
                    continue;
                }
                doomed.push((e, tile));
            }
        }
    }
    for (e, tile) in doomed {
        index.remove(e, tile);
        let _ = world.despawn(e);
    }
    index.remove(bomb, at);
    let _ = world.despawn(bomb);
}

/// Pick up collectables under the player. A second key is left on the
/// floor; everything else is taken.
fn collect_items(world: &mut World, index: &mut TerrainIndex, inventory: &mut Inventory, pos: GridPos) {
    let found: Vec<(Entity, ItemKind, EntityId)> = index
        .entities_at(pos)
        .iter()
        .filter_map(|&e| {
            let kind = world.get::<&Collectable>(e).ok()?.kind;
            let id = *world.get::<&EntityId>(e).ok()?;
            Some((e, kind, id))
        })
        .collect();

    for (entity, kind, id) in found {
        if matches!(kind, ItemKind::Key { .. }) && inventory.holds_any_key() {
            continue;
        }
        index.remove(entity, pos);
        let _ = world.despawn(entity);
        inventory.add(InventoryItem::new(id, kind));
    }
}

/// Destination of a portal hop from `target`, entered while travelling from
/// `from`. The mover exits beside the partner portal, continuing in its
/// travel direction when possible, otherwise trying the remaining cardinal
/// directions in fixed order. `None` when no exit tile is open (the mover
/// stays on the entry portal).
fn portal_destination(
    world: &World,
    index: &TerrainIndex,
    class: MoverClass,
    from: GridPos,
    target: GridPos,
) -> Option<GridPos> {
    let entry = index.find_at::<Portal>(world, target)?;
    let colour = world.get::<&Portal>(entry).ok()?.colour.clone();

    let mut partner_pos = None;
    for (e, (portal, position)) in world.query::<(&Portal, &Position)>().iter() {
        if e != entry && portal.colour == colour {
            partner_pos = Some(position.tile);
            break;
        }
    }
    let partner = partner_pos?;

    let travel = Direction::between(from, target);
    let mut order: Vec<Direction> = Vec::with_capacity(4);
    if let Some(d) = travel {
        order.push(d);
    }
    for d in Direction::CARDINALS {
        if Some(d) != travel {
            order.push(d);
        }
    }

    order
        .into_iter()
        .map(|d| partner.step(d))
        .find(|&tile| !index.is_blocked_for(world, class, tile))
}
