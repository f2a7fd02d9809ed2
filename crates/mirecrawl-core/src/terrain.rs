//! Terrain index: occupancy lookup and per-mover passability queries.
//!
//! The index maps tiles to the entities standing on them and is kept in
//! lockstep with the ECS world through the `place`/`remove`/`relocate`
//! entrypoints. Everything else on it is a pure query surface.

use std::collections::HashMap;

use hecs::{Entity, World};

use crate::components::{
    Ally, Boulder, Creature, Door, GridPos, Player, Swamp, Wall, ZombieSpawner,
};

/// Who is asking a passability question. Blocking is always evaluated
/// against a specific mover class, never globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverClass {
    Player,
    /// Bribed movers following the player.
    Ally,
    /// Ground-bound hostile movers: zombies, mercenaries, assassins, hydras.
    Hostile,
    /// Spiders: climb walls, doors and spawners; only boulders stop them.
    Climber,
    /// A boulder mid-push.
    Boulder,
}

/// Spatial occupancy index over the dungeon grid.
#[derive(Debug, Default)]
pub struct TerrainIndex {
    tiles: HashMap<GridPos, Vec<Entity>>,
}

impl TerrainIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity at a tile.
    pub fn place(&mut self, entity: Entity, pos: GridPos) {
        self.tiles.entry(pos).or_default().push(entity);
    }

    /// Unregister an entity from a tile.
    pub fn remove(&mut self, entity: Entity, pos: GridPos) {
        if let Some(occupants) = self.tiles.get_mut(&pos) {
            occupants.retain(|e| *e != entity);
            if occupants.is_empty() {
                self.tiles.remove(&pos);
            }
        }
    }

    /// Move an entity between tiles.
    pub fn relocate(&mut self, entity: Entity, from: GridPos, to: GridPos) {
        self.remove(entity, from);
        self.place(entity, to);
    }

    /// Entities currently on a tile, in placement order.
    pub fn entities_at(&self, pos: GridPos) -> &[Entity] {
        self.tiles.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `pos` is blocked for a mover of `class`, asking each entity
    /// on the tile in turn. Reactions that could unblock the tile (boulder
    /// push, door unlock) happen before this is re-checked, so this is a
    /// pure snapshot query.
    pub fn is_blocked_for(&self, world: &World, class: MoverClass, pos: GridPos) -> bool {
        self.entities_at(pos)
            .iter()
            .any(|&e| blocks(world, e, class))
    }

    /// Traversal cost multiplier of a tile: the swamp factor, or 1.
    pub fn movement_factor(&self, world: &World, pos: GridPos) -> u32 {
        self.entities_at(pos)
            .iter()
            .find_map(|&e| world.get::<&Swamp>(e).ok().map(|s| s.factor.max(1)))
            .unwrap_or(1)
    }

    /// First entity on the tile with component `T`.
    pub fn find_at<T: hecs::Component>(&self, world: &World, pos: GridPos) -> Option<Entity> {
        self.entities_at(pos)
            .iter()
            .copied()
            .find(|&e| world.get::<&T>(e).is_ok())
    }

    /// All occupied tiles, for bounds computation and debugging.
    pub fn occupied_tiles(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.tiles.keys().copied()
    }
}

/// Does `entity` block a mover of `class` from entering its tile?
fn blocks(world: &World, entity: Entity, class: MoverClass) -> bool {
    let climber = class == MoverClass::Climber;

    if world.get::<&Wall>(entity).is_ok() {
        return !climber;
    }
    if let Ok(door) = world.get::<&Door>(entity) {
        return !door.open && !climber;
    }
    if world.get::<&ZombieSpawner>(entity).is_ok() {
        return !climber;
    }
    if world.get::<&Boulder>(entity).is_ok() {
        // Boulders stop everyone; the player's push is a reaction that
        // happens before passability is re-checked.
        return true;
    }
    if world.get::<&Player>(entity).is_ok() {
        // Hostiles step onto the player to fight; a boulder cannot be
        // pushed onto the player.
        return class == MoverClass::Boulder;
    }
    if world.get::<&Creature>(entity).is_ok() {
        if climber {
            return false;
        }
        let allied = world.get::<&Ally>(entity).is_ok();
        return match class {
            // The player walks into hostiles to fight them, and allies
            // never block the player.
            MoverClass::Player => false,
            MoverClass::Ally => !allied,
            MoverClass::Hostile | MoverClass::Boulder => true,
            MoverClass::Climber => false,
        };
    }

    // Switches, portals, swamps, exits, collectables, placed bombs,
    // shadows: never blocking.
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CreatureKind, Position};

    fn place(world: &mut World, index: &mut TerrainIndex, pos: GridPos, bundle: impl hecs::DynamicBundle) -> Entity {
        let e = world.spawn(bundle);
        world.insert_one(e, Position::new(pos, 0)).unwrap();
        index.place(e, pos);
        e
    }

    #[test]
    fn walls_block_walkers_not_climbers() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(1, 1);
        place(&mut world, &mut index, pos, (Wall,));

        assert!(index.is_blocked_for(&world, MoverClass::Player, pos));
        assert!(index.is_blocked_for(&world, MoverClass::Hostile, pos));
        assert!(!index.is_blocked_for(&world, MoverClass::Climber, pos));
    }

    #[test]
    fn boulders_block_everyone() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(0, 0);
        place(&mut world, &mut index, pos, (Boulder,));

        for class in [
            MoverClass::Player,
            MoverClass::Ally,
            MoverClass::Hostile,
            MoverClass::Climber,
            MoverClass::Boulder,
        ] {
            assert!(index.is_blocked_for(&world, class, pos), "{:?}", class);
        }
    }

    #[test]
    fn open_door_stops_blocking() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(2, 0);
        let door = place(&mut world, &mut index, pos, (Door::locked(1),));

        assert!(index.is_blocked_for(&world, MoverClass::Player, pos));
        world.get::<&mut Door>(door).unwrap().open = true;
        assert!(!index.is_blocked_for(&world, MoverClass::Player, pos));
    }

    #[test]
    fn player_walks_into_hostiles_to_fight() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(2, 2);
        place(
            &mut world,
            &mut index,
            pos,
            (
                Creature {
                    kind: CreatureKind::Zombie,
                },
            ),
        );

        assert!(!index.is_blocked_for(&world, MoverClass::Player, pos));
        assert!(index.is_blocked_for(&world, MoverClass::Hostile, pos));
        assert!(index.is_blocked_for(&world, MoverClass::Ally, pos));
    }

    #[test]
    fn allies_do_not_block_player_or_each_other() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(3, 3);
        place(
            &mut world,
            &mut index,
            pos,
            (
                Creature {
                    kind: CreatureKind::Mercenary,
                },
                Ally,
            ),
        );

        assert!(!index.is_blocked_for(&world, MoverClass::Player, pos));
        assert!(!index.is_blocked_for(&world, MoverClass::Ally, pos));
        assert!(index.is_blocked_for(&world, MoverClass::Hostile, pos));
    }

    #[test]
    fn hostiles_may_step_onto_player() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(4, 4);
        place(&mut world, &mut index, pos, (Player,));

        assert!(!index.is_blocked_for(&world, MoverClass::Hostile, pos));
        assert!(index.is_blocked_for(&world, MoverClass::Boulder, pos));
    }

    #[test]
    fn swamp_factor_lookup() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(5, 5);
        place(&mut world, &mut index, pos, (Swamp { factor: 3 },));

        assert_eq!(index.movement_factor(&world, pos), 3);
        assert_eq!(index.movement_factor(&world, GridPos::new(9, 9)), 1);
    }

    #[test]
    fn relocate_moves_occupancy() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let a = GridPos::new(0, 0);
        let b = GridPos::new(1, 0);
        let e = place(&mut world, &mut index, a, (Boulder,));

        index.relocate(e, a, b);
        assert!(index.entities_at(a).is_empty());
        assert_eq!(index.entities_at(b), &[e]);
    }
}
