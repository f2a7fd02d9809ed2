//! Timed spawning: per-spawner zombie production and the global spider
//! drip, both driven from the orchestrator's tick.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{Ally, Creature, CreatureKind, EntityId, GridPos, Position, ZombieSpawner};
use crate::generation::{spawn_creature, ModeConfig};
use crate::pathfinding::Bounds;
use crate::terrain::{MoverClass, TerrainIndex};

/// Attempts at finding a free random tile before a spider spawn is skipped
/// for the tick.
const SPIDER_PLACEMENT_ATTEMPTS: u32 = 20;

/// Run every due spawner for this tick, then the global spider spawn.
pub fn run_spawners(
    world: &mut World,
    index: &mut TerrainIndex,
    bounds: Bounds,
    rng: &mut impl Rng,
    mode: &ModeConfig,
    tick: u64,
    next_id: &mut u32,
) {
    spawn_from_spawners(world, index, rng, tick, next_id);
    spawn_spiders(world, index, bounds, rng, mode, tick, next_id);
}

/// Each zombie spawner produces one zombie on a random open cardinal
/// neighbour every `interval` ticks. A walled-in spawner skips its turn.
fn spawn_from_spawners(
    world: &mut World,
    index: &mut TerrainIndex,
    rng: &mut impl Rng,
    tick: u64,
    next_id: &mut u32,
) {
    let due: Vec<GridPos> = world
        .query::<(&ZombieSpawner, &Position)>()
        .iter()
        .filter(|(_, (s, _))| s.interval > 0 && tick % s.interval as u64 == 0)
        .map(|(_, (_, p))| p.tile)
        .collect();

    for spawner_pos in due {
        let open: Vec<GridPos> = spawner_pos
            .cardinal_neighbours()
            .into_iter()
            .filter(|&n| !index.is_blocked_for(world, MoverClass::Hostile, n))
            .collect();
        if open.is_empty() {
            continue;
        }
        let tile = open[rng.gen_range(0..open.len())];
        let id = EntityId(*next_id);
        *next_id += 1;
        spawn_creature(world, index, id, CreatureKind::Zombie, tile);
    }
}

/// Global spider spawn: every `spider_spawn_interval` ticks, while at least
/// one hostile mover is alive, a spider appears on a random unblocked tile
/// inside the arena.
fn spawn_spiders(
    world: &mut World,
    index: &mut TerrainIndex,
    bounds: Bounds,
    rng: &mut impl Rng,
    mode: &ModeConfig,
    tick: u64,
    next_id: &mut u32,
) {
    if mode.spider_spawn_interval == 0 || tick % mode.spider_spawn_interval as u64 != 0 {
        return;
    }
    let any_hostile = world
        .query::<&Creature>()
        .without::<&Ally>()
        .iter()
        .next()
        .is_some();
    if !any_hostile {
        return;
    }

    for _ in 0..SPIDER_PLACEMENT_ATTEMPTS {
        let tile = GridPos::new(
            rng.gen_range(bounds.min.x..=bounds.max.x),
            rng.gen_range(bounds.min.y..=bounds.max.y),
        );
        if index.is_blocked_for(world, MoverClass::Climber, tile) {
            continue;
        }
        let id = EntityId(*next_id);
        *next_id += 1;
        spawn_creature(world, index, id, CreatureKind::Spider, tile);
        return;
    }
}

/// Remove a spawner from the world; the orchestrator has already verified
/// adjacency and weaponry.
pub fn destroy_spawner(world: &mut World, index: &mut TerrainIndex, spawner: Entity) {
    let pos = world.get::<&Position>(spawner).map(|p| p.tile).ok();
    if let Some(pos) = pos {
        index.remove(spawner, pos);
    }
    let _ = world.despawn(spawner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Creature, Wall};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawner_produces_zombie_on_schedule() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(2, 2);
        let s = world.spawn((ZombieSpawner { interval: 5 }, Position::new(pos, 0)));
        index.place(s, pos);
        let bounds = Bounds::new(GridPos::new(0, 0), GridPos::new(4, 4));
        let mode = ModeConfig::standard();
        let mut rng = StdRng::seed_from_u64(2);
        let mut next_id = 10;

        for tick in 1..=4 {
            run_spawners(&mut world, &mut index, bounds, &mut rng, &mode, tick, &mut next_id);
        }
        assert_eq!(world.query::<&Creature>().iter().count(), 0);

        run_spawners(&mut world, &mut index, bounds, &mut rng, &mode, 5, &mut next_id);
        let zombies: Vec<GridPos> = world
            .query::<(&Creature, &Position)>()
            .iter()
            .map(|(_, (_, p))| p.tile)
            .collect();
        assert_eq!(zombies.len(), 1);
        assert_eq!(zombies[0].cardinal_distance(pos), 1);
    }

    #[test]
    fn walled_in_spawner_skips() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let pos = GridPos::new(2, 2);
        let s = world.spawn((ZombieSpawner { interval: 1 }, Position::new(pos, 0)));
        index.place(s, pos);
        for n in pos.cardinal_neighbours() {
            let w = world.spawn((Wall, Position::new(n, 0)));
            index.place(w, n);
        }
        let bounds = Bounds::new(GridPos::new(0, 0), GridPos::new(4, 4));
        let mode = ModeConfig::standard();
        let mut rng = StdRng::seed_from_u64(2);
        let mut next_id = 10;

        run_spawners(&mut world, &mut index, bounds, &mut rng, &mode, 1, &mut next_id);
        assert_eq!(world.query::<&Creature>().iter().count(), 0);
    }

    #[test]
    fn spiders_need_an_existing_hostile() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let bounds = Bounds::new(GridPos::new(0, 0), GridPos::new(9, 9));
        let mut mode = ModeConfig::standard();
        mode.spider_spawn_interval = 10;
        let mut rng = StdRng::seed_from_u64(4);
        let mut next_id = 10;

        // Empty world: the gate holds.
        run_spawners(&mut world, &mut index, bounds, &mut rng, &mode, 10, &mut next_id);
        assert_eq!(world.query::<&Creature>().iter().count(), 0);

        // One zombie present: the spider drips in.
        spawn_creature(
            &mut world,
            &mut index,
            EntityId(1),
            CreatureKind::Zombie,
            GridPos::new(5, 5),
        );
        run_spawners(&mut world, &mut index, bounds, &mut rng, &mode, 10, &mut next_id);
        let spiders = world
            .query::<&Creature>()
            .iter()
            .filter(|(_, c)| c.kind == CreatureKind::Spider)
            .count();
        assert_eq!(spiders, 1);
    }
}
