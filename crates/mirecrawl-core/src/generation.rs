//! World population: building the ECS world from entity descriptors and
//! mode parameters. How descriptors were parsed from disk is someone
//! else's problem; the engine consumes them as plain data.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::components::{
    Boulder, Collectable, Creature, CreatureKind, Door, EntityId, Exit, Facing, FloorSwitch,
    GridPos, Health, ItemKind, Player, Portal, Position, PotionState, Swamp, SwampThrottle, Wall,
    ZombieSpawner,
};
use crate::components::{Attack, Direction};
use crate::error::{EngineError, EngineResult};
use crate::pathfinding::Bounds;
use crate::terrain::TerrainIndex;

/// Render layers by entity class. Ordering within a tile only.
pub const LAYER_TERRAIN: u8 = 0;
pub const LAYER_ITEM: u8 = 2;
pub const LAYER_CREATURE: u8 = 3;
pub const LAYER_PLAYER: u8 = 4;

/// Type tag of an initial entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    Player,
    Wall,
    Door,
    Boulder,
    FloorSwitch,
    Portal,
    Swamp,
    ZombieSpawner,
    Exit,
    Treasure,
    Key,
    Wood,
    Arrow,
    HealthPotion,
    InvincibilityPotion,
    InvisibilityPotion,
    Bomb,
    Sword,
    Armour,
    TimeCharm,
    Zombie,
    Spider,
    Mercenary,
    Assassin,
    Hydra,
}

/// One initial entity: type tag, tile, and type-specific extras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDescriptor {
    #[serde(rename = "type")]
    pub kind: DescriptorKind,
    pub x: i32,
    pub y: i32,
    /// Doors and keys: pairing id.
    #[serde(default)]
    pub key_id: Option<u32>,
    /// Portals: pairing colour.
    #[serde(default)]
    pub colour: Option<String>,
    /// Zombie spawners: tick interval override.
    #[serde(default)]
    pub interval: Option<u32>,
    /// Swamps: movement factor.
    #[serde(default)]
    pub factor: Option<u32>,
}

impl EntityDescriptor {
    pub fn at(kind: DescriptorKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            x,
            y,
            key_id: None,
            colour: None,
            interval: None,
            factor: None,
        }
    }

    pub fn tile(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

/// Mode parameters consumed by the engine. `standard()` is the baseline;
/// `peaceful()` and `hard()` are the conventional presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Difficulty multiplier applied to every hostile attack.
    pub enemy_attack_multiplier: f64,
    pub player_health: f64,
    pub player_attack: f64,
    /// Default spawner interval when a descriptor does not carry one.
    /// Zero disables spawners.
    pub zombie_spawn_interval: u32,
    /// Global spider spawn interval. Zero disables it.
    pub spider_spawn_interval: u32,
    /// Cardinal-distance threshold for bribery.
    pub bribe_radius: u32,
    /// Treasure price of a bribe.
    pub bribe_amount: u32,
    pub invincibility_duration: u32,
    pub invisibility_duration: u32,
    pub mind_control_duration: u32,
    pub armour_drop_rate: f64,
    pub charm_drop_rate: f64,
    /// Chebyshev blast radius of placed bombs.
    pub bomb_radius: u32,
    /// How many past ticks the rewind ring retains.
    pub snapshot_ring: usize,
}

impl ModeConfig {
    pub fn standard() -> Self {
        Self {
            enemy_attack_multiplier: 1.0,
            player_health: 100.0,
            player_attack: 10.0,
            zombie_spawn_interval: 20,
            spider_spawn_interval: 25,
            bribe_radius: 2,
            bribe_amount: 1,
            invincibility_duration: 3,
            invisibility_duration: 6,
            mind_control_duration: 5,
            armour_drop_rate: 0.2,
            charm_drop_rate: 0.1,
            bomb_radius: 1,
            snapshot_ring: 32,
        }
    }

    /// Hostiles deal no damage.
    pub fn peaceful() -> Self {
        Self {
            enemy_attack_multiplier: 0.0,
            ..Self::standard()
        }
    }

    pub fn hard() -> Self {
        Self {
            enemy_attack_multiplier: 2.0,
            player_health: 80.0,
            zombie_spawn_interval: 15,
            spider_spawn_interval: 15,
            ..Self::standard()
        }
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Result of populating a world from descriptors.
pub struct PopulatedWorld {
    pub player: Entity,
    pub bounds: Bounds,
}

/// Spawn every descriptor into the world and occupancy index. Enforces the
/// one-player invariant before any entity is created.
pub fn populate_world(
    world: &mut World,
    index: &mut TerrainIndex,
    mode: &ModeConfig,
    descriptors: &[EntityDescriptor],
    next_id: &mut u32,
) -> EngineResult<PopulatedWorld> {
    let players = descriptors
        .iter()
        .filter(|d| d.kind == DescriptorKind::Player)
        .count();
    if players != 1 {
        return Err(EngineError::InvalidArgument(format!(
            "expected exactly one player, got {}",
            players
        )));
    }

    let bounds = Bounds::around(descriptors.iter().map(EntityDescriptor::tile), 1);
    let mut player = None;

    for desc in descriptors {
        let id = EntityId(*next_id);
        *next_id += 1;
        let pos = desc.tile();

        match desc.kind {
            DescriptorKind::Player => {
                player = Some(spawn_player(world, index, mode, id, pos));
            }
            DescriptorKind::Wall => {
                spawn_static(world, index, id, pos, (Wall,));
            }
            DescriptorKind::Door => {
                spawn_static(world, index, id, pos, (Door::locked(desc.key_id.unwrap_or(0)),));
            }
            DescriptorKind::Boulder => {
                spawn_static(world, index, id, pos, (Boulder,));
            }
            DescriptorKind::FloorSwitch => {
                spawn_static(world, index, id, pos, (FloorSwitch::default(),));
            }
            DescriptorKind::Portal => {
                let colour = desc.colour.clone().unwrap_or_else(|| "blue".to_string());
                spawn_static(world, index, id, pos, (Portal { colour },));
            }
            DescriptorKind::Swamp => {
                let factor = desc.factor.unwrap_or(2).max(1);
                spawn_static(world, index, id, pos, (Swamp { factor },));
            }
            DescriptorKind::ZombieSpawner => {
                let interval = desc.interval.unwrap_or(mode.zombie_spawn_interval);
                spawn_static(world, index, id, pos, (ZombieSpawner { interval },));
            }
            DescriptorKind::Exit => {
                spawn_static(world, index, id, pos, (Exit,));
            }
            DescriptorKind::Zombie => {
                spawn_creature(world, index, id, CreatureKind::Zombie, pos);
            }
            DescriptorKind::Spider => {
                spawn_creature(world, index, id, CreatureKind::Spider, pos);
            }
            DescriptorKind::Mercenary => {
                spawn_creature(world, index, id, CreatureKind::Mercenary, pos);
            }
            DescriptorKind::Assassin => {
                spawn_creature(world, index, id, CreatureKind::Assassin, pos);
            }
            DescriptorKind::Hydra => {
                spawn_creature(world, index, id, CreatureKind::Hydra, pos);
            }
            _ => {
                let kind = collectable_kind(desc);
                spawn_collectable(world, index, id, kind, pos);
            }
        }
    }

    let player = player
        .ok_or_else(|| EngineError::InvalidArgument("player descriptor missing".into()))?;
    Ok(PopulatedWorld { player, bounds })
}

fn collectable_kind(desc: &EntityDescriptor) -> ItemKind {
    match desc.kind {
        DescriptorKind::Treasure => ItemKind::Treasure,
        DescriptorKind::Key => ItemKind::Key {
            key_id: desc.key_id.unwrap_or(0),
        },
        DescriptorKind::Wood => ItemKind::Wood,
        DescriptorKind::Arrow => ItemKind::Arrow,
        DescriptorKind::HealthPotion => ItemKind::HealthPotion,
        DescriptorKind::InvincibilityPotion => ItemKind::InvincibilityPotion,
        DescriptorKind::InvisibilityPotion => ItemKind::InvisibilityPotion,
        DescriptorKind::Bomb => ItemKind::Bomb,
        DescriptorKind::Sword => ItemKind::Sword,
        DescriptorKind::Armour => ItemKind::Armour,
        DescriptorKind::TimeCharm => ItemKind::TimeCharm,
        // Non-collectable kinds are matched before this is called.
        _ => unreachable!("not a collectable descriptor"),
    }
}

fn spawn_static(
    world: &mut World,
    index: &mut TerrainIndex,
    id: EntityId,
    pos: GridPos,
    bundle: impl hecs::DynamicBundle,
) -> Entity {
    let entity = world.spawn(bundle);
    let _ = world.insert(entity, (id, Position::new(pos, LAYER_TERRAIN)));
    index.place(entity, pos);
    entity
}

/// Drop a collectable on the floor.
pub fn spawn_collectable(
    world: &mut World,
    index: &mut TerrainIndex,
    id: EntityId,
    kind: ItemKind,
    pos: GridPos,
) -> Entity {
    let entity = world.spawn((id, Collectable { kind }, Position::new(pos, LAYER_ITEM)));
    index.place(entity, pos);
    entity
}

/// Spawn a creature with its kind's base stats and default movement policy.
pub fn spawn_creature(
    world: &mut World,
    index: &mut TerrainIndex,
    id: EntityId,
    kind: CreatureKind,
    pos: GridPos,
) -> Entity {
    let entity = world.spawn((
        id,
        Creature { kind },
        Position::new(pos, LAYER_CREATURE),
        Health(kind.base_health()),
        Attack(kind.base_attack()),
        kind.default_movement(pos),
        SwampThrottle::default(),
        Facing(Direction::Down),
    ));
    index.place(entity, pos);
    entity
}

fn spawn_player(
    world: &mut World,
    index: &mut TerrainIndex,
    mode: &ModeConfig,
    id: EntityId,
    pos: GridPos,
) -> Entity {
    let entity = world.spawn((
        id,
        Player,
        Position::new(pos, LAYER_PLAYER),
        Health(mode.player_health),
        Attack(mode.player_attack),
        PotionState::Default,
        Facing(Direction::Down),
    ));
    index.place(entity, pos);
    entity
}
