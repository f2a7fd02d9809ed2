//! Snapshot/restore of the complete engine state.
//!
//! Uses bincode for compact binary encoding. Components are serialized
//! individually per entity then reconstructed on load; the same bytes back
//! the rewind ring and the external save/load collaborators.

use hecs::World;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::components::*;
use crate::generation::ModeConfig;
use crate::pathfinding::Bounds;
use crate::terrain::TerrainIndex;

/// Version number for the snapshot format (increment when it changes).
const SNAPSHOT_VERSION: u32 = 1;

/// Serializable snapshot of the whole engine state.
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub tick: u64,
    pub next_id: u32,
    /// Deterministic reseed value for the restored RNG.
    pub rng_reseed: u64,
    pub bounds: Bounds,
    pub mode: ModeConfig,
    pub inventory: Inventory,
    /// The player's tile per past tick, for rewind shadows.
    pub player_history: Vec<GridPos>,
    /// All entities with their components.
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals.
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    // Identity
    pub entity_id: Option<EntityId>,
    pub position: Option<Position>,
    pub facing: Option<Facing>,

    // Terrain
    pub wall: Option<Wall>,
    pub door: Option<Door>,
    pub boulder: Option<Boulder>,
    pub floor_switch: Option<FloorSwitch>,
    pub portal: Option<Portal>,
    pub swamp: Option<Swamp>,
    pub spawner: Option<ZombieSpawner>,
    pub exit: Option<Exit>,
    pub placed_bomb: Option<PlacedBomb>,

    // Items
    pub collectable: Option<Collectable>,

    // Movers
    pub player: Option<Player>,
    pub creature: Option<Creature>,
    pub health: Option<Health>,
    pub attack: Option<Attack>,
    pub movement_state: Option<MovementState>,
    pub potion_state: Option<PotionState>,
    pub mind_control: Option<MindControl>,
    pub ally: Option<Ally>,
    pub swamp_throttle: Option<SwampThrottle>,
    pub shadow: Option<Shadow>,
}

/// Extract all entities from a world into serializable form.
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut entities = Vec::new();

    for entity_ref in world.iter() {
        let mut se = SerializableEntity::default();

        if let Some(c) = entity_ref.get::<&EntityId>() {
            se.entity_id = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Position>() {
            se.position = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Facing>() {
            se.facing = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Wall>() {
            se.wall = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Door>() {
            se.door = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Boulder>() {
            se.boulder = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&FloorSwitch>() {
            se.floor_switch = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Portal>() {
            se.portal = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Swamp>() {
            se.swamp = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&ZombieSpawner>() {
            se.spawner = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Exit>() {
            se.exit = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&PlacedBomb>() {
            se.placed_bomb = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Collectable>() {
            se.collectable = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Player>() {
            se.player = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Creature>() {
            se.creature = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Health>() {
            se.health = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Attack>() {
            se.attack = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&MovementState>() {
            se.movement_state = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&PotionState>() {
            se.potion_state = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&MindControl>() {
            se.mind_control = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Ally>() {
            se.ally = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&SwampThrottle>() {
            se.swamp_throttle = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Shadow>() {
            se.shadow = Some((*c).clone());
        }

        entities.push(se);
    }

    entities
}

/// Spawn an entity with all its components.
fn spawn_entity(world: &mut World, se: SerializableEntity) {
    let entity = world.spawn(());

    if let Some(c) = se.entity_id {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.position {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.facing {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.wall {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.door {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.boulder {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.floor_switch {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.portal {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.swamp {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.spawner {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.exit {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.placed_bomb {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.collectable {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.player {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.creature {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.health {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.attack {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.movement_state {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.potion_state {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.mind_control {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.ally {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.swamp_throttle {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.shadow {
        let _ = world.insert_one(entity, c);
    }
}

/// Parameters captured alongside the world in a snapshot.
pub struct SnapshotMeta<'a> {
    pub tick: u64,
    pub next_id: u32,
    pub rng_reseed: u64,
    pub bounds: Bounds,
    pub mode: &'a ModeConfig,
    pub inventory: &'a Inventory,
    pub player_history: &'a [GridPos],
}

/// Save the complete engine state to a writer.
pub fn save_state<W: Write>(writer: W, world: &World, meta: SnapshotMeta<'_>) -> Result<(), SnapshotError> {
    let save_data = SaveData {
        version: SNAPSHOT_VERSION,
        tick: meta.tick,
        next_id: meta.next_id,
        rng_reseed: meta.rng_reseed,
        bounds: meta.bounds,
        mode: meta.mode.clone(),
        inventory: meta.inventory.clone(),
        player_history: meta.player_history.to_vec(),
        entities: serialize_entities(world),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Result of loading a snapshot.
pub struct LoadedState {
    pub world: World,
    pub tick: u64,
    pub next_id: u32,
    pub rng_reseed: u64,
    pub bounds: Bounds,
    pub mode: ModeConfig,
    pub inventory: Inventory,
    pub player_history: Vec<GridPos>,
}

/// Load a snapshot from a reader.
pub fn load_state<R: Read>(reader: R) -> Result<LoadedState, SnapshotError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    for se in save_data.entities {
        spawn_entity(&mut world, se);
    }

    Ok(LoadedState {
        world,
        tick: save_data.tick,
        next_id: save_data.next_id,
        rng_reseed: save_data.rng_reseed,
        bounds: save_data.bounds,
        mode: save_data.mode,
        inventory: save_data.inventory,
        player_history: save_data.player_history,
    })
}

/// Rebuild the occupancy index from a freshly loaded world. Placement is
/// ordered by (layer, id) so occupant lists are canonical regardless of
/// archetype iteration order.
pub fn rebuild_index(world: &World) -> TerrainIndex {
    let mut index = TerrainIndex::new();
    let mut placed: Vec<(hecs::Entity, GridPos, u8, u32)> = world
        .query::<&Position>()
        .iter()
        .map(|(e, p)| {
            let id = world.get::<&EntityId>(e).map(|i| i.0).unwrap_or(u32::MAX);
            (e, p.tile, p.layer, id)
        })
        .collect();
    placed.sort_by_key(|&(_, _, layer, id)| (layer, id));
    for (entity, tile, _, _) in placed {
        index.place(entity, tile);
    }
    index
}

/// Errors that can occur during snapshot save/load.
#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SnapshotError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SnapshotError::Bincode(e)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "IO error: {}", e),
            SnapshotError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SnapshotError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Snapshot version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{populate_world, DescriptorKind, EntityDescriptor};

    #[test]
    fn snapshot_round_trips_entities_and_meta() {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let mode = ModeConfig::standard();
        let mut next_id = 0;
        let descriptors = vec![
            EntityDescriptor::at(DescriptorKind::Player, 1, 1),
            EntityDescriptor::at(DescriptorKind::Wall, 0, 0),
            EntityDescriptor::at(DescriptorKind::Mercenary, 4, 4),
            EntityDescriptor::at(DescriptorKind::Treasure, 2, 1),
        ];
        let populated =
            populate_world(&mut world, &mut index, &mode, &descriptors, &mut next_id).unwrap();

        let mut inventory = Inventory::default();
        inventory.add(InventoryItem::new(EntityId(99), ItemKind::Sword));
        let history = vec![GridPos::new(1, 1)];

        let mut bytes = Vec::new();
        save_state(
            &mut bytes,
            &world,
            SnapshotMeta {
                tick: 12,
                next_id,
                rng_reseed: 777,
                bounds: populated.bounds,
                mode: &mode,
                inventory: &inventory,
                player_history: &history,
            },
        )
        .unwrap();

        let loaded = load_state(bytes.as_slice()).unwrap();
        assert_eq!(loaded.tick, 12);
        assert_eq!(loaded.next_id, next_id);
        assert_eq!(loaded.rng_reseed, 777);
        assert_eq!(loaded.player_history, history);
        assert_eq!(loaded.inventory.items.len(), 1);
        assert_eq!(loaded.world.iter().count(), world.iter().count());

        let rebuilt = rebuild_index(&loaded.world);
        assert_eq!(rebuilt.entities_at(GridPos::new(4, 4)).len(), 1);
        assert_eq!(rebuilt.entities_at(GridPos::new(2, 1)).len(), 1);
    }

    #[test]
    fn version_mismatch_is_detected() {
        let world = World::new();
        let mode = ModeConfig::standard();
        let inventory = Inventory::default();
        let mut bytes = Vec::new();
        save_state(
            &mut bytes,
            &world,
            SnapshotMeta {
                tick: 0,
                next_id: 0,
                rng_reseed: 0,
                bounds: Bounds::new(GridPos::new(0, 0), GridPos::new(1, 1)),
                mode: &mode,
                inventory: &inventory,
                player_history: &[],
            },
        )
        .unwrap();

        // Corrupt the leading version field.
        bytes[0] = bytes[0].wrapping_add(1);
        assert!(matches!(
            load_state(bytes.as_slice()),
            Err(SnapshotError::VersionMismatch { .. })
        ));
    }
}
