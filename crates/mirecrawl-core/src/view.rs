//! Read-only views returned by engine calls: a serializable description of
//! the live world for callers, test harnesses, and goal evaluation.

use hecs::World;
use serde::{Deserialize, Serialize};

use crate::components::{
    Attack, Boulder, Collectable, Creature, CreatureKind, Door, EntityId, Exit, FloorSwitch,
    GridPos, Health, Inventory, ItemKind, MindControl, Ally, PlacedBomb, Player, Portal, Position,
    PotionState, Shadow, Swamp, Wall, ZombieSpawner,
};

/// Snapshot of one tick's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickView {
    pub tick: u64,
    /// Remaining-goal description from the goal collaborator, if attached.
    /// An empty string means every goal is met.
    pub goal: Option<String>,
    pub player: Option<PlayerView>,
    pub entities: Vec<EntityView>,
    pub inventory: Vec<ItemView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: EntityId,
    pub x: i32,
    pub y: i32,
    pub health: f64,
    pub attack: f64,
    pub potion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub layer: u8,
    /// Allied creature, open door, active switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemView {
    pub id: EntityId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durability: Option<u32>,
}

pub fn item_kind_label(kind: ItemKind) -> String {
    match kind {
        ItemKind::Treasure => "treasure".into(),
        ItemKind::Key { key_id } => format!("key:{}", key_id),
        ItemKind::Wood => "wood".into(),
        ItemKind::Arrow => "arrow".into(),
        ItemKind::HealthPotion => "health_potion".into(),
        ItemKind::InvincibilityPotion => "invincibility_potion".into(),
        ItemKind::InvisibilityPotion => "invisibility_potion".into(),
        ItemKind::Bomb => "bomb".into(),
        ItemKind::Sword => "sword".into(),
        ItemKind::Armour => "armour".into(),
        ItemKind::RevivalCharm => "revival_charm".into(),
        ItemKind::TimeCharm => "time_charm".into(),
        ItemKind::Bow => "bow".into(),
        ItemKind::Shield => "shield".into(),
        ItemKind::Sceptre => "sceptre".into(),
    }
}

fn creature_label(kind: CreatureKind) -> &'static str {
    match kind {
        CreatureKind::Zombie => "zombie",
        CreatureKind::Spider => "spider",
        CreatureKind::Mercenary => "mercenary",
        CreatureKind::Assassin => "assassin",
        CreatureKind::Hydra => "hydra",
    }
}

/// Describe every positioned entity except the player.
pub fn entity_views(world: &World) -> Vec<EntityView> {
    let mut views = Vec::new();

    for entity_ref in world.iter() {
        if entity_ref.get::<&Player>().is_some() {
            continue;
        }
        let Some(pos) = entity_ref.get::<&Position>().map(|p| *p) else {
            continue;
        };
        let Some(id) = entity_ref.get::<&EntityId>().map(|i| *i) else {
            continue;
        };

        let (kind, state): (String, Option<String>) =
            if let Some(c) = entity_ref.get::<&Creature>() {
                let allied = entity_ref.get::<&Ally>().is_some();
                let controlled = entity_ref.get::<&MindControl>().is_some();
                let state = if allied {
                    Some("ally".to_string())
                } else if controlled {
                    Some("controlled".to_string())
                } else {
                    None
                };
                (creature_label(c.kind).to_string(), state)
            } else if let Some(d) = entity_ref.get::<&Door>() {
                let state = if d.open { Some("open".to_string()) } else { None };
                ("door".to_string(), state)
            } else if let Some(s) = entity_ref.get::<&FloorSwitch>() {
                let state = if s.active {
                    Some("active".to_string())
                } else {
                    None
                };
                ("switch".to_string(), state)
            } else if entity_ref.get::<&Wall>().is_some() {
                ("wall".to_string(), None)
            } else if entity_ref.get::<&Boulder>().is_some() {
                ("boulder".to_string(), None)
            } else if let Some(p) = entity_ref.get::<&Portal>() {
                ("portal".to_string(), Some(p.colour.clone()))
            } else if let Some(s) = entity_ref.get::<&Swamp>() {
                ("swamp".to_string(), Some(s.factor.to_string()))
            } else if entity_ref.get::<&ZombieSpawner>().is_some() {
                ("zombie_spawner".to_string(), None)
            } else if entity_ref.get::<&Exit>().is_some() {
                ("exit".to_string(), None)
            } else if entity_ref.get::<&PlacedBomb>().is_some() {
                ("placed_bomb".to_string(), None)
            } else if let Some(c) = entity_ref.get::<&Collectable>() {
                (item_kind_label(c.kind), None)
            } else if entity_ref.get::<&Shadow>().is_some() {
                ("shadow".to_string(), None)
            } else {
                continue;
            };

        views.push(EntityView {
            id,
            kind,
            x: pos.tile.x,
            y: pos.tile.y,
            layer: pos.layer,
            state,
        });
    }

    views.sort_by_key(|v| v.id);
    views
}

/// Describe the player, if alive.
pub fn player_view(world: &World, player: Option<hecs::Entity>) -> Option<PlayerView> {
    let player = player?;
    let id = *world.get::<&EntityId>(player).ok()?;
    let pos = world.get::<&Position>(player).ok()?.tile;
    let health = world.get::<&Health>(player).ok()?.0;
    let attack = world.get::<&Attack>(player).ok()?.0;
    let potion = match world
        .get::<&PotionState>(player)
        .map(|p| *p)
        .unwrap_or(PotionState::Default)
    {
        PotionState::Default => "default".to_string(),
        PotionState::Invincible { remaining } => format!("invincible:{}", remaining),
        PotionState::Invisible { remaining } => format!("invisible:{}", remaining),
    };
    Some(PlayerView {
        id,
        x: pos.x,
        y: pos.y,
        health,
        attack,
        potion,
    })
}

/// Describe the inventory.
pub fn inventory_view(inventory: &Inventory) -> Vec<ItemView> {
    inventory
        .items
        .iter()
        .map(|i| ItemView {
            id: i.id,
            kind: item_kind_label(i.kind),
            durability: i.durability,
        })
        .collect()
}

/// Goal helper: is the player standing on an exit tile?
pub fn player_on_exit(world: &World, player: Option<hecs::Entity>) -> bool {
    let Some(player) = player else {
        return false;
    };
    let Ok(pos) = world.get::<&Position>(player).map(|p| p.tile) else {
        return false;
    };
    world
        .query::<(&Exit, &Position)>()
        .iter()
        .any(|(_, (_, p))| p.tile == pos)
}

/// Goal helper: tiles of all exits.
pub fn exit_tiles(world: &World) -> Vec<GridPos> {
    world
        .query::<(&Exit, &Position)>()
        .iter()
        .map(|(_, (_, p))| p.tile)
        .collect()
}
