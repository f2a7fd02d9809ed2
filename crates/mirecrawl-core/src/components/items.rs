//! Item kinds, inventory records, and crafting recipes.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// Everything that can sit in the player's inventory (and, for most kinds,
/// on the floor as a collectable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Treasure,
    Key { key_id: u32 },
    Wood,
    Arrow,
    HealthPotion,
    InvincibilityPotion,
    InvisibilityPotion,
    Bomb,
    Sword,
    Armour,
    RevivalCharm,
    TimeCharm,
    // Built, never found on the floor.
    Bow,
    Shield,
    Sceptre,
}

impl ItemKind {
    /// Per-round damage contribution (damage x hit rate) when wielded.
    /// `None` for items that are not attack equipment.
    pub fn attack_bonus(self) -> Option<f64> {
        match self {
            // Sword: 2 damage, one hit per round.
            ItemKind::Sword => Some(2.0),
            // Bow: 1.5 damage, two hits per round.
            ItemKind::Bow => Some(3.0),
            _ => None,
        }
    }

    /// Multiplicative incoming-damage factor when worn. `None` for items
    /// that are not defence equipment.
    pub fn damage_reduction(self) -> Option<f64> {
        match self {
            ItemKind::Armour => Some(0.5),
            ItemKind::Shield => Some(0.6),
            _ => None,
        }
    }

    /// Battle durability for equipment: rounds survived before breaking.
    pub fn initial_durability(self) -> Option<u32> {
        match self {
            ItemKind::Sword => Some(8),
            ItemKind::Bow => Some(5),
            ItemKind::Armour => Some(6),
            ItemKind::Shield => Some(7),
            _ => None,
        }
    }

    pub fn is_equipment(self) -> bool {
        self.attack_bonus().is_some() || self.damage_reduction().is_some()
    }

    /// Items the player may consume as a tick action.
    pub fn is_consumable(self) -> bool {
        matches!(
            self,
            ItemKind::HealthPotion
                | ItemKind::InvincibilityPotion
                | ItemKind::InvisibilityPotion
                | ItemKind::Bomb
        )
    }

    /// Weapons that qualify for destroying a spawner.
    pub fn is_weapon(self) -> bool {
        matches!(self, ItemKind::Sword | ItemKind::Bow)
    }
}

/// One item instance in the inventory. Equipment tracks remaining
/// durability; other kinds carry `None`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: EntityId,
    pub kind: ItemKind,
    pub durability: Option<u32>,
}

impl InventoryItem {
    pub fn new(id: EntityId, kind: ItemKind) -> Self {
        Self {
            id,
            kind,
            durability: kind.initial_durability(),
        }
    }
}

/// The player's inventory. Owned by the engine rather than attached as a
/// component: battle resolution mutates it while the world is borrowed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn add(&mut self, item: InventoryItem) {
        self.items.push(item);
    }

    pub fn contains(&self, kind: ItemKind) -> bool {
        self.items.iter().any(|i| i.kind == kind)
    }

    pub fn count(&self, kind: ItemKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind).count()
    }

    pub fn find(&self, id: EntityId) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Remove one item of `kind`, returning it. Keys are matched on kind
    /// equality, so `Key { key_id }` removes that specific key.
    pub fn take_kind(&mut self, kind: ItemKind) -> Option<InventoryItem> {
        let idx = self.items.iter().position(|i| i.kind == kind)?;
        Some(self.items.remove(idx))
    }

    pub fn take_id(&mut self, id: EntityId) -> Option<InventoryItem> {
        let idx = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Remove the first held key regardless of its id.
    pub fn take_any_key(&mut self) -> Option<InventoryItem> {
        let idx = self
            .items
            .iter()
            .position(|i| matches!(i.kind, ItemKind::Key { .. }))?;
        Some(self.items.remove(idx))
    }

    pub fn holds_key(&self, key_id: u32) -> bool {
        self.items
            .iter()
            .any(|i| i.kind == ItemKind::Key { key_id })
    }

    pub fn holds_any_key(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i.kind, ItemKind::Key { .. }))
    }
}

/// Craftable recipes for `build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Buildable {
    Bow,
    Shield,
    Sceptre,
}

impl Buildable {
    pub fn parse(name: &str) -> Option<Buildable> {
        match name {
            "bow" => Some(Buildable::Bow),
            "shield" => Some(Buildable::Shield),
            "sceptre" => Some(Buildable::Sceptre),
            _ => None,
        }
    }

    pub fn produces(self) -> ItemKind {
        match self {
            Buildable::Bow => ItemKind::Bow,
            Buildable::Shield => ItemKind::Shield,
            Buildable::Sceptre => ItemKind::Sceptre,
        }
    }

    /// Crafting cost, as (ingredient predicate description, count) pairs
    /// resolved by the engine against the inventory.
    pub fn recipe(self) -> &'static [(Ingredient, usize)] {
        match self {
            Buildable::Bow => &[(Ingredient::Wood, 1), (Ingredient::Arrow, 3)],
            Buildable::Shield => &[(Ingredient::Wood, 2), (Ingredient::TreasureOrKey, 1)],
            Buildable::Sceptre => &[
                (Ingredient::Wood, 1),
                (Ingredient::AnyKey, 1),
                (Ingredient::Treasure, 1),
            ],
        }
    }
}

/// Ingredient classes a recipe may demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ingredient {
    Wood,
    Arrow,
    Treasure,
    AnyKey,
    /// Either one treasure or one key satisfies this slot.
    TreasureOrKey,
}

/// Ground-item component: a collectable lying on a tile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collectable {
    pub kind: ItemKind,
}
