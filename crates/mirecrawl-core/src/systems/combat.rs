//! Combat resolution: the player's potion state machine, battle rounds with
//! equipment-modified damage, bribery, mind control, and battle drops.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    Ally, Attack, Creature, CreatureKind, EntityId, Health, Inventory, InventoryItem, ItemKind,
    MindControl, MovementState, Player, PotionState, Position,
};
use crate::error::EngineError;
use crate::generation::ModeConfig;

/// How a collision between the player and a hostile mover ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// Invisible player: no damage in either direction.
    Evaded,
    /// The opponent died; the caller removes it from the world.
    OpponentDefeated,
    /// The player died; the caller removes it from the world.
    PlayerDefeated,
}

/// Resolve a battle between the player and a hostile, non-allied mover
/// sharing its tile. Mutates healths and the inventory; despawning the
/// loser is the orchestrator's job.
pub fn resolve(
    world: &mut World,
    inventory: &mut Inventory,
    mode: &ModeConfig,
    rng: &mut impl Rng,
    next_id: &mut u32,
    player: Entity,
    opponent: Entity,
) -> BattleOutcome {
    let potion = world
        .get::<&PotionState>(player)
        .map(|p| *p)
        .unwrap_or(PotionState::Default);

    if potion.is_invisible() {
        return BattleOutcome::Evaded;
    }
    if potion.is_invincible() {
        // Killed outright; equipment is never touched.
        return BattleOutcome::OpponentDefeated;
    }

    let player_attack = world.get::<&Attack>(player).map(|a| a.0).unwrap_or(0.0);
    let mut player_health = world.get::<&Health>(player).map(|h| h.0).unwrap_or(0.0);

    let opponent_kind = world.get::<&Creature>(opponent).map(|c| c.kind).ok();
    let opponent_attack = world.get::<&Attack>(opponent).map(|a| a.0).unwrap_or(0.0);
    let mut opponent_health = world.get::<&Health>(opponent).map(|h| h.0).unwrap_or(0.0);

    // Allies fight alongside the player every round.
    let ally_attack: f64 = world
        .query::<&Attack>()
        .with::<&Ally>()
        .iter()
        .map(|(_, a)| a.0)
        .sum();

    let outcome = loop {
        // Recomputed every round: equipment breaks mid-battle.
        let bonus: f64 = inventory
            .items
            .iter()
            .filter(|i| i.durability.map_or(false, |d| d > 0))
            .filter_map(|i| i.kind.attack_bonus())
            .sum();
        let reduction: f64 = inventory
            .items
            .iter()
            .filter(|i| i.durability.map_or(false, |d| d > 0))
            .filter_map(|i| i.kind.damage_reduction())
            .product();

        let outgoing = player_attack + bonus + ally_attack;
        let incoming = opponent_attack * mode.enemy_attack_multiplier * reduction;

        // Both deltas are computed from the pre-round state and applied
        // together.
        let hydra_heals = opponent_kind == Some(CreatureKind::Hydra)
            && !inventory.contains(ItemKind::Sword)
            && rng.gen_bool(0.5);
        if hydra_heals {
            opponent_health += outgoing;
        } else {
            opponent_health -= outgoing;
        }
        player_health -= incoming;

        spend_durability(inventory);

        if player_health <= 0.0 {
            if inventory.take_kind(ItemKind::RevivalCharm).is_some() {
                player_health = mode.player_health;
            } else {
                break BattleOutcome::PlayerDefeated;
            }
        }
        if opponent_health <= 0.0 {
            roll_drops(inventory, mode, rng, next_id);
            break BattleOutcome::OpponentDefeated;
        }
    };

    if let Ok(mut h) = world.get::<&mut Health>(player) {
        h.0 = player_health;
    }
    if let Ok(mut h) = world.get::<&mut Health>(opponent) {
        h.0 = opponent_health;
    }
    outcome
}

/// Every equipped item participating in a round loses one durability;
/// broken items leave the inventory.
fn spend_durability(inventory: &mut Inventory) {
    for item in &mut inventory.items {
        if item.kind.is_equipment() {
            if let Some(d) = item.durability.as_mut() {
                *d = d.saturating_sub(1);
            }
        }
    }
    inventory
        .items
        .retain(|i| !i.kind.is_equipment() || i.durability.map_or(true, |d| d > 0));
}

/// Two independent drop rolls after a kill: armour and a revival charm.
/// Rewards go straight to the inventory.
fn roll_drops(inventory: &mut Inventory, mode: &ModeConfig, rng: &mut impl Rng, next_id: &mut u32) {
    if rng.gen_bool(mode.armour_drop_rate) {
        let id = EntityId(*next_id);
        *next_id += 1;
        inventory.add(InventoryItem::new(id, ItemKind::Armour));
    }
    if rng.gen_bool(mode.charm_drop_rate) {
        let id = EntityId(*next_id);
        *next_id += 1;
        inventory.add(InventoryItem::new(id, ItemKind::RevivalCharm));
    }
}

/// Bribe a bribable hostile into permanent alliance. Fails without
/// mutating anything if the mover is out of range or the price is not
/// covered.
pub fn attempt_bribe(
    world: &mut World,
    inventory: &mut Inventory,
    mode: &ModeConfig,
    player: Entity,
    target: Entity,
) -> Result<(), EngineError> {
    let kind = world
        .get::<&Creature>(target)
        .ok()
        .map(|c| c.kind)
        .filter(|k| k.is_bribable())
        .ok_or_else(|| EngineError::InvalidArgument("entity cannot be bribed".into()))?;
    if world.get::<&Ally>(target).is_ok() {
        return Err(EngineError::InvalidAction("already an ally".into()));
    }

    let player_pos = world
        .get::<&Position>(player)
        .map(|p| p.tile)
        .map_err(|_| EngineError::InvalidAction("no player".into()))?;
    let target_pos = world
        .get::<&Position>(target)
        .map(|p| p.tile)
        .map_err(|_| EngineError::InvalidAction("target has no position".into()))?;
    if player_pos.cardinal_distance(target_pos) > mode.bribe_radius {
        return Err(EngineError::InvalidAction("too far away to bribe".into()));
    }

    let treasure_needed = mode.bribe_amount as usize;
    if inventory.count(ItemKind::Treasure) < treasure_needed {
        return Err(EngineError::InvalidAction("not enough treasure".into()));
    }
    let charm_needed = kind == CreatureKind::Assassin;
    if charm_needed && !inventory.contains(ItemKind::RevivalCharm) {
        return Err(EngineError::InvalidAction(
            "assassins demand a revival charm".into(),
        ));
    }

    // Price is covered; consume it and flip allegiance.
    for _ in 0..treasure_needed {
        inventory.take_kind(ItemKind::Treasure);
    }
    if charm_needed {
        inventory.take_kind(ItemKind::RevivalCharm);
    }
    world
        .insert_one(target, Ally)
        .map_err(|_| EngineError::InvalidAction("target no longer exists".into()))?;
    // Allies trail the player from now on.
    if let Ok(mut state) = world.get::<&mut MovementState>(target) {
        *state = MovementState::Follow;
    }
    let _ = world.remove_one::<MindControl>(target);
    Ok(())
}

/// Put a bribable hostile under sceptre control: it flees the player until
/// the effect expires.
pub fn apply_mind_control(
    world: &mut World,
    mode: &ModeConfig,
    target: Entity,
) -> Result<(), EngineError> {
    let bribable = world
        .get::<&Creature>(target)
        .map(|c| c.kind.is_bribable())
        .unwrap_or(false);
    if !bribable {
        return Err(EngineError::InvalidArgument(
            "entity cannot be mind-controlled".into(),
        ));
    }
    if world.get::<&Ally>(target).is_ok() {
        return Err(EngineError::InvalidAction("already an ally".into()));
    }
    world
        .insert_one(
            target,
            MindControl {
                remaining: mode.mind_control_duration,
            },
        )
        .map_err(|_| EngineError::InvalidAction("target no longer exists".into()))?;
    Ok(())
}

/// Publish a potion transition to every hostile mover: entering
/// invincibility turns followers and wanderers into fleers, leaving it
/// turns them back. Patrollers keep circling and allies never react.
pub fn publish_potion_transition(world: &mut World, state: PotionState) {
    let invincible = state.is_invincible();
    let mut changes: Vec<(Entity, MovementState)> = Vec::new();

    for (entity, (creature, movement)) in world
        .query::<(&Creature, &MovementState)>()
        .without::<&Ally>()
        .iter()
    {
        let new_state = if invincible {
            match movement {
                MovementState::Follow | MovementState::RandomWalk => Some(MovementState::Flee),
                _ => None,
            }
        } else {
            match movement {
                MovementState::Flee => Some(match creature.kind {
                    CreatureKind::Mercenary | CreatureKind::Assassin => MovementState::Follow,
                    _ => MovementState::RandomWalk,
                }),
                _ => None,
            }
        };
        if let Some(s) = new_state {
            changes.push((entity, s));
        }
    }

    for (entity, s) in changes {
        if let Ok(mut movement) = world.get::<&mut MovementState>(entity) {
            *movement = s;
        }
    }
}

/// True when the mover should fight the player on contact.
pub fn is_hostile(world: &World, entity: Entity) -> bool {
    world.get::<&Creature>(entity).is_ok()
        && world.get::<&Ally>(entity).is_err()
        && world.get::<&Player>(entity).is_err()
}
