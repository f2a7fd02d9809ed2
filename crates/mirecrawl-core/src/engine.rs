//! Simulation engine - main entry point for running the dungeon.
//!
//! `GameEngine` owns the ECS world, the occupancy index, the injected RNG,
//! and the rewind ring, and sequences every tick deterministically: player
//! action, potion decay, mover steps, spawning, goal evaluation. All
//! mutation funnels through here, which is what keeps the one-blocker-per-
//! tile invariant intact at tick boundaries.

use std::collections::VecDeque;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::{
    Attack, Buildable, Creature, Direction, EntityId, Facing, FloorSwitch, GridPos, Health,
    Ingredient, Inventory, InventoryItem, ItemKind, MindControl, PlacedBomb, Player, Position,
    PotionState, Shadow, ZombieSpawner,
};
use crate::error::{EngineError, EngineResult};
use crate::generation::{populate_world, EntityDescriptor, ModeConfig, LAYER_PLAYER, LAYER_TERRAIN};
use crate::goals::{GoalContext, GoalEvaluator};
use crate::pathfinding::Bounds;
use crate::persistence::{self, SnapshotMeta};
use crate::systems::{
    apply_mind_control, attempt_bribe, creature_step, destroy_spawner, explode, is_hostile,
    player_move, publish_potion_transition, relocate_mover, resolve, run_spawners, BattleOutcome,
    StepOutcome,
};
use crate::terrain::TerrainIndex;
use crate::view::{self, TickView};

/// The dungeon simulation engine.
pub struct GameEngine {
    /// ECS world containing all entities.
    world: World,
    /// Occupancy index, kept in lockstep with the world.
    index: TerrainIndex,
    /// The single injected random source. No other entropy exists.
    rng: StdRng,
    seed: u64,
    mode: ModeConfig,
    /// Arena rectangle derived from the initial layout.
    bounds: Bounds,
    tick: u64,
    /// Next external entity id; never reused.
    next_id: u32,
    inventory: Inventory,
    /// Live player handle; `None` once the player has fallen.
    player: Option<Entity>,
    /// Player tile at the end of each past tick, `[0]` being initial.
    player_history: Vec<GridPos>,
    /// Bounded ring of end-of-tick snapshots for rewinding.
    snapshots: VecDeque<Vec<u8>>,
    goal: Option<Box<dyn GoalEvaluator>>,
}

impl GameEngine {
    /// Build an engine from initial entities and mode parameters. The seed
    /// fixes every random decision the simulation will ever make.
    pub fn new(
        descriptors: &[EntityDescriptor],
        mode: ModeConfig,
        seed: u64,
    ) -> EngineResult<Self> {
        let mut world = World::new();
        let mut index = TerrainIndex::new();
        let mut next_id = 0;
        let populated = populate_world(&mut world, &mut index, &mode, descriptors, &mut next_id)?;

        let player_pos = world
            .get::<&Position>(populated.player)
            .map(|p| p.tile)
            .map_err(|_| EngineError::InvalidArgument("player has no position".into()))?;

        let mut engine = Self {
            world,
            index,
            rng: StdRng::seed_from_u64(seed),
            seed,
            mode,
            bounds: populated.bounds,
            tick: 0,
            next_id,
            inventory: Inventory::default(),
            player: Some(populated.player),
            player_history: vec![player_pos],
            snapshots: VecDeque::new(),
            goal: None,
        };
        engine.push_snapshot()?;
        Ok(engine)
    }

    /// Attach the external goal-evaluation collaborator.
    pub fn with_goal(mut self, goal: Box<dyn GoalEvaluator>) -> Self {
        self.goal = Some(goal);
        self
    }

    // ── Tick orchestration ─────────────────────────────────────────────

    /// Advance the world by one atomic tick: optional item consumption and
    /// player move, potion decay, mover steps, spawning, goal evaluation.
    pub fn tick(
        &mut self,
        item: Option<EntityId>,
        direction: Option<Direction>,
    ) -> EngineResult<TickView> {
        let Some(player) = self.player else {
            // Terminal state: progression has ended, queries still work.
            return Ok(self.build_view());
        };

        // Caller errors are rejected before any state changes.
        if let Some(id) = item {
            let held = self.inventory.find(id).map(|i| i.kind);
            match held {
                Some(kind) if kind.is_consumable() => {}
                Some(_) => {
                    return Err(EngineError::InvalidArgument(
                        "item cannot be consumed".into(),
                    ))
                }
                None if id.0 >= self.next_id => return Err(EngineError::UnknownItem(id)),
                None => return Err(EngineError::InvalidAction("item not in inventory".into())),
            }
        }

        self.tick += 1;

        // (1) Player action: consume, then interact-and-move.
        if let Some(id) = item {
            self.consume_item(player, id);
        }
        if let Some(direction) = direction {
            if self.player.is_some() {
                let out = player_move(
                    &mut self.world,
                    &mut self.index,
                    &mut self.inventory,
                    player,
                    direction,
                );
                if let StepOutcome::Moved { tile } = out {
                    self.battle_at(tile);
                }
            }
        }

        // (2) Potion decay.
        if let Some(player) = self.player {
            let reverted = self
                .world
                .get::<&mut PotionState>(player)
                .map(|mut p| p.decay())
                .unwrap_or(false);
            if reverted {
                publish_potion_transition(&mut self.world, PotionState::Default);
            }
        }

        // (3) Mover steps, stable id order.
        self.run_movers();

        // (4) Spawners.
        run_spawners(
            &mut self.world,
            &mut self.index,
            self.bounds,
            &mut self.rng,
            &self.mode,
            self.tick,
            &mut self.next_id,
        );

        // (5) Bookkeeping and goal evaluation.
        if let Some(player) = self.player {
            if let Ok(pos) = self.world.get::<&Position>(player).map(|p| p.tile) {
                self.player_history.push(pos);
            }
        }
        self.push_snapshot()?;
        Ok(self.build_view())
    }

    /// Bribe a mover or destroy a spawner. Does not advance time.
    pub fn interact(&mut self, id: EntityId) -> EngineResult<TickView> {
        let entity = self
            .find_by_id(id)
            .ok_or(EngineError::UnknownEntity(id))?;
        let player = self
            .player
            .ok_or_else(|| EngineError::InvalidAction("the player has fallen".into()))?;

        let bribable = self
            .world
            .get::<&Creature>(entity)
            .map(|c| c.kind.is_bribable())
            .unwrap_or(false);
        if bribable {
            if self.inventory.contains(ItemKind::Sceptre) {
                apply_mind_control(&mut self.world, &self.mode, entity)?;
            } else {
                attempt_bribe(
                    &mut self.world,
                    &mut self.inventory,
                    &self.mode,
                    player,
                    entity,
                )?;
            }
            return Ok(self.build_view());
        }

        if self.world.get::<&ZombieSpawner>(entity).is_ok() {
            let player_pos = self
                .world
                .get::<&Position>(player)
                .map(|p| p.tile)
                .map_err(|_| EngineError::InvalidAction("no player position".into()))?;
            let spawner_pos = self
                .world
                .get::<&Position>(entity)
                .map(|p| p.tile)
                .map_err(|_| EngineError::InvalidAction("no spawner position".into()))?;
            if player_pos.cardinal_distance(spawner_pos) != 1 {
                return Err(EngineError::InvalidAction(
                    "not adjacent to the spawner".into(),
                ));
            }
            if !self.inventory.items.iter().any(|i| i.kind.is_weapon()) {
                return Err(EngineError::InvalidAction(
                    "a weapon is needed to destroy a spawner".into(),
                ));
            }
            destroy_spawner(&mut self.world, &mut self.index, entity);
            return Ok(self.build_view());
        }

        Err(EngineError::InvalidArgument(
            "entity cannot be interacted with".into(),
        ))
    }

    /// Craft a buildable from inventory resources. Does not advance time.
    pub fn build(&mut self, recipe: Buildable) -> EngineResult<TickView> {
        // Plan the consumption first so failure leaves the inventory alone.
        let mut wood = self.inventory.count(ItemKind::Wood);
        let mut arrows = self.inventory.count(ItemKind::Arrow);
        let mut treasure = self.inventory.count(ItemKind::Treasure);
        let mut keys = self
            .inventory
            .items
            .iter()
            .filter(|i| matches!(i.kind, ItemKind::Key { .. }))
            .count();

        let mut take_wood = 0;
        let mut take_arrows = 0;
        let mut take_treasure = 0;
        let mut take_keys = 0;

        for &(ingredient, n) in recipe.recipe() {
            for _ in 0..n {
                let ok = match ingredient {
                    Ingredient::Wood if wood > 0 => {
                        wood -= 1;
                        take_wood += 1;
                        true
                    }
                    Ingredient::Arrow if arrows > 0 => {
                        arrows -= 1;
                        take_arrows += 1;
                        true
                    }
                    Ingredient::Treasure if treasure > 0 => {
                        treasure -= 1;
                        take_treasure += 1;
                        true
                    }
                    Ingredient::AnyKey if keys > 0 => {
                        keys -= 1;
                        take_keys += 1;
                        true
                    }
                    Ingredient::TreasureOrKey if treasure > 0 => {
                        treasure -= 1;
                        take_treasure += 1;
                        true
                    }
                    Ingredient::TreasureOrKey if keys > 0 => {
                        keys -= 1;
                        take_keys += 1;
                        true
                    }
                    _ => false,
                };
                if !ok {
                    return Err(EngineError::InvalidAction(
                        "insufficient crafting resources".into(),
                    ));
                }
            }
        }

        for _ in 0..take_wood {
            self.inventory.take_kind(ItemKind::Wood);
        }
        for _ in 0..take_arrows {
            self.inventory.take_kind(ItemKind::Arrow);
        }
        for _ in 0..take_treasure {
            self.inventory.take_kind(ItemKind::Treasure);
        }
        for _ in 0..take_keys {
            self.inventory.take_any_key();
        }

        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.inventory.add(InventoryItem::new(id, recipe.produces()));
        Ok(self.build_view())
    }

    /// Craft by recipe name, for callers working from raw strings.
    pub fn build_named(&mut self, name: &str) -> EngineResult<TickView> {
        let recipe = Buildable::parse(name)
            .ok_or_else(|| EngineError::InvalidArgument(format!("unknown buildable: {}", name)))?;
        self.build(recipe)
    }

    /// Rewind the world `ticks` ticks. The live player persists with its
    /// current position, health and inventory; a shadow replays the
    /// recorded path until it catches up to the present or collides with
    /// the live player.
    pub fn rewind(&mut self, ticks: u32) -> EngineResult<TickView> {
        if ticks == 0 {
            return Err(EngineError::InvalidArgument(
                "rewind amount must be positive".into(),
            ));
        }
        let player = self
            .player
            .ok_or_else(|| EngineError::InvalidAction("the player has fallen".into()))?;
        if !self.inventory.contains(ItemKind::TimeCharm) {
            return Err(EngineError::InvalidAction(
                "rewinding needs a time charm".into(),
            ));
        }
        let k = ticks as usize;
        if k >= self.snapshots.len() {
            return Err(EngineError::InvalidAction(
                "not enough recorded history".into(),
            ));
        }

        // Keep the live player's present across the restore.
        let live_id = *self
            .world
            .get::<&EntityId>(player)
            .map_err(|_| EngineError::InvalidAction("player has no id".into()))?;
        let live_pos = *self
            .world
            .get::<&Position>(player)
            .map_err(|_| EngineError::InvalidAction("player has no position".into()))?;
        let live_health = self.world.get::<&Health>(player).map(|h| h.0).unwrap_or(0.0);
        let live_attack = self.world.get::<&Attack>(player).map(|a| a.0).unwrap_or(0.0);
        let live_potion = self
            .world
            .get::<&PotionState>(player)
            .map(|p| *p)
            .unwrap_or(PotionState::Default);

        let snapshot_idx = self.snapshots.len() - 1 - k;
        let bytes = self.snapshots[snapshot_idx].clone();
        let loaded = persistence::load_state(bytes.as_slice())?;

        // The shadow replays the recorded segment from the restore point to
        // the present.
        let restore_tick = loaded.tick as usize;
        let shadow_path: Vec<GridPos> = self.player_history[restore_tick..].to_vec();

        self.world = loaded.world;
        self.index = persistence::rebuild_index(&self.world);
        self.tick = loaded.tick;
        self.rng = StdRng::seed_from_u64(loaded.rng_reseed);
        self.player_history = loaded.player_history;
        self.snapshots.truncate(snapshot_idx + 1);

        // Replace the restored player with the live one; its past self
        // becomes the shadow.
        let restored_player = self
            .world
            .query::<&Player>()
            .iter()
            .map(|(e, _)| e)
            .next();
        let (shadow_health, shadow_attack) = restored_player
            .map(|e| {
                (
                    self.world.get::<&Health>(e).map(|h| h.0).unwrap_or(0.0),
                    self.world.get::<&Attack>(e).map(|a| a.0).unwrap_or(0.0),
                )
            })
            .unwrap_or((0.0, 0.0));
        if let Some(old) = restored_player {
            if let Ok(pos) = self.world.get::<&Position>(old).map(|p| p.tile) {
                self.index.remove(old, pos);
            }
            let _ = self.world.despawn(old);
        }

        let live = self.world.spawn((
            live_id,
            Player,
            live_pos,
            Health(live_health),
            Attack(live_attack),
            live_potion,
            Facing(Direction::Down),
        ));
        self.index.place(live, live_pos.tile);
        self.player = Some(live);

        if let Some(&start) = shadow_path.first() {
            let shadow_id = EntityId(self.next_id);
            self.next_id += 1;
            let shadow = self.world.spawn((
                shadow_id,
                Shadow {
                    path: shadow_path,
                    next: 1,
                },
                Position::new(start, LAYER_PLAYER),
                Health(shadow_health),
                Attack(shadow_attack),
            ));
            self.index.place(shadow, start);
        }

        // The charm is spent by the trip.
        self.inventory.take_kind(ItemKind::TimeCharm);

        Ok(self.build_view())
    }

    // ── Snapshots ──────────────────────────────────────────────────────

    /// Serialize the complete engine state to bytes.
    pub fn snapshot(&self) -> EngineResult<Vec<u8>> {
        let mut bytes = Vec::new();
        persistence::save_state(
            &mut bytes,
            &self.world,
            SnapshotMeta {
                tick: self.tick,
                next_id: self.next_id,
                rng_reseed: self.rng_reseed(),
                bounds: self.bounds,
                mode: &self.mode,
                inventory: &self.inventory,
                player_history: &self.player_history,
            },
        )?;
        Ok(bytes)
    }

    /// Replace the live state with a previously serialized one.
    pub fn restore(&mut self, bytes: &[u8]) -> EngineResult<TickView> {
        let loaded = persistence::load_state(bytes)?;

        self.world = loaded.world;
        self.index = persistence::rebuild_index(&self.world);
        self.tick = loaded.tick;
        self.next_id = loaded.next_id;
        self.rng = StdRng::seed_from_u64(loaded.rng_reseed);
        self.mode = loaded.mode;
        self.bounds = loaded.bounds;
        self.inventory = loaded.inventory;
        self.player_history = loaded.player_history;
        self.player = self
            .world
            .query::<&Player>()
            .iter()
            .map(|(e, _)| e)
            .next();
        self.snapshots.clear();
        self.push_snapshot()?;
        Ok(self.build_view())
    }

    // ── Query accessors ────────────────────────────────────────────────

    pub fn view(&self) -> TickView {
        self.build_view()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn mode(&self) -> &ModeConfig {
        &self.mode
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn player_alive(&self) -> bool {
        self.player.is_some()
    }

    pub fn player_tile(&self) -> Option<GridPos> {
        let player = self.player?;
        self.world.get::<&Position>(player).map(|p| p.tile).ok()
    }

    pub fn player_health(&self) -> Option<f64> {
        let player = self.player?;
        self.world.get::<&Health>(player).map(|h| h.0).ok()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Recorded player tile per past tick, `[0]` being the initial tile.
    pub fn player_history(&self) -> &[GridPos] {
        &self.player_history
    }

    /// External id -> live entity.
    pub fn find_by_id(&self, id: EntityId) -> Option<Entity> {
        self.world
            .query::<&EntityId>()
            .iter()
            .find(|(_, eid)| **eid == id)
            .map(|(e, _)| e)
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn consume_item(&mut self, player: Entity, id: EntityId) {
        let Some(item) = self.inventory.take_id(id) else {
            return;
        };
        match item.kind {
            ItemKind::HealthPotion => {
                if let Ok(mut h) = self.world.get::<&mut Health>(player) {
                    h.0 = self.mode.player_health;
                }
            }
            ItemKind::InvincibilityPotion => {
                let state = PotionState::Invincible {
                    remaining: self.mode.invincibility_duration,
                };
                if let Ok(mut p) = self.world.get::<&mut PotionState>(player) {
                    *p = state;
                }
                publish_potion_transition(&mut self.world, state);
            }
            ItemKind::InvisibilityPotion => {
                let state = PotionState::Invisible {
                    remaining: self.mode.invisibility_duration,
                };
                if let Ok(mut p) = self.world.get::<&mut PotionState>(player) {
                    *p = state;
                }
                publish_potion_transition(&mut self.world, state);
            }
            ItemKind::Bomb => {
                let Ok(pos) = self.world.get::<&Position>(player).map(|p| p.tile) else {
                    return;
                };
                let bomb = self.world.spawn((
                    item.id,
                    PlacedBomb {
                        radius: self.mode.bomb_radius,
                    },
                    Position::new(pos, LAYER_TERRAIN),
                ));
                self.index.place(bomb, pos);

                // A bomb dropped beside an already-active switch goes off
                // at once.
                let armed_switch = pos.cardinal_neighbours().into_iter().any(|n| {
                    self.index
                        .find_at::<FloorSwitch>(&self.world, n)
                        .and_then(|e| self.world.get::<&FloorSwitch>(e).ok().map(|s| s.active))
                        .unwrap_or(false)
                });
                if armed_switch {
                    explode(
                        &mut self.world,
                        &mut self.index,
                        bomb,
                        pos,
                        self.mode.bomb_radius,
                    );
                }
            }
            // Validated consumable kinds are exhaustive above.
            _ => {}
        }
    }

    /// Fight every hostile mover sharing `tile` until none remain or the
    /// player falls.
    fn battle_at(&mut self, tile: GridPos) {
        loop {
            let Some(player) = self.player else { return };
            let opponent = self
                .index
                .entities_at(tile)
                .iter()
                .copied()
                .find(|&e| is_hostile(&self.world, e));
            let Some(opponent) = opponent else { return };

            let outcome = resolve(
                &mut self.world,
                &mut self.inventory,
                &self.mode,
                &mut self.rng,
                &mut self.next_id,
                player,
                opponent,
            );
            match outcome {
                BattleOutcome::Evaded => return,
                BattleOutcome::OpponentDefeated => {
                    self.index.remove(opponent, tile);
                    let _ = self.world.despawn(opponent);
                }
                BattleOutcome::PlayerDefeated => {
                    self.remove_player(player);
                    return;
                }
            }
        }
    }

    fn remove_player(&mut self, player: Entity) {
        if let Ok(pos) = self.world.get::<&Position>(player).map(|p| p.tile) {
            self.index.remove(player, pos);
        }
        let _ = self.world.despawn(player);
        self.player = None;
    }

    /// Step every non-player mover once, in ascending id order.
    fn run_movers(&mut self) {
        let mut movers: Vec<(EntityId, Entity)> = self
            .world
            .query::<&EntityId>()
            .with::<&Creature>()
            .iter()
            .map(|(e, id)| (*id, e))
            .collect();
        movers.extend(
            self.world
                .query::<&EntityId>()
                .with::<&Shadow>()
                .iter()
                .map(|(e, id)| (*id, e)),
        );
        movers.sort_by_key(|(id, _)| *id);

        for (_, entity) in movers {
            if !self.world.contains(entity) {
                continue; // Fell to a battle or blast earlier this phase.
            }
            if self.world.get::<&Shadow>(entity).is_ok() {
                self.shadow_step(entity);
                continue;
            }
            self.creature_phase(entity);
        }
    }

    fn creature_phase(&mut self, entity: Entity) {
        let player_pos = self.player_tile();

        let out = creature_step(
            &mut self.world,
            &mut self.index,
            self.bounds,
            &mut self.rng,
            entity,
            player_pos,
        );

        // Mind control winds down after the mover acts; on expiry, combat
        // resolves immediately if the mover stands on the player.
        let expired = {
            match self.world.get::<&mut MindControl>(entity) {
                Ok(mut mc) => {
                    mc.remaining = mc.remaining.saturating_sub(1);
                    mc.remaining == 0
                }
                Err(_) => false,
            }
        };
        if expired {
            let _ = self.world.remove_one::<MindControl>(entity);
        }

        let on_player = |tile: GridPos| self.player_tile() == Some(tile);
        let collided = match out {
            StepOutcome::Moved { tile } if on_player(tile) => true,
            _ => {
                expired
                    && self
                        .world
                        .get::<&Position>(entity)
                        .map(|p| on_player(p.tile))
                        .unwrap_or(false)
            }
        };
        if collided && is_hostile(&self.world, entity) {
            if let Some(tile) = self.world.get::<&Position>(entity).map(|p| p.tile).ok() {
                self.battle_at(tile);
            }
        }
    }

    /// Shadow replay: one recorded tile per tick. Collision with the live
    /// player resolves against the player's current combat state; catching
    /// up to the present removes the shadow.
    fn shadow_step(&mut self, entity: Entity) {
        let step = {
            let Ok(shadow) = self.world.get::<&Shadow>(entity) else {
                return;
            };
            shadow.path.get(shadow.next).copied()
        };

        match step {
            None => {
                // Caught up with the present.
                if let Ok(pos) = self.world.get::<&Position>(entity).map(|p| p.tile) {
                    self.index.remove(entity, pos);
                }
                let _ = self.world.despawn(entity);
            }
            Some(next_tile) => {
                let from = self
                    .world
                    .get::<&Position>(entity)
                    .map(|p| p.tile)
                    .unwrap_or(next_tile);
                relocate_mover(&mut self.world, &mut self.index, entity, from, next_tile);
                if let Ok(mut shadow) = self.world.get::<&mut Shadow>(entity) {
                    shadow.next += 1;
                }

                if self.player_tile() == Some(next_tile) {
                    self.shadow_battle(entity, next_tile);
                }
            }
        }
    }

    fn shadow_battle(&mut self, shadow: Entity, tile: GridPos) {
        let Some(player) = self.player else { return };
        let outcome = resolve(
            &mut self.world,
            &mut self.inventory,
            &self.mode,
            &mut self.rng,
            &mut self.next_id,
            player,
            shadow,
        );
        match outcome {
            BattleOutcome::Evaded => {}
            BattleOutcome::OpponentDefeated => {
                self.index.remove(shadow, tile);
                let _ = self.world.despawn(shadow);
            }
            BattleOutcome::PlayerDefeated => {
                self.remove_player(player);
            }
        }
    }

    fn rng_reseed(&self) -> u64 {
        // Deterministic in (seed, tick): restoring a snapshot always
        // resumes the same stream.
        self.seed ^ self.tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    fn push_snapshot(&mut self) -> EngineResult<()> {
        let bytes = self.snapshot()?;
        self.snapshots.push_back(bytes);
        while self.snapshots.len() > self.mode.snapshot_ring.max(1) {
            self.snapshots.pop_front();
        }
        Ok(())
    }

    fn build_view(&self) -> TickView {
        let goal = self.goal.as_ref().map(|g| {
            g.evaluate(&GoalContext {
                world: &self.world,
                player: self.player,
                inventory: &self.inventory,
            })
        });
        TickView {
            tick: self.tick,
            goal,
            player: view::player_view(&self.world, self.player),
            entities: view::entity_views(&self.world),
            inventory: view::inventory_view(&self.inventory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::DescriptorKind;

    fn walled_arena(w: i32, h: i32, extra: Vec<EntityDescriptor>) -> Vec<EntityDescriptor> {
        let mut descriptors = Vec::new();
        for x in 0..w {
            for y in 0..h {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    descriptors.push(EntityDescriptor::at(DescriptorKind::Wall, x, y));
                }
            }
        }
        descriptors.extend(extra);
        descriptors
    }

    #[test]
    fn engine_creation_and_empty_tick() {
        let descriptors = walled_arena(
            6,
            6,
            vec![EntityDescriptor::at(DescriptorKind::Player, 2, 2)],
        );
        let mut engine = GameEngine::new(&descriptors, ModeConfig::standard(), 1).unwrap();
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(engine.player_tile(), Some(GridPos::new(2, 2)));

        let viewed = engine.tick(None, None).unwrap();
        assert_eq!(viewed.tick, 1);
        assert_eq!(engine.player_tile(), Some(GridPos::new(2, 2)));
    }

    #[test]
    fn player_walks_and_is_stopped_by_walls() {
        let descriptors = walled_arena(
            5,
            5,
            vec![EntityDescriptor::at(DescriptorKind::Player, 1, 1)],
        );
        let mut engine = GameEngine::new(&descriptors, ModeConfig::standard(), 1).unwrap();

        engine.tick(None, Some(Direction::Right)).unwrap();
        assert_eq!(engine.player_tile(), Some(GridPos::new(2, 1)));

        engine.tick(None, Some(Direction::Up)).unwrap();
        assert_eq!(engine.player_tile(), Some(GridPos::new(2, 1)));
    }

    #[test]
    fn unknown_and_unheld_items_are_rejected_without_mutation() {
        let descriptors = walled_arena(
            5,
            5,
            vec![
                EntityDescriptor::at(DescriptorKind::Player, 1, 1),
                EntityDescriptor::at(DescriptorKind::Treasure, 2, 1),
            ],
        );
        let mut engine = GameEngine::new(&descriptors, ModeConfig::standard(), 1).unwrap();

        let err = engine.tick(Some(EntityId(9999)), None).unwrap_err();
        assert!(matches!(err, EngineError::UnknownItem(_)));
        assert_eq!(engine.tick_count(), 0);

        // Treasure id exists but lies on the floor.
        let treasure = engine
            .view()
            .entities
            .iter()
            .find(|e| e.kind == "treasure")
            .map(|e| e.id)
            .unwrap();
        let err = engine.tick(Some(treasure), None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction(_)));
        assert_eq!(engine.tick_count(), 0);
    }

    #[test]
    fn goal_string_is_surfaced() {
        let descriptors = walled_arena(
            5,
            5,
            vec![
                EntityDescriptor::at(DescriptorKind::Player, 1, 1),
                EntityDescriptor::at(DescriptorKind::Exit, 2, 1),
            ],
        );
        let mut engine = GameEngine::new(&descriptors, ModeConfig::standard(), 1)
            .unwrap()
            .with_goal(Box::new(crate::goals::ExitGoal));

        let viewed = engine.tick(None, None).unwrap();
        assert_eq!(viewed.goal.as_deref(), Some(":exit"));

        let viewed = engine.tick(None, Some(Direction::Right)).unwrap();
        assert_eq!(viewed.goal.as_deref(), Some(""));
    }

    #[test]
    fn same_seed_same_story() {
        let descriptors = walled_arena(
            10,
            10,
            vec![
                EntityDescriptor::at(DescriptorKind::Player, 1, 1),
                EntityDescriptor::at(DescriptorKind::Zombie, 8, 8),
                EntityDescriptor::at(DescriptorKind::Zombie, 5, 5),
            ],
        );
        let mut a = GameEngine::new(&descriptors, ModeConfig::standard(), 42).unwrap();
        let mut b = GameEngine::new(&descriptors, ModeConfig::standard(), 42).unwrap();

        for _ in 0..30 {
            let va = a.tick(None, Some(Direction::Right)).unwrap();
            let vb = b.tick(None, Some(Direction::Right)).unwrap();
            let ja = serde_json::to_string(&va).unwrap();
            let jb = serde_json::to_string(&vb).unwrap();
            assert_eq!(ja, jb);
        }
    }
}
