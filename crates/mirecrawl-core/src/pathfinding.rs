//! Pathfinding over the live dungeon grid.
//!
//! Three queries, all evaluated against the same neighbour/blocking model so
//! they can never disagree: a reachability flood fill, an unweighted BFS
//! path length, and a swamp-cost-aware Dijkstra producing a predecessor map
//! for "next hop toward the player" decisions.
//!
//! Unreachable destinations are reported as `None`, never as errors; movers
//! treat them as "stay in place".

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use hecs::World;
use serde::{Deserialize, Serialize};

use crate::components::GridPos;
use crate::terrain::{MoverClass, TerrainIndex};

/// Inclusive rectangle bounding all graph searches. Dungeons are normally
/// wall-enclosed, but searches must terminate even on open layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: GridPos,
    pub max: GridPos,
}

impl Bounds {
    pub fn new(min: GridPos, max: GridPos) -> Self {
        Self { min, max }
    }

    /// Bounding box of a tile set, grown by `margin` on every side.
    pub fn around<I: IntoIterator<Item = GridPos>>(tiles: I, margin: i32) -> Self {
        let mut min = GridPos::new(i32::MAX, i32::MAX);
        let mut max = GridPos::new(i32::MIN, i32::MIN);
        for t in tiles {
            min.x = min.x.min(t.x);
            min.y = min.y.min(t.y);
            max.x = max.x.max(t.x);
            max.y = max.y.max(t.y);
        }
        if min.x > max.x {
            // Empty layout: a single-tile box at the origin.
            min = GridPos::new(0, 0);
            max = GridPos::new(0, 0);
        }
        Self {
            min: GridPos::new(min.x - margin, min.y - margin),
            max: GridPos::new(max.x + margin, max.y + margin),
        }
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }
}

/// Flood-fill the connected component of tiles a mover of `class` standing
/// at `from` could ever occupy.
pub fn reachable_set(
    index: &TerrainIndex,
    world: &World,
    class: MoverClass,
    from: GridPos,
    bounds: Bounds,
) -> HashSet<GridPos> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(from);
    queue.push_back(from);

    while let Some(pos) = queue.pop_front() {
        for next in pos.cardinal_neighbours() {
            if !bounds.contains(next) || seen.contains(&next) {
                continue;
            }
            if index.is_blocked_for(world, class, next) {
                continue;
            }
            seen.insert(next);
            queue.push_back(next);
        }
    }
    seen
}

/// Unweighted shortest path length from `src` to `dst` for a mover of
/// `class`. `Some(0)` when `src == dst`; `None` when unreachable.
pub fn shortest_path_length(
    index: &TerrainIndex,
    world: &World,
    class: MoverClass,
    src: GridPos,
    dst: GridPos,
    bounds: Bounds,
) -> Option<u32> {
    if src == dst {
        return Some(0);
    }

    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(src);
    queue.push_back((src, 0u32));

    while let Some((pos, dist)) = queue.pop_front() {
        for next in pos.cardinal_neighbours() {
            if next == dst {
                return Some(dist + 1);
            }
            if !bounds.contains(next) || seen.contains(&next) {
                continue;
            }
            if index.is_blocked_for(world, class, next) {
                continue;
            }
            seen.insert(next);
            queue.push_back((next, dist + 1));
        }
    }
    None
}

/// Result of a weighted search: predecessor and cost maps keyed by tile.
/// Callers walk the predecessor chain back from a destination to find the
/// first hop to take.
#[derive(Debug)]
pub struct WeightedPaths {
    origin: GridPos,
    prev: HashMap<GridPos, GridPos>,
    cost: HashMap<GridPos, u32>,
}

impl WeightedPaths {
    /// Total path cost from the origin to `dst`, or `None` if unreachable.
    pub fn cost_to(&self, dst: GridPos) -> Option<u32> {
        self.cost.get(&dst).copied()
    }

    /// First tile to step onto along the cheapest path from the origin to
    /// `dst`. `None` when `dst` is the origin or unreachable.
    pub fn first_step(&self, dst: GridPos) -> Option<GridPos> {
        if dst == self.origin || !self.cost.contains_key(&dst) {
            return None;
        }
        let mut cur = dst;
        while let Some(&p) = self.prev.get(&cur) {
            if p == self.origin {
                return Some(cur);
            }
            cur = p;
        }
        None
    }
}

/// Direction a weighted search charges its edges in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeCost {
    /// Entering a tile costs that tile's movement factor. Used for paths
    /// *from* the origin outward (Follow: mover toward player).
    EnterTile,
    /// Reversed-graph search from a destination: expanding frontier tile
    /// `pos` toward `next` stands for the forward move `next -> pos`, which
    /// costs `pos`'s factor. Yields, for every tile, the exact forward cost
    /// of travelling from it *to* the origin (Flee: comparing escape tiles).
    LeaveTile,
}

/// Dijkstra from `origin` over the tiles passable for `class`.
///
/// Tie-break is deterministic: the lowest cost discovered first wins, with
/// neighbours expanded in fixed Up/Down/Left/Right order and heap ties
/// broken by insertion sequence.
fn dijkstra(
    index: &TerrainIndex,
    world: &World,
    class: MoverClass,
    origin: GridPos,
    bounds: Bounds,
    edge_cost: EdgeCost,
) -> WeightedPaths {
    let mut prev = HashMap::new();
    let mut cost = HashMap::new();
    let mut done = HashSet::new();
    let mut seq = 0u64;
    let mut heap: BinaryHeap<Reverse<(u32, u64, GridPos)>> = BinaryHeap::new();

    cost.insert(origin, 0);
    heap.push(Reverse((0, seq, origin)));

    while let Some(Reverse((dist, _, pos))) = heap.pop() {
        if !done.insert(pos) {
            continue;
        }
        for next in pos.cardinal_neighbours() {
            if !bounds.contains(next) || done.contains(&next) {
                continue;
            }
            if index.is_blocked_for(world, class, next) {
                continue;
            }
            let step = match edge_cost {
                EdgeCost::EnterTile => index.movement_factor(world, next),
                EdgeCost::LeaveTile => index.movement_factor(world, pos),
            };
            let candidate = dist + step;
            if cost.get(&next).map_or(true, |&c| candidate < c) {
                cost.insert(next, candidate);
                prev.insert(next, pos);
                seq += 1;
                heap.push(Reverse((candidate, seq, next)));
            }
        }
    }

    WeightedPaths { origin, prev, cost }
}

/// Weighted shortest paths outward from `src`; `first_step(dst)` is the
/// next hop toward `dst`.
pub fn paths_from(
    index: &TerrainIndex,
    world: &World,
    class: MoverClass,
    src: GridPos,
    bounds: Bounds,
) -> WeightedPaths {
    dijkstra(index, world, class, src, bounds, EdgeCost::EnterTile)
}

/// For every tile, the weighted cost of travelling from it to `target`.
/// Used by fleeing movers to rank escape tiles.
pub fn costs_to_target(
    index: &TerrainIndex,
    world: &World,
    class: MoverClass,
    target: GridPos,
    bounds: Bounds,
) -> WeightedPaths {
    dijkstra(index, world, class, target, bounds, EdgeCost::LeaveTile)
}

/// Convenience wrapper: the single next hop from `src` toward `dst`.
pub fn first_step_towards(
    index: &TerrainIndex,
    world: &World,
    class: MoverClass,
    src: GridPos,
    dst: GridPos,
    bounds: Bounds,
) -> Option<GridPos> {
    paths_from(index, world, class, src, bounds).first_step(dst)
}
