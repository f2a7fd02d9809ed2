//! Mirecrawl Headless Simulation Harness
//!
//! Validates engine behaviour end to end without a frontend.
//! Runs entirely in-process — no files written, no rendering.
//!
//! Usage:
//!   cargo run -p mirecrawl-simtest
//!   cargo run -p mirecrawl-simtest -- --verbose

use mirecrawl_core::components::{Direction, GridPos, ItemKind};
use mirecrawl_core::engine::GameEngine;
use mirecrawl_core::generation::{DescriptorKind, EntityDescriptor, ModeConfig};
use mirecrawl_core::goals::ExitGoal;
use mirecrawl_core::pathfinding;
use mirecrawl_core::terrain::{MoverClass, TerrainIndex};

// ── Fixture dungeon (same JSON shape external loaders produce) ─────────
const ARENA_JSON: &str = include_str!("../fixtures/arena.json");

// ── Test harness ───────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: String) -> Self {
        Self {
            name: name.to_string(),
            passed,
            detail,
        }
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Mirecrawl Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Fixture dungeon loads and boots
    results.extend(validate_fixture(verbose));

    // 2. Determinism under a fixed seed
    results.extend(validate_determinism(verbose));

    // 3. Pathfinding invariants on the live terrain
    results.extend(validate_pathfinding(verbose));

    // 4. Battle arithmetic sweep
    results.extend(validate_battles(verbose));

    // 5. Swamp throttling
    results.extend(validate_swamp(verbose));

    // 6. Rewind replay
    results.extend(validate_rewind(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);
    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_fixture() -> Vec<EntityDescriptor> {
    serde_json::from_str(ARENA_JSON).expect("fixture parses")
}

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

fn quiet_mode() -> ModeConfig {
    ModeConfig {
        zombie_spawn_interval: 0,
        spider_spawn_interval: 0,
        ..ModeConfig::standard()
    }
}

// ── 1. Fixture ─────────────────────────────────────────────────────────

fn validate_fixture(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    let descriptors = load_fixture();
    results.push(TestResult::new(
        "fixture parses",
        descriptors.len() > 30,
        format!("{} descriptors", descriptors.len()),
    ));

    let engine = GameEngine::new(&descriptors, ModeConfig::standard(), 7);
    let ok = engine.is_ok();
    results.push(TestResult::new(
        "fixture boots",
        ok,
        "engine constructed".to_string(),
    ));
    if !ok {
        return results;
    }
    let engine = engine.unwrap().with_goal(Box::new(ExitGoal));

    let view = engine.view();
    let players = view.player.is_some();
    results.push(TestResult::new(
        "one player",
        players,
        format!("player at {:?}", view.player.as_ref().map(|p| (p.x, p.y))),
    ));
    results.push(TestResult::new(
        "goal reported",
        view.goal.as_deref() == Some(":exit"),
        format!("goal = {:?}", view.goal),
    ));

    if verbose {
        println!("  fixture view: {} entities", view.entities.len());
    }
    results
}

// ── 2. Determinism ─────────────────────────────────────────────────────

fn validate_determinism(_verbose: bool) -> Vec<TestResult> {
    let descriptors = load_fixture();
    let script = [
        Some(Direction::Right),
        Some(Direction::Right),
        Some(Direction::Down),
        None,
        Some(Direction::Down),
        Some(Direction::Right),
    ];

    let run = |seed: u64| -> String {
        let mut engine = GameEngine::new(&descriptors, ModeConfig::standard(), seed).unwrap();
        let mut log = String::new();
        for _ in 0..5 {
            for dir in script {
                let view = engine.tick(None, dir).unwrap();
                log.push_str(&serde_json::to_string(&view).unwrap());
            }
        }
        log
    };

    let a = run(99);
    let b = run(99);
    let c = run(100);

    vec![
        TestResult::new(
            "same seed, same story",
            a == b,
            format!("{} bytes of identical views", a.len()),
        ),
        TestResult::new(
            "different seed diverges eventually",
            a != c,
            "seeded randomness observed".to_string(),
        ),
    ]
}

// ── 3. Pathfinding ─────────────────────────────────────────────────────

fn validate_pathfinding(verbose: bool) -> Vec<TestResult> {
    use mirecrawl_core::generation::populate_world;

    let mut results = Vec::new();
    let descriptors = walled_arena(
        8,
        8,
        vec![EntityDescriptor::at(DescriptorKind::Player, 1, 1)],
    );

    let mut world = mirecrawl_core::hecs::World::new();
    let mut index = TerrainIndex::new();
    let mode = ModeConfig::standard();
    let mut next_id = 0;
    let populated = populate_world(&mut world, &mut index, &mode, &descriptors, &mut next_id).unwrap();

    let src = GridPos::new(1, 1);
    let paths = pathfinding::paths_from(&index, &world, MoverClass::Hostile, src, populated.bounds);
    let mut mismatches = 0;
    let mut checked = 0;
    for x in 1..7 {
        for y in 1..7 {
            let dst = GridPos::new(x, y);
            let bfs = pathfinding::shortest_path_length(
                &index,
                &world,
                MoverClass::Hostile,
                src,
                dst,
                populated.bounds,
            );
            checked += 1;
            if paths.cost_to(dst) != bfs {
                mismatches += 1;
                if verbose {
                    println!("  mismatch at {:?}: {:?} vs {:?}", dst, paths.cost_to(dst), bfs);
                }
            }
        }
    }
    results.push(TestResult::new(
        "uniform-cost dijkstra equals bfs",
        mismatches == 0,
        format!("{} destinations checked", checked),
    ));

    let reachable =
        pathfinding::reachable_set(&index, &world, MoverClass::Hostile, src, populated.bounds);
    results.push(TestResult::new(
        "flood fill covers the interior",
        reachable.len() == 36,
        format!("{} tiles reachable", reachable.len()),
    ));

    results
}

// ── 4. Battles ─────────────────────────────────────────────────────────

fn validate_battles(_verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    // Standard mode: walking into a zombie costs six health.
    let descriptors = walled_arena(
        6,
        4,
        vec![
            EntityDescriptor::at(DescriptorKind::Player, 1, 2),
            EntityDescriptor::at(DescriptorKind::Zombie, 2, 2),
        ],
    );
    let mut engine = GameEngine::new(&descriptors, quiet_mode(), 5).unwrap();
    let view = engine.tick(None, Some(Direction::Right)).unwrap();
    let zombie_gone = view.entities.iter().all(|e| e.kind != "zombie");
    results.push(TestResult::new(
        "zombie battle resolves",
        zombie_gone && engine.player_health() == Some(94.0),
        format!("player health {:?}", engine.player_health()),
    ));

    // Peaceful mode: the zombie still dies, the player is untouched.
    let mut engine = GameEngine::new(
        &descriptors,
        ModeConfig {
            zombie_spawn_interval: 0,
            spider_spawn_interval: 0,
            ..ModeConfig::peaceful()
        },
        5,
    )
    .unwrap();
    engine.tick(None, Some(Direction::Right)).unwrap();
    results.push(TestResult::new(
        "peaceful battles are harmless",
        engine.player_health() == Some(100.0),
        format!("player health {:?}", engine.player_health()),
    ));

    results
}

// ── 5. Swamp ───────────────────────────────────────────────────────────

fn validate_swamp(_verbose: bool) -> Vec<TestResult> {
    let descriptors = walled_arena(
        10,
        5,
        vec![
            EntityDescriptor::at(DescriptorKind::Player, 1, 2),
            EntityDescriptor {
                factor: Some(4),
                ..EntityDescriptor::at(DescriptorKind::Swamp, 6, 2)
            },
            EntityDescriptor::at(DescriptorKind::Mercenary, 6, 2),
        ],
    );
    let mut engine = GameEngine::new(&descriptors, quiet_mode(), 5).unwrap();

    let mut stationary = 0;
    let mut moved_at = None;
    for tick in 1..=6 {
        let view = engine.tick(None, None).unwrap();
        let merc = view
            .entities
            .iter()
            .find(|e| e.kind == "mercenary")
            .map(|e| GridPos::new(e.x, e.y))
            .unwrap();
        if merc == GridPos::new(6, 2) {
            stationary += 1;
        } else if moved_at.is_none() {
            moved_at = Some(tick);
        }
    }

    vec![TestResult::new(
        "factor-4 swamp delays three ticks",
        stationary == 3 && moved_at == Some(4),
        format!("{} stationary ticks, moved at {:?}", stationary, moved_at),
    )]
}

// ── 6. Rewind ──────────────────────────────────────────────────────────

fn validate_rewind(_verbose: bool) -> Vec<TestResult> {
    let descriptors = walled_arena(
        12,
        5,
        vec![
            EntityDescriptor::at(DescriptorKind::Player, 1, 2),
            EntityDescriptor::at(DescriptorKind::TimeCharm, 2, 2),
        ],
    );
    let mut engine = GameEngine::new(&descriptors, quiet_mode(), 5).unwrap();
    for _ in 0..4 {
        engine.tick(None, Some(Direction::Right)).unwrap();
    }
    let recorded = engine.player_history().to_vec();

    let view = engine.rewind(3).unwrap();
    let shadow_start = view
        .entities
        .iter()
        .find(|e| e.kind == "shadow")
        .map(|e| GridPos::new(e.x, e.y));

    // The shadow begins where the player stood three ticks ago and walks
    // the recorded trail.
    let mut replay = vec![shadow_start.unwrap_or(GridPos::new(-1, -1))];
    for _ in 0..2 {
        let view = engine.tick(None, None).unwrap();
        if let Some(s) = view
            .entities
            .iter()
            .find(|e| e.kind == "shadow")
            .map(|e| GridPos::new(e.x, e.y))
        {
            replay.push(s);
        }
    }

    let expected: Vec<GridPos> = recorded[recorded.len() - 4..recorded.len() - 1].to_vec();
    let charm_spent = !engine.inventory().contains(ItemKind::TimeCharm);

    vec![TestResult::new(
        "rewind shadow replays history",
        replay == expected && charm_spent,
        format!("replay {:?} vs recorded {:?}", replay, expected),
    )]
}
