//! Habitat Headless Harness
//!
//! Replays layout, placement, drag and settling scenarios against the real
//! engine. Runs entirely in-process: no renderer, no UI.
//!
//! Usage:
//!   cargo run -p habitat-simtest
//!   cargo run -p habitat-simtest -- --verbose

use habitat_core::prelude::*;
use habitat_logic::config::Purpose;
use habitat_logic::constants::{partitions, MAX_FLOORS};
use habitat_logic::geometry::PlanPoint;
use habitat_logic::layout::{floor_gap, generate_floor_plan, LayoutParams};
use habitat_logic::systems::{auto_layout, SystemKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Sample layout record (same JSON the planner saves) ──────────────────
const SAMPLE_LAYOUT_JSON: &str = include_str!("../../../data/sample_layout.json");

const DT: f32 = 1.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Habitat Planner Harness ===\n");

    let mut results = Vec::new();

    // 1. Saved layout record
    results.extend(validate_layout_record(verbose));

    // 2. Floor and partition generation sweep
    results.extend(validate_floor_plans(verbose));

    // 3. Placement rules
    results.extend(validate_placement(verbose));

    // 4. Settling convergence
    results.extend(validate_settling(verbose));

    // 5. Randomized drag/release stress
    results.extend(validate_drag_stress(verbose));

    // 6. Re-anchoring to moved floors
    results.extend(validate_reanchor(verbose));

    // 7. System ring layout
    results.extend(validate_system_layout(verbose));

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

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn engine_with_floors(count: u32) -> HabitatEngine {
    let mut engine = HabitatEngine::new();
    engine.rebuild_floors(count);
    engine
}

fn plan_point(p: Vec3) -> PlanPoint {
    PlanPoint::new(p.x, p.z)
}

/// Worst bounds overshoot and worst separation shortfall across the floor set.
fn layout_violations(engine: &HabitatEngine) -> (f32, f32) {
    let limit = engine.rules.bounds_limit(engine.config().radius);
    let min = engine.rules.min_object_distance;
    let objects: Vec<_> = engine
        .registry()
        .ids()
        .into_iter()
        .filter_map(|id| engine.furniture(id))
        .collect();

    let mut overshoot: f32 = 0.0;
    let mut shortfall: f32 = 0.0;
    for (i, a) in objects.iter().enumerate() {
        let r = plan_point(a.position).distance(&PlanPoint::new(0.0, 0.0));
        overshoot = overshoot.max(r - limit);
        for b in &objects[i + 1..] {
            if a.locked_floor == b.locked_floor {
                let d = plan_point(a.position).distance(&plan_point(b.position));
                shortfall = shortfall.max(min - d);
            }
        }
    }
    (overshoot, shortfall)
}

// ── 1. Layout Record ────────────────────────────────────────────────────

fn validate_layout_record(verbose: bool) -> Vec<TestResult> {
    println!("--- Layout Record ---");
    let mut results = Vec::new();

    let raw: serde_json::Value = match serde_json::from_str(SAMPLE_LAYOUT_JSON) {
        Ok(v) => v,
        Err(e) => {
            results.push(TestResult {
                name: "record_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    // Every system id in the sample is known
    let ids: Vec<&str> = raw["systems"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    let unknown: Vec<_> = ids
        .iter()
        .filter(|id| SystemKind::from_id(id).is_none())
        .collect();
    results.push(TestResult {
        name: "record_known_systems".into(),
        passed: !ids.is_empty() && unknown.is_empty(),
        detail: if unknown.is_empty() {
            format!("{} systems, all known", ids.len())
        } else {
            format!("unknown systems: {:?}", unknown)
        },
    });

    // Loading into an engine lays out every system
    let mut engine = HabitatEngine::new();
    let load = engine.load_layout(SAMPLE_LAYOUT_JSON);
    results.push(TestResult {
        name: "record_load".into(),
        passed: load.is_ok() && engine.systems_count() == ids.len(),
        detail: match &load {
            Ok(()) => format!("{} systems laid out", engine.systems_count()),
            Err(e) => format!("load failed: {}", e),
        },
    });

    // Save then load yields the same config
    let saved = engine.save_layout();
    let mut reloaded = HabitatEngine::new();
    let round_trip = saved
        .as_deref()
        .map_err(|e| e.to_string())
        .and_then(|json| reloaded.load_layout(json).map_err(|e| e.to_string()));
    let same = round_trip.is_ok()
        && reloaded.config().shape == engine.config().shape
        && reloaded.config().radius == engine.config().radius
        && reloaded.config().enabled_systems == engine.config().enabled_systems;
    results.push(TestResult {
        name: "record_round_trip".into(),
        passed: same,
        detail: match round_trip {
            Ok(()) => "save/load preserves shape, size and systems".into(),
            Err(e) => e,
        },
    });

    // Corrupt records leave the engine alone
    let before = engine.config().clone();
    let bad = [
        "{ truncated",
        r#"{"shape":"hexagon","radius":10,"height":15}"#,
        r#"{"shape":"sphere","radius":-4,"height":15}"#,
    ];
    let rejected = bad.iter().all(|json| engine.load_layout(json).is_err());
    results.push(TestResult {
        name: "record_rejects_corrupt".into(),
        passed: rejected && engine.config() == &before,
        detail: format!("{} corrupt records rejected", bad.len()),
    });

    if verbose {
        println!("  {} sample systems", ids.len());
    }
    results
}

// ── 2. Floor Plans ──────────────────────────────────────────────────────

fn validate_floor_plans(verbose: bool) -> Vec<TestResult> {
    println!("--- Floor Plans ---");
    let mut results = Vec::new();

    let purpose_sets: [&[Purpose]; 4] = [
        &[],
        &[Purpose::Research],
        &[Purpose::MixedUse, Purpose::Residential],
        &[Purpose::EmergencyShelter],
    ];
    let crews = [1, 12, 13, 25, 500];

    let mut plans = 0;
    let mut spacing_errors = 0;
    let mut short_walls = 0;
    let mut bad_heights = 0;
    let mut missing_boundary = 0;
    let mut non_deterministic = 0;

    for floor_count in 0..=12 {
        for crew_size in crews {
            for purposes in purpose_sets {
                let params = LayoutParams {
                    floor_count,
                    crew_size,
                    purposes: purposes.to_vec(),
                    ..LayoutParams::default()
                };
                let plan = generate_floor_plan(&params);
                plans += 1;

                if plan != generate_floor_plan(&params) {
                    non_deterministic += 1;
                }

                let gap = floor_gap(params.height, floor_count);
                for pair in plan.floors.windows(2) {
                    let step = pair[1].elevation_base - pair[0].elevation_base;
                    if (step - gap).abs() > 1e-4 {
                        spacing_errors += 1;
                    }
                }

                short_walls += plan
                    .walls
                    .iter()
                    .filter(|w| w.length() < partitions::MIN_WALL_LENGTH)
                    .count();
                bad_heights += plan
                    .walls
                    .iter()
                    .filter(|w| {
                        w.height < partitions::MIN_WALL_HEIGHT - 1e-5
                            || w.height > partitions::MAX_WALL_HEIGHT + 1e-5
                    })
                    .count();

                let half_w = plan.footprint_width / 2.0;
                let half_d = plan.footprint_depth / 2.0;
                for floor in &plan.floors {
                    let boundary = plan
                        .walls_on(floor.index)
                        .filter(|w| {
                            let on_x = (w.start.x - w.end.x).abs() < 1e-4
                                && (w.start.x.abs() - half_w).abs() < 1e-4;
                            let on_z = (w.start.z - w.end.z).abs() < 1e-4
                                && (w.start.z.abs() - half_d).abs() < 1e-4;
                            on_x || on_z
                        })
                        .count();
                    if boundary < 4 {
                        missing_boundary += 1;
                    }
                }
            }
        }
    }

    results.push(TestResult {
        name: "plan_even_spacing".into(),
        passed: spacing_errors == 0,
        detail: format!("{} plans, {} spacing errors", plans, spacing_errors),
    });
    results.push(TestResult {
        name: "plan_deterministic".into(),
        passed: non_deterministic == 0,
        detail: format!("{} plans differed between runs", non_deterministic),
    });
    results.push(TestResult {
        name: "plan_no_slivers".into(),
        passed: short_walls == 0,
        detail: format!("{} walls below minimum length", short_walls),
    });
    results.push(TestResult {
        name: "plan_wall_heights".into(),
        passed: bad_heights == 0,
        detail: format!("{} walls outside height clamp", bad_heights),
    });
    results.push(TestResult {
        name: "plan_boundary_walls".into(),
        passed: missing_boundary == 0,
        detail: format!("{} floors missing a boundary wall", missing_boundary),
    });

    // Floor cap
    let capped = generate_floor_plan(&LayoutParams {
        floor_count: MAX_FLOORS + 25,
        ..LayoutParams::default()
    });
    results.push(TestResult {
        name: "plan_floor_cap".into(),
        passed: capped.floor_count() == MAX_FLOORS,
        detail: format!("{} floors built for {} requested", capped.floor_count(), MAX_FLOORS + 25),
    });

    if verbose {
        println!("  swept {} plans", plans);
    }
    results
}

// ── 3. Placement ────────────────────────────────────────────────────────

fn validate_placement(_verbose: bool) -> Vec<TestResult> {
    println!("--- Placement ---");
    let mut results = Vec::new();

    let mut engine = engine_with_floors(2);
    let mut accepted = 0;
    for i in -4..=4 {
        for j in -4..=4 {
            if engine
                .place_object(FurnitureKind::Cube, Vec3::new(i as f32, 0.0, j as f32), 0)
                .is_ok()
            {
                accepted += 1;
            }
            engine.update(0.6);
        }
    }
    results.push(TestResult {
        name: "placement_capacity".into(),
        passed: accepted == 50 && engine.objects_on_floor(0) == 50,
        detail: format!("{} of 81 accepted on one floor", accepted),
    });

    let other_floor = engine.place_object(FurnitureKind::Cube, Vec3::new(0.0, 0.0, 0.0), 1);
    results.push(TestResult {
        name: "placement_capacity_per_floor".into(),
        passed: other_floor.is_ok(),
        detail: "second floor has its own capacity".into(),
    });

    engine.update(0.6);
    let close = engine.place_object(FurnitureKind::Cube, Vec3::new(0.3, 0.0, 0.0), 1);
    results.push(TestResult {
        name: "placement_min_distance".into(),
        passed: matches!(close, Err(PlacementRejection::TooClose { .. })),
        detail: format!("{:?}", close.err().map(|r| r.reason())),
    });

    engine.update(0.6);
    let edge = engine.place_object(FurnitureKind::Cube, Vec3::new(8.0, 0.0, 0.0), 1);
    engine.update(0.6);
    let beyond = engine.place_object(FurnitureKind::Cube, Vec3::new(8.01, 0.0, 0.0), 1);
    results.push(TestResult {
        name: "placement_bounds_inclusive".into(),
        passed: edge.is_ok() && matches!(beyond, Err(PlacementRejection::OutOfBounds { .. })),
        detail: "distance 8.0 accepted, 8.01 rejected".into(),
    });

    engine.update(0.6);
    engine.set_layout_locked(true);
    let locked = engine.place_object(FurnitureKind::Cube, Vec3::new(-6.0, 0.0, 0.0), 1);
    results.push(TestResult {
        name: "placement_lock".into(),
        passed: locked == Err(PlacementRejection::LayoutLocked),
        detail: "locked layout refuses placement".into(),
    });

    results
}

// ── 4. Settling ─────────────────────────────────────────────────────────

fn validate_settling(verbose: bool) -> Vec<TestResult> {
    println!("--- Settling ---");
    let mut results = Vec::new();

    let mut engine = engine_with_floors(5);
    let mut ids = Vec::new();
    for floor in 0..5u32 {
        for (i, kind) in FurnitureKind::ALL.iter().enumerate() {
            let x = -6.0 + 2.0 * i as f32;
            if let Ok(id) = engine.place_object(*kind, Vec3::new(x, 0.0, floor as f32 - 2.0), floor) {
                ids.push(id);
            }
            engine.update(0.6);
        }
    }

    let mut ticks = 0;
    while ticks < 600 && ids.iter().any(|id| engine.furniture(*id).is_some_and(|s| s.falling)) {
        engine.update(DT);
        ticks += 1;
    }

    let off_rest = ids
        .iter()
        .filter_map(|id| engine.furniture(*id))
        .filter(|s| {
            let floor = &engine.floors().floors[s.locked_floor as usize];
            s.falling || s.position.y != floor.rest_height(s.bounding_height)
        })
        .count();
    results.push(TestResult {
        name: "settle_all_land".into(),
        passed: ids.len() == 35 && off_rest == 0,
        detail: format!("{} objects, {} off rest height after {} ticks", ids.len(), off_rest, ticks),
    });

    // Nothing moves once everything has landed
    let snapshot: Vec<_> = ids.iter().filter_map(|id| engine.furniture(*id)).collect();
    for _ in 0..60 {
        engine.update(DT);
    }
    let drifted = snapshot
        .iter()
        .filter(|s| engine.furniture(s.id).map(|n| n.position) != Some(s.position))
        .count();
    results.push(TestResult {
        name: "settle_at_rest".into(),
        passed: drifted == 0,
        detail: format!("{} objects drifted at rest", drifted),
    });

    if verbose {
        println!("  landed in {} ticks", ticks);
    }
    results
}

// ── 5. Drag Stress ──────────────────────────────────────────────────────

fn validate_drag_stress(verbose: bool) -> Vec<TestResult> {
    println!("--- Drag Stress ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(7);

    let mut engine = engine_with_floors(3);
    let mut ids = Vec::new();
    while ids.len() < 60 {
        let floor = rng.gen_range(0..3u32);
        let point = Vec3::new(rng.gen_range(-7.0..7.0), 0.0, rng.gen_range(-7.0..7.0));
        if let Ok(id) = engine.place_object(FurnitureKind::Chair, point, floor) {
            ids.push(id);
        }
        engine.update(0.6);
    }

    let mut drags = 0;
    let mut reverted = 0;
    let mut worst_overshoot: f32 = 0.0;
    let mut worst_shortfall: f32 = 0.0;
    for _ in 0..400 {
        let id = ids[rng.gen_range(0..ids.len())];
        if engine.begin_drag(id, (0.0, 0.0)).is_err() {
            engine.update(0.2);
            continue;
        }
        let target = Vec3::new(rng.gen_range(-12.0..12.0), 0.0, rng.gen_range(-12.0..12.0));
        let _ = engine.drag_to(target);
        if let Ok(release) = engine.end_drag() {
            drags += 1;
            if release.reverted {
                reverted += 1;
            }
        }
        engine.update(0.2);

        let (overshoot, shortfall) = layout_violations(&engine);
        worst_overshoot = worst_overshoot.max(overshoot);
        worst_shortfall = worst_shortfall.max(shortfall);
    }

    results.push(TestResult {
        name: "drag_bounds".into(),
        passed: worst_overshoot <= 1e-3,
        detail: format!("{} drops, worst overshoot {:.5}", drags, worst_overshoot),
    });
    results.push(TestResult {
        name: "drag_separation".into(),
        passed: worst_shortfall <= 1e-3,
        detail: format!(
            "{} drops ({} reverted), worst shortfall {:.5}",
            drags, reverted, worst_shortfall
        ),
    });
    results.push(TestResult {
        name: "drag_keeps_objects".into(),
        passed: engine.object_count() == ids.len(),
        detail: format!("{} objects after stress", engine.object_count()),
    });

    if verbose {
        println!("  {} drops, {} reverted", drags, reverted);
    }
    results
}

// ── 6. Re-anchor ────────────────────────────────────────────────────────

fn validate_reanchor(_verbose: bool) -> Vec<TestResult> {
    println!("--- Re-anchor ---");
    let mut results = Vec::new();

    let mut engine = engine_with_floors(3);
    let Ok(id) = engine.place_object(FurnitureKind::Table, Vec3::new(0.0, 0.0, 0.0), 2) else {
        results.push(TestResult {
            name: "reanchor_setup".into(),
            passed: false,
            detail: "placement refused".into(),
        });
        return results;
    };
    for _ in 0..120 {
        engine.update(DT);
    }
    let start = engine.furniture(id).map(|s| s.position.y).unwrap_or_default();

    engine.select_floor(2);
    let target = engine.floors().floors[2].rest_height(FurnitureKind::Table.bounding_height());
    let budget = ((target - start).abs() / 0.05).ceil() as usize;

    let mut ticks = 0;
    let mut monotonic = true;
    let mut last = start;
    while ticks < budget + 10 {
        let y = engine.furniture(id).map(|s| s.position.y).unwrap_or_default();
        if y == target {
            break;
        }
        engine.update(DT);
        ticks += 1;
        let next = engine.furniture(id).map(|s| s.position.y).unwrap_or_default();
        monotonic &= next >= last;
        last = next;
    }
    results.push(TestResult {
        name: "reanchor_within_budget".into(),
        passed: ticks <= budget && last == target,
        detail: format!("{} ticks for a budget of {}", ticks, budget),
    });
    results.push(TestResult {
        name: "reanchor_monotonic".into(),
        passed: monotonic,
        detail: "height never reversed while following the floor".into(),
    });

    engine.rebuild_floors(1);
    let fallback = engine.furniture(id).map(|s| s.locked_floor);
    results.push(TestResult {
        name: "reanchor_missing_floor".into(),
        passed: fallback == Some(0),
        detail: format!("object now on floor {:?}", fallback),
    });

    results
}

// ── 7. System Layout ────────────────────────────────────────────────────

fn validate_system_layout(_verbose: bool) -> Vec<TestResult> {
    println!("--- System Layout ---");
    let mut results = Vec::new();

    let (radius, height) = (10.0, 15.0);
    let placements = auto_layout(&SystemKind::ALL, radius, height, 42);
    let off_ring = placements
        .iter()
        .filter(|p| (plan_point(p.position).distance(&PlanPoint::new(0.0, 0.0)) - radius * 0.8).abs() > 1e-3)
        .count();
    let off_band = placements
        .iter()
        .filter(|p| p.position.y.abs() > height * 0.2 + 1e-5)
        .count();
    results.push(TestResult {
        name: "systems_on_ring".into(),
        passed: placements.len() == SystemKind::ALL.len() && off_ring == 0 && off_band == 0,
        detail: format!(
            "{} systems, {} off ring, {} outside vertical band",
            placements.len(),
            off_ring,
            off_band
        ),
    });

    results.push(TestResult {
        name: "systems_seeded".into(),
        passed: placements == auto_layout(&SystemKind::ALL, radius, height, 42),
        detail: "same seed, same layout".into(),
    });

    results
}
