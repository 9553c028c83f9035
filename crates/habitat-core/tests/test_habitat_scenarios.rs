//! End-to-end scenarios driven through `HabitatEngine` only.

use habitat_core::drag::DragError;
use habitat_core::prelude::*;
use habitat_logic::geometry::PlanPoint;
use habitat_logic::layout::{generate_floor_plan, LayoutParams};

const DT: f32 = 1.0 / 60.0;

fn engine_with_floors(count: u32) -> HabitatEngine {
    let mut engine = HabitatEngine::new();
    engine.rebuild_floors(count);
    engine
}

fn run(engine: &mut HabitatEngine, ticks: usize) {
    for _ in 0..ticks {
        engine.update(DT);
    }
}

fn plan_point(p: Vec3) -> PlanPoint {
    PlanPoint::new(p.x, p.z)
}

/// Every object is inside the bounds disc and clear of every other object
/// on its floor.
fn assert_layout_invariants(engine: &HabitatEngine) {
    let limit = engine.rules.bounds_limit(engine.config().radius);
    let min = engine.rules.min_object_distance;
    let objects: Vec<_> = engine
        .registry()
        .ids()
        .into_iter()
        .filter_map(|id| engine.furniture(id))
        .collect();

    for a in &objects {
        let from_centre = plan_point(a.position).distance(&PlanPoint::new(0.0, 0.0));
        assert!(
            from_centre <= limit + 1e-3,
            "{} outside bounds at {:.4}",
            a.id,
            from_centre
        );
        for b in &objects {
            if a.id >= b.id || a.locked_floor != b.locked_floor {
                continue;
            }
            let d = plan_point(a.position).distance(&plan_point(b.position));
            assert!(d >= min - 1e-3, "{} and {} only {:.4} apart", a.id, b.id, d);
        }
    }
}

#[test]
fn fifty_first_object_is_rejected() {
    let mut engine = engine_with_floors(1);
    let mut placed = 0;
    'grid: for i in -4..=4 {
        for j in -4..=4 {
            engine
                .place_object(FurnitureKind::Cube, Vec3::new(i as f32, 0.0, j as f32), 0)
                .unwrap();
            engine.update(0.6);
            placed += 1;
            if placed == 50 {
                break 'grid;
            }
        }
    }
    assert_eq!(engine.objects_on_floor(0), 50);

    let err = engine
        .place_object(FurnitureKind::Cube, Vec3::new(0.5, 0.0, 0.5), 0)
        .unwrap_err();
    assert!(matches!(err, PlacementRejection::FloorFull { count: 50, capacity: 50 }));
    assert_eq!(engine.object_count(), 50);
}

#[test]
fn too_close_placement_is_rejected() {
    let mut engine = engine_with_floors(1);
    let first = engine
        .place_object(FurnitureKind::Chair, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    engine.update(1.0);

    let err = engine
        .place_object(FurnitureKind::Chair, Vec3::new(0.3, 0.0, 0.0), 0)
        .unwrap_err();
    match err {
        PlacementRejection::TooClose { neighbor, distance, .. } => {
            assert_eq!(neighbor, first.0);
            assert!((distance - 0.3).abs() < 1e-5);
        }
        other => panic!("unexpected rejection {:?}", other),
    }
    assert_eq!(engine.object_count(), 1);
}

#[test]
fn same_point_on_another_floor_is_fine() {
    let mut engine = engine_with_floors(2);
    engine
        .place_object(FurnitureKind::Chair, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    engine.update(1.0);
    assert!(engine
        .place_object(FurnitureKind::Chair, Vec3::new(0.0, 0.0, 0.0), 1)
        .is_ok());
}

#[test]
fn far_drag_lands_on_bounds_edge() {
    let mut engine = engine_with_floors(1);
    let id = engine
        .place_object(FurnitureKind::Table, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    run(&mut engine, 60);

    engine.begin_drag(id, (0.0, 0.0)).unwrap();
    engine.drag_to(Vec3::new(100.0, 0.0, 100.0)).unwrap();
    let release = engine.end_drag().unwrap();
    assert!(!release.reverted);

    let p = engine.furniture(id).unwrap().position;
    let distance = plan_point(p).distance(&PlanPoint::new(0.0, 0.0));
    assert!((distance - 8.0).abs() < 1e-3, "landed at {}", distance);
    assert!(p.x > 0.0 && p.z > 0.0);
    assert_eq!(
        p.y,
        engine.floors().floors[0].rest_height(FurnitureKind::Table.bounding_height())
    );
}

#[test]
fn repeated_drops_keep_objects_apart() {
    let mut engine = engine_with_floors(2);
    let spots = [
        (0.0, 0.0),
        (2.0, 0.0),
        (-2.0, 0.0),
        (0.0, 2.0),
        (0.0, -2.0),
        (3.0, 3.0),
        (-3.0, 3.0),
        (3.0, -3.0),
        (-3.0, -3.0),
        (5.0, 0.0),
    ];
    let mut ids = Vec::new();
    for (i, (x, z)) in spots.iter().enumerate() {
        let floor = (i % 2) as u32;
        ids.push(
            engine
                .place_object(FurnitureKind::Chair, Vec3::new(*x, 0.0, *z), floor)
                .unwrap(),
        );
        engine.update(0.6);
    }
    run(&mut engine, 120);

    // Drop every object on top of its neighbour in the list.
    for round in 0..3 {
        for (i, id) in ids.iter().enumerate() {
            let target = engine.furniture(ids[(i + 1 + round) % ids.len()]).unwrap().position;
            engine.begin_drag(*id, (0.0, 0.0)).unwrap();
            engine
                .drag_to(Vec3::new(target.x + 0.1, target.y, target.z - 0.1))
                .unwrap();
            engine.end_drag().unwrap();
            engine.update(0.2);
            assert_layout_invariants(&engine);
        }
    }
    assert_eq!(engine.object_count(), ids.len());
}

#[test]
fn all_objects_settle() {
    let mut engine = engine_with_floors(3);
    let kinds = FurnitureKind::ALL;
    let mut ids = Vec::new();
    for (i, kind) in kinds.iter().enumerate() {
        let x = -6.0 + 2.0 * i as f32;
        ids.push(
            engine
                .place_object(*kind, Vec3::new(x, 0.0, 1.0), (i % 3) as u32)
                .unwrap(),
        );
        engine.update(0.6);
    }
    run(&mut engine, 300);

    for id in ids {
        let s = engine.furniture(id).unwrap();
        let floor = &engine.floors().floors[s.locked_floor as usize];
        assert!(!s.falling, "{} still falling", id);
        assert_eq!(s.position.y, floor.rest_height(s.bounding_height));
    }
}

#[test]
fn resting_object_follows_raised_floor() {
    let mut engine = engine_with_floors(3);
    let id = engine
        .place_object(FurnitureKind::Storage, Vec3::new(1.0, 0.0, 1.0), 1)
        .unwrap();
    run(&mut engine, 120);
    let before = engine.furniture(id).unwrap().position.y;

    assert!(engine.select_floor(1));
    let target = engine.floors().floors[1].rest_height(FurnitureKind::Storage.bounding_height());
    let delta = target - before;
    let budget = (delta / 0.05).ceil() as usize;

    let mut last = before;
    let mut ticks = 0;
    while engine.furniture(id).unwrap().position.y != target {
        engine.update(DT);
        ticks += 1;
        let y = engine.furniture(id).unwrap().position.y;
        assert!(y >= last, "moved backwards at tick {}", ticks);
        last = y;
        assert!(ticks <= budget, "not re-anchored within {} ticks", budget);
    }
}

#[test]
fn stable_object_jumps_with_floor() {
    let mut engine = engine_with_floors(2);
    let id = engine
        .place_object(FurnitureKind::Bed, Vec3::new(0.0, 0.0, 0.0), 1)
        .unwrap();
    engine.begin_drag(id, (0.0, 0.0)).unwrap();
    engine.end_drag().unwrap();
    assert!(engine.furniture(id).unwrap().stable);

    engine.select_floor(1);
    let report = engine.update(DT);
    assert_eq!(report.restabilized, vec![id]);
    let s = engine.furniture(id).unwrap();
    assert!(s.stable);
    assert_eq!(
        s.position.y,
        engine.floors().floors[1].rest_height(s.bounding_height)
    );
}

#[test]
fn newer_release_outlives_older_timer() {
    let mut engine = engine_with_floors(1);
    let id = engine
        .place_object(FurnitureKind::Chair, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    engine.begin_drag(id, (0.0, 0.0)).unwrap();
    engine.end_drag().unwrap();

    engine.update(1.5);
    engine.begin_drag(id, (0.0, 0.0)).unwrap();
    engine.end_drag().unwrap();

    // First release would have expired at t=2.0.
    engine.update(0.75);
    assert!(engine.furniture(id).unwrap().stable);
    engine.update(1.5);
    assert!(!engine.furniture(id).unwrap().stable);
}

#[test]
fn drag_cooldown_and_single_drag() {
    let mut engine = engine_with_floors(1);
    let a = engine
        .place_object(FurnitureKind::Chair, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    engine.update(1.0);
    let b = engine
        .place_object(FurnitureKind::Chair, Vec3::new(3.0, 0.0, 0.0), 0)
        .unwrap();

    engine.begin_drag(a, (0.0, 0.0)).unwrap();
    assert_eq!(engine.begin_drag(b, (0.0, 0.0)), Err(DragError::AlreadyDragging));
    engine.end_drag().unwrap();

    assert!(matches!(
        engine.begin_drag(b, (0.0, 0.0)),
        Err(DragError::Cooldown { .. })
    ));
    engine.update(0.2);
    assert!(engine.begin_drag(b, (0.0, 0.0)).is_ok());
}

#[test]
fn pointer_drag_follows_travel() {
    let mut engine = engine_with_floors(1);
    let id = engine
        .place_object(FurnitureKind::Cube, Vec3::new(1.0, 0.0, 1.0), 0)
        .unwrap();
    let picked = engine
        .begin_drag_at_pointer((0.2, 0.2), &|_, _| Some(id))
        .unwrap();
    assert_eq!(picked, Some(id));

    let p = engine.drag_pointer((0.3, 0.1)).unwrap();
    assert!((p.x - 2.0).abs() < 1e-4);
    assert!((p.z - 2.0).abs() < 1e-4);
    engine.end_drag().unwrap();

    engine.update(0.5);
    let miss = engine.begin_drag_at_pointer((0.0, 0.0), &|_, _| None).unwrap();
    assert_eq!(miss, None);
    assert!(!engine.session().dragging);
}

#[test]
fn pointer_placement_uses_hit_floor() {
    let mut engine = engine_with_floors(3);
    let hit = PointerHit {
        point: Vec3::new(2.0, 0.0, -1.0),
        floor_index: 2,
    };
    let id = engine
        .place_at_pointer(FurnitureKind::Bed, (0.1, -0.3), &|_, _| Some(hit))
        .unwrap()
        .unwrap();
    assert_eq!(engine.furniture(id).unwrap().locked_floor, 2);

    engine.update(1.0);
    let none = engine
        .place_at_pointer(FurnitureKind::Bed, (0.9, 0.9), &|_, _| None)
        .unwrap();
    assert_eq!(none, None);
    assert_eq!(engine.object_count(), 1);
}

#[test]
fn rebuilding_same_floors_is_idempotent() {
    let mut engine = engine_with_floors(4);
    let first = engine.floors().clone();
    engine.rebuild_floors(4);
    assert_eq!(engine.floors(), &first);
    assert_eq!(first.walls.len(), 4 * 12);
}

#[test]
fn clear_keeps_counting_ids() {
    let mut engine = engine_with_floors(1);
    let first = engine
        .place_object(FurnitureKind::Cube, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    engine.clear_workspace();
    assert_eq!(engine.object_count(), 0);
    assert!(engine.drain_events().iter().any(|e| matches!(
        e,
        EngineEvent::FurnitureRemoved { id } if *id == first
    )));

    engine.rebuild_floors(1);
    let second = engine
        .place_object(FurnitureKind::Cube, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(second.to_string(), "furniture_1");
}

#[test]
fn failed_load_keeps_layout() {
    let mut engine = engine_with_floors(2);
    let id = engine
        .place_object(FurnitureKind::Cube, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    let before = engine.config().clone();

    assert!(engine.load_layout("not json at all").is_err());
    assert!(engine
        .load_layout(r#"{"shape":"cylinder","radius":0,"height":15}"#)
        .is_err());

    assert_eq!(engine.config(), &before);
    assert!(engine.furniture(id).is_some());
    assert_eq!(engine.floors().floor_count(), 2);
}

#[test]
fn load_rebuilds_floors_for_new_shell() {
    let mut engine = engine_with_floors(3);
    let id = engine
        .place_object(FurnitureKind::Cube, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    run(&mut engine, 240);
    let old_y = engine.furniture(id).unwrap().position.y;

    engine
        .load_layout(r#"{"shape":"cylinder","radius":20,"height":30,"systems":[]}"#)
        .unwrap();

    let plan = engine.floors();
    assert_eq!(plan, &generate_floor_plan(&LayoutParams::from(engine.config())));
    assert_eq!(plan.floor_count(), 3);
    assert!((plan.footprint_width - 44.0).abs() < 1e-4);

    let object = engine.furniture(id).unwrap();
    let rest = plan.floor(0).unwrap().rest_height(object.bounding_height);
    assert!((object.position.y - rest).abs() < 1e-4);
    assert!((object.position.y - old_y).abs() > 1e-3);

    // Bounds follow the wider shell: 15 was out at radius 10, 17 is still out.
    let half_width = plan.footprint_width / 2.0;
    run(&mut engine, 60);
    let far = engine
        .place_object(FurnitureKind::Cube, Vec3::new(15.0, 0.0, 0.0), 1)
        .unwrap();
    assert!(engine.furniture(far).unwrap().position.x < half_width);
    run(&mut engine, 60);
    assert!(matches!(
        engine.place_object(FurnitureKind::Cube, Vec3::new(17.0, 0.0, 0.0), 1),
        Err(PlacementRejection::OutOfBounds { .. })
    ));
    assert_layout_invariants(&engine);
}

#[test]
fn events_mirror_scene_changes() {
    let mut engine = engine_with_floors(1);
    let events = engine.drain_events();
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::FloorsRebuilt { floor_count: 1, wall_count: 12 }]
    ));

    let id = engine
        .place_object(FurnitureKind::Sphere, Vec3::new(0.0, 0.0, 0.0), 0)
        .unwrap();
    engine.begin_drag(id, (0.0, 0.0)).unwrap();
    engine.end_drag().unwrap();
    engine.delete_object(id);

    let events = engine.drain_events();
    assert!(matches!(events[0], EngineEvent::FurnitureSpawned { floor: 0, .. }));
    assert!(matches!(
        events[1],
        EngineEvent::Notice { kind: NoticeKind::Success, .. }
    ));
    assert_eq!(events[2], EngineEvent::CameraNavigation(false));
    assert_eq!(events[3], EngineEvent::CameraNavigation(true));
    assert_eq!(events[4], EngineEvent::FurnitureRemoved { id });
    assert!(engine.drain_events().is_empty());
}
