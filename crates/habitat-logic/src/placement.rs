//! Placement validation and drag-release correction.
//!
//! Validation is a pure check over a snapshot of the floor: the caller
//! gathers the lock state, clock, floor existence and occupants into a
//! [`PlacementContext`] and gets back the first rule that fails.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. layout lock
//! 2. placement cooldown
//! 3. floor exists
//! 4. within `bounds_fraction × radius` of the centre
//! 5. floor below capacity
//! 6. at least `min_object_distance` from every occupant (XZ plane)

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp_to_disc, PlanPoint};

/// Placement and drag tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRules {
    /// Seconds between accepted placements.
    pub placement_cooldown: f64,
    /// Seconds between drag starts.
    pub drag_cooldown: f64,
    pub max_objects_per_floor: usize,
    /// Minimum horizontal separation between objects on one floor.
    pub min_object_distance: f32,
    /// Allowed distance from centre as a fraction of the habitat radius.
    pub bounds_fraction: f32,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            placement_cooldown: 0.5,
            drag_cooldown: 0.1,
            max_objects_per_floor: 50,
            min_object_distance: 0.5,
            bounds_fraction: 0.8,
        }
    }
}

impl PlacementRules {
    pub fn bounds_limit(&self, radius: f32) -> f32 {
        radius * self.bounds_fraction
    }
}

/// Slack used when re-checking separation after a push, so a neighbour
/// pushed to exactly the minimum distance is not counted as an offender.
pub const SEPARATION_TOLERANCE: f32 = 1e-4;

/// Push/clamp passes before release correction gives up.
const MAX_CORRECTION_PASSES: usize = 8;

/// An object already on the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupant {
    pub id: u64,
    pub position: PlanPoint,
}

/// Why a placement was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementRejection {
    /// Raised by the engine before validation; a drag owns the workspace.
    DragInProgress,
    LayoutLocked,
    Cooldown { remaining: f64 },
    MissingFloor(u32),
    OutOfBounds { distance: f32, limit: f32 },
    FloorFull { count: usize, capacity: usize },
    TooClose { neighbor: u64, distance: f32, minimum: f32 },
}

impl PlacementRejection {
    /// Stable machine-readable code.
    pub fn reason(&self) -> &'static str {
        match self {
            PlacementRejection::DragInProgress => "drag_in_progress",
            PlacementRejection::LayoutLocked => "layout_locked",
            PlacementRejection::Cooldown { .. } => "cooldown",
            PlacementRejection::MissingFloor(_) => "missing_floor",
            PlacementRejection::OutOfBounds { .. } => "out_of_bounds",
            PlacementRejection::FloorFull { .. } => "floor_full",
            PlacementRejection::TooClose { .. } => "too_close",
        }
    }

    /// Short user-facing notice.
    pub fn message(&self) -> String {
        match self {
            PlacementRejection::DragInProgress => "Cannot place objects while dragging".to_string(),
            PlacementRejection::LayoutLocked => "Layout is locked. Unlock to edit.".to_string(),
            PlacementRejection::Cooldown { .. } => "Please wait before placing another object".to_string(),
            PlacementRejection::MissingFloor(i) => format!("Floor {} does not exist", i + 1),
            PlacementRejection::OutOfBounds { .. } => "Object must be placed within habitat bounds".to_string(),
            PlacementRejection::FloorFull { capacity, .. } => {
                format!("Floor is full (max {} objects)", capacity)
            }
            PlacementRejection::TooClose { .. } => "Too close to another object".to_string(),
        }
    }
}

impl std::fmt::Display for PlacementRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementRejection::Cooldown { remaining } => {
                write!(f, "{} ({:.2}s remaining)", self.reason(), remaining)
            }
            PlacementRejection::OutOfBounds { distance, limit } => {
                write!(f, "{} ({:.2} > {:.2})", self.reason(), distance, limit)
            }
            PlacementRejection::FloorFull { count, capacity } => {
                write!(f, "{} ({}/{})", self.reason(), count, capacity)
            }
            PlacementRejection::TooClose {
                neighbor,
                distance,
                minimum,
            } => write!(
                f,
                "{} (furniture_{} at {:.2} < {:.2})",
                self.reason(),
                neighbor,
                distance,
                minimum
            ),
            _ => f.write_str(self.reason()),
        }
    }
}

/// Snapshot of everything validation looks at.
#[derive(Debug, Clone)]
pub struct PlacementContext<'a> {
    pub layout_locked: bool,
    /// Session clock, seconds.
    pub now: f64,
    pub last_placement_at: Option<f64>,
    pub floor_exists: bool,
    pub radius: f32,
    /// Objects currently locked to the target floor.
    pub occupants: &'a [Occupant],
}

/// Decide whether `candidate` may be placed on `floor_index`.
pub fn validate(
    candidate: PlanPoint,
    floor_index: u32,
    ctx: &PlacementContext<'_>,
    rules: &PlacementRules,
) -> Result<(), PlacementRejection> {
    if ctx.layout_locked {
        return Err(PlacementRejection::LayoutLocked);
    }

    if let Some(last) = ctx.last_placement_at {
        let elapsed = ctx.now - last;
        if elapsed < rules.placement_cooldown {
            return Err(PlacementRejection::Cooldown {
                remaining: rules.placement_cooldown - elapsed,
            });
        }
    }

    if !ctx.floor_exists {
        return Err(PlacementRejection::MissingFloor(floor_index));
    }

    let distance = (candidate.x * candidate.x + candidate.z * candidate.z).sqrt();
    let limit = rules.bounds_limit(ctx.radius);
    // NaN compares false against the limit, so test finiteness explicitly.
    if !distance.is_finite() || distance > limit {
        return Err(PlacementRejection::OutOfBounds { distance, limit });
    }

    if ctx.occupants.len() >= rules.max_objects_per_floor {
        return Err(PlacementRejection::FloorFull {
            count: ctx.occupants.len(),
            capacity: rules.max_objects_per_floor,
        });
    }

    if let Some((neighbor, distance)) = nearest(candidate, ctx.occupants) {
        if distance < rules.min_object_distance {
            return Err(PlacementRejection::TooClose {
                neighbor,
                distance,
                minimum: rules.min_object_distance,
            });
        }
    }

    Ok(())
}

/// Closest occupant and its horizontal distance.
pub fn nearest(point: PlanPoint, occupants: &[Occupant]) -> Option<(u64, f32)> {
    occupants
        .iter()
        .map(|o| (o.id, point.distance(&o.position)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Closest occupant closer than the minimum separation.
fn nearest_offender(point: PlanPoint, occupants: &[Occupant], minimum: f32) -> Option<Occupant> {
    occupants
        .iter()
        .filter(|o| point.distance(&o.position) < minimum - SEPARATION_TOLERANCE)
        .min_by(|a, b| {
            point
                .distance(&a.position)
                .total_cmp(&point.distance(&b.position))
        })
        .copied()
}

fn satisfies(point: PlanPoint, occupants: &[Occupant], limit: f32, minimum: f32) -> bool {
    let within = (point.x * point.x + point.z * point.z).sqrt() <= limit + SEPARATION_TOLERANCE;
    within && nearest_offender(point, occupants, minimum).is_none()
}

/// Where a released object ends up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseOutcome {
    pub position: PlanPoint,
    pub clamped: bool,
    /// Last neighbour the object was pushed away from.
    pub pushed_from: Option<u64>,
    pub snapped: bool,
    /// False if bounds and separation could not both be satisfied; the
    /// caller should fall back to the pre-drag position.
    pub resolved: bool,
}

/// Correct a drag-release position.
///
/// Clamps into the bounds disc, then pushes the object directly away from
/// the nearest neighbour that is too close so it sits exactly
/// `min_object_distance` from it. Coincident points are pushed along +x.
/// When `snap` is set the x/z are rounded to whole units, unless the rounded
/// point would break bounds or separation.
pub fn correct_release(
    target: PlanPoint,
    others: &[Occupant],
    radius: f32,
    rules: &PlacementRules,
    snap: bool,
) -> ReleaseOutcome {
    let limit = rules.bounds_limit(radius);
    let minimum = rules.min_object_distance;

    let (x, z) = clamp_to_disc(target.x, target.z, limit);
    let mut position = PlanPoint::new(x, z);
    let clamped = position != target;
    let mut pushed_from = None;

    for _ in 0..MAX_CORRECTION_PASSES {
        let Some(offender) = nearest_offender(position, others, minimum) else {
            break;
        };
        let dx = position.x - offender.position.x;
        let dz = position.z - offender.position.z;
        let dist = (dx * dx + dz * dz).sqrt();
        let (ux, uz) = if dist > f32::EPSILON {
            (dx / dist, dz / dist)
        } else {
            (1.0, 0.0)
        };
        let pushed_x = offender.position.x + ux * minimum;
        let pushed_z = offender.position.z + uz * minimum;
        let (cx, cz) = clamp_to_disc(pushed_x, pushed_z, limit);
        position = PlanPoint::new(cx, cz);
        pushed_from = Some(offender.id);
    }

    let resolved = satisfies(position, others, limit, minimum);

    let mut snapped = false;
    if snap && resolved {
        let rounded = PlanPoint::new(position.x.round(), position.z.round());
        if satisfies(rounded, others, limit, minimum) {
            snapped = rounded != position;
            position = rounded;
        }
    }

    ReleaseOutcome {
        position,
        clamped,
        pushed_from,
        snapped,
        resolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(occupants: &[Occupant]) -> PlacementContext<'_> {
        PlacementContext {
            layout_locked: false,
            now: 10.0,
            last_placement_at: None,
            floor_exists: true,
            radius: 10.0,
            occupants,
        }
    }

    fn at(id: u64, x: f32, z: f32) -> Occupant {
        Occupant {
            id,
            position: PlanPoint::new(x, z),
        }
    }

    #[test]
    fn empty_floor_accepts() {
        let rules = PlacementRules::default();
        assert!(validate(PlanPoint::new(1.0, 1.0), 0, &ctx(&[]), &rules).is_ok());
    }

    #[test]
    fn lock_checked_before_everything() {
        let rules = PlacementRules::default();
        let mut c = ctx(&[]);
        c.layout_locked = true;
        c.floor_exists = false;
        c.last_placement_at = Some(9.99);
        assert_eq!(
            validate(PlanPoint::new(50.0, 0.0), 3, &c, &rules),
            Err(PlacementRejection::LayoutLocked)
        );
    }

    #[test]
    fn cooldown_before_floor() {
        let rules = PlacementRules::default();
        let mut c = ctx(&[]);
        c.floor_exists = false;
        c.last_placement_at = Some(9.8);
        let err = validate(PlanPoint::new(0.0, 0.0), 2, &c, &rules).unwrap_err();
        assert_eq!(err.reason(), "cooldown");
        c.last_placement_at = Some(9.5);
        assert_eq!(
            validate(PlanPoint::new(0.0, 0.0), 2, &c, &rules),
            Err(PlacementRejection::MissingFloor(2))
        );
    }

    #[test]
    fn bounds_edge_is_inclusive() {
        let rules = PlacementRules::default();
        assert!(validate(PlanPoint::new(8.0, 0.0), 0, &ctx(&[]), &rules).is_ok());
        let err = validate(PlanPoint::new(8.01, 0.0), 0, &ctx(&[]), &rules).unwrap_err();
        assert_eq!(err.reason(), "out_of_bounds");
    }

    #[test]
    fn non_finite_candidate_is_out_of_bounds() {
        let rules = PlacementRules::default();
        let others = [at(0, 0.0, 0.0)];
        for candidate in [
            PlanPoint::new(f32::NAN, 0.0),
            PlanPoint::new(0.0, f32::NAN),
            PlanPoint::new(f32::INFINITY, 1.0),
            PlanPoint::new(1.0, f32::NEG_INFINITY),
        ] {
            let err = validate(candidate, 0, &ctx(&others), &rules).unwrap_err();
            assert_eq!(err.reason(), "out_of_bounds", "{:?} accepted", candidate);
        }
    }

    #[test]
    fn capacity_before_distance() {
        let rules = PlacementRules {
            max_objects_per_floor: 2,
            ..Default::default()
        };
        let occupants = [at(1, 0.0, 0.0), at(2, 3.0, 0.0)];
        let err = validate(PlanPoint::new(0.1, 0.0), 0, &ctx(&occupants), &rules).unwrap_err();
        assert_eq!(
            err,
            PlacementRejection::FloorFull {
                count: 2,
                capacity: 2
            }
        );
    }

    #[test]
    fn too_close_reports_nearest() {
        let rules = PlacementRules::default();
        let occupants = [at(1, 0.0, 0.0), at(2, 0.5, 0.0)];
        match validate(PlanPoint::new(0.3, 0.0), 0, &ctx(&occupants), &rules) {
            Err(PlacementRejection::TooClose {
                neighbor, distance, ..
            }) => {
                assert_eq!(neighbor, 2);
                assert!((distance - 0.2).abs() < 1e-5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn separation_ignores_height_axis() {
        // Exactly at the minimum is allowed.
        let rules = PlacementRules::default();
        let occupants = [at(1, 0.0, 0.0)];
        assert!(validate(PlanPoint::new(0.0, 0.5), 0, &ctx(&occupants), &rules).is_ok());
    }

    #[test]
    fn release_clamps_far_drag() {
        let rules = PlacementRules::default();
        let out = correct_release(PlanPoint::new(100.0, 100.0), &[], 10.0, &rules, false);
        let d = (out.position.x.powi(2) + out.position.z.powi(2)).sqrt();
        assert!(out.clamped);
        assert!(out.resolved);
        assert!((d - 8.0).abs() < 1e-4);
        assert!((out.position.x - out.position.z).abs() < 1e-4);
    }

    #[test]
    fn release_pushes_exactly_minimum() {
        let rules = PlacementRules::default();
        let others = [at(7, 2.0, 0.0)];
        let out = correct_release(PlanPoint::new(2.2, 0.0), &others, 10.0, &rules, false);
        assert_eq!(out.pushed_from, Some(7));
        assert!((out.position.x - 2.5).abs() < 1e-5);
        assert!(out.position.z.abs() < 1e-6);
    }

    #[test]
    fn release_on_top_of_neighbor_pushes_along_x() {
        let rules = PlacementRules::default();
        let others = [at(3, 1.0, 1.0)];
        let out = correct_release(PlanPoint::new(1.0, 1.0), &others, 10.0, &rules, false);
        assert!((out.position.x - 1.5).abs() < 1e-5);
        assert!((out.position.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn snap_rounds_when_safe() {
        let rules = PlacementRules::default();
        let out = correct_release(PlanPoint::new(2.4, -3.6), &[], 10.0, &rules, true);
        assert!(out.snapped);
        assert_eq!(out.position, PlanPoint::new(2.0, -4.0));
    }

    #[test]
    fn snap_discarded_when_it_collides() {
        let rules = PlacementRules::default();
        let others = [at(1, 2.3, 0.0)];
        let out = correct_release(PlanPoint::new(1.7, 0.0), &others, 10.0, &rules, true);
        assert!(!out.snapped);
        assert_eq!(out.position, PlanPoint::new(1.7, 0.0));
    }

    #[test]
    fn snap_discarded_when_it_leaves_bounds() {
        let rules = PlacementRules::default();
        let out = correct_release(PlanPoint::new(5.7, 5.7), &[], 10.0, &rules, true);
        // (6, 6) is 8.49 from centre
        assert!(!out.snapped);
    }

    #[test]
    fn crowded_ring_may_be_unresolvable() {
        let rules = PlacementRules {
            min_object_distance: 3.0,
            ..Default::default()
        };
        let others: Vec<Occupant> = (0..8)
            .map(|i| {
                let a = i as f32 * std::f32::consts::TAU / 8.0;
                at(i, a.cos() * 1.0, a.sin() * 1.0)
            })
            .collect();
        let out = correct_release(PlanPoint::new(0.0, 0.0), &others, 2.0, &rules, false);
        assert!(!out.resolved);
    }
}
