//! Drag controller - pick-up, move and release of one object at a time.
//!
//! ```text
//!   Idle ──begin──▶ Dragging ──release──▶ Idle
//!                    │   ▲
//!                    └───┘ pointer moves
//! ```
//!
//! While dragging, the whole workspace is frozen: camera navigation is off
//! and the engine skips ambient rotation and settling. Release always
//! commits at the dragged position after correction; there is no cancel
//! back to the start.

use thiserror::Error;

use habitat_logic::constants::interaction::DRAG_SENSITIVITY;
use habitat_logic::geometry::{clamp_to_disc, PlanPoint, Vec3};
use habitat_logic::layout::FloorPlan;
use habitat_logic::placement::{correct_release, PlacementRules, ReleaseOutcome};

use crate::components::{Dragged, Falling, FurnitureId, Stable, StabilityToken, Transform};
use crate::registry::FurnitureRegistry;
use crate::session::SessionState;
use crate::systems::{SettlingParams, StabilityScheduler};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DragError {
    #[error("a drag is already in progress")]
    AlreadyDragging,
    #[error("drag cooldown active ({remaining:.2}s remaining)")]
    Cooldown { remaining: f64 },
    #[error("unknown object {0}")]
    UnknownObject(FurnitureId),
    #[error("no drag in progress")]
    NotDragging,
}

/// State captured at pick-up.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub object: FurnitureId,
    pub start_position: Vec3,
    pub start_rotation: f32,
    pub start_scale: Vec3,
    /// Normalized device coordinates at pick-up
    pub start_pointer: (f32, f32),
    pub started_at: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// Inputs for finalizing a release.
pub struct ReleaseContext<'a> {
    pub floors: &'a FloorPlan,
    pub radius: f32,
    pub rules: &'a PlacementRules,
    pub params: &'a SettlingParams,
}

/// Result of a release.
#[derive(Debug, Clone, PartialEq)]
pub struct DragRelease {
    pub object: FurnitureId,
    pub position: Vec3,
    pub correction: ReleaseOutcome,
    /// Correction could not satisfy bounds and separation; the object went
    /// back to where it was picked up.
    pub reverted: bool,
    /// The locked floor no longer existed and was reassigned to floor 0.
    pub floor_fallback: bool,
    pub duplicates_removed: usize,
    pub stability: Option<StabilityToken>,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(active) => Some(active),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Pick up `object`. Clears its stable flag and cancels any pending
    /// stability release.
    pub fn begin(
        &mut self,
        registry: &mut FurnitureRegistry,
        scheduler: &mut StabilityScheduler,
        session: &mut SessionState,
        object: FurnitureId,
        pointer: (f32, f32),
        rules: &PlacementRules,
    ) -> Result<(), DragError> {
        if self.is_dragging() {
            return Err(DragError::AlreadyDragging);
        }
        let now = session.clock;
        if let Some(last) = session.last_drag_start_at {
            let elapsed = now - last;
            if elapsed < rules.drag_cooldown {
                return Err(DragError::Cooldown {
                    remaining: rules.drag_cooldown - elapsed,
                });
            }
        }
        let entity = registry
            .entity_of(object)
            .ok_or(DragError::UnknownObject(object))?;

        let world = registry.world_mut();
        let transform = *world
            .get::<&Transform>(entity)
            .map_err(|_| DragError::UnknownObject(object))?;
        let _ = world.remove_one::<Stable>(entity);
        let _ = world.insert_one(entity, Dragged);
        scheduler.cancel(object);

        session.dragging = true;
        session.camera_navigation = false;
        session.last_drag_start_at = Some(now);

        self.state = DragState::Dragging(ActiveDrag {
            object,
            start_position: transform.position,
            start_rotation: transform.rotation_y,
            start_scale: transform.scale,
            start_pointer: pointer,
            started_at: now,
        });
        log::info!("Drag started for {}", object);
        Ok(())
    }

    /// Move by pointer travel since pick-up. X follows the pointer's x and
    /// Z its inverted y, scaled by the drag sensitivity.
    pub fn drag_pointer(
        &mut self,
        registry: &mut FurnitureRegistry,
        pointer: (f32, f32),
        radius: f32,
        rules: &PlacementRules,
    ) -> Result<Vec3, DragError> {
        let active = self.active().ok_or(DragError::NotDragging)?;
        let dx = pointer.0 - active.start_pointer.0;
        let dy = pointer.1 - active.start_pointer.1;
        let target = PlanPoint::new(
            active.start_position.x + dx * DRAG_SENSITIVITY,
            active.start_position.z - dy * DRAG_SENSITIVITY,
        );
        self.move_to(registry, target, radius, rules)
    }

    /// Move to a world-space point, e.g. from a ray hit on the drag plane.
    pub fn drag_to(
        &mut self,
        registry: &mut FurnitureRegistry,
        point: Vec3,
        radius: f32,
        rules: &PlacementRules,
    ) -> Result<Vec3, DragError> {
        self.move_to(registry, PlanPoint::new(point.x, point.z), radius, rules)
    }

    fn move_to(
        &mut self,
        registry: &mut FurnitureRegistry,
        target: PlanPoint,
        radius: f32,
        rules: &PlacementRules,
    ) -> Result<Vec3, DragError> {
        let object = self.active().ok_or(DragError::NotDragging)?.object;
        let current = registry
            .position(object)
            .ok_or(DragError::UnknownObject(object))?;
        if !(target.x.is_finite() && target.z.is_finite()) {
            log::debug!("Ignoring non-finite drag target for {}", object);
            return Ok(current);
        }
        let (x, z) = clamp_to_disc(target.x, target.z, rules.bounds_limit(radius));
        let position = Vec3::new(x, current.y, z);
        registry.set_position(object, position);
        Ok(position)
    }

    /// Drop the object: dedup, correct into bounds and away from neighbours,
    /// snap if enabled, set the exact rest height and mark it stable for
    /// `params.stable_duration`.
    pub fn release(
        &mut self,
        registry: &mut FurnitureRegistry,
        scheduler: &mut StabilityScheduler,
        session: &mut SessionState,
        ctx: &ReleaseContext<'_>,
    ) -> Result<DragRelease, DragError> {
        let active = match std::mem::take(&mut self.state) {
            DragState::Dragging(active) => active,
            DragState::Idle => return Err(DragError::NotDragging),
        };
        session.dragging = false;
        session.camera_navigation = true;

        let object = active.object;
        let duplicates_removed = registry.dedup_sweep();
        let entity = registry
            .entity_of(object)
            .ok_or(DragError::UnknownObject(object))?;
        let _ = registry.world_mut().remove_one::<Dragged>(entity);

        let mut floor_index = registry.locked_floor(object).unwrap_or(0);
        let mut floor_fallback = false;
        if ctx.floors.floor(floor_index).is_none() && ctx.floors.floor(0).is_some() {
            log::warn!(
                "{} locked to missing floor {}, reassigning to floor 0",
                object,
                floor_index
            );
            floor_index = 0;
            registry.set_locked_floor(object, 0);
            floor_fallback = true;
        }

        let current = registry
            .position(object)
            .ok_or(DragError::UnknownObject(object))?;
        let others = registry.occupants(floor_index, Some(object));
        let correction = correct_release(
            PlanPoint::new(current.x, current.z),
            &others,
            ctx.radius,
            ctx.rules,
            session.snap_enabled,
        );
        let reverted = !correction.resolved;
        let (x, z) = if reverted {
            log::warn!("{} could not be placed clear of neighbours, returning to pick-up point", object);
            (active.start_position.x, active.start_position.z)
        } else {
            (correction.position.x, correction.position.z)
        };

        let mut position = Vec3::new(x, current.y, z);
        let mut stability = None;
        if let Some(floor) = ctx.floors.floor(floor_index) {
            let bounding_height = registry
                .get(object)
                .map(|s| s.bounding_height)
                .unwrap_or_default();
            position.y = floor.rest_height(bounding_height);
            let token = scheduler.schedule(object, session.clock, ctx.params.stable_duration);
            let world = registry.world_mut();
            let _ = world.remove_one::<Falling>(entity);
            let _ = world.insert_one(
                entity,
                Stable {
                    anchor_elevation: floor.elevation_current,
                    token,
                },
            );
            stability = Some(token);
        }
        registry.set_position(object, position);

        log::info!(
            "Drag finished for {} at ({:.2}, {:.2}, {:.2})",
            object,
            position.x,
            position.y,
            position.z
        );
        Ok(DragRelease {
            object,
            position,
            correction,
            reverted,
            floor_fallback,
            duplicates_removed,
            stability,
        })
    }

    /// Drop the drag without committing, e.g. when the object was deleted
    /// or the workspace cleared. Returns the object that was being dragged.
    pub fn abort(&mut self, registry: &mut FurnitureRegistry, session: &mut SessionState) -> Option<FurnitureId> {
        let active = match std::mem::take(&mut self.state) {
            DragState::Dragging(active) => active,
            DragState::Idle => return None,
        };
        if let Some(entity) = registry.entity_of(active.object) {
            let _ = registry.world_mut().remove_one::<Dragged>(entity);
        }
        session.dragging = false;
        session.camera_navigation = true;
        Some(active.object)
    }
}
