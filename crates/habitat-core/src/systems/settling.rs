//! Settling system - vertical motion of furniture onto its locked floor.
//!
//! Per object, by state:
//! - **Falling**: integrate gravity; land exactly on the rest height.
//! - **Anchored**: step toward the rest height of the floor's *current*
//!   elevation so objects follow a floor raised for focus.
//! - **Stable**: hold still unless the floor moved past the refresh
//!   threshold, then snap and restart the stability window.
//! - **Dragged**: untouched.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use habitat_logic::layout::FloorPlan;

use crate::components::*;
use crate::systems::stability::StabilityScheduler;

/// Integrator and re-stick tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlingParams {
    pub gravity: f32,
    /// Largest step the integrator takes, seconds.
    pub max_dt: f32,
    /// Largest per-tick re-stick move.
    pub restick_step: f32,
    /// Offsets at or below this are left alone.
    pub restick_epsilon: f32,
    /// Remaining offsets within one step plus this snap to the target.
    pub snap_epsilon: f32,
    /// Height above the rest position at which new objects appear.
    pub spawn_lift: f32,
    /// Seconds a released object stays stable.
    pub stable_duration: f64,
    /// Floor movement that re-stabilizes a stable object.
    pub stable_refresh_threshold: f32,
}

impl Default for SettlingParams {
    fn default() -> Self {
        Self {
            gravity: -9.8,
            max_dt: 1.0 / 30.0,
            restick_step: 0.05,
            restick_epsilon: 0.001,
            snap_epsilon: 0.002,
            spawn_lift: 2.0,
            stable_duration: 2.0,
            stable_refresh_threshold: 0.1,
        }
    }
}

/// What one settling pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettleReport {
    pub landed: Vec<FurnitureId>,
    pub restuck: usize,
    pub restabilized: Vec<FurnitureId>,
}

/// One integrator step. Returns the new height and velocity, or `None` for
/// the velocity once the object has landed.
pub fn fall_step(y: f32, velocity: f32, target: f32, gravity: f32, dt: f32) -> (f32, Option<f32>) {
    let velocity = velocity + gravity * dt;
    let y = y + velocity * dt;
    if y <= target {
        (target, None)
    } else {
        (y, Some(velocity))
    }
}

/// One re-stick step toward `target`, or `None` when already close enough.
pub fn restick_step(y: f32, target: f32, params: &SettlingParams) -> Option<f32> {
    let dy = target - y;
    if dy.abs() <= params.restick_epsilon {
        return None;
    }
    if dy.abs() <= params.restick_step + params.snap_epsilon {
        Some(target)
    } else {
        Some(y + params.restick_step * dy.signum())
    }
}

enum Update {
    Fall { entity: Entity, y: f32, velocity: Option<f32> },
    Restick { entity: Entity, y: f32 },
    Restabilize { entity: Entity, id: FurnitureId, y: f32, anchor: f32 },
}

/// Advance every object by `dt` seconds (clamped to `params.max_dt`).
pub fn settling_system(
    world: &mut World,
    floors: &FloorPlan,
    params: &SettlingParams,
    scheduler: &mut StabilityScheduler,
    now: f64,
    dt: f32,
) -> SettleReport {
    let dt = dt.clamp(0.0, params.max_dt);
    let mut updates: Vec<Update> = Vec::with_capacity(64);

    for (entity, (furniture, transform, falling, stable, dragged)) in world
        .query::<(&Furniture, &Transform, Option<&Falling>, Option<&Stable>, Option<&Dragged>)>()
        .iter()
    {
        if dragged.is_some() {
            continue;
        }
        let Some(floor) = floors.floor(furniture.locked_floor) else {
            continue;
        };
        let target = floor.rest_height(furniture.bounding_height);
        let y = transform.position.y;

        if let Some(falling) = falling {
            let (y, velocity) = fall_step(y, falling.velocity, target, params.gravity, dt);
            updates.push(Update::Fall { entity, y, velocity });
        } else if let Some(stable) = stable {
            if (floor.elevation_current - stable.anchor_elevation).abs() > params.stable_refresh_threshold {
                updates.push(Update::Restabilize {
                    entity,
                    id: furniture.id,
                    y: target,
                    anchor: floor.elevation_current,
                });
            }
        } else if let Some(y) = restick_step(y, target, params) {
            updates.push(Update::Restick { entity, y });
        }
    }

    let mut report = SettleReport::default();
    for update in updates {
        match update {
            Update::Fall { entity, y, velocity } => {
                set_height(world, entity, y);
                match velocity {
                    Some(velocity) => {
                        if let Ok(mut falling) = world.get::<&mut Falling>(entity) {
                            falling.velocity = velocity;
                        }
                    }
                    None => {
                        let _ = world.remove_one::<Falling>(entity);
                        if let Ok(furniture) = world.get::<&Furniture>(entity) {
                            log::debug!("{} settled at y={:.3}", furniture.id, y);
                            report.landed.push(furniture.id);
                        }
                    }
                }
            }
            Update::Restick { entity, y } => {
                set_height(world, entity, y);
                report.restuck += 1;
            }
            Update::Restabilize { entity, id, y, anchor } => {
                set_height(world, entity, y);
                let token = scheduler.schedule(id, now, params.stable_duration);
                let _ = world.insert_one(
                    entity,
                    Stable {
                        anchor_elevation: anchor,
                        token,
                    },
                );
                log::debug!("{} re-stabilized on moved floor", id);
                report.restabilized.push(id);
            }
        }
    }
    report
}

fn set_height(world: &mut World, entity: Entity, y: f32) {
    if let Ok(mut transform) = world.get::<&mut Transform>(entity) {
        transform.position.y = y;
    }
}
