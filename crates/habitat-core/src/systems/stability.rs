//! Deferred stability release.
//!
//! A drag release marks its object [`Stable`] for a fixed window. Rather
//! than a timer callback, the release is a scheduled entry keyed by a
//! [`StabilityToken`]; scheduling again for the same object supersedes the
//! pending entry, so only the newest release ever fires.

use hecs::World;
use serde::{Deserialize, Serialize};

use crate::components::{Furniture, FurnitureId, Stable, StabilityToken};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduledRelease {
    object: FurnitureId,
    token: StabilityToken,
    due_at: f64,
}

/// Pending stability releases (singleton, stored in engine)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StabilityScheduler {
    pending: Vec<ScheduledRelease>,
    next_token: u64,
}

impl StabilityScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a release `delay` seconds after `now`, replacing any release
    /// already pending for the object.
    pub fn schedule(&mut self, object: FurnitureId, now: f64, delay: f64) -> StabilityToken {
        self.cancel(object);
        let token = StabilityToken(self.next_token);
        self.next_token += 1;
        self.pending.push(ScheduledRelease {
            object,
            token,
            due_at: now + delay,
        });
        token
    }

    pub fn cancel(&mut self, object: FurnitureId) {
        self.pending.retain(|r| r.object != object);
    }

    /// Take every release due at `now`.
    pub fn take_due(&mut self, now: f64) -> Vec<(FurnitureId, StabilityToken)> {
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|r| r.due_at <= now);
        self.pending = waiting;
        due.into_iter().map(|r| (r.object, r.token)).collect()
    }

    pub fn due_at(&self, object: FurnitureId) -> Option<f64> {
        self.pending
            .iter()
            .find(|r| r.object == object)
            .map(|r| r.due_at)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending release. Tokens keep counting.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Remove `Stable` from objects whose release is due. A release whose token
/// no longer matches the object's current `Stable` is stale and ignored.
pub fn stability_system(world: &mut World, scheduler: &mut StabilityScheduler, now: f64) -> Vec<FurnitureId> {
    let due = scheduler.take_due(now);
    if due.is_empty() {
        return Vec::new();
    }

    let expired: Vec<(hecs::Entity, FurnitureId)> = world
        .query::<(&Furniture, &Stable)>()
        .iter()
        .filter(|(_, (f, s))| due.iter().any(|(id, token)| *id == f.id && *token == s.token))
        .map(|(entity, (f, _))| (entity, f.id))
        .collect();

    for (entity, id) in &expired {
        let _ = world.remove_one::<Stable>(*entity);
        log::debug!("Stability released for {}", id);
    }
    expired.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use habitat_logic::furniture::FurnitureKind;
    use habitat_logic::geometry::Vec3;

    fn spawn_stable(world: &mut World, id: u64, token: StabilityToken) -> hecs::Entity {
        world.spawn((
            Furniture {
                id: FurnitureId(id),
                kind: FurnitureKind::Table,
                bounding_height: 0.84,
                locked_floor: 0,
                created_at: 0.0,
                spawn_order: id,
                color: 0,
            },
            Transform::at(Vec3::ZERO),
            Stable {
                anchor_elevation: 0.0,
                token,
            },
        ))
    }

    #[test]
    fn test_release_after_delay() {
        let mut world = World::new();
        let mut scheduler = StabilityScheduler::new();
        let token = scheduler.schedule(FurnitureId(1), 10.0, 2.0);
        let entity = spawn_stable(&mut world, 1, token);

        assert!(stability_system(&mut world, &mut scheduler, 11.9).is_empty());
        assert!(world.get::<&Stable>(entity).is_ok());

        assert_eq!(stability_system(&mut world, &mut scheduler, 12.0), vec![FurnitureId(1)]);
        assert!(world.get::<&Stable>(entity).is_err());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_reschedule_supersedes() {
        let mut world = World::new();
        let mut scheduler = StabilityScheduler::new();
        let first = scheduler.schedule(FurnitureId(1), 0.0, 2.0);
        let second = scheduler.schedule(FurnitureId(1), 1.5, 2.0);
        assert_ne!(first, second);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.due_at(FurnitureId(1)), Some(3.5));

        let entity = spawn_stable(&mut world, 1, second);
        stability_system(&mut world, &mut scheduler, 2.5);
        assert!(world.get::<&Stable>(entity).is_ok());
        stability_system(&mut world, &mut scheduler, 3.5);
        assert!(world.get::<&Stable>(entity).is_err());
    }

    #[test]
    fn test_stale_token_ignored() {
        let mut world = World::new();
        let mut scheduler = StabilityScheduler::new();
        let stale = scheduler.schedule(FurnitureId(4), 0.0, 1.0);
        let entity = spawn_stable(&mut world, 4, StabilityToken(stale.0 + 100));
        assert!(stability_system(&mut world, &mut scheduler, 5.0).is_empty());
        assert!(world.get::<&Stable>(entity).is_ok());
    }
}
