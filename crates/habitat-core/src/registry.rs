//! Furniture registry - owns every placed object and its identity.
//!
//! Objects live as entities in a `hecs` world. Ids are handed out from a
//! counter that only ever grows, so an id is never seen twice in a session
//! even across deletes and workspace clears.

use hecs::{Entity, World};
use std::collections::HashMap;

use habitat_logic::furniture::FurnitureKind;
use habitat_logic::geometry::{PlanPoint, Vec3};
use habitat_logic::placement::Occupant;

use crate::components::*;

/// Read-only copy of one object's state.
#[derive(Debug, Clone, PartialEq)]
pub struct FurnitureSnapshot {
    pub id: FurnitureId,
    pub kind: FurnitureKind,
    pub position: Vec3,
    pub rotation_y: f32,
    pub scale: Vec3,
    pub bounding_height: f32,
    pub locked_floor: u32,
    pub created_at: f64,
    pub color: u32,
    pub falling: bool,
    pub stable: bool,
    pub dragged: bool,
}

/// Owns the furniture world.
pub struct FurnitureRegistry {
    world: World,
    next_id: u64,
    next_spawn: u64,
}

impl FurnitureRegistry {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            next_id: 0,
            next_spawn: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Create an object at `position`, falling toward `floor_index`.
    pub fn place(
        &mut self,
        kind: FurnitureKind,
        position: Vec3,
        floor_index: u32,
        created_at: f64,
        color: u32,
    ) -> FurnitureId {
        let id = FurnitureId(self.next_id);
        self.next_id += 1;
        let furniture = Furniture {
            id,
            kind,
            bounding_height: kind.bounding_height(),
            locked_floor: floor_index,
            created_at,
            spawn_order: self.next_spawn_order(),
            color,
        };
        self.world.spawn((
            furniture,
            Transform::at(position),
            Falling::default(),
            AttachmentPoints::default(),
        ));
        id
    }

    /// Clone an object under a fresh id, shifted by `offset`. The copy starts
    /// falling from the shifted position.
    pub fn duplicate(&mut self, id: FurnitureId, offset: Vec3, created_at: f64) -> Option<FurnitureId> {
        let entity = self.entity_of(id)?;
        let source = (*self.world.get::<&Furniture>(entity).ok()?).clone();
        let transform = *self.world.get::<&Transform>(entity).ok()?;

        let new_id = FurnitureId(self.next_id);
        self.next_id += 1;
        let furniture = Furniture {
            id: new_id,
            created_at,
            spawn_order: self.next_spawn_order(),
            ..source
        };
        let transform = Transform {
            position: transform.position + offset,
            ..transform
        };
        self.world.spawn((
            furniture,
            transform,
            Falling::default(),
            AttachmentPoints::default(),
        ));
        Some(new_id)
    }

    /// Remove an object together with its attachment sockets.
    pub fn remove(&mut self, id: FurnitureId) -> bool {
        match self.entity_of(id) {
            Some(entity) => self.world.despawn(entity).is_ok(),
            None => false,
        }
    }

    /// Remove every object locked to `floor_index`.
    pub fn clear_floor(&mut self, floor_index: u32) -> Vec<FurnitureId> {
        let doomed: Vec<(Entity, FurnitureId)> = self
            .world
            .query::<&Furniture>()
            .iter()
            .filter(|(_, f)| f.locked_floor == floor_index)
            .map(|(e, f)| (e, f.id))
            .collect();
        for (entity, _) in &doomed {
            let _ = self.world.despawn(*entity);
        }
        doomed.into_iter().map(|(_, id)| id).collect()
    }

    /// Drop every object. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.world.clear();
    }

    /// Remove objects whose id collides with an earlier-spawned one.
    /// Returns how many were removed.
    pub fn dedup_sweep(&mut self) -> usize {
        let mut earliest: HashMap<FurnitureId, (Entity, u64)> = HashMap::new();
        let mut doomed = Vec::new();

        for (entity, furniture) in self.world.query::<&Furniture>().iter() {
            match earliest.get_mut(&furniture.id) {
                None => {
                    earliest.insert(furniture.id, (entity, furniture.spawn_order));
                }
                Some(kept) if furniture.spawn_order < kept.1 => {
                    doomed.push((kept.0, furniture.id));
                    *kept = (entity, furniture.spawn_order);
                }
                Some(_) => doomed.push((entity, furniture.id)),
            }
        }

        for (entity, id) in &doomed {
            log::warn!("Removing duplicate {} ({:?})", id, entity);
            let _ = self.world.despawn(*entity);
        }
        doomed.len()
    }

    pub fn entity_of(&self, id: FurnitureId) -> Option<Entity> {
        self.world
            .query::<&Furniture>()
            .iter()
            .find(|(_, f)| f.id == id)
            .map(|(entity, _)| entity)
    }

    pub fn contains(&self, id: FurnitureId) -> bool {
        self.entity_of(id).is_some()
    }

    pub fn get(&self, id: FurnitureId) -> Option<FurnitureSnapshot> {
        let entity = self.entity_of(id)?;
        let furniture = self.world.get::<&Furniture>(entity).ok()?;
        let transform = self.world.get::<&Transform>(entity).ok()?;
        Some(FurnitureSnapshot {
            id: furniture.id,
            kind: furniture.kind,
            position: transform.position,
            rotation_y: transform.rotation_y,
            scale: transform.scale,
            bounding_height: furniture.bounding_height,
            locked_floor: furniture.locked_floor,
            created_at: furniture.created_at,
            color: furniture.color,
            falling: self.world.get::<&Falling>(entity).is_ok(),
            stable: self.world.get::<&Stable>(entity).is_ok(),
            dragged: self.world.get::<&Dragged>(entity).is_ok(),
        })
    }

    pub fn position(&self, id: FurnitureId) -> Option<Vec3> {
        let entity = self.entity_of(id)?;
        let transform = self.world.get::<&Transform>(entity).ok()?;
        Some(transform.position)
    }

    pub fn set_position(&mut self, id: FurnitureId, position: Vec3) -> bool {
        let Some(entity) = self.entity_of(id) else {
            return false;
        };
        match self.world.get::<&mut Transform>(entity) {
            Ok(mut transform) => {
                transform.position = position;
                true
            }
            Err(_) => false,
        }
    }

    /// Add `delta` radians to the object's yaw.
    pub fn rotate(&mut self, id: FurnitureId, delta: f32) -> bool {
        let Some(entity) = self.entity_of(id) else {
            return false;
        };
        match self.world.get::<&mut Transform>(entity) {
            Ok(mut transform) => {
                transform.rotation_y += delta;
                true
            }
            Err(_) => false,
        }
    }

    /// Zero the yaw and restore unit scale. Position is left to the caller.
    pub fn reset_orientation(&mut self, id: FurnitureId) -> bool {
        let Some(entity) = self.entity_of(id) else {
            return false;
        };
        match self.world.get::<&mut Transform>(entity) {
            Ok(mut transform) => {
                transform.rotation_y = 0.0;
                transform.scale = Vec3::ONE;
                true
            }
            Err(_) => false,
        }
    }

    pub fn locked_floor(&self, id: FurnitureId) -> Option<u32> {
        let entity = self.entity_of(id)?;
        let furniture = self.world.get::<&Furniture>(entity).ok()?;
        Some(furniture.locked_floor)
    }

    pub fn set_locked_floor(&mut self, id: FurnitureId, floor_index: u32) -> bool {
        let Some(entity) = self.entity_of(id) else {
            return false;
        };
        match self.world.get::<&mut Furniture>(entity) {
            Ok(mut furniture) => {
                furniture.locked_floor = floor_index;
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_color(&mut self, id: FurnitureId, color: u32) -> bool {
        let Some(entity) = self.entity_of(id) else {
            return false;
        };
        match self.world.get::<&mut Furniture>(entity) {
            Ok(mut furniture) => {
                furniture.color = color;
                true
            }
            Err(_) => false,
        }
    }

    /// Ids of objects locked to a floor, oldest first.
    pub fn objects_on(&self, floor_index: u32) -> Vec<FurnitureId> {
        let mut found: Vec<(u64, FurnitureId)> = self
            .world
            .query::<&Furniture>()
            .iter()
            .filter(|(_, f)| f.locked_floor == floor_index)
            .map(|(_, f)| (f.spawn_order, f.id))
            .collect();
        found.sort_by_key(|(order, _)| *order);
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Every id, oldest first.
    pub fn ids(&self) -> Vec<FurnitureId> {
        let mut found: Vec<(u64, FurnitureId)> = self
            .world
            .query::<&Furniture>()
            .iter()
            .map(|(_, f)| (f.spawn_order, f.id))
            .collect();
        found.sort_by_key(|(order, _)| *order);
        found.into_iter().map(|(_, id)| id).collect()
    }

    pub fn count_on(&self, floor_index: u32) -> usize {
        self.world
            .query::<&Furniture>()
            .iter()
            .filter(|(_, f)| f.locked_floor == floor_index)
            .count()
    }

    pub fn len(&self) -> usize {
        self.world.query::<&Furniture>().iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Horizontal positions of objects on a floor, for placement checks.
    pub fn occupants(&self, floor_index: u32, exclude: Option<FurnitureId>) -> Vec<Occupant> {
        self.world
            .query::<(&Furniture, &Transform)>()
            .iter()
            .filter(|(_, (f, _))| f.locked_floor == floor_index && Some(f.id) != exclude)
            .map(|(_, (f, t))| Occupant {
                id: f.id.0,
                position: PlanPoint::new(t.position.x, t.position.z),
            })
            .collect()
    }

    fn next_spawn_order(&mut self) -> u64 {
        let order = self.next_spawn;
        self.next_spawn += 1;
        order
    }

    /// Insert an object with a caller-chosen identity.
    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, id: FurnitureId, floor_index: u32, position: Vec3) -> Entity {
        let furniture = Furniture {
            id,
            kind: FurnitureKind::Cube,
            bounding_height: FurnitureKind::Cube.bounding_height(),
            locked_floor: floor_index,
            created_at: 0.0,
            spawn_order: self.next_spawn_order(),
            color: 0,
        };
        self.world.spawn((furniture, Transform::at(position), AttachmentPoints::default()))
    }
}

impl Default for FurnitureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
