//! Attachment graph - optional links between furniture sockets.
//!
//! Links are advisory: settling and placement never look at them. The graph
//! lives outside the ECS world, alongside it in the engine, and refers to
//! objects by [`FurnitureId`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use habitat_logic::furniture::{local_to_world, AttachmentName};
use habitat_logic::geometry::Vec3;

use crate::components::{AttachmentPoints, Furniture, FurnitureId, Transform};
use crate::registry::FurnitureRegistry;

/// Visual connector handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorId(pub u64);

/// One socket on one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub owner: FurnitureId,
    pub name: AttachmentName,
}

/// A socket within search range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyPoint {
    pub point: AttachmentRef,
    pub world_position: Vec3,
    pub distance: f32,
}

/// `object` is attached to `point`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttachmentLink {
    pub object: FurnitureId,
    pub point: AttachmentRef,
    /// Object position minus socket world position at connect time
    pub offset: Vec3,
    pub connector: ConnectorId,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttachError {
    #[error("unknown object {0}")]
    UnknownObject(FurnitureId),
    #[error("{} has no {:?} socket", .0.owner, .0.name)]
    UnknownPoint(AttachmentRef),
    #[error("an object cannot attach to itself")]
    SelfAttachment,
    #[error("socket already holds {0}")]
    PointOccupied(FurnitureId),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentGraph {
    links: Vec<AttachmentLink>,
    next_connector: u64,
}

impl AttachmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// World position of a socket, following its owner's transform.
    pub fn point_world(registry: &FurnitureRegistry, point: AttachmentRef) -> Option<Vec3> {
        let entity = registry.entity_of(point.owner)?;
        let world = registry.world();
        let transform = world.get::<&Transform>(entity).ok()?;
        let points = world.get::<&AttachmentPoints>(entity).ok()?;
        let socket = points.get(point.name)?;
        Some(socket_world(&transform, socket.local_offset))
    }

    /// Sockets on other objects within `max_distance` of `object`, nearest first.
    pub fn find_nearby(registry: &FurnitureRegistry, object: FurnitureId, max_distance: f32) -> Vec<NearbyPoint> {
        let Some(origin) = registry.position(object) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for (_, (furniture, transform, points)) in registry
            .world()
            .query::<(&Furniture, &Transform, &AttachmentPoints)>()
            .iter()
        {
            if furniture.id == object {
                continue;
            }
            for socket in &points.points {
                let world_position = socket_world(transform, socket.local_offset);
                let distance = origin.distance(&world_position);
                if distance <= max_distance {
                    found.push(NearbyPoint {
                        point: AttachmentRef {
                            owner: furniture.id,
                            name: socket.name,
                        },
                        world_position,
                        distance,
                    });
                }
            }
        }
        found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        found
    }

    /// Attach `object` to `point`, keeping the object's offset from the
    /// socket's current world position. An existing link from `object` must
    /// be removed first with [`disconnect`](Self::disconnect).
    pub fn connect(
        &mut self,
        registry: &mut FurnitureRegistry,
        object: FurnitureId,
        point: AttachmentRef,
    ) -> Result<ConnectorId, AttachError> {
        if object == point.owner {
            return Err(AttachError::SelfAttachment);
        }
        let position = registry
            .position(object)
            .ok_or(AttachError::UnknownObject(object))?;
        if !registry.contains(point.owner) {
            return Err(AttachError::UnknownObject(point.owner));
        }
        let socket = Self::point_world(registry, point).ok_or(AttachError::UnknownPoint(point))?;
        if let Some(holder) = self.attached_at(point) {
            if holder != object {
                return Err(AttachError::PointOccupied(holder));
            }
        }

        let offset = position - socket;
        registry.set_position(object, socket + offset);

        let connector = ConnectorId(self.next_connector);
        self.next_connector += 1;
        self.links.push(AttachmentLink {
            object,
            point,
            offset,
            connector,
        });
        Ok(connector)
    }

    /// Remove the link from `object`, returning its connector.
    pub fn disconnect(&mut self, object: FurnitureId) -> Option<ConnectorId> {
        let index = self.links.iter().position(|l| l.object == object)?;
        Some(self.links.remove(index).connector)
    }

    /// Remove every link that touches `object` on either end.
    pub fn remove_object(&mut self, object: FurnitureId) -> Vec<ConnectorId> {
        let (gone, kept): (Vec<_>, Vec<_>) = self
            .links
            .drain(..)
            .partition(|l| l.object == object || l.point.owner == object);
        self.links = kept;
        gone.into_iter().map(|l| l.connector).collect()
    }

    pub fn attached_to(&self, object: FurnitureId) -> Option<AttachmentRef> {
        self.links.iter().find(|l| l.object == object).map(|l| l.point)
    }

    pub fn attached_at(&self, point: AttachmentRef) -> Option<FurnitureId> {
        self.links.iter().find(|l| l.point == point).map(|l| l.object)
    }

    pub fn links(&self) -> &[AttachmentLink] {
        &self.links
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }
}

fn socket_world(transform: &Transform, local_offset: Vec3) -> Vec3 {
    let scaled = Vec3::new(
        local_offset.x * transform.scale.x,
        local_offset.y * transform.scale.y,
        local_offset.z * transform.scale.z,
    );
    local_to_world(transform.position, transform.rotation_y, scaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use habitat_logic::furniture::FurnitureKind;

    fn two_objects() -> (FurnitureRegistry, FurnitureId, FurnitureId) {
        let mut registry = FurnitureRegistry::new();
        let a = registry.place(FurnitureKind::Cube, Vec3::new(0.0, 1.0, 0.0), 0, 0.0, 0);
        let b = registry.place(FurnitureKind::Cube, Vec3::new(2.5, 1.0, 0.0), 0, 0.0, 0);
        (registry, a, b)
    }

    #[test]
    fn test_find_nearby_sorted() {
        let (registry, a, b) = two_objects();
        let nearby = AttachmentGraph::find_nearby(&registry, a, 2.0);
        assert!(!nearby.is_empty());
        assert_eq!(nearby[0].point, AttachmentRef { owner: b, name: AttachmentName::Left });
        assert!((nearby[0].distance - 1.5).abs() < 1e-5);
        assert!(nearby.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(nearby.iter().all(|p| p.point.owner == b && p.distance <= 2.0));
    }

    #[test]
    fn test_connect_and_disconnect() {
        let (mut registry, a, b) = two_objects();
        let mut graph = AttachmentGraph::new();
        let point = AttachmentRef { owner: b, name: AttachmentName::Left };
        let before = registry.position(a).unwrap();

        let connector = graph.connect(&mut registry, a, point).unwrap();
        let after = registry.position(a).unwrap();
        assert!(before.distance(&after) < 1e-5);
        assert_eq!(graph.attached_to(a), Some(point));
        assert_eq!(graph.attached_at(point), Some(a));

        assert_eq!(graph.disconnect(a), Some(connector));
        assert_eq!(graph.attached_to(a), None);
        assert_eq!(graph.disconnect(a), None);
    }

    #[test]
    fn test_connect_rejections() {
        let (mut registry, a, b) = two_objects();
        let c = registry.place(FurnitureKind::Cube, Vec3::new(-2.0, 1.0, 0.0), 0, 0.0, 0);
        let mut graph = AttachmentGraph::new();
        let point = AttachmentRef { owner: b, name: AttachmentName::Top };

        assert_eq!(
            graph.connect(&mut registry, b, point),
            Err(AttachError::SelfAttachment)
        );
        assert_eq!(
            graph.connect(&mut registry, FurnitureId(42), point),
            Err(AttachError::UnknownObject(FurnitureId(42)))
        );
        graph.connect(&mut registry, a, point).unwrap();
        assert_eq!(
            graph.connect(&mut registry, c, point),
            Err(AttachError::PointOccupied(a))
        );
    }

    #[test]
    fn test_remove_object_clears_both_ends() {
        let (mut registry, a, b) = two_objects();
        let c = registry.place(FurnitureKind::Cube, Vec3::new(0.0, 1.0, 2.5), 0, 0.0, 0);
        let mut graph = AttachmentGraph::new();
        graph
            .connect(&mut registry, a, AttachmentRef { owner: b, name: AttachmentName::Left })
            .unwrap();
        graph
            .connect(&mut registry, b, AttachmentRef { owner: c, name: AttachmentName::Back })
            .unwrap();
        graph
            .connect(&mut registry, c, AttachmentRef { owner: a, name: AttachmentName::Front })
            .unwrap();

        assert_eq!(graph.remove_object(b).len(), 2);
        assert_eq!(graph.links().len(), 1);
        assert_eq!(graph.attached_to(c).map(|p| p.owner), Some(a));
    }

    #[test]
    fn test_socket_follows_rotation() {
        let (mut registry, _, b) = two_objects();
        registry.rotate(b, std::f32::consts::PI);
        let left = AttachmentGraph::point_world(
            &registry,
            AttachmentRef { owner: b, name: AttachmentName::Left },
        )
        .unwrap();
        assert!((left.x - 3.5).abs() < 1e-5);
    }
}
