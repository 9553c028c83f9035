//! Furniture identity, transform and attachment sockets.

use habitat_logic::furniture::{AttachmentName, FurnitureKind};
use habitat_logic::geometry::Vec3;
use serde::{Deserialize, Serialize};

/// Session-unique furniture identifier. Allocated from a monotonic counter
/// and never reused, even after the object is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FurnitureId(pub u64);

impl std::fmt::Display for FurnitureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "furniture_{}", self.0)
    }
}

/// Furniture component - identity and floor lock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Furniture {
    pub id: FurnitureId,
    pub kind: FurnitureKind,
    /// Measured vertical extent; the object rests with its centre half
    /// this far above the slab top.
    pub bounding_height: f32,
    /// Floor whose elevation governs this object's vertical anchor.
    /// Focus raises do not change it.
    pub locked_floor: u32,
    /// Session clock at creation, seconds.
    pub created_at: f64,
    /// Insertion order within the registry. Breaks ties between objects
    /// that share an id.
    pub spawn_order: u64,
    pub color: u32,
}

/// Placement transform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_y: f32,
    pub scale: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation_y: 0.0,
            scale: Vec3::ONE,
        }
    }
}

/// One socket on an object, in the owner's local frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AttachmentPoint {
    pub name: AttachmentName,
    pub local_offset: Vec3,
}

/// The six sockets generated once when an object is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentPoints {
    pub points: [AttachmentPoint; 6],
}

impl Default for AttachmentPoints {
    fn default() -> Self {
        Self {
            points: AttachmentName::ALL.map(|name| AttachmentPoint {
                name,
                local_offset: name.local_offset(),
            }),
        }
    }
}

impl AttachmentPoints {
    pub fn get(&self, name: AttachmentName) -> Option<&AttachmentPoint> {
        self.points.iter().find(|p| p.name == name)
    }
}
