//! Furniture catalogue: kinds, resting heights, attachment offsets, colours.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec3;

/// Placeable furniture kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FurnitureKind {
    #[default]
    Bed,
    Table,
    Chair,
    Storage,
    Cube,
    Sphere,
    Cylinder,
}

impl FurnitureKind {
    pub const ALL: [FurnitureKind; 7] = [
        FurnitureKind::Bed,
        FurnitureKind::Table,
        FurnitureKind::Chair,
        FurnitureKind::Storage,
        FurnitureKind::Cube,
        FurnitureKind::Sphere,
        FurnitureKind::Cylinder,
    ];

    /// Vertical extent of the prefab in meters.
    ///
    /// Settling rests the object's centre half this far above the slab top.
    pub fn bounding_height(&self) -> f32 {
        match self {
            FurnitureKind::Bed => 1.0,      // headboard top
            FurnitureKind::Table => 0.84,   // top surface
            FurnitureKind::Chair => 1.1,    // backrest
            FurnitureKind::Storage => 1.4,
            FurnitureKind::Cube => 1.5,
            FurnitureKind::Sphere => 2.25,
            FurnitureKind::Cylinder => 2.25,
        }
    }

    /// Primitive kinds take the theme/vibrant colour; the detailed prefabs
    /// carry their own materials.
    pub fn allows_recolor(&self) -> bool {
        matches!(
            self,
            FurnitureKind::Cube | FurnitureKind::Sphere | FurnitureKind::Cylinder
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            FurnitureKind::Bed => "bed",
            FurnitureKind::Table => "table",
            FurnitureKind::Chair => "chair",
            FurnitureKind::Storage => "storage",
            FurnitureKind::Cube => "cube",
            FurnitureKind::Sphere => "sphere",
            FurnitureKind::Cylinder => "cylinder",
        }
    }
}

/// Named attachment sockets, one per face direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentName {
    Right,
    Left,
    Front,
    Back,
    Top,
    Bottom,
}

impl AttachmentName {
    pub const ALL: [AttachmentName; 6] = [
        AttachmentName::Right,
        AttachmentName::Left,
        AttachmentName::Front,
        AttachmentName::Back,
        AttachmentName::Top,
        AttachmentName::Bottom,
    ];

    /// Offset from the owning object's origin, in its local frame.
    pub fn local_offset(&self) -> Vec3 {
        match self {
            AttachmentName::Right => Vec3::new(1.0, 0.0, 0.0),
            AttachmentName::Left => Vec3::new(-1.0, 0.0, 0.0),
            AttachmentName::Front => Vec3::new(0.0, 0.0, 1.0),
            AttachmentName::Back => Vec3::new(0.0, 0.0, -1.0),
            AttachmentName::Top => Vec3::new(0.0, 1.0, 0.0),
            AttachmentName::Bottom => Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

/// Rotate a local offset about Y and translate it to world space.
pub fn local_to_world(origin: Vec3, rotation_y: f32, offset: Vec3) -> Vec3 {
    let (sin, cos) = rotation_y.sin_cos();
    Vec3::new(
        origin.x + offset.x * cos + offset.z * sin,
        origin.y + offset.y,
        origin.z - offset.x * sin + offset.z * cos,
    )
}

/// UI theme, supplied by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

const VIBRANT_PALETTE: [u32; 7] = [
    0xef4444, 0xf59e0b, 0x10b981, 0x06b6d4, 0x8b5cf6, 0xec4899, 0x84cc16,
];

/// Default colour for a new object. Vibrant mode cycles a palette by the
/// number of objects already placed.
pub fn furniture_color(theme: Theme, vibrant: bool, ordinal: usize) -> u32 {
    if vibrant {
        return VIBRANT_PALETTE[ordinal % VIBRANT_PALETTE.len()];
    }
    match theme {
        Theme::Dark => 0xffc857,
        Theme::Light => 0x2563eb,
    }
}
