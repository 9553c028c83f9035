//! Fixed habitat dimensions: footprint scaling, slab geometry and partition limits.
//!
//! Plain numeric constants with no engine dependency. Tunables that a
//! session may override live in [`crate::placement::PlacementRules`] and the
//! settling parameters in `habitat-core`; these are the fixed ones.

/// Floor plan footprint (width and depth) as a multiple of the habitat radius.
pub const FOOTPRINT_SCALE: f32 = 2.2;

/// Vertical thickness of every floor slab.
pub const FLOOR_THICKNESS: f32 = 0.3;

/// Highest floor count the generator will build.
pub const MAX_FLOORS: u32 = 50;

/// How far a focused floor is lifted above its base elevation.
pub const FOCUS_RAISE: f32 = 3.0;

pub mod partitions {
    /// Wall height as a fraction of the gap between floors, before clamping.
    pub const WALL_HEIGHT_FACTOR: f32 = 0.85;
    pub const MIN_WALL_HEIGHT: f32 = 2.0;
    pub const MAX_WALL_HEIGHT: f32 = 3.2;

    /// Wall thickness as a fraction of the shorter footprint side, before clamping.
    pub const WALL_THICKNESS_FACTOR: f32 = 0.01;
    pub const MIN_WALL_THICKNESS: f32 = 0.06;
    pub const MAX_WALL_THICKNESS: f32 = 0.12;

    pub const CORRIDOR_WIDTH: f32 = 1.2;
    pub const SHELTER_CORRIDOR_WIDTH: f32 = 1.6;

    /// Target room areas (m²) by purpose.
    pub const ROOM_AREA_DEFAULT: f32 = 12.0;
    pub const ROOM_AREA_RESEARCH: f32 = 16.0;
    pub const ROOM_AREA_MIXED_USE: f32 = 20.0;

    /// Walls shorter than this are dropped.
    pub const MIN_WALL_LENGTH: f32 = 0.01;
}

pub mod crew {
    pub const MIN_CREW: u32 = 1;
    pub const MAX_CREW: u32 = 500;

    /// Grid density multipliers by crew size band.
    pub const DENSITY_SMALL: f32 = 1.0;
    pub const DENSITY_MEDIUM: f32 = 1.1;
    pub const DENSITY_LARGE: f32 = 1.3;
    pub const MEDIUM_CREW_ABOVE: u32 = 12;
    pub const LARGE_CREW_ABOVE: u32 = 24;
}

pub mod interaction {
    /// World units moved per unit of normalized pointer travel while dragging.
    pub const DRAG_SENSITIVITY: f32 = 10.0;

    /// X offset applied to a duplicated object.
    pub const DUPLICATE_OFFSET_X: f32 = 2.0;

    /// Ambient habitat rotation per update, in radians.
    pub const AMBIENT_ROTATION_STEP: f32 = 0.005;

    /// Default search radius for attachment snapping.
    pub const ATTACH_SEARCH_RADIUS: f32 = 2.0;
}
