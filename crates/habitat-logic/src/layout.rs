//! Floor slab and partition generation.
//!
//! Floors are spread evenly through the shell height; each floor gets the
//! same rectangular room grid, cut by a cross-shaped corridor through the
//! centre.
//!
//! ```text
//!   ┌────┬────┬──  ──┬────┬────┐
//!   │    │    │      │    │    │
//!   ├────┼────┼──  ──┼────┼────┤
//!   │    │    │      │    │    │
//!                              ← corridor band (grid lines omitted)
//!   │    │    │      │    │    │
//!   ├────┼────┼──  ──┼────┼────┤
//!   │    │    │      │    │    │
//!   └────┴────┴──  ──┴────┴────┘
//! ```
//!
//! Generation is a pure function of [`LayoutParams`]: two calls with the
//! same inputs yield identical plans. Rebuilding replaces every floor and
//! wall, but floor indices stay stable so furniture can re-anchor by index.
//!
//! ```
//! use habitat_logic::layout::{generate_floor_plan, LayoutParams};
//!
//! let params = LayoutParams { floor_count: 3, ..LayoutParams::default() };
//! let plan = generate_floor_plan(&params);
//! assert_eq!(plan.floors.len(), 3);
//! assert!(!plan.walls.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{corridor_width, density_factor, target_room_area, HabitatConfig, Purpose};
use crate::constants::{partitions, FLOOR_THICKNESS, FOCUS_RAISE, FOOTPRINT_SCALE, MAX_FLOORS};
use crate::geometry::PlanPoint;

/// A single horizontal slab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub index: u32,
    /// Resting elevation of the slab centre.
    pub elevation_base: f32,
    /// Displayed elevation; differs from base while the floor is focused.
    pub elevation_current: f32,
    pub thickness: f32,
}

impl Floor {
    /// Top surface at the current elevation.
    pub fn top(&self) -> f32 {
        self.elevation_current + self.thickness / 2.0
    }

    /// Resting height for the centre of an object of the given vertical extent.
    pub fn rest_height(&self, bounding_height: f32) -> f32 {
        self.top() + bounding_height / 2.0
    }

    pub fn is_raised(&self) -> bool {
        self.elevation_current != self.elevation_base
    }
}

/// One straight partition wall segment on a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionWall {
    pub floor_index: u32,
    pub start: PlanPoint,
    pub end: PlanPoint,
    pub height: f32,
}

impl PartitionWall {
    pub fn length(&self) -> f32 {
        self.start.distance(&self.end)
    }
}

/// Inputs to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub radius: f32,
    pub height: f32,
    pub floor_count: u32,
    pub crew_size: u32,
    pub purposes: Vec<Purpose>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            radius: 10.0,
            height: 15.0,
            floor_count: 0,
            crew_size: 1,
            purposes: Vec::new(),
        }
    }
}

impl From<&HabitatConfig> for LayoutParams {
    fn from(config: &HabitatConfig) -> Self {
        Self {
            radius: config.radius,
            height: config.height,
            floor_count: config.floor_count,
            crew_size: config.crew_size,
            purposes: config.purposes.clone(),
        }
    }
}

impl LayoutParams {
    pub fn footprint(&self) -> (f32, f32) {
        let side = self.radius * FOOTPRINT_SCALE;
        (side, side)
    }
}

/// Result of floor generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    pub floors: Vec<Floor>,
    pub walls: Vec<PartitionWall>,
    pub footprint_width: f32,
    pub footprint_depth: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    pub corridor_width: f32,
    pub grid_x: u32,
    pub grid_z: u32,
}

impl FloorPlan {
    /// A plan with no floors.
    pub fn empty() -> Self {
        Self {
            floors: Vec::new(),
            walls: Vec::new(),
            footprint_width: 0.0,
            footprint_depth: 0.0,
            wall_height: 0.0,
            wall_thickness: 0.0,
            corridor_width: 0.0,
            grid_x: 0,
            grid_z: 0,
        }
    }

    pub fn floor(&self, index: u32) -> Option<&Floor> {
        self.floors.get(index as usize)
    }

    pub fn floor_count(&self) -> u32 {
        self.floors.len() as u32
    }

    pub fn walls_on(&self, floor_index: u32) -> impl Iterator<Item = &PartitionWall> {
        self.walls
            .iter()
            .filter(move |w| w.floor_index == floor_index)
    }

    /// Raise one floor for focus and return every other floor to its base.
    /// Returns false (and changes nothing) if the index is unknown.
    pub fn focus(&mut self, index: u32) -> bool {
        if self.floor(index).is_none() {
            return false;
        }
        for floor in &mut self.floors {
            floor.elevation_current = if floor.index == index {
                floor.elevation_base + FOCUS_RAISE
            } else {
                floor.elevation_base
            };
        }
        true
    }

    /// Return every floor to its base elevation.
    pub fn reset_focus(&mut self) {
        for floor in &mut self.floors {
            floor.elevation_current = floor.elevation_base;
        }
    }
}

/// Gap between consecutive floors for a shell height.
pub fn floor_gap(height: f32, floor_count: u32) -> f32 {
    height / (floor_count as f32 + 1.0)
}

/// Slab centre elevations, bottom to top.
pub fn floor_elevations(height: f32, floor_count: u32) -> Vec<f32> {
    let gap = floor_gap(height, floor_count);
    (0..floor_count)
        .map(|i| -height / 2.0 + (i as f32 + 1.0) * gap)
        .collect()
}

/// Wall height for a given floor gap.
pub fn wall_height_for_gap(gap: f32) -> f32 {
    (gap * partitions::WALL_HEIGHT_FACTOR).clamp(partitions::MIN_WALL_HEIGHT, partitions::MAX_WALL_HEIGHT)
}

/// Wall thickness for a footprint.
pub fn wall_thickness_for(width: f32, depth: f32) -> f32 {
    (width.min(depth) * partitions::WALL_THICKNESS_FACTOR)
        .clamp(partitions::MIN_WALL_THICKNESS, partitions::MAX_WALL_THICKNESS)
}

/// Room grid resolution along one side. Never below 1.
pub fn grid_cells(extent: f32, room_area: f32, density: f32) -> u32 {
    let rooms = ((extent / room_area.sqrt()).floor() as i64).max(1);
    ((rooms as f32 * density).round() as i64).max(1) as u32
}

/// Generate floors and partition walls.
pub fn generate_floor_plan(params: &LayoutParams) -> FloorPlan {
    let floor_count = if params.floor_count > MAX_FLOORS {
        log::warn!(
            "Floor count {} exceeds maximum, clamping to {}",
            params.floor_count,
            MAX_FLOORS
        );
        MAX_FLOORS
    } else {
        params.floor_count
    };

    let (width, depth) = params.footprint();
    let gap = floor_gap(params.height, floor_count);
    let room_area = target_room_area(&params.purposes);
    let density = density_factor(params.crew_size);
    let corridor = corridor_width(&params.purposes);

    let mut plan = FloorPlan {
        floors: Vec::with_capacity(floor_count as usize),
        walls: Vec::new(),
        footprint_width: width,
        footprint_depth: depth,
        wall_height: wall_height_for_gap(gap),
        wall_thickness: wall_thickness_for(width, depth),
        corridor_width: corridor,
        grid_x: grid_cells(width, room_area, density),
        grid_z: grid_cells(depth, room_area, density),
    };

    for (i, elevation) in floor_elevations(params.height, floor_count)
        .into_iter()
        .enumerate()
    {
        plan.floors.push(Floor {
            index: i as u32,
            elevation_base: elevation,
            elevation_current: elevation,
            thickness: FLOOR_THICKNESS,
        });
    }

    for floor in &plan.floors {
        let walls = floor_partitions(
            floor.index,
            width,
            depth,
            plan.grid_x,
            plan.grid_z,
            corridor,
            plan.wall_height,
        );
        plan.walls.extend(walls);
    }

    plan
}

/// Partition walls for a single floor: interior grid lines outside the
/// corridor band, then the four boundary walls.
pub fn floor_partitions(
    floor_index: u32,
    width: f32,
    depth: f32,
    grid_x: u32,
    grid_z: u32,
    corridor: f32,
    wall_height: f32,
) -> Vec<PartitionWall> {
    let mut walls = Vec::new();
    let min_x = -width / 2.0;
    let min_z = -depth / 2.0;
    let cell_w = width / grid_x as f32;
    let cell_d = depth / grid_z as f32;
    let half_corridor = corridor / 2.0;
    let in_corridor = |c: f32| c > -half_corridor && c < half_corridor;

    let mut add = |x1: f32, z1: f32, x2: f32, z2: f32| {
        let wall = PartitionWall {
            floor_index,
            start: PlanPoint::new(x1, z1),
            end: PlanPoint::new(x2, z2),
            height: wall_height,
        };
        if wall.length() >= partitions::MIN_WALL_LENGTH {
            walls.push(wall);
        }
    };

    // Lines of constant x, running along z
    for gx in 1..grid_x {
        let x = min_x + gx as f32 * cell_w;
        if in_corridor(x) {
            continue;
        }
        add(x, min_z, x, -min_z);
    }
    // Lines of constant z, running along x
    for gz in 1..grid_z {
        let z = min_z + gz as f32 * cell_d;
        if in_corridor(z) {
            continue;
        }
        add(min_x, z, -min_x, z);
    }

    // Boundary, regardless of the corridor
    add(min_x, min_z, -min_x, min_z);
    add(min_x, -min_z, -min_x, -min_z);
    add(min_x, min_z, min_x, -min_z);
    add(-min_x, min_z, -min_x, -min_z);

    walls
}
