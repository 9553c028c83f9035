//! Shared session flags.
//!
//! One struct holds the workspace-wide switches that several components
//! read. Each field has a single writer:
//!
//! | Field | Written by |
//! |-------|------------|
//! | `clock` | `HabitatEngine::update` |
//! | `layout_locked` | lock toggle |
//! | `dragging`, `camera_navigation`, `last_drag_start_at` | drag controller |
//! | `planner_active`, `selected_floor` | floor focus |
//! | `snap_enabled`, `theme`, `vibrant` | UI shell setters |
//! | `habitat_rotation` | ambient rotation in `update` |
//! | `last_placement_at` | accepted placements |

use serde::{Deserialize, Serialize};

use habitat_logic::furniture::Theme;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session clock in seconds
    pub clock: f64,
    pub layout_locked: bool,
    pub dragging: bool,
    pub camera_navigation: bool,
    pub planner_active: bool,
    pub snap_enabled: bool,
    pub selected_floor: Option<u32>,
    /// Ambient yaw of the whole habitat, radians
    pub habitat_rotation: f32,
    pub last_placement_at: Option<f64>,
    pub last_drag_start_at: Option<f64>,
    pub theme: Theme,
    pub vibrant: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            clock: 0.0,
            layout_locked: false,
            dragging: false,
            camera_navigation: true,
            planner_active: false,
            snap_enabled: true,
            selected_floor: None,
            habitat_rotation: 0.0,
            last_placement_at: None,
            last_drag_start_at: None,
            theme: Theme::Light,
            vibrant: false,
        }
    }
}

impl SessionState {
    /// Ambient rotation runs only when nobody is editing.
    pub fn rotation_active(&self) -> bool {
        !(self.planner_active || self.dragging || self.layout_locked)
    }

    /// Settling runs unless a drag or the layout lock froze the workspace.
    pub fn settling_active(&self) -> bool {
        !(self.dragging || self.layout_locked)
    }

    /// Return to a fresh workspace, keeping the clock and UI preferences.
    pub fn reset_workspace(&mut self) {
        *self = Self {
            clock: self.clock,
            layout_locked: self.layout_locked,
            snap_enabled: self.snap_enabled,
            theme: self.theme,
            vibrant: self.vibrant,
            ..Self::default()
        };
    }
}
