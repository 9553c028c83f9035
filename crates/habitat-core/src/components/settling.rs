//! Settling state components.
//!
//! An object with none of these is Anchored: the settling system nudges it
//! toward its floor each tick. `Falling`, `Stable` and `Dragged` each take
//! that ownership away for as long as they are attached.

use serde::{Deserialize, Serialize};

/// Falling component - present only until the object reaches its rest height
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Falling {
    /// Vertical velocity, units per second (negative is down)
    pub velocity: f32,
}

/// Handle for one scheduled stability release. A newer token for the same
/// object supersedes older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StabilityToken(pub u64);

/// Stable component - set on drag release, suppresses gradual re-stick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Stable {
    /// Locked floor's current elevation when stability was granted
    pub anchor_elevation: f32,
    pub token: StabilityToken,
}

/// Dragged marker - the drag controller owns this object
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Dragged;
