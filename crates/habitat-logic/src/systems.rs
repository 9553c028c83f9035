//! Life-support system catalogue and ring auto-layout.
//!
//! Enabled systems are spread evenly around a ring inside the shell. The
//! vertical jitter comes from a seeded RNG so a given seed always produces
//! the same layout.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geometry::Vec3;

/// Habitat support systems that can be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemKind {
    LifeSupport,
    Power,
    Waste,
    Thermal,
    Communications,
    Medical,
    Sleep,
    Exercise,
    Food,
    Stowage,
}

impl SystemKind {
    pub const ALL: [SystemKind; 10] = [
        SystemKind::LifeSupport,
        SystemKind::Power,
        SystemKind::Waste,
        SystemKind::Thermal,
        SystemKind::Communications,
        SystemKind::Medical,
        SystemKind::Sleep,
        SystemKind::Exercise,
        SystemKind::Food,
        SystemKind::Stowage,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            SystemKind::LifeSupport => "life-support",
            SystemKind::Power => "power",
            SystemKind::Waste => "waste",
            SystemKind::Thermal => "thermal",
            SystemKind::Communications => "communications",
            SystemKind::Medical => "medical",
            SystemKind::Sleep => "sleep",
            SystemKind::Exercise => "exercise",
            SystemKind::Food => "food",
            SystemKind::Stowage => "stowage",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }
}

/// A placed system module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPlacement {
    pub kind: SystemKind,
    pub position: Vec3,
}

/// Fraction of the shell radius used for the system ring.
const RING_FRACTION: f32 = 0.8;
/// Vertical jitter is drawn from ±(height × this).
const VERTICAL_SPREAD: f32 = 0.2;

/// Lay enabled systems out on a ring at 0.8 × radius.
///
/// System `i` of `n` sits at angle `i × 2π / n`. Y is drawn uniformly from
/// `±0.2 × height` using `seed`.
pub fn auto_layout(
    systems: &[SystemKind],
    radius: f32,
    height: f32,
    seed: u64,
) -> Vec<SystemPlacement> {
    if systems.is_empty() {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let ring = radius * RING_FRACTION;
    let angle_step = std::f32::consts::TAU / systems.len() as f32;
    let spread = height * VERTICAL_SPREAD;

    systems
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            let angle = i as f32 * angle_step;
            let y = if spread > 0.0 {
                rng.gen_range(-spread..=spread)
            } else {
                0.0
            };
            SystemPlacement {
                kind,
                position: Vec3::new(angle.cos() * ring, y, angle.sin() * ring),
            }
        })
        .collect()
}
