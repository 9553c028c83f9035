//! Habitat configuration and validation.
//!
//! Before floors are generated the user sets the habitat shell (shape,
//! radius, height), the number of floors, crew size and mission purposes.
//! This module holds that data model and the validation for it, independent
//! of any UI framework.
//!
//! ```
//! use habitat_logic::config::{validate_config, HabitatConfig};
//!
//! let mut config = HabitatConfig::default();
//! config.floor_count = 3;
//! config.crew_size = 8;
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{crew, partitions, MAX_FLOORS};
use crate::systems::SystemKind;

/// Habitat shell shape. The shell itself is drawn by the scene; the core
/// only carries the id through to the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitatShape {
    #[default]
    Cylinder,
    Sphere,
    Cube,
    Torus,
}

impl HabitatShape {
    pub fn id(&self) -> &'static str {
        match self {
            HabitatShape::Cylinder => "cylinder",
            HabitatShape::Sphere => "sphere",
            HabitatShape::Cube => "cube",
            HabitatShape::Torus => "torus",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "cylinder" => Some(HabitatShape::Cylinder),
            "sphere" => Some(HabitatShape::Sphere),
            "cube" => Some(HabitatShape::Cube),
            "torus" => Some(HabitatShape::Torus),
            _ => None,
        }
    }
}

/// Mission purpose tags from the setup questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    Residential,
    Research,
    #[serde(rename = "Mixed-use")]
    MixedUse,
    #[serde(rename = "Emergency shelter")]
    EmergencyShelter,
}

/// Target room area for a set of purposes. Research wins over mixed-use.
pub fn target_room_area(purposes: &[Purpose]) -> f32 {
    if purposes.contains(&Purpose::Research) {
        partitions::ROOM_AREA_RESEARCH
    } else if purposes.contains(&Purpose::MixedUse) {
        partitions::ROOM_AREA_MIXED_USE
    } else {
        partitions::ROOM_AREA_DEFAULT
    }
}

/// Corridor width for a set of purposes.
pub fn corridor_width(purposes: &[Purpose]) -> f32 {
    if purposes.contains(&Purpose::EmergencyShelter) {
        partitions::SHELTER_CORRIDOR_WIDTH
    } else {
        partitions::CORRIDOR_WIDTH
    }
}

/// Grid density multiplier for a crew size.
pub fn density_factor(crew_size: u32) -> f32 {
    if crew_size > crew::LARGE_CREW_ABOVE {
        crew::DENSITY_LARGE
    } else if crew_size > crew::MEDIUM_CREW_ABOVE {
        crew::DENSITY_MEDIUM
    } else {
        crew::DENSITY_SMALL
    }
}

/// User-editable habitat configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitatConfig {
    pub shape: HabitatShape,
    /// Shell radius in meters. Drives the footprint and the placement bounds.
    pub radius: f32,
    /// Shell height in meters. Floors are spread evenly inside it.
    pub height: f32,
    pub floor_count: u32,
    pub crew_size: u32,
    pub purposes: Vec<Purpose>,
    pub enabled_systems: Vec<SystemKind>,
}

impl Default for HabitatConfig {
    fn default() -> Self {
        Self {
            shape: HabitatShape::Cylinder,
            radius: 10.0,
            height: 15.0,
            floor_count: 0,
            crew_size: 1,
            purposes: Vec::new(),
            enabled_systems: Vec::new(),
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Radius must be a positive, finite number.
    InvalidRadius(f32),
    /// Height must be a positive, finite number.
    InvalidHeight(f32),
    /// More floors than the generator supports.
    TooManyFloors(u32),
    /// Crew size out of range.
    CrewOutOfRange(u32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidRadius(r) => write!(f, "radius must be positive, got {}", r),
            ConfigError::InvalidHeight(h) => write!(f, "height must be positive, got {}", h),
            ConfigError::TooManyFloors(n) => {
                write!(f, "at most {} floors are supported, got {}", MAX_FLOORS, n)
            }
            ConfigError::CrewOutOfRange(c) => write!(
                f,
                "crew size must be within {}..={}, got {}",
                crew::MIN_CREW,
                crew::MAX_CREW,
                c
            ),
        }
    }
}

/// Validate a habitat configuration, returning all errors found.
pub fn validate_config(config: &HabitatConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !config.radius.is_finite() || config.radius <= 0.0 {
        errors.push(ConfigError::InvalidRadius(config.radius));
    }
    if !config.height.is_finite() || config.height <= 0.0 {
        errors.push(ConfigError::InvalidHeight(config.height));
    }
    if config.floor_count > MAX_FLOORS {
        errors.push(ConfigError::TooManyFloors(config.floor_count));
    }
    if !(crew::MIN_CREW..=crew::MAX_CREW).contains(&config.crew_size) {
        errors.push(ConfigError::CrewOutOfRange(config.crew_size));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&HabitatConfig::default()).is_empty());
    }

    #[test]
    fn collects_every_error() {
        let config = HabitatConfig {
            radius: 0.0,
            height: f32::NAN,
            floor_count: 51,
            crew_size: 0,
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ConfigError::TooManyFloors(51)));
        assert!(errors.contains(&ConfigError::CrewOutOfRange(0)));
    }

    #[test]
    fn research_beats_mixed_use() {
        assert_eq!(
            target_room_area(&[Purpose::MixedUse, Purpose::Research]),
            partitions::ROOM_AREA_RESEARCH
        );
        assert_eq!(
            target_room_area(&[Purpose::MixedUse]),
            partitions::ROOM_AREA_MIXED_USE
        );
        assert_eq!(target_room_area(&[]), partitions::ROOM_AREA_DEFAULT);
    }

    #[test]
    fn density_bands() {
        assert_eq!(density_factor(12), 1.0);
        assert_eq!(density_factor(13), 1.1);
        assert_eq!(density_factor(24), 1.1);
        assert_eq!(density_factor(25), 1.3);
    }

    #[test]
    fn shelter_widens_corridor() {
        assert_eq!(corridor_width(&[Purpose::EmergencyShelter]), 1.6);
        assert_eq!(corridor_width(&[Purpose::Residential]), 1.2);
    }

    #[test]
    fn shape_ids() {
        for shape in [
            HabitatShape::Cylinder,
            HabitatShape::Sphere,
            HabitatShape::Cube,
            HabitatShape::Torus,
        ] {
            assert_eq!(HabitatShape::from_id(shape.id()), Some(shape));
        }
        assert_eq!(HabitatShape::from_id("dodecahedron"), None);
    }
}
