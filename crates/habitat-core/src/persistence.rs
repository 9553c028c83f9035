//! Save/Load of the habitat layout record
//!
//! The record is a small JSON document carrying the shell shape, its
//! dimensions and the enabled life-support systems. Furniture and floor
//! partitions are not part of it; loading a record leaves them as they are.
//!
//! ```json
//! {
//!   "shape": "cylinder",
//!   "radius": 10.0,
//!   "height": 15.0,
//!   "systems": ["life-support", "power"],
//!   "saved_at": 1760659200
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use habitat_logic::config::{HabitatConfig, HabitatShape};
use habitat_logic::systems::SystemKind;

/// Persisted layout record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub shape: String,
    pub radius: f32,
    pub height: f32,
    #[serde(default)]
    pub systems: Vec<String>,
    /// Seconds since the Unix epoch
    #[serde(default)]
    pub saved_at: u64,
}

/// A record that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub shape: HabitatShape,
    pub radius: f32,
    pub height: f32,
    pub systems: Vec<SystemKind>,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed layout: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported habitat shape '{0}'")]
    UnsupportedShape(String),
    #[error("Invalid {field}: {value}")]
    InvalidDimension { field: &'static str, value: f32 },
}

impl LayoutRecord {
    /// Capture the persisted part of a configuration.
    pub fn from_config(config: &HabitatConfig, saved_at: u64) -> Self {
        Self {
            shape: config.shape.id().to_string(),
            radius: config.radius,
            height: config.height,
            systems: config
                .enabled_systems
                .iter()
                .map(|s| s.id().to_string())
                .collect(),
            saved_at,
        }
    }

    /// Check shape and dimensions. Unknown system ids are skipped with a
    /// warning rather than failing the whole record.
    pub fn validate(&self) -> Result<ValidatedRecord, RecordError> {
        let shape = HabitatShape::from_id(&self.shape)
            .ok_or_else(|| RecordError::UnsupportedShape(self.shape.clone()))?;
        for (field, value) in [("radius", self.radius), ("height", self.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(RecordError::InvalidDimension { field, value });
            }
        }

        let mut systems = Vec::with_capacity(self.systems.len());
        for id in &self.systems {
            match SystemKind::from_id(id) {
                Some(kind) if !systems.contains(&kind) => systems.push(kind),
                Some(_) => {}
                None => log::warn!("Skipping unknown system '{}' in layout record", id),
            }
        }

        Ok(ValidatedRecord {
            shape,
            radius: self.radius,
            height: self.height,
            systems,
        })
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Write a record as pretty JSON
pub fn save_record<W: Write>(mut writer: W, record: &LayoutRecord) -> Result<(), RecordError> {
    serde_json::to_writer_pretty(&mut writer, record)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Read and validate a record
pub fn load_record<R: Read>(reader: R) -> Result<ValidatedRecord, RecordError> {
    let record: LayoutRecord = serde_json::from_reader(reader)?;
    record.validate()
}
