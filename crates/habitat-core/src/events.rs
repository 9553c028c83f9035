//! Engine outbox.
//!
//! The engine never calls into the renderer or UI. It queues events that
//! the shell drains once per frame to create/remove visual nodes and show
//! transient notices.

use serde::{Deserialize, Serialize};

use habitat_logic::furniture::FurnitureKind;

use crate::attachments::{AttachmentRef, ConnectorId};
use crate::components::FurnitureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Success,
    Error,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    FloorsRebuilt { floor_count: u32, wall_count: usize },
    FurnitureSpawned { id: FurnitureId, kind: FurnitureKind, floor: u32 },
    FurnitureRemoved { id: FurnitureId },
    ConnectorAdded { connector: ConnectorId, object: FurnitureId, point: AttachmentRef },
    ConnectorRemoved { connector: ConnectorId },
    CameraNavigation(bool),
    Notice { kind: NoticeKind, text: String },
    SystemsLaidOut { count: usize },
}

impl EngineEvent {
    pub fn success(text: impl Into<String>) -> Self {
        EngineEvent::Notice {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        EngineEvent::Notice {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn hint(text: impl Into<String>) -> Self {
        EngineEvent::Notice {
            kind: NoticeKind::Hint,
            text: text.into(),
        }
    }
}
