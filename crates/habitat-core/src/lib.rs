//! Habitat Core - interior planning engine
//!
//! Holds the furniture of a space-habitat interior and the floors it rests
//! on. Objects are placed through a fixed set of checks, fall onto their
//! floor, follow floors that move, and are kept apart when dragged and
//! dropped.
//!
//! # Architecture
//!
//! Furniture lives in an Entity Component System (ECS) world via `hecs`:
//! - **Entities**: one per furniture object
//! - **Components**: identity, transform, sockets and the transient
//!   `Falling`/`Stable`/`Dragged` states
//! - **Systems**: settling and stability expiry, run from [`engine::HabitatEngine::update`]
//!
//! Floor plans, placement rules and system layout are pure functions in
//! `habitat-logic`.
//!
//! # Example
//!
//! ```rust,no_run
//! use habitat_core::prelude::*;
//!
//! let mut engine = HabitatEngine::new();
//! engine.rebuild_floors(3);
//!
//! let bed = engine
//!     .place_object(FurnitureKind::Bed, Vec3::new(2.0, 0.0, 1.0), 1)
//!     .expect("placement accepted");
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//!     for event in engine.drain_events() {
//!         // mirror into the scene
//!         let _ = (event, bed);
//!     }
//! }
//! ```

pub mod attachments;
pub mod components;
pub mod drag;
pub mod engine;
pub mod events;
pub mod persistence;
pub mod registry;
pub mod session;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{HabitatEngine, PointerHit};
    pub use crate::events::{EngineEvent, NoticeKind};
    pub use habitat_logic::furniture::FurnitureKind;
    pub use habitat_logic::geometry::Vec3;
    pub use habitat_logic::placement::PlacementRejection;
}
