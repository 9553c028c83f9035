//! Component definitions for the furniture world.
//!
//! Components are pure data structs attached to furniture entities.
//! They have no behavior - that lives in systems and the registry.

mod furniture;
mod settling;

pub use furniture::*;
pub use settling::*;
