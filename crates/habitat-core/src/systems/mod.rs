//! Systems - per-tick logic that operates on furniture components

mod settling;
pub(crate) mod stability;

pub use settling::*;
pub use stability::*;
