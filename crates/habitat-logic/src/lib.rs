//! Pure layout and placement logic for the habitat planner.
//!
//! This crate contains everything that is independent of the entity store,
//! clock, or renderer. Functions take plain data and return results, making
//! them unit-testable and usable from the engine, the headless harness, or
//! any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Habitat shell, crew, purposes; configuration validation |
//! | [`constants`] | Footprint scale, slab thickness, partition and crew limits |
//! | [`furniture`] | Furniture kinds, resting heights, attachment sockets, colours |
//! | [`geometry`] | Y-up vector math and horizontal-plane helpers |
//! | [`layout`] | Floor slab spacing and per-floor partition walls |
//! | [`placement`] | Ordered placement checks and drag-release correction |
//! | [`systems`] | Life-support system catalogue and ring auto-layout |

pub mod config;
pub mod constants;
pub mod furniture;
pub mod geometry;
pub mod layout;
pub mod placement;
pub mod systems;
