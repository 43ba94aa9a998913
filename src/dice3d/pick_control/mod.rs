//! Pick Control Module
//!
//! This module handles pointer-controlled picking and dragging of the die.
//! A pointer press on a settled die attaches a point-to-point joint between
//! the grabbed spot and a kinematic anchor; the anchor then follows the
//! pointer across a camera-facing plane until the pointer is released.

mod ray;
mod state;
mod systems;

pub use ray::*;
pub use state::*;
pub use systems::*;
