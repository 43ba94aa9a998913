//! Systems module for dice3d
//!
//! This module contains all the Bevy systems for the die simulation,
//! organized into submodules by functionality:
//!
//! - `setup`: Scene initialization (die, floor and walls, camera entity)
//! - `physics`: Gravity, reset, pose sync and stability tracking
//! - `dice`: Face resolution and host notification
//! - `camera`: Camera follow
//! - `rendering`: Meshes, lights, text and input forwarding for the window

mod camera;
mod dice;
mod physics;
pub mod rendering;
mod setup;

// Re-export all public systems
pub use camera::follow_die_camera;
pub use dice::{notify_face_listeners, resolve_face};
pub use physics::{apply_die_reset, apply_gravity, sync_die_pose, track_stability};
pub use setup::{setup_scene, spawn_die};
