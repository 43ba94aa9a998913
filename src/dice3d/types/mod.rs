//! Type definitions for the dice drop simulator
//!
//! This module is organized into submodules:
//! - `dice` - Die components, pip labels, the signed-axis face table, poses
//! - `camera` - Camera marker, follower, and pointer viewport
//! - `face` - Face mapper and face change messages
//! - `stability` - Velocity windows and settlement detection
//! - `motion` - Device-motion velocity injection
//! - `settings` - Simulation settings, loading, and validation

pub mod camera;
pub mod dice;
pub mod face;
pub mod motion;
pub mod settings;
pub mod stability;

// Re-export all public types for convenient access
pub use camera::*;
pub use dice::*;
pub use face::*;
pub use motion::*;
pub use settings::*;
pub use stability::*;
