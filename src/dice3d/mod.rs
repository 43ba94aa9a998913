pub mod pick_control;
pub mod plugin;
pub mod simulation;
pub mod systems;
pub mod types;

pub use pick_control::*;
pub use plugin::*;
pub use simulation::*;
pub use systems::*;
pub use types::*;
