//! Dice Drop: a physically simulated die you can pick up, drag and drop,
//! with the upward face read out once it comes to rest.
//!
//! The simulation runs on Bevy with Rapier physics. Embed it headless through
//! [`dice3d::DieSimulation`], or add [`dice3d::DiceSimulationPlugin`] (and
//! [`dice3d::DiceRenderPlugin`] for a window) to your own `App`.

pub mod dice3d;
