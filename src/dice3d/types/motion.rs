//! Device-motion input
//!
//! Acceleration samples from a handheld device can arrive at any rate. Each
//! sample is dead-banded and scaled into a velocity delta; deltas accumulate
//! until the next tick adds them to the die velocity.

use bevy::prelude::*;

use super::settings::MotionSettings;

#[derive(Resource, Clone, Debug, Default)]
pub struct MotionInjector {
    dead_band: f32,
    scale: Vec3,
    pending: Vec3,
}

impl MotionInjector {
    pub fn new(settings: &MotionSettings) -> Self {
        Self {
            dead_band: settings.dead_band,
            scale: Vec3::from_array(settings.scale),
            pending: Vec3::ZERO,
        }
    }

    /// Velocity delta contributed by one acceleration sample
    pub fn delta_for(&self, acceleration: Vec3) -> Vec3 {
        let gated = Vec3::select(
            acceleration.abs().cmpgt(Vec3::splat(self.dead_band)),
            acceleration,
            Vec3::ZERO,
        );
        gated * self.scale
    }

    pub fn accumulate(&mut self, acceleration: Vec3) {
        self.pending += self.delta_for(acceleration);
    }

    /// Hand over everything accumulated since the last tick.
    pub fn take(&mut self) -> Vec3 {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> Vec3 {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = Vec3::ZERO;
    }
}
