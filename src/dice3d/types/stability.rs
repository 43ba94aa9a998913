//! Settlement detection
//!
//! The die counts as settled once it rests near the floor and the recent
//! velocity samples on every axis have died down. Between the stable and the
//! unstable threshold the previous verdict is kept, so the face read-out does
//! not flicker while the die rocks to a stop.

use bevy::prelude::*;

/// Capacity of each per-axis velocity window
pub const VELOCITY_WINDOW: usize = 10;

/// Window sum at or below which an axis counts as still
pub const STABLE_THRESHOLD: f32 = 0.001 * VELOCITY_WINDOW as f32;

/// Window sum above which an axis counts as moving
pub const UNSTABLE_THRESHOLD: f32 = 1.0 * VELOCITY_WINDOW as f32;

/// Ring buffer of the most recent velocity samples along one axis
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityWindow {
    samples: [f32; VELOCITY_WINDOW],
    next: usize,
    len: usize,
}

impl VelocityWindow {
    /// Overwrites the oldest sample once the window is full.
    pub fn push(&mut self, sample: f32) {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % VELOCITY_WINDOW;
        self.len = (self.len + 1).min(VELOCITY_WINDOW);
    }

    /// Sum of sample magnitudes
    pub fn sum(&self) -> f32 {
        self.samples[..self.len].iter().map(|v| v.abs()).sum()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Verdict reported to the rest of the pipeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stability {
    Settled,
    #[default]
    Unsettled,
}

/// Raw classification of a single frame, before hysteresis is applied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Settled,
    Unsettled,
    Indeterminate,
}

/// Resource tracking whether the die has come to rest
#[derive(Resource, Clone, Debug)]
pub struct StabilityTracker {
    windows: [VelocityWindow; 3],
    reported: Stability,
    edge_length: f32,
}

impl StabilityTracker {
    pub fn new(edge_length: f32) -> Self {
        Self {
            windows: [VelocityWindow::default(); 3],
            reported: Stability::Unsettled,
            edge_length,
        }
    }

    /// Record one post-step sample and return the (hysteresis-filtered) verdict.
    pub fn record(&mut self, linvel: Vec3, elevation: f32) -> Stability {
        for (window, sample) in self.windows.iter_mut().zip(linvel.to_array()) {
            window.push(sample);
        }

        match self.classify(elevation) {
            Classification::Settled => self.reported = Stability::Settled,
            Classification::Unsettled => self.reported = Stability::Unsettled,
            Classification::Indeterminate => {}
        }
        self.reported
    }

    pub fn classify(&self, elevation: f32) -> Classification {
        if !self.is_warm() {
            return Classification::Unsettled;
        }

        if elevation > self.edge_length
            || self.windows.iter().any(|w| w.sum() > UNSTABLE_THRESHOLD)
        {
            return Classification::Unsettled;
        }

        if self.windows.iter().all(|w| w.sum() <= STABLE_THRESHOLD) {
            Classification::Settled
        } else {
            Classification::Indeterminate
        }
    }

    pub fn is_warm(&self) -> bool {
        self.windows.iter().all(|w| !w.is_empty())
    }

    pub fn stability(&self) -> Stability {
        self.reported
    }

    pub fn is_settled(&self) -> bool {
        self.reported == Stability::Settled
    }

    /// Per-axis window sums (x, y, z)
    pub fn sums(&self) -> Vec3 {
        Vec3::new(
            self.windows[0].sum(),
            self.windows[1].sum(),
            self.windows[2].sum(),
        )
    }

    /// Drop all history; the die reads as unsettled until new samples arrive.
    pub fn clear(&mut self) {
        for window in &mut self.windows {
            window.clear();
        }
        self.reported = Stability::Unsettled;
    }
}
