//! Camera-related types and components
//!
//! This module contains the main camera marker component, the follower that
//! keeps the camera framed on the die, and the pointer viewport description
//! used to turn screen coordinates into rays.

use bevy::prelude::*;

use super::settings::CameraSettings;

/// Marker component for the main 3D camera
#[derive(Component)]
pub struct MainCamera;

/// Residual offsets shorter than this are dropped.
const RECOIL_EPSILON: f32 = 1e-4;

/// Resource placing the camera relative to the die
#[derive(Resource, Clone, Debug)]
pub struct CameraFollower {
    pub target_offset: Vec3,
    pub residual: Vec3,
    pub decay: f32,
    following: bool,
}

impl CameraFollower {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            target_offset: Vec3::from_array(settings.target_offset),
            residual: Vec3::ZERO,
            decay: settings.recoil_decay,
            following: true,
        }
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    /// Stop following; the camera stays where it is.
    pub fn disengage(&mut self) {
        self.following = false;
    }

    /// Resume following from the current camera position without a jump.
    pub fn resume(&mut self, camera_position: Vec3, die_position: Vec3) {
        self.residual = camera_position - die_position - self.target_offset;
        self.following = true;
    }

    /// Advance one frame. Returns the camera position while following.
    pub fn update(&mut self, die_position: Vec3) -> Option<Vec3> {
        if !self.following {
            return None;
        }
        let position = die_position + self.target_offset + self.residual;
        self.residual *= self.decay;
        if self.residual.length() < RECOIL_EPSILON {
            self.residual = Vec3::ZERO;
        }
        Some(position)
    }

    /// Camera transform looking at the die from the follow position
    pub fn camera_transform(&self, camera_position: Vec3, die_position: Vec3) -> Transform {
        Transform::from_translation(camera_position).looking_at(die_position, Vec3::Y)
    }

    pub fn reset(&mut self) {
        self.residual = Vec3::ZERO;
        self.following = true;
    }
}

/// Resource describing how normalized pointer coordinates map to camera rays
#[derive(Resource, Clone, Copy, Debug)]
pub struct PointerViewport {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width over height
    pub aspect: f32,
}

impl PointerViewport {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            fov_y: settings.fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follower() -> CameraFollower {
        CameraFollower::new(&CameraSettings::default())
    }

    #[test]
    fn test_follows_die_with_target_offset() {
        let mut follower = follower();
        let die = Vec3::new(1.0, 0.1, -2.0);
        assert_eq!(follower.update(die), Some(die + follower.target_offset));
    }

    #[test]
    fn test_disengaged_follower_does_not_move_camera() {
        let mut follower = follower();
        follower.disengage();
        assert_eq!(follower.update(Vec3::ZERO), None);
    }

    #[test]
    fn test_resume_does_not_jump() {
        let mut follower = follower();
        follower.disengage();

        let camera = Vec3::new(0.3, 1.4, 0.9);
        let die = Vec3::new(2.0, 0.1, 0.0);
        follower.resume(camera, die);

        let first = follower.update(die).unwrap();
        assert!(first.abs_diff_eq(camera, 1e-5));
    }

    #[test]
    fn test_residual_decays_to_zero() {
        let mut follower = follower();
        follower.resume(Vec3::new(5.0, 5.0, 5.0), Vec3::ZERO);
        let start = follower.residual.length();

        follower.update(Vec3::ZERO);
        assert!((follower.residual.length() - start * 0.95).abs() < 1e-4);

        for _ in 0..1000 {
            follower.update(Vec3::ZERO);
        }
        assert_eq!(follower.residual, Vec3::ZERO);
    }
}
