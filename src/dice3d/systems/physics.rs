//! Simulation driver systems
//!
//! Rapier advances the world by one fixed step per frame. These systems keep
//! the engine configured, copy the die pose out after each step with its
//! orientation renormalized, feed the stability tracker, and restore the
//! start pose on reset.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::pick_control::{InteractionQueue, PickController};
use crate::dice3d::types::*;

/// Keep Rapier's gravity in line with the settings resource.
pub fn apply_gravity(
    settings: Res<SimulationSettings>,
    mut configs: Query<&mut RapierConfiguration>,
) {
    let gravity = settings.gravity();
    for mut config in &mut configs {
        if config.gravity != gravity {
            config.gravity = gravity;
        }
    }
}

/// Put the die back at its start pose with zero velocity, dropping any pick
/// constraint and all stability history.
#[allow(clippy::too_many_arguments)]
pub fn apply_die_reset(
    mut commands: Commands,
    mut queue: ResMut<InteractionQueue>,
    settings: Res<SimulationSettings>,
    mut controller: ResMut<PickController>,
    mut tracker: ResMut<StabilityTracker>,
    mut follower: ResMut<CameraFollower>,
    mut motion: ResMut<MotionInjector>,
    mut mapper: ResMut<FaceMapper>,
    mut die_pose: ResMut<DiePose>,
    mut face_changed: MessageWriter<FaceChanged>,
    mut dice: Query<
        (&mut Transform, &mut GlobalTransform, &mut Velocity, &mut Sleeping),
        With<Die>,
    >,
) {
    if !queue.take_reset() {
        return;
    }

    if let Some(constraint) = controller.cancel() {
        commands.entity(constraint.anchor).despawn();
    }
    tracker.clear();
    follower.reset();
    motion.clear();
    if mapper.current().is_some() {
        face_changed.write(FaceChanged(None));
    }
    mapper.clear();

    let start = settings.die.start_transform();
    for (mut transform, mut global, mut velocity, mut sleeping) in &mut dice {
        *transform = start;
        *global = GlobalTransform::from(start);
        *velocity = Velocity::zero();
        sleeping.sleeping = false;
    }
    *die_pose = DiePose {
        pose: Pose::from_transform(&start),
        linvel: Vec3::ZERO,
        angvel: Vec3::ZERO,
        elevation: settings.elevation_of(start.translation),
    };
    info!("Die reset to {:?}", start.translation);
}

/// Copy the stepped die pose out, renormalizing its orientation.
///
/// Only the reported copy is corrected. Rapier keeps its own rotation at unit
/// length while integrating, so the body itself is never written to here and
/// a resting die is not woken up by the correction.
pub fn sync_die_pose(
    settings: Res<SimulationSettings>,
    mut die_pose: ResMut<DiePose>,
    mut dice: Query<(&mut Transform, &Velocity), With<Die>>,
) {
    let Ok((mut transform, velocity)) = dice.single_mut() else {
        return;
    };

    let rotation = settings.physics.quat_normalization.apply(transform.rotation);
    // Rapier already owns this pose; writing it back must not read as a teleport.
    transform.bypass_change_detection().rotation = rotation;

    *die_pose = DiePose {
        pose: Pose {
            position: transform.translation,
            orientation: rotation,
        },
        linvel: velocity.linvel,
        angvel: velocity.angvel,
        elevation: settings.elevation_of(transform.translation),
    };
}

/// Feed the post-step velocity into the settlement detector.
pub fn track_stability(die_pose: Res<DiePose>, mut tracker: ResMut<StabilityTracker>) {
    let before = tracker.stability();
    let after = tracker.record(die_pose.linvel, die_pose.elevation);
    if before != after {
        debug!("Die stability changed: {before:?} -> {after:?}");
    }
}
