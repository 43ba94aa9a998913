//! Pick Control Systems
//!
//! Contains the systems that drain queued host input into the pick state
//! machine, keep the kinematic anchor on the pointer, and advance the state
//! machine after each physics step.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::ray::{drag_plane_hit, intersect_die, local_pivot, screen_ray};
use super::state::*;
use crate::dice3d::types::*;

/// Fraction of the edge length below which a held die is dropped
const FORCED_RELEASE_FRACTION: f32 = 0.25;

/// A held die reaches at most one body diagonal (in edge lengths) from the anchor
const ANCHOR_WALL_MARGIN: f32 = 1.75;

/// Tear down the pick joint and hand the camera back to the follower.
///
/// Returns false when there was nothing to release.
pub fn finish_drag(
    commands: &mut Commands,
    controller: &mut PickController,
    follower: &mut CameraFollower,
    camera_position: Vec3,
    die_position: Vec3,
) -> bool {
    let Some(constraint) = controller.release() else {
        return false;
    };
    commands.entity(constraint.anchor).despawn();
    follower.resume(camera_position, die_position);
    true
}

/// Apply everything the host queued since the last tick, in arrival order.
#[allow(clippy::too_many_arguments)]
pub fn drain_interaction_queue(
    mut commands: Commands,
    mut queue: ResMut<InteractionQueue>,
    mut controller: ResMut<PickController>,
    mut follower: ResMut<CameraFollower>,
    mut motion: ResMut<MotionInjector>,
    mut tracker: ResMut<StabilityTracker>,
    mut mapper: ResMut<FaceMapper>,
    settings: Res<SimulationSettings>,
    viewport: Res<PointerViewport>,
    mut dice: Query<(Entity, &Transform, &mut Velocity, &mut Sleeping), With<Die>>,
    cameras: Query<&Transform, (With<MainCamera>, Without<Die>)>,
) {
    let Ok((die_entity, die_transform, mut velocity, mut sleeping)) = dice.single_mut() else {
        if !queue.is_empty() {
            debug!("Dropping {} queued inputs: no die in the world", queue.len());
            queue.drain().for_each(drop);
        }
        return;
    };
    let camera = cameras.single().ok();

    for event in queue.drain() {
        match event {
            InteractionEvent::PointerDown(ndc) => {
                if controller.state() != PickState::Idle || !tracker.is_settled() {
                    debug!("Ignoring pick: die is not settled");
                    continue;
                }
                let Some(camera) = camera else {
                    continue;
                };
                let Some(hit) = screen_ray(camera, viewport.fov_y, viewport.aspect, ndc)
                    .and_then(|ray| intersect_die(ray, die_transform, settings.die.half_extent()))
                else {
                    continue;
                };

                let pivot = local_pivot(die_transform, hit);
                let anchor_transform = Transform::from_translation(hit);
                let joint = SphericalJointBuilder::new()
                    .local_anchor1(pivot)
                    .local_anchor2(Vec3::ZERO);
                let anchor = commands
                    .spawn((
                        PickAnchor,
                        RigidBody::KinematicPositionBased,
                        anchor_transform,
                        GlobalTransform::from(anchor_transform),
                        ImpulseJoint::new(die_entity, joint),
                    ))
                    .id();

                let constraint = PickConstraint {
                    anchor,
                    pivot,
                    plane_origin: hit,
                    anchor_position: hit,
                };
                if controller.begin(constraint) {
                    follower.disengage();
                    sleeping.sleeping = false;
                    info!("Picked up die at {hit:?} (pivot {pivot:?})");
                } else {
                    commands.entity(anchor).despawn();
                }
            }
            InteractionEvent::PointerMove(ndc) => {
                let (Some(constraint), Some(camera)) = (controller.constraint().copied(), camera)
                else {
                    continue;
                };
                let target = screen_ray(camera, viewport.fov_y, viewport.aspect, ndc)
                    .and_then(|ray| drag_plane_hit(ray, constraint.plane_origin, camera));
                if let Some(target) = target {
                    let margin = settings.die.edge_length * ANCHOR_WALL_MARGIN;
                    controller.drag_to(settings.arena.clamp_inside(target, margin));
                }
            }
            InteractionEvent::PointerUp(_) => {
                let camera_position = camera.map_or(die_transform.translation, |c| c.translation);
                if finish_drag(
                    &mut commands,
                    &mut controller,
                    &mut follower,
                    camera_position,
                    die_transform.translation,
                ) {
                    info!("Released die at {:?}", die_transform.translation);
                }
            }
            InteractionEvent::DeviceMotion(acceleration) => {
                motion.accumulate(acceleration);
            }
            InteractionEvent::Throw { linvel, angvel } => {
                if controller.is_dragging() {
                    debug!("Ignoring throw while the die is held");
                    continue;
                }
                velocity.linvel = linvel;
                velocity.angvel = angvel;
                sleeping.sleeping = false;
                // A toss starts a new settle even if the die never leaves the floor
                tracker.clear();
                mapper.rearm();
            }
        }
    }

    let delta = motion.take();
    if delta != Vec3::ZERO {
        velocity.linvel += delta;
    }
}

/// Move the kinematic anchor to where the pointer wants it and wake the die
/// so the joint is solved again.
pub fn sync_pick_anchor(
    controller: Res<PickController>,
    mut anchors: Query<(&mut Transform, &mut GlobalTransform), With<PickAnchor>>,
    mut dice: Query<&mut Sleeping, With<Die>>,
) {
    let Some(constraint) = controller.constraint() else {
        return;
    };
    let Ok((mut transform, mut global)) = anchors.get_mut(constraint.anchor) else {
        return;
    };
    if transform.translation == constraint.anchor_position {
        return;
    }

    transform.translation = constraint.anchor_position;
    *global = GlobalTransform::from(*transform);
    for mut sleeping in &mut dice {
        sleeping.sleeping = false;
    }
}

/// Post-step transitions: forced release of a sunken die, Released -> Idle.
pub fn advance_pick_state(
    mut commands: Commands,
    mut controller: ResMut<PickController>,
    mut follower: ResMut<CameraFollower>,
    tracker: Res<StabilityTracker>,
    settings: Res<SimulationSettings>,
    pose: Res<DiePose>,
    cameras: Query<&Transform, With<MainCamera>>,
) {
    match controller.state() {
        PickState::Dragging => {
            if pose.elevation >= settings.die.edge_length * FORCED_RELEASE_FRACTION {
                return;
            }
            let die_position = pose.pose.position;
            let camera_position = cameras
                .single()
                .map_or(die_position, |camera| camera.translation);
            if finish_drag(
                &mut commands,
                &mut controller,
                &mut follower,
                camera_position,
                die_position,
            ) {
                info!(
                    "Forced release: die sank to {:.3} above the floor",
                    pose.elevation
                );
            }
        }
        PickState::Released => {
            if tracker.is_settled() && controller.settle() {
                debug!("Die settled after release");
            }
        }
        PickState::Idle => {}
    }
}
