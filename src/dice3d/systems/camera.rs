//! Camera control systems

use bevy::prelude::*;

use crate::dice3d::types::*;

/// System to keep the camera framed on the die while following
pub fn follow_die_camera(
    mut follower: ResMut<CameraFollower>,
    die_pose: Res<DiePose>,
    mut cameras: Query<(&mut Transform, &mut GlobalTransform), With<MainCamera>>,
) {
    let die_position = die_pose.pose.position;
    let Some(camera_position) = follower.update(die_position) else {
        return;
    };

    for (mut transform, mut global) in cameras.iter_mut() {
        *transform = follower.camera_transform(camera_position, die_position);
        *global = GlobalTransform::from(*transform);
    }
}
