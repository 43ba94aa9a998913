//! Die result systems
//!
//! This module contains the systems that read the upward face after each
//! step and hand changes to the host.

use bevy::prelude::*;

use crate::dice3d::pick_control::PickController;
use crate::dice3d::types::*;

/// System to determine the upward face and publish changes
pub fn resolve_face(
    mut mapper: ResMut<FaceMapper>,
    tracker: Res<StabilityTracker>,
    controller: Res<PickController>,
    die_pose: Res<DiePose>,
    mut face_changed: MessageWriter<FaceChanged>,
) {
    let die = die_pose.pose.to_transform();
    let Some(face) = mapper.update(
        tracker.stability(),
        controller.is_dragging(),
        &die,
        die_pose.elevation,
    ) else {
        return;
    };

    match face {
        Some(label) => info!("Die shows {label}"),
        None => debug!("Die face cleared"),
    }
    face_changed.write(FaceChanged(face));
}

/// Forward face changes to the host callback, if one is registered
pub fn notify_face_listeners(
    mut face_changed: MessageReader<FaceChanged>,
    mut listener: Option<ResMut<FaceListener>>,
) {
    for FaceChanged(face) in face_changed.read() {
        if let Some(listener) = listener.as_mut() {
            (listener.0)(*face);
        }
    }
}
