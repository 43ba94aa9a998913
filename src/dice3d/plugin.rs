//! Bevy plugins wiring the die simulation into an `App`
//!
//! [`DiceSimulationPlugin`] carries everything the simulation needs and runs
//! headless. [`DiceRenderPlugin`] adds meshes, lights and input forwarding on
//! top of it for the windowed app.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::pick_control::*;
use crate::dice3d::systems::rendering::{
    decorate_scene, forward_pointer_input, handle_keyboard, update_face_text,
};
use crate::dice3d::systems::*;
use crate::dice3d::types::*;

/// Ordering of the per-frame die systems around the Rapier step
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DieSystems {
    /// `Update`: reset, host input, anchor pose
    Input,
    /// `PostUpdate`, after Rapier writeback: pose, stability, pick state, face, camera
    Readout,
}

/// Core simulation: physics world, pick control, face read-out, camera follow
pub struct DiceSimulationPlugin {
    pub settings: SimulationSettings,
}

impl DiceSimulationPlugin {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }
}

impl Plugin for DiceSimulationPlugin {
    fn build(&self, app: &mut App) {
        let settings = self.settings.clone();

        if !app.is_plugin_added::<RapierPhysicsPlugin<NoUserData>>() {
            app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
        }

        let start = settings.die.start_transform();
        app.insert_resource(TimestepMode::Fixed {
            dt: settings.physics.timestep,
            substeps: 1,
        })
        .insert_resource(StabilityTracker::new(settings.die.edge_length))
        .insert_resource(FaceMapper::new(&settings))
        .insert_resource(CameraFollower::new(&settings.camera))
        .insert_resource(MotionInjector::new(&settings.motion))
        .insert_resource(PointerViewport::new(&settings.camera))
        .insert_resource(DiePose {
            pose: Pose::from_transform(&start),
            elevation: settings.elevation_of(start.translation),
            ..default()
        })
        .init_resource::<PickController>()
        .init_resource::<InteractionQueue>()
        .insert_resource(settings)
        .add_message::<FaceChanged>()
        .configure_sets(Update, DieSystems::Input)
        .configure_sets(PostUpdate, DieSystems::Readout.after(PhysicsSet::Writeback))
        .add_systems(Startup, setup_scene.run_if(not(any_with_component::<Die>)))
        .add_systems(
            Update,
            (
                apply_gravity,
                apply_die_reset,
                drain_interaction_queue,
                sync_pick_anchor,
            )
                .chain()
                .in_set(DieSystems::Input),
        )
        .add_systems(
            PostUpdate,
            (
                sync_die_pose,
                track_stability,
                advance_pick_state,
                resolve_face,
                notify_face_listeners,
                follow_die_camera,
            )
                .chain()
                .in_set(DieSystems::Readout),
        );
    }
}

/// Windowed decoration and input forwarding
pub struct DiceRenderPlugin;

impl Plugin for DiceRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, decorate_scene.after(setup_scene))
            .add_systems(
                Update,
                (forward_pointer_input, handle_keyboard).before(DieSystems::Input),
            )
            .add_systems(PostUpdate, update_face_text.after(DieSystems::Readout));
    }
}
