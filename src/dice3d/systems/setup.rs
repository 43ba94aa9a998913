//! Scene setup system
//!
//! Spawns the physical scene: the die, the floor and wall planes, and the
//! camera entity the follower moves. Nothing here needs a renderer, so the
//! same setup runs headless and in the windowed app.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::types::*;

/// Restitution and friction of the floor and walls
const BOUNDARY_RESTITUTION: f32 = 0.2;
const BOUNDARY_FRICTION: f32 = 0.8;

/// Main setup system - spawns the die, boundaries and camera
pub fn setup_scene(
    mut commands: Commands,
    settings: Res<SimulationSettings>,
    mut follower: ResMut<CameraFollower>,
) {
    spawn_die(&mut commands, &settings);

    let floor = Vec3::new(0.0, settings.arena.floor_height, 0.0);
    let reach = settings.arena.wall_half_extent;
    spawn_boundary(&mut commands, floor, Vec3::Y);
    for normal in [Vec3::X, Vec3::NEG_X, Vec3::Z, Vec3::NEG_Z] {
        // Each wall's normal points back toward the origin
        spawn_boundary(&mut commands, floor - normal * reach, normal);
    }

    // Camera starts on its follow position so the first frame does not jump
    let die_position = Vec3::from_array(settings.die.start_position);
    follower.reset();
    let camera_position = die_position + follower.target_offset;
    let camera = follower.camera_transform(camera_position, die_position);
    commands.spawn((MainCamera, camera, GlobalTransform::from(camera)));

    info!(
        "Scene ready: die edge {} at {:?}, walls at +-{}",
        settings.die.edge_length, die_position, reach
    );
}

/// Spawn the die body at its start pose.
pub fn spawn_die(commands: &mut Commands, settings: &SimulationSettings) -> Entity {
    let die = &settings.die;
    let half = die.half_extent();
    let transform = die.start_transform();

    commands
        .spawn((
            Die,
            RigidBody::Dynamic,
            Collider::cuboid(half, half, half),
            Velocity::zero(),
            Damping {
                linear_damping: 0.0,
                angular_damping: die.angular_damping,
            },
            Restitution {
                coefficient: die.restitution,
                combine_rule: CoefficientCombineRule::Min,
            },
            Friction::coefficient(die.friction),
            ColliderMassProperties::Density(die.density()),
            Ccd::enabled(),
            Sleeping::default(),
            transform,
            GlobalTransform::from(transform),
        ))
        .id()
}

/// Spawn a static plane through `point`; the solid side lies opposite `normal`.
fn spawn_boundary(commands: &mut Commands, point: Vec3, normal: Vec3) {
    let Some(collider) = Collider::halfspace(normal) else {
        warn!("Skipping boundary with degenerate normal {normal:?}");
        return;
    };
    let transform = Transform::from_translation(point);
    commands.spawn((
        Boundary,
        RigidBody::Fixed,
        collider,
        Restitution::coefficient(BOUNDARY_RESTITUTION),
        Friction::coefficient(BOUNDARY_FRICTION),
        transform,
        GlobalTransform::from(transform),
    ));
}
