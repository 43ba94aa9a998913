//! Rendering and input forwarding for the windowed front end
//!
//! Decorates the physical scene with meshes, lights and a face read-out, and
//! turns mouse, touch and keyboard input into interaction events.

use bevy::input::touch::Touches;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::dice3d::pick_control::{InteractionEvent, InteractionQueue};
use crate::dice3d::simulation::ThrowParams;
use crate::dice3d::types::*;

/// Throw strength used by the space bar
const KEY_THROW_STRENGTH: f32 = 3.0;
/// Acceleration sample sent per frame while an arrow key is held
const KEY_MOTION_ACCELERATION: f32 = 15.0;

/// Marker for the face read-out text
#[derive(Component)]
pub struct FaceText;

/// Pip positions on a face, in quarter-edge units of the face's two tangents
fn pip_layout(count: u8) -> &'static [(f32, f32)] {
    match count {
        1 => &[(0.0, 0.0)],
        2 => &[(-1.0, -1.0), (1.0, 1.0)],
        3 => &[(-1.0, -1.0), (0.0, 0.0), (1.0, 1.0)],
        4 => &[(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)],
        5 => &[(-1.0, -1.0), (-1.0, 1.0), (0.0, 0.0), (1.0, -1.0), (1.0, 1.0)],
        6 => &[
            (-1.0, -1.0),
            (-1.0, 0.0),
            (-1.0, 1.0),
            (1.0, -1.0),
            (1.0, 0.0),
            (1.0, 1.0),
        ],
        _ => &[],
    }
}

/// Turn the camera entity into a real camera and add meshes and lights.
pub fn decorate_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<SimulationSettings>,
    cameras: Query<Entity, With<MainCamera>>,
    dice: Query<Entity, With<Die>>,
) {
    for camera in &cameras {
        commands.entity(camera).insert((
            Camera3d::default(),
            Projection::from(PerspectiveProjection {
                fov: settings.camera.fov_degrees.to_radians(),
                ..default()
            }),
        ));
    }

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(5.0, 10.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        PointLight {
            intensity: 200_000.0,
            ..default()
        },
        Transform::from_xyz(-2.0, 4.0, 2.0),
    ));

    let size = settings.arena.wall_half_extent * 2.0;
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(size, size))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.25, 0.35, 0.3),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::from_xyz(0.0, settings.arena.floor_height, 0.0),
    ));

    let edge = settings.die.edge_length;
    let die_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.95, 0.95, 0.92),
        perceptual_roughness: 0.4,
        ..default()
    });
    let pip_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.05, 0.05, 0.05),
        unlit: true,
        ..default()
    });
    let pip_mesh = meshes.add(Sphere::new(edge * 0.08));
    let die_mesh = meshes.add(Cuboid::new(edge, edge, edge));

    for die in &dice {
        commands
            .entity(die)
            .insert((Mesh3d(die_mesh.clone()), MeshMaterial3d(die_material.clone())))
            .with_children(|parent| {
                for axis in FaceAxis::ALL {
                    let Some(label) = settings.die.face_table.label(axis) else {
                        continue;
                    };
                    let normal = axis.unit();
                    let u = if normal.x.abs() > 0.5 { Vec3::Z } else { Vec3::X };
                    let v = normal.cross(u);
                    for (a, b) in pip_layout(label.value()) {
                        let offset = normal * (edge * 0.47) + (u * *a + v * *b) * (edge * 0.25);
                        parent.spawn((
                            Mesh3d(pip_mesh.clone()),
                            MeshMaterial3d(pip_material.clone()),
                            Transform::from_translation(offset),
                        ));
                    }
                }
            });
    }

    commands.spawn((
        Text::new("Face: -"),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        FaceText,
    ));
    commands.spawn((
        Text::new("Drag the die to pick it up | R: reset | Space: throw | Arrows: shake"),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
    ));
}

/// Window cursor position to normalized device coordinates (y up)
fn to_ndc(window: &Window, cursor: Vec2) -> Vec2 {
    Vec2::new(
        cursor.x / window.width() * 2.0 - 1.0,
        1.0 - cursor.y / window.height() * 2.0,
    )
}

/// Forward mouse and touch input as pointer events
pub fn forward_pointer_input(
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<PointerViewport>,
    mut queue: ResMut<InteractionQueue>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    if window.height() > 0.0 {
        let aspect = window.width() / window.height();
        if viewport.aspect != aspect {
            viewport.aspect = aspect;
        }
    }

    if let Some(cursor) = window.cursor_position() {
        let ndc = to_ndc(window, cursor);
        if mouse.just_pressed(MouseButton::Left) {
            queue.push(InteractionEvent::PointerDown(ndc));
        } else if mouse.pressed(MouseButton::Left) {
            queue.push(InteractionEvent::PointerMove(ndc));
        }
        if mouse.just_released(MouseButton::Left) {
            queue.push(InteractionEvent::PointerUp(ndc));
        }
    } else if mouse.just_released(MouseButton::Left) {
        // Released outside the window
        queue.push(InteractionEvent::PointerUp(Vec2::ZERO));
    }

    for touch in touches.iter_just_pressed() {
        queue.push(InteractionEvent::PointerDown(to_ndc(window, touch.position())));
    }
    for touch in touches.iter() {
        if touch.delta() != Vec2::ZERO {
            queue.push(InteractionEvent::PointerMove(to_ndc(window, touch.position())));
        }
    }
    for touch in touches.iter_just_released() {
        queue.push(InteractionEvent::PointerUp(to_ndc(window, touch.position())));
    }
}

/// Keyboard shortcuts: reset, throw, and simulated device motion
pub fn handle_keyboard(keyboard: Res<ButtonInput<KeyCode>>, mut queue: ResMut<InteractionQueue>) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        queue.request_reset();
    }

    if keyboard.just_pressed(KeyCode::Space) {
        let throw = ThrowParams::random(&mut rand::thread_rng(), KEY_THROW_STRENGTH);
        queue.push(InteractionEvent::Throw {
            linvel: throw.linvel,
            angvel: throw.angvel,
        });
    }

    let mut acceleration = Vec3::ZERO;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        acceleration.x -= KEY_MOTION_ACCELERATION;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        acceleration.x += KEY_MOTION_ACCELERATION;
    }
    if keyboard.pressed(KeyCode::ArrowUp) {
        acceleration.z -= KEY_MOTION_ACCELERATION;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        acceleration.z += KEY_MOTION_ACCELERATION;
    }
    if acceleration != Vec3::ZERO {
        queue.push(InteractionEvent::DeviceMotion(acceleration));
    }
}

/// Show the current face
pub fn update_face_text(
    mut face_changed: MessageReader<FaceChanged>,
    mut texts: Query<&mut Text, With<FaceText>>,
) {
    let Some(FaceChanged(face)) = face_changed.read().last().copied() else {
        return;
    };
    let label = face.map_or_else(|| "-".to_string(), |label| label.to_string());
    for mut text in &mut texts {
        text.0 = format!("Face: {label}");
    }
}
