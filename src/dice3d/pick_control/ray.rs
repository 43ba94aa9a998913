//! Pick Ray Geometry
//!
//! Screen-to-world rays, ray/die intersection, and the camera-facing drag
//! plane used while the die is held.

use bevy::math::bounding::{Aabb3d, RayCast3d};
use bevy::prelude::*;

/// Furthest distance a pick ray is tested against the die
const MAX_PICK_DISTANCE: f32 = 1000.0;

/// Cast a ray from the camera through a point given in normalized device
/// coordinates (x right, y up, both in [-1, 1]).
pub fn screen_ray(camera: &Transform, fov_y: f32, aspect: f32, ndc: Vec2) -> Option<Ray3d> {
    let half_height = (fov_y * 0.5).tan();
    let view_direction = Vec3::new(ndc.x * half_height * aspect, ndc.y * half_height, -1.0);
    let direction = Dir3::new(camera.rotation * view_direction).ok()?;
    Some(Ray3d::new(camera.translation, direction))
}

/// World point where the ray first enters the die's box, if it does.
pub fn intersect_die(ray: Ray3d, die: &Transform, half_extent: f32) -> Option<Vec3> {
    let inverse = die.rotation.inverse();
    let local_origin = inverse * (ray.origin - die.translation);
    let local_direction = Dir3::new(inverse * *ray.direction).ok()?;

    let cast = RayCast3d::from_ray(Ray3d::new(local_origin, local_direction), MAX_PICK_DISTANCE);
    let aabb = Aabb3d::new(Vec3::ZERO, Vec3::splat(half_extent));
    let distance = cast.aabb_intersection_at(&aabb)?;
    Some(ray.get_point(distance))
}

/// Express a world point in the die's body frame. This is the pivot the pick
/// joint holds on to for the rest of the drag.
pub fn local_pivot(die: &Transform, world_point: Vec3) -> Vec3 {
    die.rotation.inverse() * (world_point - die.translation)
}

/// Intersect the ray with the plane through `plane_origin` that faces the camera.
pub fn drag_plane_hit(ray: Ray3d, plane_origin: Vec3, camera: &Transform) -> Option<Vec3> {
    let plane = InfinitePlane3d { normal: camera.back() };
    let distance = ray.intersect_plane(plane_origin, plane)?;
    Some(ray.get_point(distance))
}

/// Project a world point back to normalized device coordinates. Front ends
/// and scripted drags use this to aim at a point on the die.
pub fn world_to_ndc(camera: &Transform, fov_y: f32, aspect: f32, point: Vec3) -> Option<Vec2> {
    let view = camera.rotation.inverse() * (point - camera.translation);
    if view.z >= 0.0 {
        return None;
    }
    let half_height = (fov_y * 0.5).tan();
    let depth = -view.z;
    Some(Vec2::new(
        view.x / (depth * half_height * aspect),
        view.y / (depth * half_height),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const FOV: f32 = 1.2;
    const ASPECT: f32 = 1.5;

    fn camera() -> Transform {
        Transform::from_xyz(0.0, 1.1, 1.0).looking_at(Vec3::new(0.0, 0.1, 0.0), Vec3::Y)
    }

    #[test]
    fn test_center_ray_points_forward() {
        let camera = camera();
        let ray = screen_ray(&camera, FOV, ASPECT, Vec2::ZERO).unwrap();
        assert!(ray.origin.abs_diff_eq(camera.translation, 1e-6));
        assert!((*ray.direction).abs_diff_eq(*camera.forward(), 1e-5));
    }

    #[test]
    fn test_ndc_round_trip() {
        let camera = camera();
        let point = Vec3::new(0.05, 0.15, -0.02);
        let ndc = world_to_ndc(&camera, FOV, ASPECT, point).unwrap();
        let ray = screen_ray(&camera, FOV, ASPECT, ndc).unwrap();
        let to_point = (point - ray.origin).normalize();
        assert!(to_point.abs_diff_eq(*ray.direction, 1e-4));
    }

    #[test]
    fn test_ray_hits_top_face() {
        let die = Transform::from_xyz(0.0, 0.1, 0.0);
        let ray = Ray3d::new(Vec3::new(0.02, 3.0, -0.03), Dir3::NEG_Y);
        let hit = intersect_die(ray, &die, 0.1).unwrap();
        assert!(hit.abs_diff_eq(Vec3::new(0.02, 0.2, -0.03), 1e-5));
    }

    #[test]
    fn test_ray_misses_die() {
        let die = Transform::from_xyz(0.0, 0.1, 0.0);
        let ray = Ray3d::new(Vec3::new(1.0, 3.0, 0.0), Dir3::NEG_Y);
        assert!(intersect_die(ray, &die, 0.1).is_none());
    }

    #[test]
    fn test_rotated_die_intersection_uses_body_frame() {
        // A 45 degree yaw widens the die's footprint along x to half * sqrt(2)
        let die = Transform::from_xyz(0.0, 0.1, 0.0)
            .with_rotation(Quat::from_rotation_y(FRAC_PI_2 * 0.5));
        let ray = Ray3d::new(Vec3::new(0.13, 3.0, 0.0), Dir3::NEG_Y);
        assert!(intersect_die(ray, &die, 0.1).is_some());

        let unrotated = Transform::from_xyz(0.0, 0.1, 0.0);
        assert!(intersect_die(ray, &unrotated, 0.1).is_none());
    }

    #[test]
    fn test_local_pivot_undoes_rotation() {
        let die = Transform::from_xyz(1.0, 0.1, 0.0).with_rotation(Quat::from_rotation_z(FRAC_PI_2));
        // World +y of the center is local +x after a quarter turn about z
        let pivot = local_pivot(&die, Vec3::new(1.0, 0.2, 0.0));
        assert!(pivot.abs_diff_eq(Vec3::new(0.1, 0.0, 0.0), 1e-6));
        assert!(die.transform_point(pivot).abs_diff_eq(Vec3::new(1.0, 0.2, 0.0), 1e-6));
    }

    #[test]
    fn test_drag_plane_faces_camera() {
        let camera = Transform::from_xyz(0.0, 0.2, 2.0).looking_at(Vec3::new(0.0, 0.2, 0.0), Vec3::Y);
        let origin = Vec3::new(0.0, 0.2, 0.0);

        // Aim one unit to the right of the grab point: the hit stays in the z = 0 plane
        let ray = Ray3d::new(camera.translation, Dir3::new(Vec3::new(1.0, 0.0, -2.0)).unwrap());
        let hit = drag_plane_hit(ray, origin, &camera).unwrap();
        assert!(hit.abs_diff_eq(Vec3::new(1.0, 0.2, 0.0), 1e-5));

        // A ray pointing away never meets the plane
        let away = Ray3d::new(camera.translation, Dir3::Z);
        assert!(drag_plane_hit(away, origin, &camera).is_none());
    }
}
