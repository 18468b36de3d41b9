use framecore_common::Transform;
use framecore_scene::{CollisionShape, Entity, RigidBodyState, SceneStore};
use glam::Vec3;

/// Closest body along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub distance: f32,
    pub point: Vec3,
}

/// Cast a ray against every enabled rigid body. Spheres are tested exactly,
/// boxes by their world bounds. Ties go to the lower slot.
pub fn raycast(scene: &SceneStore, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<RayHit> {
    let dir = dir.try_normalize()?;
    if !(origin.is_finite() && max_dist >= 0.0) {
        return None;
    }
    let mut best: Option<RayHit> = None;
    for (entity, body) in scene.iter::<RigidBodyState>() {
        if body.is_disabled() {
            continue;
        }
        let Some(transform) = scene.get::<Transform>(entity) else {
            continue;
        };
        let limit = best.map_or(max_dist, |hit| hit.distance);
        let distance = match body.shape {
            CollisionShape::Sphere { radius } => {
                let r = radius * transform.scale.abs().max_element();
                ray_sphere(origin, dir, transform.position, r, limit)
            }
            CollisionShape::Box { .. } => body
                .shape
                .world_aabb(transform)
                .ray_intersection(origin, dir, limit),
        };
        if let Some(distance) = distance {
            if best.is_none_or(|hit| distance < hit.distance) {
                best = Some(RayHit {
                    entity,
                    distance,
                    point: origin + dir * distance,
                });
            }
        }
    }
    best
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32, max_dist: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let disc = b * b - c;
    if b > 0.0 || disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t <= max_dist).then_some(t)
}
