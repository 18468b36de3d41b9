use framecore_common::Aabb;
use glam::{Mat4, Vec3, Vec4};

/// Six clip planes extracted from a view-projection matrix.
///
/// Each plane is `(normal, d)` with the normal pointing into the frustum,
/// normalized so `dot(normal, p) + d` is a signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Plane extraction for a right-handed projection with depth in `[0, 1]`.
    pub fn from_view_projection(m: &Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(normalize_plane);
        Self { planes }
    }

    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// False only when the box lies entirely outside one plane. Boxes near
    /// frustum corners may pass; that is acceptable for culling.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let n = plane.truncate();
            // Corner furthest along the plane normal.
            let p = Vec3::select(n.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            n.dot(p) + plane.w >= 0.0
        })
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.truncate().dot(p) + plane.w >= 0.0)
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let len = plane.truncate().length();
    if len > f32::EPSILON { plane / len } else { plane }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;

    fn frustum() -> Frustum {
        let cam = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        Frustum::from_view_projection(&cam.view_projection())
    }

    fn cube(center: Vec3) -> Aabb {
        Aabb::from_center_half_extents(center, Vec3::splat(0.5))
    }

    #[test]
    fn box_in_front_is_inside() {
        assert!(frustum().intersects_aabb(&cube(Vec3::ZERO)));
        assert!(frustum().contains_point(Vec3::ZERO));
    }

    #[test]
    fn box_behind_camera_is_culled() {
        assert!(!frustum().intersects_aabb(&cube(Vec3::new(0.0, 0.0, 20.0))));
    }

    #[test]
    fn box_far_to_the_side_is_culled() {
        assert!(!frustum().intersects_aabb(&cube(Vec3::new(100.0, 0.0, 0.0))));
        assert!(!frustum().intersects_aabb(&cube(Vec3::new(0.0, -100.0, 0.0))));
    }

    #[test]
    fn box_beyond_far_plane_is_culled() {
        assert!(!frustum().intersects_aabb(&cube(Vec3::new(0.0, 0.0, -2000.0))));
    }

    #[test]
    fn box_straddling_a_plane_is_kept() {
        // Half-width of the view at distance 10 with a 60 degree fov and 16:9.
        let half_width = 10.0 * (30.0_f32.to_radians()).tan() * (16.0 / 9.0);
        let straddling = Aabb::from_center_half_extents(Vec3::new(half_width, 0.0, 0.0), Vec3::splat(1.0));
        assert!(frustum().intersects_aabb(&straddling));
    }

    #[test]
    fn planes_are_normalized() {
        for plane in frustum().planes() {
            assert!((plane.truncate().length() - 1.0).abs() < 1e-4);
        }
    }
}
