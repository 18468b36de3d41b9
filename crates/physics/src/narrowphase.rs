//! Exact contact tests for the supported shape pairs.

use framecore_common::Transform;
use framecore_scene::CollisionShape;
use glam::Vec3;

/// Contact between bodies `a` and `b`. `normal` points from `a` toward `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: usize,
    pub b: usize,
    pub normal: Vec3,
    pub depth: f32,
    /// World-space point midway between the two surfaces.
    pub point: Vec3,
}

/// Result of a shape-pair test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Points from the first shape toward the second.
    pub normal: Vec3,
    pub depth: f32,
    pub point: Vec3,
}

impl Hit {
    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// A shape placed in the world, with its scale folded in.
#[derive(Debug, Clone, Copy)]
pub enum WorldShape {
    Sphere { center: Vec3, radius: f32 },
    Box { transform: Transform, half_extents: Vec3 },
}

impl WorldShape {
    pub fn new(shape: &CollisionShape, transform: &Transform) -> Self {
        match *shape {
            CollisionShape::Sphere { radius } => Self::Sphere {
                center: transform.position,
                radius: radius.abs() * transform.scale.abs().max_element(),
            },
            CollisionShape::Box { half_extents } => Self::Box {
                transform: *transform,
                half_extents: half_extents.abs() * transform.scale.abs(),
            },
        }
    }
}

/// Returns the contact when the shapes overlap.
pub fn collide(a: &WorldShape, b: &WorldShape) -> Option<Hit> {
    match (a, b) {
        (
            WorldShape::Sphere { center: ca, radius: ra },
            WorldShape::Sphere { center: cb, radius: rb },
        ) => sphere_sphere(*ca, *ra, *cb, *rb),
        (
            WorldShape::Sphere { center, radius },
            WorldShape::Box {
                transform,
                half_extents,
            },
        ) => sphere_box(*center, *radius, transform, *half_extents),
        (
            WorldShape::Box {
                transform,
                half_extents,
            },
            WorldShape::Sphere { center, radius },
        ) => sphere_box(*center, *radius, transform, *half_extents).map(Hit::flipped),
        (
            WorldShape::Box {
                transform: ta,
                half_extents: ha,
            },
            WorldShape::Box {
                transform: tb,
                half_extents: hb,
            },
        ) => box_box(ta, *ha, tb, *hb),
    }
}

pub fn sphere_sphere(pa: Vec3, ra: f32, pb: Vec3, rb: f32) -> Option<Hit> {
    let d = pb - pa;
    let dist2 = d.length_squared();
    let rsum = ra + rb;
    if dist2 >= rsum * rsum {
        return None;
    }
    let dist = dist2.sqrt();
    let normal = if dist > 1.0e-6 { d / dist } else { Vec3::Y };
    let depth = rsum - dist;
    Some(Hit {
        normal,
        depth,
        point: pa + normal * (ra - 0.5 * depth),
    })
}

/// Sphere against an oriented box. The normal points from the sphere into
/// the box.
pub fn sphere_box(center: Vec3, radius: f32, box_transform: &Transform, half: Vec3) -> Option<Hit> {
    let inv_rot = box_transform.rotation.inverse();
    let local = inv_rot * (center - box_transform.position);
    let clamped = local.clamp(-half, half);
    let offset = local - clamped;
    let dist = offset.length();

    let (normal, depth) = if dist > 1.0e-6 {
        if dist >= radius {
            return None;
        }
        // Box -> sphere in world space; flip for sphere -> box.
        let n = box_transform.rotation * (offset / dist);
        (-n, radius - dist)
    } else {
        // Center inside the box: push out through the nearest face.
        let gap = half - local.abs();
        let axis = if gap.x <= gap.y && gap.x <= gap.z {
            Vec3::X * local.x.signum()
        } else if gap.y <= gap.z {
            Vec3::Y * local.y.signum()
        } else {
            Vec3::Z * local.z.signum()
        };
        (-(box_transform.rotation * axis), radius + gap.min_element())
    };
    Some(Hit {
        normal,
        depth,
        point: center + normal * (radius - 0.5 * depth),
    })
}

/// Which separating axis produced the least penetration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feature {
    FaceA,
    FaceB,
    Edge,
}

/// Oriented box against oriented box by separating axes: the three face
/// normals of each box plus the nine edge cross products. The normal is the
/// axis of least penetration, pointing from `a` toward `b`.
pub fn box_box(ta: &Transform, ha: Vec3, tb: &Transform, hb: Vec3) -> Option<Hit> {
    let axes_a = box_axes(ta);
    let axes_b = box_axes(tb);
    let d = tb.position - ta.position;

    let mut best: Option<(Vec3, f32, Feature)> = None;
    let mut test = |axis: Vec3, feature: Feature| -> bool {
        let len2 = axis.length_squared();
        // Parallel edges give no axis.
        if len2 < 1.0e-8 {
            return true;
        }
        let axis = axis / len2.sqrt();
        let dist = d.dot(axis);
        let overlap = project(&axes_a, ha, axis) + project(&axes_b, hb, axis) - dist.abs();
        if overlap <= 0.0 {
            return false;
        }
        // Edge axes must clearly beat a face axis to win.
        let margin = if feature == Feature::Edge { 1.0e-4 } else { 0.0 };
        if best.is_none_or(|(_, depth, _)| overlap + margin < depth) {
            let normal = if dist < 0.0 { -axis } else { axis };
            best = Some((normal, overlap, feature));
        }
        true
    };

    for axis in axes_a {
        if !test(axis, Feature::FaceA) {
            return None;
        }
    }
    for axis in axes_b {
        if !test(axis, Feature::FaceB) {
            return None;
        }
    }
    for ea in axes_a {
        for eb in axes_b {
            if !test(ea.cross(eb), Feature::Edge) {
                return None;
            }
        }
    }

    let (normal, depth, feature) = best?;
    let deepest_b = support(tb, &axes_b, hb, -normal);
    let deepest_a = support(ta, &axes_a, ha, normal);
    let point = match feature {
        Feature::FaceA => deepest_b + normal * (0.5 * depth),
        Feature::FaceB => deepest_a - normal * (0.5 * depth),
        Feature::Edge => (deepest_a + deepest_b) * 0.5,
    };
    Some(Hit { normal, depth, point })
}

fn box_axes(t: &Transform) -> [Vec3; 3] {
    [t.rotation * Vec3::X, t.rotation * Vec3::Y, t.rotation * Vec3::Z]
}

/// Half-width of the box projected onto `axis`.
fn project(axes: &[Vec3; 3], half: Vec3, axis: Vec3) -> f32 {
    half.x * axes[0].dot(axis).abs() + half.y * axes[1].dot(axis).abs() + half.z * axes[2].dot(axis).abs()
}

/// Centre of the corners furthest along `dir`, within a small tolerance.
fn support(t: &Transform, axes: &[Vec3; 3], half: Vec3, dir: Vec3) -> Vec3 {
    let tolerance = 1.0e-3 * half.element_sum().max(1.0);
    let mut corners = [Vec3::ZERO; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
        let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
        let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
        *corner = t.position + axes[0] * (sx * half.x) + axes[1] * (sy * half.y) + axes[2] * (sz * half.z);
    }
    let reach = corners.iter().map(|c| c.dot(dir)).fold(f32::NEG_INFINITY, f32::max);
    let mut sum = Vec3::ZERO;
    let mut count = 0.0;
    for c in corners.iter().filter(|c| c.dot(dir) >= reach - tolerance) {
        sum += *c;
        count += 1.0;
    }
    sum / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn spheres_touching_apart() {
        assert!(sphere_sphere(Vec3::ZERO, 1.0, Vec3::new(2.5, 0.0, 0.0), 1.0).is_none());
        let hit = sphere_sphere(Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap();
        assert_eq!(hit.normal, Vec3::X);
        assert!((hit.depth - 0.5).abs() < 1e-6);
        assert!((hit.point - Vec3::new(0.75, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn sphere_resting_on_box_points_down() {
        let ground = Transform::default();
        let hit = sphere_box(Vec3::new(0.0, 1.4, 0.0), 0.5, &ground, Vec3::new(5.0, 1.0, 5.0)).unwrap();
        assert!((hit.normal - Vec3::NEG_Y).length() < 1e-6);
        assert!((hit.depth - 0.1).abs() < 1e-5);
        assert!((hit.point - Vec3::new(0.0, 0.95, 0.0)).length() < 1e-5);
    }

    #[test]
    fn sphere_against_rotated_box() {
        // Box rotated 45 degrees about Z: its corner points up along +Y.
        let tilted = Transform {
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
            ..Transform::default()
        };
        let corner_height = 2.0f32.sqrt();
        assert!(sphere_box(Vec3::new(0.0, corner_height + 0.6, 0.0), 0.5, &tilted, Vec3::ONE).is_none());
        let hit = sphere_box(Vec3::new(0.0, corner_height + 0.4, 0.0), 0.5, &tilted, Vec3::ONE).unwrap();
        assert!((hit.normal - Vec3::NEG_Y).length() < 1e-4);
    }

    #[test]
    fn sphere_center_inside_box_uses_nearest_face() {
        let hit = sphere_box(Vec3::new(0.0, 0.0, 0.9), 0.25, &Transform::default(), Vec3::ONE).unwrap();
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-6);
        assert!((hit.depth - 0.35).abs() < 1e-5);
    }

    #[test]
    fn box_box_least_penetration_axis() {
        let a = Transform::default();
        let b = Transform::from_position(Vec3::new(0.5, 1.8, 0.0));
        let hit = box_box(&a, Vec3::ONE, &b, Vec3::ONE).unwrap();
        assert!((hit.normal - Vec3::Y).length() < 1e-6);
        assert!((hit.depth - 0.2).abs() < 1e-5);
        let far = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        assert!(box_box(&a, Vec3::ONE, &far, Vec3::ONE).is_none());
    }

    #[test]
    fn box_on_slab_contacts_at_face_centre() {
        let slab = Transform::from_position(Vec3::new(0.0, -0.5, 0.0));
        let crate_box = Transform::from_position(Vec3::new(2.0, 0.45, 1.0));
        let hit = box_box(&slab, Vec3::new(20.0, 0.5, 20.0), &crate_box, Vec3::splat(0.5)).unwrap();
        assert!((hit.normal - Vec3::Y).length() < 1e-6);
        assert!((hit.depth - 0.05).abs() < 1e-5);
        assert!((hit.point - Vec3::new(2.0, -0.025, 1.0)).length() < 1e-4);
    }

    fn tilted_cube(center: Vec3) -> WorldShape {
        WorldShape::new(
            &CollisionShape::Box {
                half_extents: Vec3::splat(0.5),
            },
            &Transform {
                position: center,
                rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
                ..Transform::default()
            },
        )
    }

    #[test]
    fn rotated_boxes_with_overlapping_bounds_do_not_touch() {
        let shape = CollisionShape::Box {
            half_extents: Vec3::splat(0.5),
        };
        let rot = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let ta = Transform {
            rotation: rot,
            ..Transform::default()
        };
        let tb = Transform {
            position: Vec3::new(1.2, 1.2, 0.0),
            rotation: rot,
            ..Transform::default()
        };
        assert!(shape.world_aabb(&ta).overlaps(&shape.world_aabb(&tb)));
        assert!(collide(&tilted_cube(Vec3::ZERO), &tilted_cube(Vec3::new(1.2, 1.2, 0.0))).is_none());
    }

    #[test]
    fn rotated_boxes_touch_along_face_normal() {
        let hit = collide(&tilted_cube(Vec3::ZERO), &tilted_cube(Vec3::new(0.6, 0.6, 0.0))).unwrap();
        let face = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((hit.normal - face).length() < 1e-4);
        assert!((hit.depth - (1.0 - 0.6 * 2.0f32.sqrt())).abs() < 1e-4);
    }

    #[test]
    fn collide_flips_box_sphere_normal() {
        let ball = WorldShape::new(
            &CollisionShape::Sphere { radius: 0.5 },
            &Transform::from_position(Vec3::new(0.0, 1.4, 0.0)),
        );
        let slab = WorldShape::new(
            &CollisionShape::Box {
                half_extents: Vec3::ONE,
            },
            &Transform::default(),
        );
        let sb = collide(&ball, &slab).unwrap();
        let bs = collide(&slab, &ball).unwrap();
        assert_eq!(sb.normal, -bs.normal);
        assert_eq!(sb.point, bs.point);
        assert!((bs.normal - Vec3::Y).length() < 1e-6);
    }
}
