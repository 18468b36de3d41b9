use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Below this length a quaternion is treated as degenerate and replaced by identity.
const MIN_ROTATION_LENGTH: f32 = 1.0e-6;

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }

    /// True when every scale component is finite and strictly positive.
    pub fn has_positive_scale(&self) -> bool {
        self.scale.is_finite() && self.scale.cmpgt(Vec3::ZERO).all()
    }

    /// Copy of this transform with a unit-length rotation.
    pub fn normalized(mut self) -> Self {
        let len = self.rotation.length();
        self.rotation = if len.is_finite() && len > MIN_ROTATION_LENGTH {
            self.rotation / len
        } else {
            Quat::IDENTITY
        };
        self
    }

    /// Model matrix (scale, then rotate, then translate).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (local * self.scale)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let h = half_extents.abs();
        Self {
            min: center - h,
            max: center + h,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// World-space box enclosing this local box after `transform`.
    ///
    /// Uses the absolute rotation matrix, so the result is tight for the
    /// box's own orientation and conservative otherwise.
    pub fn transformed(&self, transform: &Transform) -> Aabb {
        let center = transform.transform_point(self.center());
        let rot = Mat3::from_quat(transform.rotation);
        let abs = Mat3::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
        let half = abs * (self.half_extents() * transform.scale.abs());
        Aabb::from_center_half_extents(center, half)
    }

    /// Slab test. Returns the entry distance along `dir` if the ray hits
    /// within `max_dist`; a ray starting inside reports 0.
    pub fn ray_intersection(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = max_dist;
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            if d.abs() < f32::EPSILON {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Local-space bounding volume attached to renderables, used for culling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundingVolume {
    Sphere { center: Vec3, radius: f32 },
    Box(Aabb),
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self::Box(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)))
    }
}

impl BoundingVolume {
    /// World-space box enclosing the volume under `transform`.
    pub fn world_aabb(&self, transform: &Transform) -> Aabb {
        match self {
            Self::Sphere { center, radius } => {
                let c = transform.transform_point(*center);
                let r = radius.abs() * transform.scale.abs().max_element();
                Aabb::from_center_half_extents(c, Vec3::splat(r))
            }
            Self::Box(aabb) => aabb.transformed(transform),
        }
    }
}
