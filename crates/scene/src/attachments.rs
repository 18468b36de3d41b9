//! Attachment kinds that can hang off an entity.
//!
//! Entities are bare handles; all data and behavior lives in one table per
//! attachment kind, queried by the systems that need it.

use framecore_common::{
    Aabb, AudioClip, BoundingVolume, MaterialResource, MeshResource, PlaybackHandle, Transform,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Discriminant for attachment tables, recorded in scene events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentKind {
    Transform,
    RigidBody,
    Renderable,
    SoundEmitter,
}

/// How the physics integrator treats a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Integrated under forces and contacts.
    #[default]
    Dynamic,
    /// Moved by external logic; pushes dynamic bodies but is never pushed.
    Kinematic,
    /// Never moves.
    Static,
}

/// Activation state of a rigid body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    #[default]
    Active,
    /// Skipped by the integrator until woken by a contact or an impulse.
    Sleeping,
    /// Forced off after degenerate state; never integrated again.
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

impl CollisionShape {
    /// Local-space bounds, before the entity's scale.
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Self::Sphere { radius } => Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(*radius)),
            Self::Box { half_extents } => Aabb::from_center_half_extents(Vec3::ZERO, *half_extents),
        }
    }

    /// World-space bounds under `transform`.
    pub fn world_aabb(&self, transform: &Transform) -> Aabb {
        match self {
            Self::Sphere { radius } => BoundingVolume::Sphere {
                center: Vec3::ZERO,
                radius: *radius,
            }
            .world_aabb(transform),
            Self::Box { .. } => self.local_aabb().transformed(transform),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub inverse_mass: f32,
    /// Diagonal of the inverse inertia tensor, body frame.
    pub inverse_inertia: Vec3,
}

impl MassProperties {
    /// Infinite mass: immovable by impulses.
    pub const INFINITE: Self = Self {
        mass: 0.0,
        inverse_mass: 0.0,
        inverse_inertia: Vec3::ZERO,
    };

    /// Solid sphere or box of uniform density. Non-positive mass yields
    /// infinite mass.
    pub fn from_shape(shape: &CollisionShape, mass: f32) -> Self {
        if !(mass.is_finite() && mass > 0.0) {
            return Self::INFINITE;
        }
        let inertia = match shape {
            CollisionShape::Sphere { radius } => Vec3::splat(0.4 * mass * radius * radius),
            CollisionShape::Box { half_extents } => {
                let d = *half_extents * 2.0;
                let (x2, y2, z2) = (d.x * d.x, d.y * d.y, d.z * d.z);
                Vec3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 12.0)
            }
        };
        let inverse_inertia = Vec3::select(inertia.cmpgt(Vec3::ZERO), inertia.recip(), Vec3::ZERO);
        Self {
            mass,
            inverse_mass: 1.0 / mass,
            inverse_inertia,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    pub restitution: f32,
    pub friction: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.5,
        }
    }
}

/// Rigid body simulation state for an entity that opts into physics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyState {
    pub kind: BodyKind,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: MassProperties,
    pub shape: CollisionShape,
    pub material: PhysicsMaterial,
    pub activation: Activation,
    /// Force accumulated since the last sub-step; cleared after each one.
    pub force: Vec3,
    /// Impulse accumulated since the last sub-step; cleared after each one.
    pub impulse: Vec3,
    /// Consecutive sub-steps spent below the sleep thresholds.
    pub rest_steps: u32,
}

impl RigidBodyState {
    pub fn dynamic(shape: CollisionShape, mass: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: MassProperties::from_shape(&shape, mass),
            shape,
            material: PhysicsMaterial::default(),
            activation: Activation::Active,
            force: Vec3::ZERO,
            impulse: Vec3::ZERO,
            rest_steps: 0,
        }
    }

    pub fn kinematic(shape: CollisionShape) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            mass: MassProperties::INFINITE,
            ..Self::dynamic(shape, 0.0)
        }
    }

    /// A body that never moves (`static` is a keyword).
    pub fn fixed(shape: CollisionShape) -> Self {
        Self {
            kind: BodyKind::Static,
            mass: MassProperties::INFINITE,
            ..Self::dynamic(shape, 0.0)
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn is_active(&self) -> bool {
        self.activation == Activation::Active
    }

    pub fn is_sleeping(&self) -> bool {
        self.activation == Activation::Sleeping
    }

    pub fn is_disabled(&self) -> bool {
        self.activation == Activation::Disabled
    }

    /// Queue an impulse for the next sub-step. Wakes a sleeping body.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.impulse += impulse;
        self.wake();
    }

    /// Accumulate a force for the next sub-step. Wakes a sleeping body.
    pub fn apply_force(&mut self, force: Vec3) {
        self.force += force;
        self.wake();
    }

    /// Return a sleeping body to the active set. Disabled bodies stay disabled.
    pub fn wake(&mut self) {
        if self.activation == Activation::Sleeping {
            self.activation = Activation::Active;
            self.rest_steps = 0;
        }
    }

    pub fn sleep(&mut self) {
        if self.activation == Activation::Active {
            self.activation = Activation::Sleeping;
            self.linear_velocity = Vec3::ZERO;
            self.angular_velocity = Vec3::ZERO;
        }
    }

    pub fn disable(&mut self) {
        self.activation = Activation::Disabled;
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.force = Vec3::ZERO;
        self.impulse = Vec3::ZERO;
    }

    pub fn has_finite_state(&self) -> bool {
        self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
            && self.force.is_finite()
            && self.impulse.is_finite()
    }
}

/// The previous and current transform of a physics-driven entity, kept for
/// exactly one fixed step so rendering can blend between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSnapshotPair {
    pub previous: Transform,
    pub current: Transform,
}

impl PhysicsSnapshotPair {
    pub fn new(transform: Transform) -> Self {
        Self {
            previous: transform,
            current: transform,
        }
    }

    /// Shift `current` into `previous` and record the newly integrated state.
    pub fn advance(&mut self, next: Transform) {
        self.previous = self.current;
        self.current = next;
    }
}

/// Renderable component: shared mesh and material plus culling data.
#[derive(Debug, Clone)]
pub struct RenderableAttachment {
    pub mesh: Arc<MeshResource>,
    pub material: Arc<MaterialResource>,
    pub visible: bool,
    /// Local-space bounds used for frustum culling.
    pub bounds: BoundingVolume,
}

impl RenderableAttachment {
    /// Visible renderable whose bounds are the mesh's own bounds.
    pub fn new(mesh: Arc<MeshResource>, material: Arc<MaterialResource>) -> Self {
        let bounds = BoundingVolume::Box(mesh.bounds);
        Self {
            mesh,
            material,
            visible: true,
            bounds,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingVolume) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Lifecycle of an emitter's voice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitterState {
    /// No voice yet; one is requested on the first audible frame.
    #[default]
    Pending,
    Playing,
    /// A non-looping clip ran to its end and its voice was released.
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundEmitter {
    pub clip: AudioClip,
    pub gain: f32,
    pub looping: bool,
    /// Positional audio; non-spatial emitters play at the listener.
    pub spatial: bool,
    /// Distance beyond which a spatial emitter is not audible.
    pub range: f32,
    pub playback: Option<PlaybackHandle>,
    /// Seconds played since the voice started.
    pub cursor: f32,
    pub state: EmitterState,
}

impl SoundEmitter {
    pub fn new(clip: AudioClip) -> Self {
        Self {
            clip,
            gain: 1.0,
            looping: false,
            spatial: true,
            range: f32::INFINITY,
            playback: None,
            cursor: 0.0,
            state: EmitterState::Pending,
        }
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn spatial(mut self, spatial: bool) -> Self {
        self.spatial = spatial;
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    /// Ask for the clip to play again from the start on the next update.
    /// Returns the live voice, which the caller must stop.
    #[must_use = "the returned voice is still playing"]
    pub fn restart(&mut self) -> Option<PlaybackHandle> {
        self.cursor = 0.0;
        self.state = EmitterState::Pending;
        self.playback.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_mass_properties() {
        let m = MassProperties::from_shape(&CollisionShape::Sphere { radius: 1.0 }, 2.0);
        assert_eq!(m.inverse_mass, 0.5);
        assert!((m.inverse_inertia.x - 1.0 / 0.8).abs() < 1e-6);
    }

    #[test]
    fn restart_hands_back_live_voice() {
        let mut em = SoundEmitter::new(AudioClip {
            handle: framecore_common::ClipHandle(1),
            duration: 1.0,
        });
        em.playback = Some(PlaybackHandle(5));
        em.state = EmitterState::Playing;
        em.cursor = 0.4;
        assert_eq!(em.restart(), Some(PlaybackHandle(5)));
        assert_eq!(em.playback, None);
        assert_eq!(em.state, EmitterState::Pending);
        assert_eq!(em.cursor, 0.0);
        assert_eq!(em.restart(), None);
    }

    #[test]
    fn zero_mass_is_infinite() {
        let m = MassProperties::from_shape(&CollisionShape::Sphere { radius: 1.0 }, 0.0);
        assert_eq!(m, MassProperties::INFINITE);
    }

    #[test]
    fn impulse_wakes_sleeping_body() {
        let mut body = RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0);
        body.linear_velocity = Vec3::X;
        body.sleep();
        assert!(body.is_sleeping());
        assert_eq!(body.linear_velocity, Vec3::ZERO);
        body.apply_impulse(Vec3::Y);
        assert!(body.is_active());
        assert_eq!(body.impulse, Vec3::Y);
    }

    #[test]
    fn disabled_body_does_not_wake() {
        let mut body = RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0);
        body.disable();
        body.apply_impulse(Vec3::Y);
        assert!(body.is_disabled());
    }

    #[test]
    fn static_and_kinematic_have_infinite_mass() {
        let shape = CollisionShape::Box {
            half_extents: Vec3::ONE,
        };
        assert_eq!(RigidBodyState::fixed(shape).mass.inverse_mass, 0.0);
        assert_eq!(RigidBodyState::kinematic(shape).kind, BodyKind::Kinematic);
    }

    #[test]
    fn snapshot_advance_shifts_current() {
        let a = Transform::default();
        let b = Transform::from_position(Vec3::X);
        let mut pair = PhysicsSnapshotPair::new(a);
        pair.advance(b);
        assert_eq!(pair.previous, a);
        assert_eq!(pair.current, b);
    }
}
