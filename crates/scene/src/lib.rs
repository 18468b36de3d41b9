//! Scene store for the framecore simulation core.
//!
//! # Invariants
//! - An [`Entity`] handle resolves only while its generation matches its
//!   slot; destroy bumps the generation before the slot is reused.
//! - Every structural mutation is recorded as a [`SceneEvent`].
//! - Only the simulation thread mutates the store; other threads go through
//!   the [`handoff`] queue.

pub mod attachments;
pub mod entity;
pub mod handoff;
pub mod interpolation;
pub mod store;

pub use attachments::{
    Activation, AttachmentKind, BodyKind, CollisionShape, EmitterState, MassProperties,
    PhysicsMaterial, PhysicsSnapshotPair, RenderableAttachment, RigidBodyState, SoundEmitter,
};
pub use entity::{Entity, EntityAllocator};
pub use handoff::{
    AnyAttachment, DrainReport, HandoffError, HandoffReceiver, HandoffSender, SceneCommand,
    handoff_channel,
};
pub use interpolation::{interpolate, render_transform};
pub use store::{Attachment, SceneError, SceneEvent, SceneStore};

pub fn crate_info() -> &'static str {
    "framecore-scene v0.1.0"
}
