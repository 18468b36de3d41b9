//! Shared types for the framecore simulation core.
//!
//! # Invariants
//! - A `Transform` stored anywhere in the core has a unit rotation and a
//!   strictly positive, finite scale.
//! - Resource handles are opaque; only the asset system assigns them.

pub mod config;
pub mod fault;
pub mod resources;
pub mod types;

pub use config::{ConfigError, EngineConfig, SleepConfig};
pub use fault::Fault;
pub use resources::{
    AudioClip, BlendMode, ClipHandle, MaterialHandle, MaterialResource, MeshHandle, MeshResource,
    PlaybackHandle,
};
pub use types::{Aabb, BoundingVolume, Transform};

pub fn crate_info() -> &'static str {
    "framecore-common v0.1.0"
}
