//! Render collection: turns the scene into an ordered draw list.
//!
//! # Invariants
//! - The collector never mutates the scene.
//! - Hidden, destroyed, and non-resident renderables never reach a backend.
//! - Submission never blocks; a full backend queue costs the frame its tail.

mod backend;
mod camera;
mod collector;
mod frustum;

pub use backend::{DebugTextBackend, RenderBackend, SubmitError};
pub use camera::Camera;
pub use collector::{
    CollectStats, DrawItem, DrawList, RenderCollector, SortKey, SubmitOutcome, visible,
};
pub use frustum::Frustum;

pub fn crate_info() -> &'static str {
    "framecore-render v0.1.0"
}
