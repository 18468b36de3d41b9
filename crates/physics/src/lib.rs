//! Fixed-step rigid-body physics for the framecore scene.
//!
//! # Invariants
//! - Only [`PhysicsIntegrator::step`] writes transforms of dynamic bodies.
//! - Sleeping and disabled bodies are never written.
//! - Non-finite state never reaches the scene store.

pub mod broadphase;
pub mod integrator;
pub mod narrowphase;
pub mod query;
pub mod solver;

pub use broadphase::{CellCoord, SpatialHash};
pub use integrator::{PhysicsIntegrator, PhysicsSettings, StepReport};
pub use narrowphase::Contact;
pub use query::{RayHit, raycast};

pub fn crate_info() -> &'static str {
    "framecore-physics v0.1.0"
}
