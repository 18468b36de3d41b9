//! Frame driver: owns the scene and runs physics, render, and audio in
//! their fixed order each frame.
//!
//! # Invariants
//! - The handoff queue is drained before any physics sub-step.
//! - After every tick the accumulator is finite, non-negative, and below `h`.
//! - Render collection and the audio update each run exactly once per tick.

mod clock;
mod driver;
mod stats;
mod timer;

pub use clock::SimClock;
pub use driver::{DriverError, DriverState, FrameDriver, ShutdownHandle};
pub use stats::{FrameReport, FrameStats};
pub use timer::{FrameTimer, PhaseTimers};

pub fn crate_info() -> &'static str {
    "framecore-runtime v0.1.0"
}
