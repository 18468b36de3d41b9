//! Audio scheduling for sound emitters.
//!
//! # Invariants
//! - A voice is requested lazily, on the first frame its emitter is audible.
//! - Every voice is stopped exactly once: when its emitter leaves the scene,
//!   when a non-looping clip ends, or at shutdown.
//! - Within a frame all stops are issued before any new play.

mod backend;
mod scheduler;

pub use backend::{AudioBackend, AudioError, ListenerPose, NullAudioBackend, Voice};
pub use scheduler::{AudioScheduler, AudioStats};

pub fn crate_info() -> &'static str {
    "framecore-audio v0.1.0"
}
