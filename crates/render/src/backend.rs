use std::fmt::Write as _;

use crate::camera::Camera;
use crate::collector::{DrawItem, DrawList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The backend took the first `accepted` items and refused the rest.
    #[error("render queue full after {accepted} items")]
    QueueFull { accepted: usize },
}

/// Consumer of draw lists. Implementations must not block the caller;
/// overload is reported as [`SubmitError::QueueFull`].
pub trait RenderBackend {
    /// Submit one frame's items in order. Returns how many were accepted.
    fn submit(&mut self, items: &[DrawItem]) -> Result<usize, SubmitError>;
}

/// Text backend: formats each submitted frame as a human-readable dump.
///
/// Used by the CLI and by tests. An optional per-frame capacity emulates a
/// saturated queue.
#[derive(Debug, Default)]
pub struct DebugTextBackend {
    capacity: Option<usize>,
    frames: u64,
    last_frame: String,
}

impl DebugTextBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept at most `capacity` items per frame.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Text of the most recent submission.
    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    /// Describe a whole draw list from a camera's point of view.
    pub fn render(&self, list: &DrawList, camera: &Camera) -> String {
        let mut out = String::new();
        let p = camera.position;
        let f = camera.forward();
        let _ = writeln!(out, "=== Draw List ({} items) ===", list.len());
        let _ = writeln!(
            out,
            "Camera: pos=({:.1}, {:.1}, {:.1}) dir=({:.2}, {:.2}, {:.2}) fov={:.0}",
            p.x,
            p.y,
            p.z,
            f.x,
            f.y,
            f.z,
            camera.fov.to_degrees()
        );
        for item in list.iter() {
            write_item(&mut out, item);
        }
        out
    }
}

fn write_item(out: &mut String, item: &DrawItem) {
    let pos = item.world.w_axis;
    let pass = if item.sort_key.is_translucent() {
        "blend"
    } else {
        "opaque"
    };
    let _ = writeln!(
        out,
        "  [{}] {pass} mesh={:016x} mat={:016x} pos=({:.2}, {:.2}, {:.2})",
        item.entity, item.mesh.0, item.material.0, pos.x, pos.y, pos.z
    );
}

impl RenderBackend for DebugTextBackend {
    fn submit(&mut self, items: &[DrawItem]) -> Result<usize, SubmitError> {
        let accepted = self.capacity.map_or(items.len(), |cap| cap.min(items.len()));
        self.frames += 1;
        self.last_frame.clear();
        let _ = writeln!(self.last_frame, "frame {}: {accepted} items", self.frames);
        for item in &items[..accepted] {
            write_item(&mut self.last_frame, item);
        }
        if accepted < items.len() {
            return Err(SubmitError::QueueFull { accepted });
        }
        Ok(accepted)
    }
}
