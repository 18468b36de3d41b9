//! Opaque handles into the external asset, render, and audio systems.
//!
//! Meshes and materials are shared between renderables through `Arc`; a
//! resource lives as long as its longest holder.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::Aabb;

/// A handle referencing a mesh asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u64);

/// A handle referencing a material asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialHandle(pub u64);

/// A handle referencing a decoded audio clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipHandle(pub u64);

/// A live voice in the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaybackHandle(pub u64);

/// How a material is composited; drives draw ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Opaque,
    Translucent,
}

/// Mesh metadata shared by every renderable that draws it.
#[derive(Debug)]
pub struct MeshResource {
    pub handle: MeshHandle,
    pub name: String,
    pub vertex_count: u32,
    pub index_count: u32,
    /// Local-space bounds of the geometry.
    pub bounds: Aabb,
    resident: AtomicBool,
}

impl MeshResource {
    pub fn new(handle: MeshHandle, name: impl Into<String>, vertex_count: u32, index_count: u32, bounds: Aabb) -> Self {
        Self {
            handle,
            name: name.into(),
            vertex_count,
            index_count,
            bounds,
            resident: AtomicBool::new(true),
        }
    }

    /// Whether the backend can still draw this mesh. Evicted meshes are
    /// skipped at collection time.
    pub fn is_resident(&self) -> bool {
        self.resident.load(Ordering::Acquire)
    }

    pub fn set_resident(&self, resident: bool) {
        self.resident.store(resident, Ordering::Release);
    }
}

/// Material parameters shared by every renderable that uses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialResource {
    pub handle: MaterialHandle,
    pub name: String,
    pub base_color: [f32; 4],
    pub blend: BlendMode,
}

impl MaterialResource {
    pub fn is_translucent(&self) -> bool {
        self.blend == BlendMode::Translucent
    }
}

/// A decoded clip: its handle and playback length in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub handle: ClipHandle,
    pub duration: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::sync::Arc;

    #[test]
    fn mesh_starts_resident_and_can_be_evicted() {
        let mesh = MeshResource::new(
            MeshHandle(1),
            "cube",
            24,
            36,
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
        );
        assert!(mesh.is_resident());
        mesh.set_resident(false);
        assert!(!mesh.is_resident());
    }

    #[test]
    fn shared_mesh_lives_until_last_holder() {
        let mesh = Arc::new(MeshResource::new(
            MeshHandle(7),
            "shared",
            3,
            3,
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE),
        ));
        let weak = Arc::downgrade(&mesh);
        let second = Arc::clone(&mesh);
        drop(mesh);
        assert!(weak.upgrade().is_some());
        drop(second);
        assert!(weak.upgrade().is_none());
    }
}
