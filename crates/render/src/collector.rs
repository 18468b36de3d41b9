use framecore_common::{Fault, MaterialHandle, MeshHandle};
use framecore_scene::{Entity, RenderableAttachment, SceneStore, render_transform};
use glam::Mat4;

use crate::backend::{RenderBackend, SubmitError};
use crate::camera::Camera;
use crate::frustum::Frustum;

/// Draw ordering key. Sorting ascending gives opaque items grouped by full
/// material then mesh handle, followed by translucent items far to near.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SortKey {
    Opaque {
        material: MaterialHandle,
        mesh: MeshHandle,
    },
    Translucent {
        /// Inverted ordered depth bits: far items compare lowest.
        far_first: u32,
        material: MaterialHandle,
    },
}

impl SortKey {
    pub fn opaque(material: MaterialHandle, mesh: MeshHandle) -> Self {
        Self::Opaque { material, mesh }
    }

    /// Larger depth sorts first.
    pub fn translucent(depth: f32, material: MaterialHandle) -> Self {
        Self::Translucent {
            far_first: !ordered_bits(depth),
            material,
        }
    }

    pub fn is_translucent(&self) -> bool {
        matches!(self, Self::Translucent { .. })
    }
}

/// Map an `f32` onto a `u32` with the same ordering.
fn ordered_bits(value: f32) -> u32 {
    let bits = value.to_bits();
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000
    }
}

/// One draw command for the render backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub entity: Entity,
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub world: Mat4,
    pub sort_key: SortKey,
}

/// The ordered output of one collection pass. Rebuilt every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub items: Vec<DrawItem>,
}

impl DrawList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawItem> {
        self.items.iter()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.items.iter().any(|item| item.entity == entity)
    }

    /// Number of material or mesh switches a backend sees walking the list.
    pub fn state_changes(&self) -> usize {
        self.items
            .windows(2)
            .filter(|w| w[0].material != w[1].material || w[0].mesh != w[1].mesh)
            .count()
    }
}

/// Counters for one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub considered: usize,
    pub hidden: usize,
    pub culled: usize,
    /// Renderables whose mesh is no longer resident.
    pub missing: usize,
    pub emitted: usize,
}

/// Result of handing a draw list to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub submitted: usize,
    pub dropped: usize,
    pub saturated: bool,
}

enum Verdict {
    Draw(DrawItem),
    Hidden,
    Culled,
    Missing,
}

fn classify(
    scene: &SceneStore,
    camera: &Camera,
    frustum: &Frustum,
    alpha: f32,
    entity: Entity,
    renderable: &RenderableAttachment,
) -> Verdict {
    if !renderable.visible {
        return Verdict::Hidden;
    }
    if !renderable.mesh.is_resident() {
        return Verdict::Missing;
    }
    let Some(transform) = render_transform(scene, entity, alpha) else {
        // Renderables without a transform have nowhere to be drawn.
        return Verdict::Hidden;
    };
    let bounds = renderable.bounds.world_aabb(&transform);
    if !frustum.intersects_aabb(&bounds) {
        return Verdict::Culled;
    }
    let material = renderable.material.handle;
    let mesh = renderable.mesh.handle;
    let sort_key = if renderable.material.is_translucent() {
        SortKey::translucent(camera.view_depth(bounds.center()), material)
    } else {
        SortKey::opaque(material, mesh)
    };
    Verdict::Draw(DrawItem {
        entity,
        mesh,
        material,
        world: transform.to_matrix(),
        sort_key,
    })
}

/// Lazy, single-pass walk yielding the draw items that survive visibility,
/// residency, and frustum tests, in slot order (unsorted).
pub fn visible<'a>(
    scene: &'a SceneStore,
    camera: &'a Camera,
    alpha: f32,
) -> impl Iterator<Item = DrawItem> + 'a {
    let frustum = Frustum::from_view_projection(&camera.view_projection());
    scene
        .iter::<RenderableAttachment>()
        .filter_map(move |(entity, renderable)| {
            match classify(scene, camera, &frustum, alpha, entity, renderable) {
                Verdict::Draw(item) => Some(item),
                _ => None,
            }
        })
}

/// Builds the per-frame draw list and hands it to a backend.
#[derive(Debug, Default)]
pub struct RenderCollector {
    last_stats: CollectStats,
    frames: u64,
    saturated_frames: u64,
}

impl RenderCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cull, then sort into submission order. Reads the scene only.
    pub fn collect(&mut self, scene: &SceneStore, camera: &Camera, alpha: f32) -> DrawList {
        let _span = tracing::info_span!("render_collect").entered();
        let frustum = Frustum::from_view_projection(&camera.view_projection());
        let mut stats = CollectStats::default();
        let mut items = Vec::new();

        for (entity, renderable) in scene.iter::<RenderableAttachment>() {
            stats.considered += 1;
            match classify(scene, camera, &frustum, alpha, entity, renderable) {
                Verdict::Draw(item) => items.push(item),
                Verdict::Hidden => stats.hidden += 1,
                Verdict::Culled => stats.culled += 1,
                Verdict::Missing => {
                    stats.missing += 1;
                    tracing::debug!(%entity, fault = %Fault::ResourceMissing, "draw skipped");
                }
            }
        }

        items.sort_by_key(|item: &DrawItem| (item.sort_key, item.entity));
        stats.emitted = items.len();
        self.last_stats = stats;
        self.frames += 1;
        tracing::trace!(
            considered = stats.considered,
            culled = stats.culled,
            emitted = stats.emitted,
            "draw list built"
        );
        DrawList { items }
    }

    /// Submit without blocking. A saturated backend keeps what it accepted;
    /// the rest of the frame's items are dropped.
    pub fn submit<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, list: &DrawList) -> SubmitOutcome {
        match backend.submit(&list.items) {
            Ok(submitted) => SubmitOutcome {
                submitted,
                dropped: list.len().saturating_sub(submitted),
                saturated: false,
            },
            Err(SubmitError::QueueFull { accepted }) => {
                self.saturated_frames += 1;
                let dropped = list.len().saturating_sub(accepted);
                tracing::warn!(accepted, dropped, fault = %Fault::BackendSaturated, "render submission saturated");
                SubmitOutcome {
                    submitted: accepted,
                    dropped,
                    saturated: true,
                }
            }
        }
    }

    pub fn last_stats(&self) -> CollectStats {
        self.last_stats
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn saturated_frames(&self) -> u64 {
        self.saturated_frames
    }
}
