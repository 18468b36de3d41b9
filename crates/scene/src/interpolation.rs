//! Render-time blending between the last two physics states.
//!
//! Nothing here writes to the store; the blended transform exists only for
//! the frame that asked for it.

use framecore_common::Transform;

use crate::attachments::PhysicsSnapshotPair;
use crate::entity::Entity;
use crate::store::SceneStore;

/// Blend `pair.previous` toward `pair.current` by `alpha`.
///
/// Position and scale are lerped, rotation is slerped along the shorter arc.
/// `alpha` is clamped to `[0, 1]`; NaN counts as 0. The endpoints return the
/// stored transforms exactly.
pub fn interpolate(pair: &PhysicsSnapshotPair, alpha: f32) -> Transform {
    if !(alpha > 0.0) {
        return pair.previous;
    }
    if alpha >= 1.0 {
        return pair.current;
    }
    let (a, b) = (&pair.previous, &pair.current);
    Transform {
        position: a.position.lerp(b.position, alpha),
        rotation: a.rotation.slerp(b.rotation, alpha).normalize(),
        scale: a.scale.lerp(b.scale, alpha),
    }
}

/// Transform to draw `entity` with. Physics-driven entities are blended;
/// everything else uses its stored transform.
pub fn render_transform(scene: &SceneStore, entity: Entity, alpha: f32) -> Option<Transform> {
    match scene.snapshot(entity) {
        Some(pair) => Some(interpolate(pair, alpha)),
        None => scene.get::<Transform>(entity).copied(),
    }
}
