//! Demo scene shared by the `simulate` and `run` commands.

use std::sync::Arc;

use framecore_assets::{AssetLoader, AssetStore, content_hash};
use framecore_common::{
    Aabb, AudioClip, BlendMode, ClipHandle, MeshHandle, MeshResource, Transform,
};
use framecore_scene::{
    CollisionShape, Entity, PhysicsMaterial, RenderableAttachment, RigidBodyState, SceneError,
    SceneStore, SoundEmitter,
};
use glam::Vec3;
use sha2::{Digest, Sha256};

pub struct DemoScene {
    pub balls: Vec<Entity>,
}

/// A static ground slab with `bodies` balls dropped above it in a grid.
/// Every third ball is translucent; the first one hums.
pub fn populate(scene: &mut SceneStore, assets: &AssetStore, bodies: usize) -> Result<DemoScene, SceneError> {
    let sphere = Arc::new(MeshResource::new(
        MeshHandle(content_hash(b"demo:sphere")),
        "sphere",
        482,
        2880,
        Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
    ));
    let slab = Arc::new(MeshResource::new(
        MeshHandle(content_hash(b"demo:slab")),
        "slab",
        24,
        36,
        Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
    ));
    let stone = assets.register_material("stone", [0.5, 0.5, 0.5, 1.0], BlendMode::Opaque);
    let glass = assets.register_material("glass", [0.6, 0.8, 1.0, 0.4], BlendMode::Translucent);

    let ground = scene.spawn(Transform {
        position: Vec3::new(0.0, -0.5, 0.0),
        scale: Vec3::new(40.0, 1.0, 40.0),
        ..Transform::default()
    })?;
    scene.attach(
        ground,
        RigidBodyState::fixed(CollisionShape::Box {
            half_extents: Vec3::new(20.0, 0.5, 20.0),
        }),
    )?;
    scene.attach(ground, RenderableAttachment::new(slab, Arc::clone(&stone)))?;

    let mut balls = Vec::with_capacity(bodies);
    for i in 0..bodies {
        let layer = (i / 25) as f32;
        let x = (i % 5) as f32 * 1.5 - 3.0;
        let z = ((i / 5) % 5) as f32 * 1.5 - 3.0;
        let e = scene.spawn(Transform::from_position(Vec3::new(x, 2.0 + layer * 1.5, z)))?;
        let body = RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0).with_material(PhysicsMaterial {
            restitution: 0.3,
            friction: 0.5,
        });
        scene.attach(e, body)?;
        let material = if i % 3 == 2 { &glass } else { &stone };
        scene.attach(e, RenderableAttachment::new(Arc::clone(&sphere), Arc::clone(material)))?;
        if i == 0 {
            let hum = AudioClip {
                handle: ClipHandle(content_hash(b"demo:hum")),
                duration: 2.0,
            };
            scene.attach(e, SoundEmitter::new(hum).looping(true).with_range(30.0))?;
        }
        balls.push(e);
    }
    Ok(DemoScene { balls })
}

/// Hash of every transform in slot order. Equal hashes mean bit-identical
/// simulation state.
pub fn state_hash(scene: &SceneStore) -> u64 {
    let mut hasher = Sha256::new();
    for (entity, t) in scene.iter::<Transform>() {
        hasher.update(entity.index().to_le_bytes());
        for v in t.position.to_array().into_iter().chain(t.rotation.to_array()) {
            hasher.update(v.to_bits().to_le_bytes());
        }
    }
    let digest = hasher.finalize();
    u64::from_le_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}
