//! Background mesh loading.
//!
//! A loader thread is the single producer on a handoff queue: it reads and
//! decodes files off the simulation thread, then delivers the finished
//! renderable as an `Attach` command. The simulation picks it up on the next
//! frame's drain.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use framecore_common::{MaterialResource, MeshHandle};
use framecore_scene::{Entity, HandoffError, HandoffSender, RenderableAttachment, SceneCommand};
use tracing::{debug, warn};

use crate::store::{AssetError, AssetLoader, AssetStore};

/// How long a loader waits on a full queue before retrying.
const RETRY_INTERVAL: Duration = Duration::from_millis(1);
const MAX_DELIVERY_ATTEMPTS: u32 = 2000;

/// Load `path` and attach it to `entity` as a renderable.
#[derive(Debug, Clone)]
pub struct MeshLoadRequest {
    pub path: PathBuf,
    pub entity: Entity,
    pub material: Arc<MaterialResource>,
}

#[derive(Debug, Default)]
pub struct LoadSummary {
    pub delivered: Vec<MeshHandle>,
    pub failed: Vec<(PathBuf, AssetError)>,
}

impl AssetStore {
    /// Load one mesh on a worker thread and hand it to the scene.
    pub fn spawn_mesh_load(
        self: &Arc<Self>,
        path: PathBuf,
        entity: Entity,
        material: Arc<MaterialResource>,
        sender: HandoffSender,
    ) -> JoinHandle<Result<MeshHandle, AssetError>> {
        let store = Arc::clone(self);
        thread::spawn(move || {
            store.load_and_deliver(
                &MeshLoadRequest {
                    path,
                    entity,
                    material,
                },
                &sender,
            )
        })
    }

    /// Load a batch in order on one worker thread. A failed load does not
    /// stop the batch; a closed queue does.
    pub fn spawn_mesh_loads(
        self: &Arc<Self>,
        requests: Vec<MeshLoadRequest>,
        sender: HandoffSender,
    ) -> JoinHandle<LoadSummary> {
        let store = Arc::clone(self);
        thread::spawn(move || {
            let mut summary = LoadSummary::default();
            for request in requests {
                match store.load_and_deliver(&request, &sender) {
                    Ok(handle) => summary.delivered.push(handle),
                    Err(AssetError::Handoff(HandoffError::Closed)) => {
                        summary
                            .failed
                            .push((request.path, AssetError::Handoff(HandoffError::Closed)));
                        break;
                    }
                    Err(e) => summary.failed.push((request.path, e)),
                }
            }
            debug!(
                delivered = summary.delivered.len(),
                failed = summary.failed.len(),
                "batch load finished"
            );
            summary
        })
    }

    fn load_and_deliver(&self, request: &MeshLoadRequest, sender: &HandoffSender) -> Result<MeshHandle, AssetError> {
        let mesh = self.load_mesh(&request.path)?;
        let handle = mesh.handle;
        let mut command = SceneCommand::Attach {
            entity: request.entity,
            attachment: RenderableAttachment::new(mesh, Arc::clone(&request.material)).into(),
        };
        for attempt in 1..=MAX_DELIVERY_ATTEMPTS {
            match sender.send(command) {
                Ok(()) => return Ok(handle),
                Err(HandoffError::Full(returned)) => {
                    if attempt == 1 {
                        debug!(mesh = handle.0, "handoff queue full; retrying");
                    }
                    command = returned;
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!(mesh = handle.0, path = %request.path.display(), "gave up delivering mesh");
        Err(HandoffError::Full(command).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecore_common::{BlendMode, Transform};
    use framecore_scene::{SceneStore, handoff_channel};
    use std::fs;

    const TRI_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn loaded_mesh_reaches_the_scene_through_the_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        fs::write(&path, TRI_OBJ).unwrap();

        let store = Arc::new(AssetStore::new());
        let material = store.register_material("white", [1.0; 4], BlendMode::Opaque);
        let mut scene = SceneStore::new();
        let entity = scene.create();
        scene.attach(entity, Transform::default()).unwrap();

        let (tx, rx) = handoff_channel(4);
        let handle = store.spawn_mesh_load(path, entity, material, tx).join().unwrap().unwrap();
        assert!(scene.get::<RenderableAttachment>(entity).is_none());

        let report = rx.drain_into(&mut scene);
        assert_eq!(report.applied, 1);
        let renderable = scene.get::<RenderableAttachment>(entity).unwrap();
        assert_eq!(renderable.mesh.handle, handle);
    }

    #[test]
    fn batch_reports_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("tri.obj");
        fs::write(&good, TRI_OBJ).unwrap();

        let store = Arc::new(AssetStore::new());
        let material = store.register_material("white", [1.0; 4], BlendMode::Opaque);
        let mut scene = SceneStore::new();
        let a = scene.create();
        let b = scene.create();

        let (tx, rx) = handoff_channel(4);
        let requests = vec![
            MeshLoadRequest {
                path: dir.path().join("missing.obj"),
                entity: a,
                material: Arc::clone(&material),
            },
            MeshLoadRequest {
                path: good,
                entity: b,
                material,
            },
        ];
        let summary = store.spawn_mesh_loads(requests, tx).join().unwrap();
        assert_eq!(summary.delivered.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(summary.failed[0].1, AssetError::NotFound(_)));

        rx.drain_into(&mut scene);
        assert!(scene.get::<RenderableAttachment>(b).is_some());
        assert!(scene.get::<RenderableAttachment>(a).is_none());
    }

    #[test]
    fn closed_queue_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        fs::write(&path, TRI_OBJ).unwrap();

        let store = Arc::new(AssetStore::new());
        let material = store.register_material("white", [1.0; 4], BlendMode::Opaque);
        let mut scene = SceneStore::new();
        let entity = scene.create();
        let (tx, rx) = handoff_channel(1);
        drop(rx);
        let result = store.spawn_mesh_load(path, entity, material, tx).join().unwrap();
        assert!(matches!(result, Err(AssetError::Handoff(HandoffError::Closed))));
    }
}
