//! Single-producer, single-consumer command queue into the scene.
//!
//! Worker threads (asset loads, mostly) never touch the [`SceneStore`]
//! directly. They push [`SceneCommand`]s into a bounded channel, and the
//! frame driver drains it once per frame before the physics sub-steps run.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use framecore_common::Transform;

use crate::attachments::{RenderableAttachment, RigidBodyState, SoundEmitter};
use crate::entity::Entity;
use crate::store::SceneStore;

/// An attachment of any kind, for commands that cross threads.
#[derive(Debug, Clone)]
pub enum AnyAttachment {
    Transform(Transform),
    RigidBody(RigidBodyState),
    Renderable(RenderableAttachment),
    Sound(SoundEmitter),
}

impl From<Transform> for AnyAttachment {
    fn from(value: Transform) -> Self {
        Self::Transform(value)
    }
}

impl From<RigidBodyState> for AnyAttachment {
    fn from(value: RigidBodyState) -> Self {
        Self::RigidBody(value)
    }
}

impl From<RenderableAttachment> for AnyAttachment {
    fn from(value: RenderableAttachment) -> Self {
        Self::Renderable(value)
    }
}

impl From<SoundEmitter> for AnyAttachment {
    fn from(value: SoundEmitter) -> Self {
        Self::Sound(value)
    }
}

/// A structural change requested from off the simulation thread.
#[derive(Debug, Clone)]
pub enum SceneCommand {
    /// Create an entity carrying these attachments.
    Spawn(Vec<AnyAttachment>),
    /// Attach to an existing entity. Ignored if the handle went stale.
    Attach {
        entity: Entity,
        attachment: AnyAttachment,
    },
    Destroy(Entity),
}

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    /// The queue is at capacity; the command is handed back for a retry.
    #[error("handoff queue full")]
    Full(SceneCommand),
    #[error("handoff queue closed")]
    Closed,
}

/// Producer half. Not `Clone`: there is exactly one producer.
#[derive(Debug)]
pub struct HandoffSender {
    tx: Sender<SceneCommand>,
}

impl HandoffSender {
    /// Enqueue without blocking.
    pub fn send(&self, command: SceneCommand) -> Result<(), HandoffError> {
        self.tx.try_send(command).map_err(|err| match err {
            TrySendError::Full(cmd) => HandoffError::Full(cmd),
            TrySendError::Disconnected(_) => HandoffError::Closed,
        })
    }
}

/// Consumer half, owned by the frame driver.
#[derive(Debug)]
pub struct HandoffReceiver {
    rx: Receiver<SceneCommand>,
}

/// Outcome of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    /// Commands that referenced a stale entity or carried an invalid value.
    pub rejected: usize,
}

impl HandoffReceiver {
    /// Apply the commands queued at the moment of the call. Commands sent
    /// while draining wait for the next frame, so a busy producer cannot
    /// hold the simulation thread here.
    pub fn drain_into(&self, scene: &mut SceneStore) -> DrainReport {
        let mut report = DrainReport::default();
        for _ in 0..self.rx.len() {
            let command = match self.rx.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };
            if apply(scene, command) {
                report.applied += 1;
            } else {
                report.rejected += 1;
            }
        }
        if report.applied + report.rejected > 0 {
            tracing::debug!(
                applied = report.applied,
                rejected = report.rejected,
                "handoff drained"
            );
        }
        report
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create a bounded handoff queue.
pub fn handoff_channel(capacity: usize) -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (HandoffSender { tx }, HandoffReceiver { rx })
}

fn apply(scene: &mut SceneStore, command: SceneCommand) -> bool {
    match command {
        SceneCommand::Spawn(attachments) => {
            let entity = scene.create();
            for attachment in attachments {
                if !attach_any(scene, entity, attachment) {
                    tracing::warn!(%entity, "spawn rejected an attachment; entity dropped");
                    scene.destroy(entity);
                    return false;
                }
            }
            true
        }
        SceneCommand::Attach { entity, attachment } => attach_any(scene, entity, attachment),
        SceneCommand::Destroy(entity) => {
            if !scene.is_alive(entity) {
                return false;
            }
            scene.destroy(entity);
            true
        }
    }
}

fn attach_any(scene: &mut SceneStore, entity: Entity, attachment: AnyAttachment) -> bool {
    let result = match attachment {
        AnyAttachment::Transform(v) => scene.attach(entity, v).map(|_| ()),
        AnyAttachment::RigidBody(v) => scene.attach(entity, v).map(|_| ()),
        AnyAttachment::Renderable(v) => scene.attach(entity, v).map(|_| ()),
        AnyAttachment::Sound(v) => scene.attach(entity, v).map(|_| ()),
    };
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(%err, "handoff attach rejected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::CollisionShape;
    use glam::Vec3;

    #[test]
    fn spawn_applies_on_drain() {
        let (tx, rx) = handoff_channel(4);
        let mut scene = SceneStore::new();
        tx.send(SceneCommand::Spawn(vec![
            Transform::from_position(Vec3::Y).into(),
            RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0).into(),
        ]))
        .unwrap();
        assert_eq!(scene.entity_count(), 0);

        let report = rx.drain_into(&mut scene);
        assert_eq!(report, DrainReport { applied: 1, rejected: 0 });
        let e = scene.entities().next().unwrap();
        assert!(scene.has::<RigidBodyState>(e));
        assert_eq!(scene.get::<Transform>(e).unwrap().position, Vec3::Y);
    }

    #[test]
    fn full_queue_hands_command_back() {
        let (tx, rx) = handoff_channel(1);
        tx.send(SceneCommand::Spawn(Vec::new())).unwrap();
        let err = tx.send(SceneCommand::Spawn(Vec::new())).unwrap_err();
        assert!(matches!(err, HandoffError::Full(SceneCommand::Spawn(_))));
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn closed_queue_reports_closed() {
        let (tx, rx) = handoff_channel(1);
        drop(rx);
        assert!(matches!(
            tx.send(SceneCommand::Spawn(Vec::new())),
            Err(HandoffError::Closed)
        ));
    }

    #[test]
    fn stale_targets_are_rejected() {
        let (tx, rx) = handoff_channel(8);
        let mut scene = SceneStore::new();
        let e = scene.create();
        scene.destroy(e);
        tx.send(SceneCommand::Attach {
            entity: e,
            attachment: Transform::default().into(),
        })
        .unwrap();
        tx.send(SceneCommand::Destroy(e)).unwrap();
        let report = rx.drain_into(&mut scene);
        assert_eq!(report, DrainReport { applied: 0, rejected: 2 });
    }

    #[test]
    fn invalid_spawn_leaves_no_entity() {
        let (tx, rx) = handoff_channel(2);
        let mut scene = SceneStore::new();
        let bad = Transform {
            scale: Vec3::ZERO,
            ..Transform::default()
        };
        tx.send(SceneCommand::Spawn(vec![bad.into()])).unwrap();
        let report = rx.drain_into(&mut scene);
        assert_eq!(report.rejected, 1);
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn producer_thread_hands_off() {
        let (tx, rx) = handoff_channel(16);
        let worker = std::thread::spawn(move || {
            for i in 0..10 {
                tx.send(SceneCommand::Spawn(vec![
                    Transform::from_position(Vec3::splat(i as f32)).into(),
                ]))
                .unwrap();
            }
        });
        worker.join().unwrap();
        let mut scene = SceneStore::new();
        assert_eq!(rx.drain_into(&mut scene).applied, 10);
        assert_eq!(scene.count::<Transform>(), 10);
        assert!(rx.is_empty());
    }
}
