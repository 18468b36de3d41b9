use framecore_common::{PlaybackHandle, Transform};
use serde::{Deserialize, Serialize};

use crate::attachments::{
    AttachmentKind, PhysicsSnapshotPair, RenderableAttachment, RigidBodyState, SoundEmitter,
};
use crate::entity::{Entity, EntityAllocator};

/// Errors from scene store operations. None of them is fatal to a frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("entity {0} is not alive")]
    InvalidHandle(Entity),
    #[error("transform for {0} is not finite or has non-positive scale")]
    InvalidTransform(Entity),
}

/// A record produced by every structural mutation of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    Created(Entity),
    Destroyed(Entity),
    Attached { entity: Entity, kind: AttachmentKind },
    Removed { entity: Entity, kind: AttachmentKind },
}

/// Dense per-kind storage indexed by entity slot.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: Vec<Option<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T> Table<T> {
    fn get(&self, index: u32) -> Option<&T> {
        self.rows.get(index as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.rows.get_mut(index as usize).and_then(Option::as_mut)
    }

    fn insert(&mut self, index: u32, value: T) -> Option<T> {
        let i = index as usize;
        if i >= self.rows.len() {
            self.rows.resize_with(i + 1, || None);
        }
        self.rows[i].replace(value)
    }

    fn remove(&mut self, index: u32) -> Option<T> {
        self.rows.get_mut(index as usize).and_then(Option::take)
    }

    fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.as_ref().map(|v| (i as u32, v)))
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> + '_ {
        self.rows
            .iter_mut()
            .enumerate()
            .filter_map(|(i, row)| row.as_mut().map(|v| (i as u32, v)))
    }

    fn len(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }
}

/// One table per attachment kind.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    transforms: Table<Transform>,
    bodies: Table<RigidBodyState>,
    renderables: Table<RenderableAttachment>,
    emitters: Table<SoundEmitter>,
}

/// A kind of data that can be attached to an entity.
///
/// Implemented for the four attachment kinds of the scene; the table
/// accessors keep the trait closed to this crate.
pub trait Attachment: Sized + 'static {
    const KIND: AttachmentKind;

    #[doc(hidden)]
    fn table(tables: &Tables) -> &Table<Self>;

    #[doc(hidden)]
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;

    /// Normalize or reject a value before it is stored.
    #[doc(hidden)]
    fn prepare(self, _entity: Entity) -> Result<Self, SceneError> {
        Ok(self)
    }

    /// External voice that must be stopped when this value leaves the store.
    #[doc(hidden)]
    fn take_playback(&mut self) -> Option<PlaybackHandle> {
        None
    }
}

impl Attachment for Transform {
    const KIND: AttachmentKind = AttachmentKind::Transform;

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.transforms
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.transforms
    }

    fn prepare(self, entity: Entity) -> Result<Self, SceneError> {
        if !self.is_finite() || !self.has_positive_scale() {
            return Err(SceneError::InvalidTransform(entity));
        }
        Ok(self.normalized())
    }
}

impl Attachment for RigidBodyState {
    const KIND: AttachmentKind = AttachmentKind::RigidBody;

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.bodies
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.bodies
    }
}

impl Attachment for RenderableAttachment {
    const KIND: AttachmentKind = AttachmentKind::Renderable;

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.renderables
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.renderables
    }
}

impl Attachment for SoundEmitter {
    const KIND: AttachmentKind = AttachmentKind::SoundEmitter;

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.emitters
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.emitters
    }

    fn take_playback(&mut self) -> Option<PlaybackHandle> {
        self.playback.take()
    }
}

/// The single source of truth for entities and their attachments.
///
/// Every lookup is O(1) by slot index and checks the handle's generation,
/// so stale handles simply miss. Iteration follows slot order and is stable
/// while nothing is destroyed; systems that want to destroy while iterating
/// use [`SceneStore::queue_destroy`] and let the frame driver flush at the
/// end of the frame.
#[derive(Debug, Default)]
pub struct SceneStore {
    entities: EntityAllocator,
    tables: Tables,
    snapshots: Table<PhysicsSnapshotPair>,
    pending_removal: Vec<Entity>,
    released_playbacks: Vec<PlaybackHandle>,
    events: Vec<SceneEvent>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> Entity {
        let entity = self.entities.allocate();
        self.events.push(SceneEvent::Created(entity));
        tracing::trace!(%entity, "entity created");
        entity
    }

    /// Create an entity with a transform already attached.
    pub fn spawn(&mut self, transform: Transform) -> Result<Entity, SceneError> {
        let entity = self.create();
        if let Err(err) = self.attach(entity, transform) {
            self.destroy(entity);
            return Err(err);
        }
        Ok(entity)
    }

    /// Destroy an entity and every attachment. A stale handle is a no-op.
    ///
    /// A live playback handle held by the entity's emitter is queued for
    /// release; the audio scheduler stops it before starting any new voice.
    pub fn destroy(&mut self, entity: Entity) {
        if !self.entities.is_alive(entity) {
            return;
        }
        self.remove::<Transform>(entity);
        self.remove::<RigidBodyState>(entity);
        self.remove::<RenderableAttachment>(entity);
        self.remove::<SoundEmitter>(entity);
        self.entities.free(entity);
        self.events.push(SceneEvent::Destroyed(entity));
        tracing::debug!(%entity, "entity destroyed");
    }

    /// Defer destruction to the next [`SceneStore::flush_pending`].
    /// Returns false for stale handles.
    pub fn queue_destroy(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        self.pending_removal.push(entity);
        true
    }

    /// Apply all deferred destructions. Returns how many entities died.
    pub fn flush_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_removal);
        let mut destroyed = 0;
        for entity in pending {
            if self.entities.is_alive(entity) {
                self.destroy(entity);
                destroyed += 1;
            }
        }
        destroyed
    }

    pub fn pending_count(&self) -> usize {
        self.pending_removal.len()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    /// Attach (or replace) a value. Returns the replaced value, if any.
    pub fn attach<T: Attachment>(&mut self, entity: Entity, value: T) -> Result<Option<T>, SceneError> {
        if !self.entities.is_alive(entity) {
            return Err(SceneError::InvalidHandle(entity));
        }
        let value = value.prepare(entity)?;
        let mut replaced = T::table_mut(&mut self.tables).insert(entity.index(), value);
        if let Some(old) = replaced.as_mut() {
            self.release(entity, old);
        }
        self.events.push(SceneEvent::Attached {
            entity,
            kind: T::KIND,
        });
        Ok(replaced)
    }

    pub fn get<T: Attachment>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        T::table(&self.tables).get(entity.index())
    }

    /// Mutable access. Writes to a `Transform` through this reference skip
    /// normalization; prefer [`SceneStore::set_transform`].
    pub fn get_mut<T: Attachment>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        T::table_mut(&mut self.tables).get_mut(entity.index())
    }

    pub fn has<T: Attachment>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    pub fn remove<T: Attachment>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        let mut removed = T::table_mut(&mut self.tables).remove(entity.index())?;
        self.release(entity, &mut removed);
        self.events.push(SceneEvent::Removed {
            entity,
            kind: T::KIND,
        });
        Some(removed)
    }

    /// Replace the transform without emitting an attach event. Used by
    /// physics write-back and by external logic moving kinematic bodies.
    pub fn set_transform(&mut self, entity: Entity, transform: Transform) -> Result<(), SceneError> {
        if !self.entities.is_alive(entity) {
            return Err(SceneError::InvalidHandle(entity));
        }
        let transform = transform.prepare(entity)?;
        match self.tables.transforms.get_mut(entity.index()) {
            Some(slot) => {
                *slot = transform;
                Ok(())
            }
            None => self.attach(entity, transform).map(|_| ()),
        }
    }

    /// Attachments of one kind in slot order.
    pub fn iter<T: Attachment>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        let entities = &self.entities;
        T::table(&self.tables)
            .iter()
            .filter_map(move |(i, v)| entities.entity_at(i).map(|e| (e, v)))
    }

    pub fn iter_mut<T: Attachment>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        let entities = &self.entities;
        T::table_mut(&mut self.tables)
            .iter_mut()
            .filter_map(move |(i, v)| entities.entity_at(i).map(|e| (e, v)))
    }

    pub fn count<T: Attachment>(&self) -> usize {
        T::table(&self.tables).len()
    }

    /// Interpolation snapshot for a physics-driven entity.
    pub fn snapshot(&self, entity: Entity) -> Option<&PhysicsSnapshotPair> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.snapshots.get(entity.index())
    }

    /// Store the interpolation snapshot. Ignored for entities without a
    /// rigid body, so the pair never outlives the body.
    pub fn set_snapshot(&mut self, entity: Entity, pair: PhysicsSnapshotPair) {
        if self.has::<RigidBodyState>(entity) {
            self.snapshots.insert(entity.index(), pair);
        }
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Playback handles whose emitter went away. The caller takes
    /// responsibility for stopping them.
    pub fn take_released_playbacks(&mut self) -> Vec<PlaybackHandle> {
        std::mem::take(&mut self.released_playbacks)
    }

    /// Restart the entity's sound emitter from the top. Its live voice, if
    /// any, joins the release queue so it is stopped before the new one
    /// starts. Returns false when the entity has no emitter.
    pub fn restart_emitter(&mut self, entity: Entity) -> bool {
        let Some(emitter) = self.get_mut::<SoundEmitter>(entity) else {
            return false;
        };
        if let Some(handle) = emitter.restart() {
            tracing::debug!(%entity, ?handle, "playback queued for release");
            self.released_playbacks.push(handle);
        }
        true
    }

    pub fn released_playback_count(&self) -> usize {
        self.released_playbacks.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Side effects of an attachment leaving its table.
    fn release<T: Attachment>(&mut self, entity: Entity, value: &mut T) {
        if T::KIND == AttachmentKind::RigidBody {
            self.snapshots.remove(entity.index());
        }
        if let Some(handle) = value.take_playback() {
            tracing::debug!(%entity, ?handle, "playback queued for release");
            self.released_playbacks.push(handle);
        }
    }
}
