use framecore_common::{Fault, Transform};
use framecore_scene::{EmitterState, Entity, RigidBodyState, SceneStore, SoundEmitter};
use glam::Vec3;

use crate::backend::{AudioBackend, AudioError, ListenerPose};

/// Counters for one scheduler update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioStats {
    /// Voices stopped because their emitter left the scene.
    pub released: usize,
    pub started: usize,
    /// Starts refused by a saturated backend; retried next frame.
    pub deferred: usize,
    /// Non-looping voices stopped at the end of their clip.
    pub finished: usize,
    /// Voices still playing after the update.
    pub active: usize,
}

/// Maps sound emitters onto backend voices.
///
/// Each update first stops every voice whose emitter went away, then
/// advances playing voices (stopping finished ones), and only then starts
/// new voices. A handle is therefore always stopped before the backend can
/// hand it to another emitter.
#[derive(Debug, Default)]
pub struct AudioScheduler {
    last_stats: AudioStats,
    saturated_frames: u64,
    scratch: Vec<Entity>,
}

impl AudioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<B: AudioBackend + ?Sized>(
        &mut self,
        scene: &mut SceneStore,
        backend: &mut B,
        listener: &ListenerPose,
        dt: f32,
    ) -> AudioStats {
        let _span = tracing::info_span!("audio_update").entered();
        let mut stats = AudioStats::default();

        for handle in scene.take_released_playbacks() {
            backend.stop(handle);
            stats.released += 1;
        }
        backend.set_listener(listener);

        self.scratch.clear();
        self.scratch
            .extend(scene.iter::<SoundEmitter>().map(|(entity, _)| entity));

        // Advance and retire playing voices.
        for &entity in &self.scratch {
            let (position, velocity) = pose_of(scene, entity, listener);
            let Some(emitter) = scene.get_mut::<SoundEmitter>(entity) else {
                continue;
            };
            if emitter.state != EmitterState::Playing {
                continue;
            }
            let Some(handle) = emitter.playback else {
                emitter.state = EmitterState::Pending;
                continue;
            };
            emitter.cursor += dt;
            let length = emitter.clip.duration;
            if !emitter.looping && emitter.cursor >= length {
                emitter.playback = None;
                emitter.state = EmitterState::Finished;
                backend.stop(handle);
                stats.finished += 1;
                tracing::debug!(%entity, ?handle, "clip finished, voice released");
                continue;
            }
            if emitter.looping && length > 0.0 {
                emitter.cursor %= length;
            }
            let gain = if audible(emitter, position, listener) {
                emitter.gain
            } else {
                0.0
            };
            backend.update_pose(handle, position, velocity);
            backend.set_gain(handle, gain);
            stats.active += 1;
        }

        // Start voices for pending emitters that can be heard.
        for &entity in &self.scratch {
            let (position, velocity) = pose_of(scene, entity, listener);
            let Some(emitter) = scene.get_mut::<SoundEmitter>(entity) else {
                continue;
            };
            if emitter.state != EmitterState::Pending || !audible(emitter, position, listener) {
                continue;
            }
            // A pending emitter may still hold its previous voice.
            if let Some(stale) = emitter.playback.take() {
                backend.stop(stale);
                stats.released += 1;
                tracing::debug!(%entity, handle = ?stale, "stale voice stopped before restart");
            }
            match backend.play(emitter.clip.handle, emitter.gain, emitter.looping) {
                Ok(handle) => {
                    emitter.playback = Some(handle);
                    emitter.cursor = 0.0;
                    emitter.state = EmitterState::Playing;
                    backend.update_pose(handle, position, velocity);
                    stats.started += 1;
                    stats.active += 1;
                    tracing::debug!(%entity, ?handle, "voice started");
                }
                Err(AudioError::Saturated) => stats.deferred += 1,
                Err(err @ AudioError::ClipUnavailable(_)) => {
                    emitter.state = EmitterState::Finished;
                    tracing::warn!(%entity, %err, "emitter retired");
                }
            }
        }

        if stats.deferred > 0 {
            self.saturated_frames += 1;
            tracing::warn!(deferred = stats.deferred, fault = %Fault::BackendSaturated, "audio starts deferred");
        }
        self.last_stats = stats;
        tracing::trace!(
            active = stats.active,
            started = stats.started,
            finished = stats.finished,
            "audio update complete"
        );
        stats
    }

    /// Stop every voice the scene still holds or has queued for release.
    /// Returns how many were stopped.
    pub fn shutdown<B: AudioBackend + ?Sized>(&mut self, scene: &mut SceneStore, backend: &mut B) -> usize {
        let mut stopped = 0;
        for handle in scene.take_released_playbacks() {
            backend.stop(handle);
            stopped += 1;
        }
        for (_, emitter) in scene.iter_mut::<SoundEmitter>() {
            if let Some(handle) = emitter.playback.take() {
                backend.stop(handle);
                emitter.state = EmitterState::Pending;
                stopped += 1;
            }
        }
        tracing::debug!(stopped, "audio shut down");
        stopped
    }

    pub fn last_stats(&self) -> AudioStats {
        self.last_stats
    }

    pub fn saturated_frames(&self) -> u64 {
        self.saturated_frames
    }
}

/// Spatial emitters sit at their entity; others play at the listener.
fn pose_of(scene: &SceneStore, entity: Entity, listener: &ListenerPose) -> (Vec3, Vec3) {
    let spatial = scene
        .get::<SoundEmitter>(entity)
        .is_some_and(|e| e.spatial);
    if !spatial {
        return (listener.position, listener.velocity);
    }
    let position = scene
        .get::<Transform>(entity)
        .map_or(listener.position, |t| t.position);
    let velocity = scene
        .get::<RigidBodyState>(entity)
        .map_or(Vec3::ZERO, |b| b.linear_velocity);
    (position, velocity)
}

fn audible(emitter: &SoundEmitter, position: Vec3, listener: &ListenerPose) -> bool {
    emitter.gain > 0.0 && (!emitter.spatial || position.distance(listener.position) <= emitter.range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullAudioBackend;
    use framecore_common::{AudioClip, ClipHandle, PlaybackHandle};
    use glam::Vec3;

    /// Backend that records every call.
    #[derive(Debug, Default)]
    struct Recording {
        next: u64,
        plays: Vec<ClipHandle>,
        stops: Vec<PlaybackHandle>,
        poses: Vec<(PlaybackHandle, Vec3, Vec3)>,
        saturated: bool,
        log: Vec<&'static str>,
    }

    impl AudioBackend for Recording {
        fn play(&mut self, clip: ClipHandle, _gain: f32, _looping: bool) -> Result<PlaybackHandle, AudioError> {
            self.log.push("play");
            if self.saturated {
                return Err(AudioError::Saturated);
            }
            self.next += 1;
            self.plays.push(clip);
            Ok(PlaybackHandle(self.next))
        }

        fn update_pose(&mut self, handle: PlaybackHandle, position: Vec3, velocity: Vec3) {
            self.poses.push((handle, position, velocity));
        }

        fn set_gain(&mut self, _handle: PlaybackHandle, _gain: f32) {}

        fn stop(&mut self, handle: PlaybackHandle) {
            self.log.push("stop");
            self.stops.push(handle);
        }

        fn set_listener(&mut self, _pose: &ListenerPose) {
            self.log.push("listener");
        }
    }

    fn clip(seconds: f32) -> AudioClip {
        AudioClip {
            handle: ClipHandle(7),
            duration: seconds,
        }
    }

    fn emitter_at(scene: &mut SceneStore, at: Vec3, emitter: SoundEmitter) -> Entity {
        let e = scene.spawn(Transform::from_position(at)).unwrap();
        scene.attach(e, emitter).unwrap();
        e
    }

    #[test]
    fn one_second_clip_released_once_after_one_and_a_half_seconds() {
        let mut scene = SceneStore::new();
        let e = emitter_at(&mut scene, Vec3::ZERO, SoundEmitter::new(clip(1.0)));
        let mut backend = Recording::default();
        let mut audio = AudioScheduler::new();
        let listener = ListenerPose::default();
        for _ in 0..15 {
            audio.update(&mut scene, &mut backend, &listener, 0.1);
        }
        assert_eq!(backend.plays.len(), 1);
        assert_eq!(backend.stops, vec![PlaybackHandle(1)]);
        let emitter = scene.get::<SoundEmitter>(e).unwrap();
        assert_eq!(emitter.state, EmitterState::Finished);
        assert_eq!(emitter.playback, None);
    }

    #[test]
    fn looping_clip_keeps_playing() {
        let mut scene = SceneStore::new();
        emitter_at(&mut scene, Vec3::ZERO, SoundEmitter::new(clip(0.5)).looping(true));
        let mut backend = Recording::default();
        let mut audio = AudioScheduler::new();
        for _ in 0..30 {
            audio.update(&mut scene, &mut backend, &ListenerPose::default(), 0.1);
        }
        assert_eq!(backend.plays.len(), 1);
        assert!(backend.stops.is_empty());
        assert_eq!(audio.last_stats().active, 1);
    }

    #[test]
    fn destroyed_emitter_is_stopped_before_any_play() {
        let mut scene = SceneStore::new();
        let first = emitter_at(&mut scene, Vec3::ZERO, SoundEmitter::new(clip(10.0)));
        let mut backend = Recording::default();
        let mut audio = AudioScheduler::new();
        let listener = ListenerPose::default();
        audio.update(&mut scene, &mut backend, &listener, 0.016);

        scene.destroy(first);
        let second = emitter_at(&mut scene, Vec3::ZERO, SoundEmitter::new(clip(10.0)));
        assert_eq!(second.index(), first.index());
        backend.log.clear();
        let stats = audio.update(&mut scene, &mut backend, &listener, 0.016);

        assert_eq!(stats.released, 1);
        assert_eq!(backend.log, vec!["stop", "listener", "play"]);
        assert_eq!(backend.stops, vec![PlaybackHandle(1)]);
    }

    #[test]
    fn restarted_emitter_stops_old_voice_first() {
        let mut scene = SceneStore::new();
        let e = emitter_at(&mut scene, Vec3::ZERO, SoundEmitter::new(clip(10.0)).looping(true));
        let mut backend = NullAudioBackend::new();
        let mut audio = AudioScheduler::new();
        let listener = ListenerPose::default();
        audio.update(&mut scene, &mut backend, &listener, 0.1);
        assert_eq!(backend.live_voices(), 1);

        assert!(scene.restart_emitter(e));
        let stats = audio.update(&mut scene, &mut backend, &listener, 0.1);
        assert_eq!(stats.released, 1);
        assert_eq!(stats.started, 1);
        assert_eq!(backend.live_voices(), 1);

        scene.destroy(e);
        audio.update(&mut scene, &mut backend, &listener, 0.1);
        assert_eq!(backend.live_voices(), 0);
    }

    #[test]
    fn pending_emitter_holding_voice_is_stopped_before_play() {
        let mut scene = SceneStore::new();
        let e = emitter_at(&mut scene, Vec3::ZERO, SoundEmitter::new(clip(10.0)));
        let mut backend = Recording::default();
        let mut audio = AudioScheduler::new();
        let listener = ListenerPose::default();
        audio.update(&mut scene, &mut backend, &listener, 0.1);

        scene.get_mut::<SoundEmitter>(e).unwrap().state = EmitterState::Pending;
        backend.log.clear();
        audio.update(&mut scene, &mut backend, &listener, 0.1);
        assert_eq!(backend.log, vec!["listener", "stop", "play"]);
        assert_eq!(backend.stops, vec![PlaybackHandle(1)]);
        assert_eq!(scene.get::<SoundEmitter>(e).unwrap().playback, Some(PlaybackHandle(2)));
    }

    #[test]
    fn saturation_leaves_emitter_pending() {
        let mut scene = SceneStore::new();
        let e = emitter_at(&mut scene, Vec3::ZERO, SoundEmitter::new(clip(1.0)));
        let mut backend = Recording {
            saturated: true,
            ..Recording::default()
        };
        let mut audio = AudioScheduler::new();
        let stats = audio.update(&mut scene, &mut backend, &ListenerPose::default(), 0.1);
        assert_eq!(stats.deferred, 1);
        assert_eq!(scene.get::<SoundEmitter>(e).unwrap().state, EmitterState::Pending);

        backend.saturated = false;
        let stats = audio.update(&mut scene, &mut backend, &ListenerPose::default(), 0.1);
        assert_eq!(stats.started, 1);
        assert_eq!(audio.saturated_frames(), 1);
    }

    #[test]
    fn out_of_range_emitter_waits() {
        let mut scene = SceneStore::new();
        let e = emitter_at(
            &mut scene,
            Vec3::new(100.0, 0.0, 0.0),
            SoundEmitter::new(clip(1.0)).with_range(10.0),
        );
        let mut backend = Recording::default();
        let mut audio = AudioScheduler::new();
        audio.update(&mut scene, &mut backend, &ListenerPose::default(), 0.1);
        assert!(backend.plays.is_empty());

        let near = ListenerPose::new(Vec3::new(95.0, 0.0, 0.0), Vec3::NEG_Z);
        audio.update(&mut scene, &mut backend, &near, 0.1);
        assert_eq!(scene.get::<SoundEmitter>(e).unwrap().state, EmitterState::Playing);
    }

    #[test]
    fn pose_follows_transform_and_body_velocity() {
        let mut scene = SceneStore::new();
        let e = emitter_at(&mut scene, Vec3::new(1.0, 2.0, 3.0), SoundEmitter::new(clip(5.0)));
        scene
            .attach(
                e,
                RigidBodyState::dynamic(framecore_scene::CollisionShape::Sphere { radius: 1.0 }, 1.0)
                    .with_velocity(Vec3::X),
            )
            .unwrap();
        let mut backend = Recording::default();
        let mut audio = AudioScheduler::new();
        audio.update(&mut scene, &mut backend, &ListenerPose::default(), 0.1);
        assert_eq!(backend.poses.last(), Some(&(PlaybackHandle(1), Vec3::new(1.0, 2.0, 3.0), Vec3::X)));
    }

    #[test]
    fn shutdown_stops_everything() {
        let mut scene = SceneStore::new();
        for i in 0..3 {
            emitter_at(&mut scene, Vec3::splat(i as f32), SoundEmitter::new(clip(10.0)).looping(true));
        }
        let mut backend = NullAudioBackend::new();
        let mut audio = AudioScheduler::new();
        audio.update(&mut scene, &mut backend, &ListenerPose::default(), 0.1);
        assert_eq!(backend.live_voices(), 3);
        assert_eq!(audio.shutdown(&mut scene, &mut backend), 3);
        assert_eq!(backend.live_voices(), 0);
        assert!(scene.iter::<SoundEmitter>().all(|(_, em)| em.playback.is_none()));
    }
}
