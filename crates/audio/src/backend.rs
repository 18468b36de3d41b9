use std::collections::BTreeMap;

use framecore_common::{ClipHandle, PlaybackHandle};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// No free voice; the request can be retried next frame.
    #[error("audio backend has no free voice")]
    Saturated,
    #[error("clip {0:?} is not available")]
    ClipUnavailable(ClipHandle),
}

/// Where the listener is and which way it faces. Pushed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListenerPose {
    pub position: Vec3,
    pub velocity: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for ListenerPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

impl ListenerPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.try_normalize().unwrap_or(Vec3::NEG_Z),
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }
}

/// External audio system. Calls are fire-and-forget; none may block.
pub trait AudioBackend {
    fn play(&mut self, clip: ClipHandle, gain: f32, looping: bool) -> Result<PlaybackHandle, AudioError>;
    fn update_pose(&mut self, handle: PlaybackHandle, position: Vec3, velocity: Vec3);
    fn set_gain(&mut self, handle: PlaybackHandle, gain: f32);
    /// Stopping an unknown or already stopped handle is a no-op.
    fn stop(&mut self, handle: PlaybackHandle);
    fn set_listener(&mut self, pose: &ListenerPose);
}

/// State of one voice in [`NullAudioBackend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub clip: ClipHandle,
    pub gain: f32,
    pub looping: bool,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Silent backend that keeps voice bookkeeping. Handles are never reused.
#[derive(Debug, Default)]
pub struct NullAudioBackend {
    max_voices: Option<usize>,
    next_handle: u64,
    voices: BTreeMap<PlaybackHandle, Voice>,
    listener: ListenerPose,
    stopped: u64,
}

impl NullAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// At most `max_voices` concurrent voices; further plays saturate.
    pub fn with_max_voices(max_voices: usize) -> Self {
        Self {
            max_voices: Some(max_voices),
            ..Self::default()
        }
    }

    pub fn voice(&self, handle: PlaybackHandle) -> Option<&Voice> {
        self.voices.get(&handle)
    }

    pub fn live_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn stopped(&self) -> u64 {
        self.stopped
    }

    pub fn listener(&self) -> &ListenerPose {
        &self.listener
    }
}

impl AudioBackend for NullAudioBackend {
    fn play(&mut self, clip: ClipHandle, gain: f32, looping: bool) -> Result<PlaybackHandle, AudioError> {
        if self.max_voices.is_some_and(|max| self.voices.len() >= max) {
            return Err(AudioError::Saturated);
        }
        self.next_handle += 1;
        let handle = PlaybackHandle(self.next_handle);
        self.voices.insert(
            handle,
            Voice {
                clip,
                gain,
                looping,
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
            },
        );
        Ok(handle)
    }

    fn update_pose(&mut self, handle: PlaybackHandle, position: Vec3, velocity: Vec3) {
        if let Some(voice) = self.voices.get_mut(&handle) {
            voice.position = position;
            voice.velocity = velocity;
        }
    }

    fn set_gain(&mut self, handle: PlaybackHandle, gain: f32) {
        if let Some(voice) = self.voices.get_mut(&handle) {
            voice.gain = gain;
        }
    }

    fn stop(&mut self, handle: PlaybackHandle) {
        if self.voices.remove(&handle).is_some() {
            self.stopped += 1;
        }
    }

    fn set_listener(&mut self, pose: &ListenerPose) {
        self.listener = *pose;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voices_are_tracked_until_stopped() {
        let mut backend = NullAudioBackend::new();
        let h = backend.play(ClipHandle(1), 0.5, false).unwrap();
        backend.update_pose(h, Vec3::X, Vec3::Y);
        assert_eq!(backend.voice(h).unwrap().position, Vec3::X);
        backend.stop(h);
        backend.stop(h);
        assert_eq!(backend.stopped(), 1);
        assert_eq!(backend.live_voices(), 0);
    }

    #[test]
    fn saturates_at_voice_limit() {
        let mut backend = NullAudioBackend::with_max_voices(1);
        let h = backend.play(ClipHandle(1), 1.0, true).unwrap();
        assert_eq!(backend.play(ClipHandle(2), 1.0, true), Err(AudioError::Saturated));
        backend.stop(h);
        let h2 = backend.play(ClipHandle(2), 1.0, true).unwrap();
        assert_ne!(h, h2);
    }

    #[test]
    fn listener_forward_is_normalized() {
        let pose = ListenerPose::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(pose.forward, Vec3::NEG_Z);
        assert_eq!(ListenerPose::new(Vec3::ZERO, Vec3::ZERO).forward, Vec3::NEG_Z);
    }
}
