use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use framecore_audio::{AudioBackend, AudioScheduler, ListenerPose};
use framecore_common::{ConfigError, EngineConfig};
use framecore_physics::{PhysicsIntegrator, StepReport};
use framecore_render::{Camera, RenderBackend, RenderCollector};
use framecore_scene::{
    Entity, HandoffReceiver, HandoffSender, RigidBodyState, SceneStore, handoff_channel,
    render_transform,
};
use glam::Vec3;
use tracing::{debug, info, info_span, trace, warn};

use crate::clock::SimClock;
use crate::stats::{FrameReport, FrameStats, merge_step};
use crate::timer::PhaseTimers;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("frame driver is not running")]
    NotRunning,
    /// The accumulator went negative or non-finite. A programming error.
    #[error("step accounting violated: accumulator = {accumulator}")]
    StepAccounting { accumulator: f64 },
}

/// Where the driver is in its frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Accumulating,
    /// Running the n-th physics sub-step of the current frame.
    Stepping(u32),
    Rendering,
}

/// Cooperative shutdown flag, checked between frames.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// The top-level loop: fixed-step physics, then one render and one audio
/// update per displayed frame.
pub struct FrameDriver<R: RenderBackend, A: AudioBackend> {
    config: EngineConfig,
    state: DriverState,
    clock: SimClock,
    scene: SceneStore,
    physics: PhysicsIntegrator,
    collector: RenderCollector,
    audio: AudioScheduler,
    render_backend: R,
    audio_backend: A,
    camera: Camera,
    listener: Option<Entity>,
    last_listener_position: Option<Vec3>,
    handoff: HandoffReceiver,
    producer: Option<HandoffSender>,
    shutdown: ShutdownHandle,
    timers: PhaseTimers,
    stats: FrameStats,
    last_report: FrameReport,
    last_tick: Option<Instant>,
    frame: u64,
}

impl<R: RenderBackend, A: AudioBackend> FrameDriver<R, A> {
    pub fn new(config: EngineConfig, render_backend: R, audio_backend: A) -> Result<Self, DriverError> {
        config.validate()?;
        let (producer, handoff) = handoff_channel(config.handoff_capacity);
        Ok(Self {
            clock: SimClock::new(config.fixed_step),
            physics: PhysicsIntegrator::from_config(&config),
            config,
            state: DriverState::Idle,
            scene: SceneStore::new(),
            collector: RenderCollector::new(),
            audio: AudioScheduler::new(),
            render_backend,
            audio_backend,
            camera: Camera::default(),
            listener: None,
            last_listener_position: None,
            handoff,
            producer: Some(producer),
            shutdown: ShutdownHandle::new(),
            timers: PhaseTimers::default(),
            stats: FrameStats::default(),
            last_report: FrameReport::default(),
            last_tick: None,
            frame: 0,
        })
    }

    /// The producer half of the scene handoff queue. There is one; the
    /// second call returns `None`.
    pub fn take_handoff_sender(&mut self) -> Option<HandoffSender> {
        self.producer.take()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    /// Mutate the scene between frames.
    pub fn scene_mut(&mut self) -> &mut SceneStore {
        &mut self.scene
    }

    pub fn physics(&self) -> &PhysicsIntegrator {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsIntegrator {
        &mut self.physics
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Hear the scene from an entity instead of the camera.
    pub fn set_listener(&mut self, entity: Option<Entity>) {
        self.listener = entity;
        self.last_listener_position = None;
    }

    pub fn render_backend(&self) -> &R {
        &self.render_backend
    }

    pub fn render_backend_mut(&mut self) -> &mut R {
        &mut self.render_backend
    }

    pub fn audio_backend(&self) -> &A {
        &self.audio_backend
    }

    pub fn audio_backend_mut(&mut self) -> &mut A {
        &mut self.audio_backend
    }

    pub fn timers(&self) -> &PhaseTimers {
        &self.timers
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn last_report(&self) -> &FrameReport {
        &self.last_report
    }

    /// `Idle -> Running`. Resets the clock. Starting a running driver is a no-op.
    pub fn start(&mut self) {
        if self.state != DriverState::Idle {
            debug!(state = ?self.state, "start ignored");
            return;
        }
        self.clock.reset();
        self.last_tick = None;
        self.last_listener_position = None;
        self.state = DriverState::Running;
        info!(
            fixed_step = self.config.fixed_step,
            max_sub_steps = self.config.max_sub_steps_per_frame,
            "frame driver started"
        );
    }

    /// Advance one displayed frame by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> Result<FrameReport, DriverError> {
        if self.state == DriverState::Idle {
            return Err(DriverError::NotRunning);
        }
        let _span = info_span!("frame", frame = self.frame).entered();
        self.timers.start("frame");
        self.state = DriverState::Accumulating;

        let (dt, clamped) = self.clamp_delta(dt);
        let handoff = self.timers.time("handoff", || self.handoff.drain_into(&mut self.scene));

        self.clock.accumulate(dt);
        self.check_accounting()?;

        self.timers.start("physics");
        let max_steps = self.config.max_sub_steps_per_frame;
        let mut sub_steps = 0;
        let mut physics = StepReport::default();
        while sub_steps < max_steps && self.clock.try_step() {
            sub_steps += 1;
            self.state = DriverState::Stepping(sub_steps);
            let report = self.physics.step(&mut self.scene);
            merge_step(&mut physics, &report);
        }
        self.timers.stop("physics");

        let dropped = self.clock.drop_backlog();
        if dropped > 0.0 {
            warn!(dropped, sub_steps, "sub-step limit reached; simulation time dropped");
        }
        self.check_accounting()?;
        let alpha = self.clock.alpha() as f32;

        self.state = DriverState::Rendering;
        self.timers.start("render");
        let list = self.collector.collect(&self.scene, &self.camera, alpha);
        let submit = self.collector.submit(&mut self.render_backend, &list);
        self.timers.stop("render");
        let collect = self.collector.last_stats();

        self.timers.start("audio");
        let pose = self.listener_pose(alpha, dt);
        let audio = self
            .audio
            .update(&mut self.scene, &mut self.audio_backend, &pose, dt as f32);
        self.timers.stop("audio");

        let destroyed = self.scene.flush_pending();
        let events = self.scene.drain_events().len();
        self.state = DriverState::Accumulating;

        let report = FrameReport {
            frame: self.frame,
            dt,
            clamped,
            sub_steps,
            dropped,
            alpha,
            handoff,
            physics,
            collect,
            submit,
            audio,
            destroyed,
        };
        self.frame += 1;
        self.stats.record(&report);
        self.last_report = report;
        self.timers.stop("frame");
        trace!(
            sub_steps,
            alpha,
            draws = submit.submitted,
            voices = audio.active,
            events,
            "frame complete"
        );
        Ok(report)
    }

    /// Advance by the wall time elapsed since the previous call. The first
    /// call after `start` advances by zero.
    pub fn tick_wall(&mut self) -> Result<FrameReport, DriverError> {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map(|prev| now.duration_since(prev).as_secs_f64())
            .unwrap_or(0.0);
        self.last_tick = Some(now);
        self.tick(dt)
    }

    /// Tick on wall time until shutdown is requested, then shut down.
    /// `frame_interval` paces the loop; `None` runs flat out.
    pub fn run(&mut self, frame_interval: Option<Duration>) -> Result<FrameStats, DriverError> {
        self.start();
        while !self.shutdown.is_requested() {
            let began = Instant::now();
            self.tick_wall()?;
            if let Some(interval) = frame_interval {
                if let Some(rest) = interval.checked_sub(began.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }
        self.shutdown();
        Ok(self.stats)
    }

    /// Flush pending destroys, stop every voice, and return to `Idle`.
    /// Returns the number of voices stopped.
    pub fn shutdown(&mut self) -> usize {
        if self.state == DriverState::Idle {
            return 0;
        }
        let destroyed = self.scene.flush_pending();
        let stopped = self.audio.shutdown(&mut self.scene, &mut self.audio_backend);
        self.scene.drain_events();
        self.state = DriverState::Idle;
        info!(
            frames = self.stats.frames,
            sub_steps = self.stats.sub_steps,
            dropped_time = self.stats.dropped_time,
            destroyed,
            stopped,
            "frame driver stopped"
        );
        stopped
    }

    fn clamp_delta(&self, dt: f64) -> (f64, bool) {
        if !(dt >= 0.0) || dt.is_infinite() {
            warn!(dt, "invalid frame delta treated as zero");
            return (0.0, true);
        }
        if dt > self.config.max_frame_delta {
            debug!(dt, max = self.config.max_frame_delta, "frame delta clamped");
            return (self.config.max_frame_delta, true);
        }
        (dt, false)
    }

    fn check_accounting(&self) -> Result<(), DriverError> {
        if self.clock.is_consistent() {
            Ok(())
        } else {
            Err(DriverError::StepAccounting {
                accumulator: self.clock.accumulator(),
            })
        }
    }

    fn listener_pose(&mut self, alpha: f32, dt: f64) -> ListenerPose {
        let from_entity = self
            .listener
            .and_then(|e| render_transform(&self.scene, e, alpha).map(|t| (e, t)));
        let (position, forward, body_velocity) = match from_entity {
            Some((entity, t)) => (
                t.position,
                t.rotation * Vec3::NEG_Z,
                self.scene
                    .get::<RigidBodyState>(entity)
                    .map(|b| b.linear_velocity),
            ),
            None => (self.camera.position, self.camera.forward(), None),
        };
        let velocity = body_velocity.unwrap_or_else(|| match self.last_listener_position {
            Some(prev) if dt > 0.0 => (position - prev) / dt as f32,
            _ => Vec3::ZERO,
        });
        self.last_listener_position = Some(position);
        ListenerPose::new(position, forward).with_velocity(velocity)
    }
}
