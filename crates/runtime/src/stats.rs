use framecore_audio::AudioStats;
use framecore_common::Fault;
use framecore_physics::StepReport;
use framecore_render::{CollectStats, SubmitOutcome};
use framecore_scene::DrainReport;
use serde::Serialize;

/// Everything one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Frame time after clamping.
    pub dt: f64,
    pub clamped: bool,
    pub sub_steps: u32,
    /// Simulation time discarded this frame by the sub-step clamp.
    pub dropped: f64,
    pub alpha: f32,
    pub handoff: DrainReport,
    /// Physics counters summed over this frame's sub-steps.
    pub physics: StepReport,
    pub collect: CollectStats,
    pub submit: SubmitOutcome,
    pub audio: AudioStats,
    /// Entities destroyed by the end-of-frame flush.
    pub destroyed: usize,
}

/// Cumulative counters since the driver started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub frames: u64,
    pub sub_steps: u64,
    pub dropped_time: f64,
    pub clamped_frames: u64,
    pub saturated_submissions: u64,
    pub dropped_draws: u64,
    pub missing_resources: u64,
    pub audio_deferred: u64,
    pub audio_saturated_frames: u64,
    pub handoff_applied: u64,
    pub handoff_rejected: u64,
    pub disabled_bodies: u64,
    pub destroyed: u64,
}

impl FrameStats {
    pub fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.sub_steps += u64::from(report.sub_steps);
        self.dropped_time += report.dropped;
        self.clamped_frames += u64::from(report.clamped);
        self.saturated_submissions += u64::from(report.submit.saturated);
        self.dropped_draws += report.submit.dropped as u64;
        self.missing_resources += report.collect.missing as u64;
        self.audio_deferred += report.audio.deferred as u64;
        self.audio_saturated_frames += u64::from(report.audio.deferred > 0);
        self.handoff_applied += report.handoff.applied as u64;
        self.handoff_rejected += report.handoff.rejected as u64;
        self.disabled_bodies += report.physics.disabled as u64;
        self.destroyed += report.destroyed as u64;
    }

    /// How often each fault class was observed.
    pub fn fault_count(&self, fault: Fault) -> u64 {
        match fault {
            Fault::InvalidHandle => self.handoff_rejected,
            Fault::DegenerateState => self.disabled_bodies,
            Fault::BackendSaturated => self.saturated_submissions + self.audio_saturated_frames,
            Fault::ResourceMissing => self.missing_resources,
        }
    }
}

/// Sum per-sub-step physics reports. Sleeping is a snapshot, so the last
/// sub-step's value wins.
pub(crate) fn merge_step(total: &mut StepReport, step: &StepReport) {
    total.integrated += step.integrated;
    total.disabled += step.disabled;
    total.contacts += step.contacts;
    total.woken += step.woken;
    total.sleeping = step.sleeping;
}
