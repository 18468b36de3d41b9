use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Ring buffer of recent durations.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn recorded(&self) -> &[Duration] {
        &self.history[..self.count()]
    }

    pub fn last(&self) -> Option<Duration> {
        if self.count() == 0 {
            return None;
        }
        let last = (self.index + self.capacity - 1) % self.capacity;
        Some(self.history[last])
    }

    pub fn average(&self) -> Duration {
        let recorded = self.recorded();
        if recorded.is_empty() {
            return Duration::ZERO;
        }
        recorded.iter().sum::<Duration>() / recorded.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.recorded().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        if self.filled { self.capacity } else { self.index }
    }
}

#[derive(Debug, Clone)]
struct Phase {
    timer: FrameTimer,
    started: Option<Instant>,
}

/// Named wall-clock timers for the phases of a frame.
#[derive(Debug, Clone)]
pub struct PhaseTimers {
    history: usize,
    phases: BTreeMap<&'static str, Phase>,
}

impl Default for PhaseTimers {
    fn default() -> Self {
        Self::new(120)
    }
}

impl PhaseTimers {
    /// Each phase keeps its last `history` samples.
    pub fn new(history: usize) -> Self {
        Self {
            history,
            phases: BTreeMap::new(),
        }
    }

    /// Starting a phase that is already running is ignored.
    pub fn start(&mut self, name: &'static str) {
        let history = self.history;
        let phase = self.phases.entry(name).or_insert_with(|| Phase {
            timer: FrameTimer::new(history),
            started: None,
        });
        if phase.started.is_none() {
            phase.started = Some(Instant::now());
        }
    }

    /// Stop a running phase and record its duration. `None` if it was not running.
    pub fn stop(&mut self, name: &'static str) -> Option<Duration> {
        let phase = self.phases.get_mut(name)?;
        let elapsed = phase.started.take()?.elapsed();
        phase.timer.record(elapsed);
        Some(elapsed)
    }

    /// Run `f` inside the named phase.
    pub fn time<R>(&mut self, name: &'static str, f: impl FnOnce() -> R) -> R {
        self.start(name);
        let out = f();
        self.stop(name);
        out
    }

    pub fn get(&self, name: &str) -> Option<&FrameTimer> {
        self.phases.get(name).map(|p| &p.timer)
    }

    pub fn last(&self, name: &str) -> Option<Duration> {
        self.get(name).and_then(FrameTimer::last)
    }

    pub fn average(&self, name: &str) -> Duration {
        self.get(name).map(FrameTimer::average).unwrap_or(Duration::ZERO)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.phases.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_timer_average() {
        let mut timer = FrameTimer::new(4);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));
        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.min(), Duration::from_millis(10));
        assert_eq!(timer.max(), Duration::from_millis(30));
        assert_eq!(timer.last(), Some(Duration::from_millis(30)));
    }

    #[test]
    fn frame_timer_wraps() {
        let mut timer = FrameTimer::new(2);
        assert_eq!(timer.last(), None);
        assert_eq!(timer.average(), Duration::ZERO);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(40));
        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(30));
        assert_eq!(timer.last(), Some(Duration::from_millis(40)));
    }

    #[test]
    fn phases_record_only_when_started() {
        let mut timers = PhaseTimers::new(8);
        assert_eq!(timers.stop("physics"), None);
        timers.start("physics");
        timers.start("physics");
        assert!(timers.stop("physics").is_some());
        assert_eq!(timers.stop("physics"), None);
        assert_eq!(timers.get("physics").map(FrameTimer::count), Some(1));
    }

    #[test]
    fn time_returns_closure_value() {
        let mut timers = PhaseTimers::default();
        let v = timers.time("render", || 7);
        assert_eq!(v, 7);
        assert_eq!(timers.names().collect::<Vec<_>>(), vec!["render"]);
        assert!(timers.last("render").is_some());
    }
}
