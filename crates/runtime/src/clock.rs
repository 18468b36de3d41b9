/// Fixed-step simulation clock.
///
/// Frame time flows into the accumulator and leaves it in whole steps of
/// `h`. Reset only when the driver starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    step: f64,
    accumulator: f64,
    sim_time: f64,
    sub_steps: u64,
    dropped: f64,
}

impl SimClock {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            accumulator: 0.0,
            sim_time: 0.0,
            sub_steps: 0,
            dropped: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.step);
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Simulated seconds, `sub_steps * h`.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn sub_steps(&self) -> u64 {
        self.sub_steps
    }

    /// Total simulation time discarded by the sub-step clamp.
    pub fn dropped(&self) -> f64 {
        self.dropped
    }

    pub fn accumulate(&mut self, dt: f64) {
        self.accumulator += dt;
    }

    /// Consume one step if enough time has accrued.
    pub fn try_step(&mut self) -> bool {
        if self.accumulator < self.step {
            return false;
        }
        self.accumulator -= self.step;
        self.sub_steps += 1;
        self.sim_time = self.sub_steps as f64 * self.step;
        true
    }

    /// Throw away every whole step still owed, keeping the sub-step
    /// remainder so alpha stays continuous. Returns the seconds dropped.
    pub fn drop_backlog(&mut self) -> f64 {
        if self.accumulator < self.step {
            return 0.0;
        }
        let remainder = self.accumulator % self.step;
        let dropped = self.accumulator - remainder;
        self.accumulator = remainder;
        self.dropped += dropped;
        dropped
    }

    /// Interpolation fraction in `[0, 1)`.
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.step
    }

    /// The accumulator must be a finite, non-negative number of seconds.
    pub fn is_consistent(&self) -> bool {
        self.accumulator.is_finite() && self.accumulator >= 0.0
    }
}
