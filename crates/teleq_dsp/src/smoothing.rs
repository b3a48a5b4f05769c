//! Parameter Smoothing
//!
//! Linear-ramp smoother used for the drive multiplier. A new target is
//! reached in a fixed number of samples derived from the ramp time and the
//! sample rate, so parameter jumps never produce discontinuities.

/// Linear ramp towards a target over a fixed time
#[derive(Debug, Clone)]
pub struct LinearSmoother {
    current: f64,
    target: f64,
    step: f64,
    countdown: usize,
    steps_to_target: usize,
}

impl LinearSmoother {
    /// Create a smoother resting at `initial`
    pub fn new(initial: f64, sample_rate: f64, ramp_seconds: f64) -> Self {
        let mut smoother = Self {
            current: initial,
            target: initial,
            step: 0.0,
            countdown: 0,
            steps_to_target: 0,
        };
        smoother.reset(sample_rate, ramp_seconds);
        smoother
    }

    /// Recompute the ramp length and jump to the current target
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        let steps = (ramp_seconds * sample_rate).floor();
        self.steps_to_target = if steps.is_finite() && steps > 0.0 {
            steps as usize
        } else {
            0
        };
        self.set_current_and_target(self.target);
    }

    /// Jump to `value` with no ramp
    pub fn set_current_and_target(&mut self, value: f64) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.countdown = 0;
    }

    /// Start ramping towards `target` from the current value
    #[inline]
    pub fn set_target(&mut self, target: f64) {
        if target == self.target {
            return;
        }
        if self.steps_to_target == 0 {
            self.set_current_and_target(target);
            return;
        }

        self.target = target;
        self.countdown = self.steps_to_target;
        self.step = (self.target - self.current) / self.countdown as f64;
    }

    /// Advance one sample and return the smoothed value
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        if self.countdown == 0 {
            return self.target;
        }

        self.countdown -= 1;
        if self.countdown > 0 {
            self.current += self.step;
        } else {
            self.current = self.target;
        }
        self.current
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }

    /// Ramp length in samples
    pub fn ramp_samples(&self) -> usize {
        self.steps_to_target
    }
}
