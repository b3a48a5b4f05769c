//! RMS Auto-Gain
//!
//! Loudness matcher used after every saturator: tracks the running mean
//! square of the signal before and after processing and rescales the
//! processed signal so both match. The gain itself is smoothed with the
//! same one-pole coefficient.
//!
//! The coefficient is derived from a fixed time constant and the session's
//! sample rate, so convergence time is the same at 44.1 kHz and 192 kHz.

/// Floor for the mean-square accumulators
pub const RMS_FLOOR: f64 = 1e-12;

/// Time constant of the RMS and gain smoothing (seconds)
///
/// Equivalent to a per-sample coefficient of 0.005 at 48 kHz.
pub const AUTO_GAIN_TIME_CONSTANT: f64 = 1.0 / (0.005 * 48_000.0);

/// One-pole coefficient for a time constant at a sample rate
#[inline]
pub fn smoothing_coefficient(time_constant: f64, sample_rate: f64) -> f64 {
    let samples = time_constant * sample_rate;
    if !samples.is_finite() || samples <= 0.0 {
        return 1.0;
    }
    1.0 - (-1.0 / samples).exp()
}

/// Per-channel auto-gain state
#[derive(Debug, Clone)]
pub struct AutoGain {
    ms_in: f64,
    ms_out: f64,
    gain: f64,
    coefficient: f64,
}

impl AutoGain {
    /// Auto-gain using [`AUTO_GAIN_TIME_CONSTANT`] at `sample_rate`
    pub fn new(sample_rate: f64) -> Self {
        Self::with_coefficient(smoothing_coefficient(AUTO_GAIN_TIME_CONSTANT, sample_rate))
    }

    /// Auto-gain with an explicit per-sample coefficient in (0, 1]
    pub fn with_coefficient(coefficient: f64) -> Self {
        Self {
            ms_in: RMS_FLOOR,
            ms_out: RMS_FLOOR,
            gain: 1.0,
            coefficient: coefficient.clamp(f64::EPSILON, 1.0),
        }
    }

    /// Feed one (reference, processed) pair and return the gain-matched sample
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process(&mut self, input: f64, output: f64) -> f64 {
        let c = self.coefficient;
        self.ms_in = ((1.0 - c) * self.ms_in + c * input * input).max(RMS_FLOOR);
        self.ms_out = ((1.0 - c) * self.ms_out + c * output * output).max(RMS_FLOOR);

        let target = if self.ms_out > RMS_FLOOR {
            (self.ms_in / self.ms_out).sqrt()
        } else {
            1.0
        };

        self.gain = (1.0 - c) * self.gain + c * target;
        output * self.gain
    }

    /// Current smoothed gain multiplier
    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Re-prime the accumulators (stream start / sample-rate change)
    pub fn reset(&mut self) {
        self.ms_in = RMS_FLOOR;
        self.ms_out = RMS_FLOOR;
        self.gain = 1.0;
    }
}
