//! Biquad Filter Stage
//!
//! A single second-order section with a bypass flag. The atomic unit of
//! every EQ band, cut filter and saturator pre/post filter.

use biquad::{Biquad, Coefficients, DirectForm2Transposed};

use crate::design::PASSTHROUGH;

/// One second-order IIR section plus its delay line
///
/// Coefficient updates take effect on the next sample and keep the delay
/// line, so automating a band does not click. A disabled stage returns its
/// input unchanged but stays in place inside its cascade.
pub struct FilterStage {
    // DirectForm2Transposed: better numerical stability than DF1
    filter: DirectForm2Transposed<f64>,
    coefficients: Coefficients<f64>,
    enabled: bool,
}

impl FilterStage {
    /// Create an enabled stage with the given coefficients
    pub fn new(coefficients: Coefficients<f64>) -> Self {
        Self {
            filter: DirectForm2Transposed::<f64>::new(coefficients),
            coefficients,
            enabled: true,
        }
    }

    /// Create an enabled stage with unity coefficients
    pub fn passthrough() -> Self {
        Self::new(PASSTHROUGH)
    }

    /// Process one sample
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        if !self.enabled {
            return input;
        }
        self.filter.run(input)
    }

    /// Process a mono block in-place
    #[inline]
    pub fn process_block(&mut self, block: &mut [f64]) {
        if !self.enabled {
            return;
        }
        for sample in block.iter_mut() {
            *sample = self.filter.run(*sample);
        }
    }

    /// Replace the coefficients without clearing the delay line
    #[inline]
    pub fn set_coefficients(&mut self, coefficients: Coefficients<f64>) {
        self.coefficients = coefficients;
        self.filter.update_coefficients(coefficients);
    }

    pub fn coefficients(&self) -> &Coefficients<f64> {
        &self.coefficients
    }

    /// Enable or bypass the stage
    ///
    /// Re-enabling clears the delay line so stale state from before the
    /// bypass is not replayed.
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.filter.reset_state();
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.filter.reset_state();
    }
}

impl Default for FilterStage {
    fn default() -> Self {
        Self::passthrough()
    }
}
