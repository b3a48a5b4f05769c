//! Peak Telemetry
//!
//! Four shared peak cells (input L/R, output L/R). The audio thread is the
//! only writer and only ever raises a value; consumers read at their own
//! cadence and apply whatever decay they like by storing a lower value.
//!
//! Relaxed ordering throughout: meters only need eventual visibility.

use std::sync::atomic::{AtomicU32, Ordering};

/// Per-tick decay used by the reference meters
pub const METER_DECAY: f32 = 0.95;

/// Bottom of the meter scale (dB)
pub const METER_FLOOR_DB: f32 = -60.0;

/// Channel index of the left/right cells
const LEFT: usize = 0;
const RIGHT: usize = 1;

/// Shared peak cells
///
/// Values are non-negative `f32` magnitudes stored as bits. For
/// non-negative floats the bit patterns order like the values, so
/// `fetch_max` on the bits is a float max.
pub struct PeakMeters {
    input: [AtomicU32; 2],
    output: [AtomicU32; 2],
}

/// A copy of the four peak values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeakSnapshot {
    pub input_left: f32,
    pub input_right: f32,
    pub output_left: f32,
    pub output_right: f32,
}

impl PeakMeters {
    pub fn new() -> Self {
        Self {
            input: [AtomicU32::new(0), AtomicU32::new(0)],
            output: [AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    #[inline]
    fn raise(cell: &AtomicU32, magnitude: f32) {
        if magnitude.is_nan() {
            return;
        }
        cell.fetch_max(magnitude.abs().to_bits(), Ordering::Relaxed);
    }

    /// Raise the input peak of `channel` (0 = L, 1 = R); other channels are ignored
    #[inline]
    pub fn record_input(&self, channel: usize, magnitude: f32) {
        if let Some(cell) = self.input.get(channel) {
            Self::raise(cell, magnitude);
        }
    }

    /// Raise the output peak of `channel` (0 = L, 1 = R); other channels are ignored
    #[inline]
    pub fn record_output(&self, channel: usize, magnitude: f32) {
        if let Some(cell) = self.output.get(channel) {
            Self::raise(cell, magnitude);
        }
    }

    pub fn snapshot(&self) -> PeakSnapshot {
        let load = |cell: &AtomicU32| f32::from_bits(cell.load(Ordering::Relaxed));
        PeakSnapshot {
            input_left: load(&self.input[LEFT]),
            input_right: load(&self.input[RIGHT]),
            output_left: load(&self.output[LEFT]),
            output_right: load(&self.output[RIGHT]),
        }
    }

    /// Multiply every cell by `factor` (consumer side)
    ///
    /// A peak recorded between the load and the store may be lost; the next
    /// block will record it again.
    pub fn decay(&self, factor: f32) {
        let factor = factor.clamp(0.0, 1.0);
        for cell in self.input.iter().chain(self.output.iter()) {
            let value = f32::from_bits(cell.load(Ordering::Relaxed));
            cell.store((value * factor).to_bits(), Ordering::Relaxed);
        }
    }

    pub fn reset(&self) {
        for cell in self.input.iter().chain(self.output.iter()) {
            cell.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for PeakMeters {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a linear peak to a 0..1 meter position over -60..0 dB
pub fn gain_to_normalized_db(gain: f32) -> f32 {
    if gain.is_nan() || gain <= 0.0 {
        return 0.0;
    }
    let db = (20.0 * gain.log10()).max(METER_FLOOR_DB);
    ((db - METER_FLOOR_DB) / -METER_FLOOR_DB).clamp(0.0, 1.0)
}

/// Meter ballistics for one telemetry consumer
///
/// Each `tick` reads the shared peaks, decays the cells by [`METER_DECAY`]
/// and returns normalized meter positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeterReading {
    pub input_left: f32,
    pub input_right: f32,
    pub output_left: f32,
    pub output_right: f32,
}

impl MeterReading {
    pub fn tick(meters: &PeakMeters) -> Self {
        let peaks = meters.snapshot();
        meters.decay(METER_DECAY);
        Self {
            input_left: gain_to_normalized_db(peaks.input_left),
            input_right: gain_to_normalized_db(peaks.input_right),
            output_left: gain_to_normalized_db(peaks.output_left),
            output_right: gain_to_normalized_db(peaks.output_right),
        }
    }
}
