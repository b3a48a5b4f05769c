//! Drive Stage
//!
//! Harmonic saturation ahead of the EQ: the input is scaled by a smoothed
//! drive multiplier, shaped by the selected model inside its filter wrapper
//! and loudness-matched back to the pre-gain input. The result replaces the
//! input (fully wet).

use crate::auto_gain::AutoGain;
use crate::processor::{block_len, AudioProcessor, ProcessSpec, MAX_CHANNELS};
use crate::saturation::SaturatorBank;
use crate::smoothing::LinearSmoother;

/// Drive amount (0..1) to smoother target
pub const DRIVE_SCALE: f64 = 6.0;

/// Lower bound of the per-sample drive multiplier
pub const MIN_DRIVE: f64 = 0.1;

/// Upper bound of the per-sample drive multiplier
pub const MAX_DRIVE: f64 = 10.0;

/// Drive smoother ramp time (seconds)
pub const DRIVE_RAMP_SECONDS: f64 = 0.02;

/// Drive controls, read once per block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveSettings {
    /// 0..1; the stage is skipped at 0
    pub amount: f64,
    /// Model tag: 0 Tape, 1 Tube, 2 FET; anything else is identity
    pub model: i32,
    /// Reserved dry/wet control. Carried through but not applied.
    pub mix: f64,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            amount: 0.0,
            model: 0,
            mix: 1.0,
        }
    }
}

/// The Drive stage for up to [`MAX_CHANNELS`] channels
pub struct DriveStage {
    settings: DriveSettings,
    smoother: LinearSmoother,
    bank: SaturatorBank,
    auto_gain: [AutoGain; MAX_CHANNELS],
    sample_rate: f64,
}

impl DriveStage {
    pub fn new(spec: &ProcessSpec) -> Self {
        let settings = DriveSettings::default();
        Self {
            smoother: LinearSmoother::new(
                settings.amount * DRIVE_SCALE,
                spec.sample_rate,
                DRIVE_RAMP_SECONDS,
            ),
            bank: SaturatorBank::new(spec.sample_rate),
            auto_gain: core::array::from_fn(|_| AutoGain::new(spec.sample_rate)),
            sample_rate: spec.sample_rate,
            settings,
        }
    }

    /// Take the block's settings and retarget the drive smoother
    #[inline]
    pub fn update(&mut self, settings: &DriveSettings) {
        self.settings = *settings;
        self.smoother.set_target(settings.amount * DRIVE_SCALE);
    }

    pub fn settings(&self) -> &DriveSettings {
        &self.settings
    }

    /// Current drive multiplier as applied to the next sample frame
    pub fn drive_multiplier(&self) -> f64 {
        self.smoother.current().clamp(MIN_DRIVE, MAX_DRIVE)
    }

    pub fn auto_gain(&self, channel: usize) -> Option<&AutoGain> {
        self.auto_gain.get(channel)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

impl AudioProcessor for DriveStage {
    /// # Real-time Safety
    /// No allocations. O(n) where n = frames x channels.
    fn process(&mut self, block: &mut [&mut [f64]]) {
        if !self.is_enabled() {
            return;
        }

        let frames = block_len(block);
        let model = self.settings.model;
        let channels = block.len().min(MAX_CHANNELS);

        // Frame-major: the smoother advances once per frame, shared by all channels
        for frame in 0..frames {
            let drive = self.smoother.next_value().clamp(MIN_DRIVE, MAX_DRIVE);

            for (channel, samples) in block.iter_mut().take(channels).enumerate() {
                let dry = samples[frame];
                let saturated = self.bank.process(channel, model, dry * drive);
                samples[frame] = self.auto_gain[channel].process(dry, saturated);
            }
        }
    }

    fn reset(&mut self) {
        self.smoother
            .set_current_and_target(self.settings.amount * DRIVE_SCALE);
        self.bank.reset();
        for auto_gain in self.auto_gain.iter_mut() {
            auto_gain.reset();
        }
    }

    fn name(&self) -> &'static str {
        "Drive"
    }

    fn is_enabled(&self) -> bool {
        self.settings.amount > 0.0
    }
}
