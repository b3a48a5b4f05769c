//! Telefy Stage
//!
//! Band-limited "telephone" distortion blended over the post-EQ signal.
//! A single amount knob drives both the wet mix and the saturation level:
//!
//! ```text
//! mix   = amount                  (0 -> 1 across the knob)
//! drive = min(2 * amount, 0.5)    (flat from mid-knob on)
//! out   = (dry * (1 - mix) + wet * mix) * (1 + 0.5 * mix)
//! ```
//!
//! The wet path is `dry * (1 + 5 * drive)` through the Telefy shaper,
//! loudness-matched to the dry signal, then band-passed.

use crate::auto_gain::AutoGain;
use crate::design;
use crate::filter::FilterStage;
use crate::processor::{block_len, AudioProcessor, ProcessSpec, MAX_CHANNELS};
use crate::saturation::telefy_saturate;

/// Ceiling of the derived Telefy drive level
pub const TELEFY_DRIVE_CEILING: f64 = 0.5;

/// Pre-gain per unit of Telefy drive
pub const TELEFY_PRE_GAIN: f64 = 5.0;

/// Make-up gain per unit of mix, for the energy the band-pass removes
pub const TELEFY_COMPENSATION: f64 = 0.5;

/// Telefy controls, read once per block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelefySettings {
    pub active: bool,
    /// 0..1; the stage is skipped at 0
    pub amount: f64,
    /// Band-pass centre (Hz)
    pub frequency: f64,
    pub q: f64,
    /// Model tag: 0 FET+ ("Distort"), 1 Rasp ("Obliterate"); anything else is identity
    pub model: i32,
}

impl Default for TelefySettings {
    fn default() -> Self {
        Self {
            active: false,
            amount: 0.0,
            frequency: 1100.0,
            q: 1.2,
            model: 0,
        }
    }
}

/// Mix and drive levels derived from the amount knob
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelefyLevels {
    pub mix: f64,
    pub drive: f64,
}

/// Derive [`TelefyLevels`] from an amount in 0..1
#[inline]
pub fn telefy_levels(amount: f64) -> TelefyLevels {
    let amount = if amount.is_nan() { 0.0 } else { amount.clamp(0.0, 1.0) };
    TelefyLevels {
        mix: amount,
        drive: (2.0 * amount).min(TELEFY_DRIVE_CEILING),
    }
}

/// The Telefy stage for up to [`MAX_CHANNELS`] channels
pub struct TelefyStage {
    settings: TelefySettings,
    band_pass: [FilterStage; MAX_CHANNELS],
    auto_gain: [AutoGain; MAX_CHANNELS],
    /// Wet path scratch, sized in `new`; longer blocks are processed in chunks
    wet: Vec<f64>,
    sample_rate: f64,
}

impl TelefyStage {
    pub fn new(spec: &ProcessSpec) -> Self {
        let settings = TelefySettings::default();
        let coefficients = design::band_pass(settings.frequency, settings.q, spec.sample_rate);

        let mut stage = Self {
            settings,
            band_pass: core::array::from_fn(|_| FilterStage::new(coefficients)),
            auto_gain: core::array::from_fn(|_| AutoGain::new(spec.sample_rate)),
            wet: vec![0.0; spec.max_block_size.max(1)],
            sample_rate: spec.sample_rate,
        };
        stage.apply_band_pass();
        stage
    }

    /// Take the block's settings; redesigns the band-pass when it changed
    pub fn update(&mut self, settings: &TelefySettings) {
        let retune = settings.frequency != self.settings.frequency || settings.q != self.settings.q;
        let toggled = settings.active != self.settings.active;
        self.settings = *settings;

        if retune || toggled {
            self.apply_band_pass();
        }
    }

    fn apply_band_pass(&mut self) {
        let coefficients =
            design::band_pass(self.settings.frequency, self.settings.q, self.sample_rate);
        for stage in self.band_pass.iter_mut() {
            stage.set_coefficients(coefficients);
            stage.set_enabled(self.settings.active);
        }
    }

    pub fn settings(&self) -> &TelefySettings {
        &self.settings
    }

    pub fn levels(&self) -> TelefyLevels {
        telefy_levels(self.settings.amount)
    }

    /// Largest number of frames processed in one pass
    pub fn chunk_size(&self) -> usize {
        self.wet.len()
    }

    pub fn band_pass(&self, channel: usize) -> Option<&FilterStage> {
        self.band_pass.get(channel)
    }
}

impl AudioProcessor for TelefyStage {
    /// # Real-time Safety
    /// No allocations: the wet path reuses the buffer sized at construction.
    fn process(&mut self, block: &mut [&mut [f64]]) {
        if !self.is_enabled() {
            return;
        }

        let levels = self.levels();
        let saturate = self.settings.active && levels.drive > 0.0;
        let pre_gain = 1.0 + TELEFY_PRE_GAIN * levels.drive;
        let compensation = 1.0 + TELEFY_COMPENSATION * levels.mix;
        let model = self.settings.model;
        let frames = block_len(block);
        let chunk_size = self.wet.len();

        for (channel, samples) in block.iter_mut().take(MAX_CHANNELS).enumerate() {
            for chunk in samples[..frames].chunks_mut(chunk_size) {
                let wet = &mut self.wet[..chunk.len()];
                wet.copy_from_slice(chunk);

                if saturate {
                    let auto_gain = &mut self.auto_gain[channel];
                    for sample in wet.iter_mut() {
                        let dry = *sample;
                        let saturated = telefy_saturate(dry * pre_gain, model);
                        *sample = auto_gain.process(dry, saturated);
                    }
                }

                self.band_pass[channel].process_block(wet);

                for (out, &processed) in chunk.iter_mut().zip(wet.iter()) {
                    *out = (*out * (1.0 - levels.mix) + processed * levels.mix) * compensation;
                }
            }
        }
    }

    fn reset(&mut self) {
        for stage in self.band_pass.iter_mut() {
            stage.reset();
        }
        for auto_gain in self.auto_gain.iter_mut() {
            auto_gain.reset();
        }
    }

    fn name(&self) -> &'static str {
        "Telefy"
    }

    fn is_enabled(&self) -> bool {
        self.settings.amount > 0.0
    }
}
