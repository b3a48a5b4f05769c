//! Equalizer Chain
//!
//! Fixed 7-slot cascade per channel:
//!
//! ```text
//! HPF cut -> Low -> Low-Mid -> High-Mid -> (Telefy slot) -> High -> LPF cut
//! ```
//!
//! Cut filters always hold two biquad sections; the slope decides how many
//! are enabled (12 dB/oct = 1, 24 dB/oct = 2) and an inactive cut bypasses
//! both. Sections are bypassed rather than removed, so coefficients can be
//! swapped at runtime without reshaping the cascade. The Telefy slot is a
//! pass-through in the main chain.
//!
//! Coefficients follow the RBJ (Robert Bristow-Johnson) Audio EQ Cookbook,
//! see [`crate::design`].

use biquad::Coefficients;

use crate::design::{self, CutCoefficients, MAX_CUT_SECTIONS, SHELF_Q};
use crate::filter::FilterStage;
use crate::processor::{block_len, AudioProcessor, ProcessSpec, MAX_CHANNELS};

/// Q of the low band in bell mode
pub const LOW_BELL_Q: f64 = 1.2;

/// Q of the high band in bell mode
pub const HIGH_BELL_Q: f64 = 1.0;

/// Number of slots in a [`MonoChain`]
pub const CHAIN_LEN: usize = 7;

/// Cut-filter steepness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slope {
    #[default]
    Slope12,
    Slope24,
}

impl Slope {
    /// Map a choice index to a slope (0 -> 12 dB/oct, 1 and above -> 24 dB/oct)
    pub fn from_index(index: i32) -> Self {
        if index >= 1 {
            Slope::Slope24
        } else {
            Slope::Slope12
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    /// Butterworth order: 2 * (slope + 1)
    pub fn order(self) -> usize {
        2 * (self.index() as usize + 1)
    }

    pub fn db_per_octave(self) -> u32 {
        12 * (self.index() as u32 + 1)
    }
}

/// High- or low-cut settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutSettings {
    pub active: bool,
    pub frequency: f64,
    pub slope: Slope,
}

/// Low/high band: shelf by default, bell with a fixed Q when `bell` is set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShelvingBandSettings {
    pub frequency: f64,
    pub gain_db: f64,
    pub bell: bool,
}

/// Low-mid/high-mid band: always a peak with user Q
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakBandSettings {
    pub frequency: f64,
    pub gain_db: f64,
    pub q: f64,
}

/// Complete EQ settings for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqSettings {
    pub high_pass: CutSettings,
    pub low: ShelvingBandSettings,
    pub low_mid: PeakBandSettings,
    pub high_mid: PeakBandSettings,
    pub high: ShelvingBandSettings,
    pub low_pass: CutSettings,
}

impl Default for EqSettings {
    fn default() -> Self {
        Self {
            high_pass: CutSettings {
                active: false,
                frequency: 17.0,
                slope: Slope::Slope12,
            },
            low: ShelvingBandSettings {
                frequency: 60.0,
                gain_db: 0.0,
                bell: false,
            },
            low_mid: PeakBandSettings {
                frequency: 300.0,
                gain_db: 0.0,
                q: 1.0,
            },
            high_mid: PeakBandSettings {
                frequency: 2500.0,
                gain_db: 0.0,
                q: 1.0,
            },
            high: ShelvingBandSettings {
                frequency: 7000.0,
                gain_db: 0.0,
                bell: false,
            },
            low_pass: CutSettings {
                active: false,
                frequency: 22001.0,
                slope: Slope::Slope12,
            },
        }
    }
}

/// Slots of a [`MonoChain`], in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    HighPass,
    Low,
    LowMid,
    HighMid,
    Telefy,
    High,
    LowPass,
}

impl ChainPosition {
    pub const ALL: [ChainPosition; CHAIN_LEN] = [
        ChainPosition::HighPass,
        ChainPosition::Low,
        ChainPosition::LowMid,
        ChainPosition::HighMid,
        ChainPosition::Telefy,
        ChainPosition::High,
        ChainPosition::LowPass,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Coefficients for every slot, designed once per block and shared by all channels
#[derive(Debug, Clone, Copy)]
pub struct EqCoefficients {
    /// `None` when the cut is inactive
    pub high_pass: Option<CutCoefficients>,
    pub low: Coefficients<f64>,
    pub low_mid: Coefficients<f64>,
    pub high_mid: Coefficients<f64>,
    pub high: Coefficients<f64>,
    pub low_pass: Option<CutCoefficients>,
}

impl EqCoefficients {
    pub fn design(settings: &EqSettings, sample_rate: f64) -> Self {
        let cut = |cut: &CutSettings, designer: fn(f64, f64, usize) -> CutCoefficients| {
            cut.active
                .then(|| designer(cut.frequency, sample_rate, cut.slope.order()))
        };

        let low = &settings.low;
        let low_gain = design::db_to_gain(low.gain_db);
        let low = if low.bell {
            design::peak(low.frequency, LOW_BELL_Q, low_gain, sample_rate)
        } else {
            design::low_shelf(low.frequency, SHELF_Q, low_gain, sample_rate)
        };

        let high = &settings.high;
        let high_gain = design::db_to_gain(high.gain_db);
        let high = if high.bell {
            design::peak(high.frequency, HIGH_BELL_Q, high_gain, sample_rate)
        } else {
            design::high_shelf(high.frequency, SHELF_Q, high_gain, sample_rate)
        };

        let peak = |band: &PeakBandSettings| {
            design::peak(band.frequency, band.q, design::db_to_gain(band.gain_db), sample_rate)
        };

        Self {
            high_pass: cut(&settings.high_pass, design::butterworth_highpass),
            low,
            low_mid: peak(&settings.low_mid),
            high_mid: peak(&settings.high_mid),
            high,
            low_pass: cut(&settings.low_pass, design::butterworth_lowpass),
        }
    }
}

/// Two-section cut filter with per-section bypass
pub struct CutFilter {
    sections: [FilterStage; MAX_CUT_SECTIONS],
}

impl CutFilter {
    /// A cut filter with every section bypassed
    pub fn new() -> Self {
        let mut sections: [FilterStage; MAX_CUT_SECTIONS] = core::array::from_fn(|_| FilterStage::passthrough());
        for section in sections.iter_mut() {
            section.set_enabled(false);
        }
        Self { sections }
    }

    /// Load a cascade design; sections it does not use are bypassed
    pub fn apply(&mut self, coefficients: Option<&CutCoefficients>) {
        let designed = coefficients.map(|c| c.sections()).unwrap_or(&[]);
        for (index, section) in self.sections.iter_mut().enumerate() {
            match designed.get(index) {
                Some(coefficients) => {
                    section.set_coefficients(*coefficients);
                    section.set_enabled(true);
                }
                None => section.set_enabled(false),
            }
        }
    }

    /// Number of enabled sections (0, 1 or 2)
    pub fn active_sections(&self) -> usize {
        self.sections.iter().filter(|s| s.is_enabled()).count()
    }

    pub fn sections(&self) -> &[FilterStage] {
        &self.sections
    }

    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        self.sections
            .iter_mut()
            .fold(input, |sample, section| section.process_sample(sample))
    }

    pub fn reset(&mut self) {
        for section in self.sections.iter_mut() {
            section.reset();
        }
    }
}

impl Default for CutFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// One slot of the chain
pub enum Stage {
    Cut(CutFilter),
    Band(FilterStage),
    Pass,
}

impl Stage {
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        match self {
            Stage::Cut(cut) => cut.process_sample(input),
            Stage::Band(band) => band.process_sample(input),
            Stage::Pass => input,
        }
    }

    pub fn reset(&mut self) {
        match self {
            Stage::Cut(cut) => cut.reset(),
            Stage::Band(band) => band.reset(),
            Stage::Pass => {}
        }
    }
}

/// The 7-slot cascade for one channel
pub struct MonoChain {
    stages: [Stage; CHAIN_LEN],
}

impl MonoChain {
    pub fn new() -> Self {
        Self {
            stages: ChainPosition::ALL.map(|position| match position {
                ChainPosition::HighPass | ChainPosition::LowPass => Stage::Cut(CutFilter::new()),
                ChainPosition::Telefy => Stage::Pass,
                _ => Stage::Band(FilterStage::passthrough()),
            }),
        }
    }

    pub fn stage(&self, position: ChainPosition) -> &Stage {
        &self.stages[position.index()]
    }

    /// Load designed coefficients into every slot
    pub fn apply(&mut self, coefficients: &EqCoefficients) {
        for (position, stage) in ChainPosition::ALL.iter().zip(self.stages.iter_mut()) {
            match (position, stage) {
                (ChainPosition::HighPass, Stage::Cut(cut)) => cut.apply(coefficients.high_pass.as_ref()),
                (ChainPosition::LowPass, Stage::Cut(cut)) => cut.apply(coefficients.low_pass.as_ref()),
                (ChainPosition::Low, Stage::Band(band)) => band.set_coefficients(coefficients.low),
                (ChainPosition::LowMid, Stage::Band(band)) => band.set_coefficients(coefficients.low_mid),
                (ChainPosition::HighMid, Stage::Band(band)) => band.set_coefficients(coefficients.high_mid),
                (ChainPosition::High, Stage::Band(band)) => band.set_coefficients(coefficients.high),
                _ => {}
            }
        }
    }

    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        self.stages
            .iter_mut()
            .fold(input, |sample, stage| stage.process_sample(sample))
    }

    #[inline]
    pub fn process_block(&mut self, block: &mut [f64]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

impl Default for MonoChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-channel EQ chains with change-detected coefficient updates
pub struct EqChain {
    chains: [MonoChain; MAX_CHANNELS],
    settings: Option<EqSettings>,
    sample_rate: f64,
}

impl EqChain {
    /// Chains in pass-through state; the first `update` designs every slot
    pub fn new(spec: &ProcessSpec) -> Self {
        Self {
            chains: core::array::from_fn(|_| MonoChain::new()),
            settings: None,
            sample_rate: spec.sample_rate,
        }
    }

    /// Redesign and load coefficients when `settings` differ from the last block
    ///
    /// Returns `true` when the designer ran.
    pub fn update(&mut self, settings: &EqSettings) -> bool {
        if self.settings.as_ref() == Some(settings) {
            return false;
        }

        let coefficients = EqCoefficients::design(settings, self.sample_rate);
        for chain in self.chains.iter_mut() {
            chain.apply(&coefficients);
        }
        self.settings = Some(*settings);
        true
    }

    /// Force the next `update` to redesign (after a bulk parameter replacement)
    pub fn invalidate(&mut self) {
        self.settings = None;
    }

    pub fn settings(&self) -> Option<&EqSettings> {
        self.settings.as_ref()
    }

    pub fn chain(&self, channel: usize) -> Option<&MonoChain> {
        self.chains.get(channel)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

impl AudioProcessor for EqChain {
    /// # Real-time Safety
    /// No allocations. O(n) where n = frames x channels.
    fn process(&mut self, block: &mut [&mut [f64]]) {
        let frames = block_len(block);
        for (chain, samples) in self.chains.iter_mut().zip(block.iter_mut()) {
            chain.process_block(&mut samples[..frames]);
        }
    }

    fn reset(&mut self) {
        for chain in self.chains.iter_mut() {
            chain.reset();
        }
    }

    fn name(&self) -> &'static str {
        "Equalizer"
    }
}
