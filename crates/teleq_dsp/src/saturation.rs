//! Saturation Models
//!
//! Stateless waveshapers for the Drive stage (Tape, Tube, FET) and the
//! Telefy stage (FET+, Rasp), plus the per-channel filter banks that wrap
//! the Drive shapers.
//!
//! # Algorithm
//!
//! Every shaper adds a small even-order term before the nonlinearity, so the
//! curves are deliberately asymmetric (even harmonics). All of them map 0 to
//! 0. Drive shapers run between a DC-blocking pre-emphasis (20 Hz highpass)
//! and an anti-alias de-emphasis (21 kHz lowpass followed by neutral 20 Hz
//! highpass sections).

use std::f64::consts::FRAC_1_SQRT_2;

use crate::design;
use crate::filter::FilterStage;
use crate::processor::MAX_CHANNELS;

/// Corner of the DC-blocking pre/post highpass sections (Hz)
pub const DC_BLOCK_HZ: f64 = 20.0;

/// Corner of the anti-alias post lowpass (Hz)
pub const ANTI_ALIAS_HZ: f64 = 21000.0;

/// Tape: asymmetric soft shaper
#[inline]
pub fn tape(x: f64) -> f64 {
    let a = x + 0.04 * x * x;
    (a * 0.9).tanh()
}

/// Tube: polynomial triode model
#[inline]
pub fn tube(x: f64) -> f64 {
    let x2 = x * x;
    let x4 = x2 * x2;
    let nonlin = 0.85 * x + 0.15 * x2 + 0.04 * x4;
    (nonlin * 1.1).tanh()
}

/// FET: fast compressive knee
#[inline]
pub fn fet(x: f64) -> f64 {
    let a = x + 0.03 * x * x;
    a / (1.0 + 0.55 * a.abs())
}

/// Telefy FET+: strong asymmetry, FET knee, rounded top
#[inline]
pub fn fet_plus(x: f64) -> f64 {
    let a = x + 0.10 * x * x;
    let knee = a / (1.0 + 0.35 * a.abs());
    (knee * 1.5).tanh()
}

/// Telefy Rasp: hard tanh overdrive blended with its square
#[inline]
pub fn rasp(x: f64) -> f64 {
    let a = x + 0.12 * x * x;
    let b = (a * 2.4).tanh();
    0.7 * b + 0.3 * (b * b)
}

/// Drive stage saturation model ("Drive Type" choice)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveModel {
    Tape,
    Tube,
    Fet,
}

impl DriveModel {
    pub const ALL: [DriveModel; 3] = [DriveModel::Tape, DriveModel::Tube, DriveModel::Fet];

    /// Map a choice index to a model; unknown indices have no model
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(DriveModel::Tape),
            1 => Some(DriveModel::Tube),
            2 => Some(DriveModel::Fet),
            _ => None,
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    /// Display name for the model
    pub fn display_name(self) -> &'static str {
        match self {
            DriveModel::Tape => "Tape",
            DriveModel::Tube => "Tube",
            DriveModel::Fet => "FET",
        }
    }

    /// The bare waveshaper
    #[inline]
    pub fn shape(self, x: f64) -> f64 {
        match self {
            DriveModel::Tape => tape(x),
            DriveModel::Tube => tube(x),
            DriveModel::Fet => fet(x),
        }
    }
}

/// Telefy saturation model ("Telefy Type" choice)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelefyModel {
    /// "Distort"
    FetPlus,
    /// "Obliterate"
    Rasp,
}

impl TelefyModel {
    pub const ALL: [TelefyModel; 2] = [TelefyModel::FetPlus, TelefyModel::Rasp];

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(TelefyModel::FetPlus),
            1 => Some(TelefyModel::Rasp),
            _ => None,
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TelefyModel::FetPlus => "Distort",
            TelefyModel::Rasp => "Obliterate",
        }
    }

    #[inline]
    pub fn shape(self, x: f64) -> f64 {
        match self {
            TelefyModel::FetPlus => fet_plus(x),
            TelefyModel::Rasp => rasp(x),
        }
    }
}

/// Telefy shaper by choice index; unknown indices pass the sample through
#[inline]
pub fn telefy_saturate(x: f64, model: i32) -> f64 {
    match TelefyModel::from_index(model) {
        Some(model) => model.shape(x),
        None => x,
    }
}

/// Pre/post filters around one Drive shaper, for one channel
///
/// Tape uses 2 pre + 3 post sections; Tube and FET use 2 + 2 (their third
/// post section is bypassed).
pub struct SaturatorFilters {
    pre: [FilterStage; 2],
    post: [FilterStage; 3],
}

impl SaturatorFilters {
    /// Filters for `model` at `sample_rate`
    pub fn new(model: DriveModel, sample_rate: f64) -> Self {
        let dc_block = || FilterStage::new(design::highpass(DC_BLOCK_HZ, FRAC_1_SQRT_2, sample_rate));
        let anti_alias = FilterStage::new(design::lowpass(ANTI_ALIAS_HZ, FRAC_1_SQRT_2, sample_rate));

        let mut third = dc_block();
        third.set_enabled(model == DriveModel::Tape);

        Self {
            pre: [dc_block(), dc_block()],
            post: [anti_alias, dc_block(), third],
        }
    }

    /// Number of active post sections
    pub fn post_sections(&self) -> usize {
        self.post.iter().filter(|stage| stage.is_enabled()).count()
    }

    /// Pre-emphasis -> shaper -> de-emphasis
    #[inline]
    pub fn process(&mut self, x: f64, shaper: fn(f64) -> f64) -> f64 {
        let mut y = x;
        for stage in self.pre.iter_mut() {
            y = stage.process_sample(y);
        }
        y = shaper(y);
        for stage in self.post.iter_mut() {
            y = stage.process_sample(y);
        }
        y
    }

    pub fn reset(&mut self) {
        for stage in self.pre.iter_mut().chain(self.post.iter_mut()) {
            stage.reset();
        }
    }
}

/// All Drive saturators with their filter banks, for every channel
pub struct SaturatorBank {
    tape: [SaturatorFilters; MAX_CHANNELS],
    tube: [SaturatorFilters; MAX_CHANNELS],
    fet: [SaturatorFilters; MAX_CHANNELS],
}

impl SaturatorBank {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            tape: core::array::from_fn(|_| SaturatorFilters::new(DriveModel::Tape, sample_rate)),
            tube: core::array::from_fn(|_| SaturatorFilters::new(DriveModel::Tube, sample_rate)),
            fet: core::array::from_fn(|_| SaturatorFilters::new(DriveModel::Fet, sample_rate)),
        }
    }

    /// Saturate one sample of `channel` with the model selected by `model`
    ///
    /// Unknown model indices and out-of-range channels pass the sample
    /// through unchanged.
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process(&mut self, channel: usize, model: i32, x: f64) -> f64 {
        if channel >= MAX_CHANNELS {
            return x;
        }
        match DriveModel::from_index(model) {
            Some(DriveModel::Tape) => self.tape[channel].process(x, tape),
            Some(DriveModel::Tube) => self.tube[channel].process(x, tube),
            Some(DriveModel::Fet) => self.fet[channel].process(x, fet),
            None => x,
        }
    }

    /// Filters of one model/channel pair
    pub fn filters(&self, model: DriveModel, channel: usize) -> Option<&SaturatorFilters> {
        let bank = match model {
            DriveModel::Tape => &self.tape,
            DriveModel::Tube => &self.tube,
            DriveModel::Fet => &self.fet,
        };
        bank.get(channel)
    }

    pub fn reset(&mut self) {
        for filters in self
            .tape
            .iter_mut()
            .chain(self.tube.iter_mut())
            .chain(self.fet.iter_mut())
        {
            filters.reset();
        }
    }
}
