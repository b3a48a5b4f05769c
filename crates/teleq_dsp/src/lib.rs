//! TeLeQ DSP - Digital Signal Processing Module
//!
//! This crate provides the signal path of the TeLeQ equalizer, including:
//! - Butterworth high/low cut filters (12 or 24 dB/oct)
//! - 4-band EQ with switchable shelf/bell low and high bands
//! - Drive saturation (Tape, Tube, FET) with RMS auto-gain
//! - Telefy band-limited distortion (Distort, Obliterate)
//! - Linear parameter smoothing
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Coefficients are designed once per block, before the per-sample loops,
//! and every buffer a stage needs is sized when the stage is built.

mod auto_gain;
pub mod design;
mod drive;
mod eq;
mod error;
mod filter;
mod processor;
pub mod saturation;
mod smoothing;
mod telefy;

pub use auto_gain::{smoothing_coefficient, AutoGain, AUTO_GAIN_TIME_CONSTANT, RMS_FLOOR};
pub use drive::{DriveSettings, DriveStage, DRIVE_RAMP_SECONDS, DRIVE_SCALE, MAX_DRIVE, MIN_DRIVE};
pub use eq::{
    ChainPosition, CutFilter, CutSettings, EqChain, EqCoefficients, EqSettings, MonoChain,
    PeakBandSettings, ShelvingBandSettings, Slope, Stage, CHAIN_LEN, HIGH_BELL_Q, LOW_BELL_Q,
};
pub use error::DspError;
pub use filter::FilterStage;
pub use processor::{AudioProcessor, ProcessSpec, MAX_CHANNELS};
pub use saturation::{DriveModel, TelefyModel};
pub use smoothing::LinearSmoother;
pub use telefy::{telefy_levels, TelefyLevels, TelefySettings, TelefyStage};
