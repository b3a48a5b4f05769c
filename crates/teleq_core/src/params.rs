//! Parameter Store
//!
//! Every control of the processor lives in one lock-free table of atomics,
//! addressed by [`ParamId`] or by its stable string key (`"HPFFreq"`,
//! `"LowGain"`, ...). The UI or host automation writes from its own thread;
//! the audio thread reads each value independently once per block and turns
//! them into a [`ChainSettings`] snapshot.
//!
//! There is no cross-parameter atomicity: a block may see one knob's new
//! value and another's old one, which is heard as part of the same sweep.

use std::sync::atomic::{AtomicU32, Ordering};

use teleq_dsp::design::db_to_gain;
use teleq_dsp::{
    CutSettings, DriveSettings, EqSettings, PeakBandSettings, ShelvingBandSettings, Slope,
    TelefySettings,
};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// HPF switches on strictly above this frequency (Hz)
pub const HPF_ACTIVATION_HZ: f32 = 17.0;

/// LPF switches on strictly below this frequency (Hz)
pub const LPF_ACTIVATION_HZ: f32 = 22001.0;

/// Number of parameters in [`PARAMETERS`]
pub const PARAM_COUNT: usize = 29;

const SLOPE_CHOICES: &[&str] = &["12 dB/Oct", "24 dB/Oct"];
const DRIVE_CHOICES: &[&str] = &["Tape", "Tube", "FET"];
const TELEFY_CHOICES: &[&str] = &["Distort", "Obliterate"];

/// Parameter identifiers, in [`PARAMETERS`] order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    HpfActive,
    LpfActive,
    HpfFreq,
    LpfFreq,
    HpfSlope,
    LpfSlope,
    LowFreq,
    LowGain,
    LowBell,
    LowMidFreq,
    LowMidGain,
    LowMidQ,
    HighMidFreq,
    HighMidGain,
    HighMidQ,
    HighFreq,
    HighGain,
    HighBell,
    DriveAmount,
    DriveActive,
    DriveType,
    Mix,
    TelefyActive,
    TelefyFreq,
    TelefyQ,
    TelefyAmount,
    TelefyType,
    InputGain,
    OutputGain,
}

impl ParamId {
    /// Look up a parameter by its stable key
    pub fn from_key(key: &str) -> Option<Self> {
        PARAMETERS.iter().find(|info| info.key == key).map(|info| info.id)
    }

    pub fn info(self) -> &'static ParamInfo {
        &PARAMETERS[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.info().key
    }

    /// All parameters, in table order
    pub fn all() -> impl Iterator<Item = ParamId> {
        PARAMETERS.iter().map(|info| info.id)
    }
}

/// Value domain of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Float {
        min: f32,
        max: f32,
        unit: &'static str,
    },
    Bool,
    /// Index into the listed choices
    Choice(&'static [&'static str]),
}

/// Static description of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamInfo {
    pub id: ParamId,
    /// Stable key used by hosts, saved state and the CLI
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: f32,
}

impl ParamInfo {
    /// Inclusive value range
    pub fn range(&self) -> (f32, f32) {
        match self.kind {
            ParamKind::Float { min, max, .. } => (min, max),
            ParamKind::Bool => (0.0, 1.0),
            ParamKind::Choice(choices) => (0.0, choices.len().saturating_sub(1) as f32),
        }
    }

    /// Bring `value` into this parameter's domain
    ///
    /// Floats are clamped, booleans snap to 0/1 and choices to the nearest
    /// index. NaN has no meaningful nearest value and yields `None`.
    pub fn sanitize(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        let (min, max) = self.range();
        let value = match self.kind {
            ParamKind::Float { .. } => value,
            ParamKind::Bool => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            ParamKind::Choice(_) => value.round(),
        };
        Some(value.clamp(min, max))
    }
}

const fn float(
    id: ParamId,
    key: &'static str,
    name: &'static str,
    min: f32,
    max: f32,
    default: f32,
    unit: &'static str,
) -> ParamInfo {
    ParamInfo {
        id,
        key,
        name,
        kind: ParamKind::Float { min, max, unit },
        default,
    }
}

const fn toggle(id: ParamId, key: &'static str, name: &'static str) -> ParamInfo {
    ParamInfo {
        id,
        key,
        name,
        kind: ParamKind::Bool,
        default: 0.0,
    }
}

const fn choice(
    id: ParamId,
    key: &'static str,
    name: &'static str,
    choices: &'static [&'static str],
) -> ParamInfo {
    ParamInfo {
        id,
        key,
        name,
        kind: ParamKind::Choice(choices),
        default: 0.0,
    }
}

/// The parameter layout
pub static PARAMETERS: [ParamInfo; PARAM_COUNT] = [
    toggle(ParamId::HpfActive, "HPFActive", "HPF Activate"),
    toggle(ParamId::LpfActive, "LPFActive", "LPF Activate"),
    float(ParamId::HpfFreq, "HPFFreq", "HPF", 17.0, 450.0, 17.0, "Hz"),
    float(ParamId::LpfFreq, "LPFFreq", "LPF", 2000.0, 22001.0, 22001.0, "Hz"),
    choice(ParamId::HpfSlope, "HPF_Slope", "HPF Slope", SLOPE_CHOICES),
    choice(ParamId::LpfSlope, "LPF_Slope", "LPF Slope", SLOPE_CHOICES),
    float(ParamId::LowFreq, "LowFreq", "Low Freq", 30.0, 500.0, 60.0, "Hz"),
    float(ParamId::LowGain, "LowGain", "Low Gain", -18.0, 18.0, 0.0, "dB"),
    toggle(ParamId::LowBell, "LowBell", "Low Bell"),
    float(ParamId::LowMidFreq, "LowMidFreq", "Low Mid Freq", 200.0, 2500.0, 300.0, "Hz"),
    float(ParamId::LowMidGain, "LowMidGain", "Low Mid Gain", -18.0, 18.0, 0.0, "dB"),
    float(ParamId::LowMidQ, "LowMidQ", "Low Mid Q", 0.4, 4.0, 1.0, ""),
    float(ParamId::HighMidFreq, "HighMidFreq", "High Mid Freq", 600.0, 7200.0, 2500.0, "Hz"),
    float(ParamId::HighMidGain, "HighMidGain", "High Mid Gain", -18.0, 18.0, 0.0, "dB"),
    float(ParamId::HighMidQ, "HighMidQ", "High Mid Q", 0.4, 4.0, 1.0, ""),
    float(ParamId::HighFreq, "HighFreq", "High Freq", 1500.0, 18000.0, 7000.0, "Hz"),
    float(ParamId::HighGain, "HighGain", "High Gain", -18.0, 18.0, 0.0, "dB"),
    toggle(ParamId::HighBell, "HighBell", "High Bell"),
    float(ParamId::DriveAmount, "DriveAmount", "Drive", 0.0, 1.0, 0.0, ""),
    toggle(ParamId::DriveActive, "driveActivate", "Drive Activate"),
    choice(ParamId::DriveType, "DriveType", "Drive Type", DRIVE_CHOICES),
    float(ParamId::Mix, "Mix", "Mix", 0.0, 1.0, 1.0, ""),
    toggle(ParamId::TelefyActive, "telefyActivate", "Telefy Activate"),
    float(ParamId::TelefyFreq, "TelefyFreq", "Tone", 300.0, 3000.0, 1100.0, "Hz"),
    float(ParamId::TelefyQ, "TelefyQ", "Intensity", 0.4, 5.0, 1.2, ""),
    float(ParamId::TelefyAmount, "TelefyAmount", "Telefy", 0.0, 1.0, 0.0, ""),
    choice(ParamId::TelefyType, "DistortionType", "Telefy Type", TELEFY_CHOICES),
    float(ParamId::InputGain, "InputGain", "Input Gain", -24.0, 12.0, 0.0, "dB"),
    float(ParamId::OutputGain, "OutputGain", "Output Gain", -24.0, 12.0, 0.0, "dB"),
];

/// Everything the audio thread needs for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSettings {
    pub eq: EqSettings,
    pub drive: DriveSettings,
    pub drive_active: bool,
    pub telefy: TelefySettings,
    pub input_gain_db: f64,
    pub output_gain_db: f64,
}

impl ChainSettings {
    pub fn input_gain(&self) -> f64 {
        db_to_gain(self.input_gain_db)
    }

    pub fn output_gain(&self) -> f64 {
        db_to_gain(self.output_gain_db)
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        ParameterStore::new().snapshot()
    }
}

/// Lock-free parameter table
///
/// Values are `f32` stored as bits in `AtomicU32` (there is no `AtomicF32`).
/// Share it with `Arc<ParameterStore>`.
pub struct ParameterStore {
    values: [AtomicU32; PARAM_COUNT],
}

impl ParameterStore {
    /// A store holding every parameter's default
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| AtomicU32::new(PARAMETERS[i].default.to_bits())),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id as usize].load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, id: ParamId, value: f32) {
        self.values[id as usize].store(value.to_bits(), Ordering::Relaxed);
    }

    /// Write a parameter, clamped to its domain; returns the stored value
    pub fn set(&self, id: ParamId, value: f32) -> EngineResult<f32> {
        let info = id.info();
        let sanitized = info.sanitize(value).ok_or_else(|| EngineError::InvalidParameterValue {
            id: info.key.to_string(),
            value,
        })?;
        self.store(id, sanitized);
        debug!("{} = {}", info.key, sanitized);
        Ok(sanitized)
    }

    /// Write a parameter by key
    pub fn set_by_key(&self, key: &str, value: f32) -> EngineResult<f32> {
        let id = ParamId::from_key(key).ok_or_else(|| EngineError::UnknownParameter(key.to_string()))?;
        self.set(id, value)
    }

    /// Read a parameter by key
    pub fn get_by_key(&self, key: &str) -> EngineResult<f32> {
        ParamId::from_key(key)
            .map(|id| self.get(id))
            .ok_or_else(|| EngineError::UnknownParameter(key.to_string()))
    }

    pub fn reset_to_defaults(&self) {
        for info in PARAMETERS.iter() {
            self.store(info.id, info.default);
        }
    }

    #[inline]
    fn flag(&self, id: ParamId) -> bool {
        self.get(id) > 0.5
    }

    #[inline]
    fn index(&self, id: ParamId) -> i32 {
        self.get(id) as i32
    }

    #[inline]
    fn value(&self, id: ParamId) -> f64 {
        self.get(id) as f64
    }

    /// Derive the four activation flags from their controlling values
    ///
    /// HPF on iff `HPFFreq > 17`, LPF on iff `LPFFreq < 22001`, Drive on iff
    /// `DriveAmount > 0`, Telefy on iff `TelefyAmount > 0`. Only flags that
    /// disagree are written. Returns `true` if any flag changed.
    ///
    /// # Real-time Safety
    /// Atomic loads/stores only; safe on the audio thread.
    pub fn update_activation_states(&self) -> bool {
        let derived = [
            (ParamId::HpfActive, self.get(ParamId::HpfFreq) > HPF_ACTIVATION_HZ),
            (ParamId::LpfActive, self.get(ParamId::LpfFreq) < LPF_ACTIVATION_HZ),
            (ParamId::DriveActive, self.get(ParamId::DriveAmount) > 0.0),
            (ParamId::TelefyActive, self.get(ParamId::TelefyAmount) > 0.0),
        ];

        let mut changed = false;
        for (id, should_be_on) in derived {
            if self.flag(id) != should_be_on {
                self.store(id, if should_be_on { 1.0 } else { 0.0 });
                changed = true;
            }
        }
        changed
    }

    /// Read every parameter once into a block snapshot
    ///
    /// # Real-time Safety
    /// No allocations; one relaxed load per parameter.
    pub fn snapshot(&self) -> ChainSettings {
        let eq = EqSettings {
            high_pass: CutSettings {
                active: self.flag(ParamId::HpfActive),
                frequency: self.value(ParamId::HpfFreq),
                slope: Slope::from_index(self.index(ParamId::HpfSlope)),
            },
            low: ShelvingBandSettings {
                frequency: self.value(ParamId::LowFreq),
                gain_db: self.value(ParamId::LowGain),
                bell: self.flag(ParamId::LowBell),
            },
            low_mid: PeakBandSettings {
                frequency: self.value(ParamId::LowMidFreq),
                gain_db: self.value(ParamId::LowMidGain),
                q: self.value(ParamId::LowMidQ),
            },
            high_mid: PeakBandSettings {
                frequency: self.value(ParamId::HighMidFreq),
                gain_db: self.value(ParamId::HighMidGain),
                q: self.value(ParamId::HighMidQ),
            },
            high: ShelvingBandSettings {
                frequency: self.value(ParamId::HighFreq),
                gain_db: self.value(ParamId::HighGain),
                bell: self.flag(ParamId::HighBell),
            },
            low_pass: CutSettings {
                active: self.flag(ParamId::LpfActive),
                frequency: self.value(ParamId::LpfFreq),
                slope: Slope::from_index(self.index(ParamId::LpfSlope)),
            },
        };

        ChainSettings {
            eq,
            drive: DriveSettings {
                amount: self.value(ParamId::DriveAmount),
                model: self.index(ParamId::DriveType),
                mix: self.value(ParamId::Mix),
            },
            drive_active: self.flag(ParamId::DriveActive),
            telefy: TelefySettings {
                active: self.flag(ParamId::TelefyActive),
                amount: self.value(ParamId::TelefyAmount),
                frequency: self.value(ParamId::TelefyFreq),
                q: self.value(ParamId::TelefyQ),
                model: self.index(ParamId::TelefyType),
            },
            input_gain_db: self.value(ParamId::InputGain),
            output_gain_db: self.value(ParamId::OutputGain),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_table_order_matches_ids() {
        for (index, info) in PARAMETERS.iter().enumerate() {
            assert_eq!(info.id as usize, index, "{} out of order", info.key);
        }
        assert_eq!(ParamId::all().count(), PARAM_COUNT);
    }

    #[test]
    fn test_keys_are_unique_and_resolvable() {
        for info in PARAMETERS.iter() {
            assert_eq!(ParamId::from_key(info.key), Some(info.id));
        }
        assert_eq!(ParamId::from_key("hpffreq"), None);
        assert_eq!(ParamId::TelefyType.key(), "DistortionType");
    }

    #[test]
    fn test_defaults_are_in_range() {
        for info in PARAMETERS.iter() {
            let (min, max) = info.range();
            assert!(
                (min..=max).contains(&info.default),
                "{} default {} outside {min}..{max}",
                info.key,
                info.default
            );
        }
    }

    #[test]
    fn test_default_snapshot_is_neutral() {
        let settings = ParameterStore::new().snapshot();
        assert_eq!(settings.eq, EqSettings::default());
        assert_eq!(settings.drive, DriveSettings::default());
        assert!(!settings.drive_active);
        assert_eq!(settings.telefy.amount, 0.0);
        assert_eq!(settings.telefy.frequency, 1100.0);
        assert_eq!(settings.input_gain(), 1.0);
        assert_eq!(settings.output_gain(), 1.0);
    }

    #[test]
    fn test_set_clamps_to_range() {
        let store = ParameterStore::new();
        assert_eq!(store.set(ParamId::LowGain, 40.0).unwrap(), 18.0);
        assert_eq!(store.set(ParamId::LowGain, -40.0).unwrap(), -18.0);
        assert_eq!(store.set(ParamId::LowBell, 0.7).unwrap(), 1.0);
        assert_eq!(store.set(ParamId::DriveType, 1.6).unwrap(), 2.0);
        assert_eq!(store.set(ParamId::DriveType, 9.0).unwrap(), 2.0);
        assert_eq!(store.set(ParamId::HpfSlope, -1.0).unwrap(), 0.0);
        assert_eq!(store.get(ParamId::DriveType), 2.0);
    }

    #[test]
    fn test_set_rejects_nan_and_unknown_keys() {
        let store = ParameterStore::new();
        assert!(matches!(
            store.set(ParamId::LowGain, f32::NAN),
            Err(EngineError::InvalidParameterValue { .. })
        ));
        assert_eq!(store.get(ParamId::LowGain), 0.0);

        assert!(matches!(
            store.set_by_key("Volume", 1.0),
            Err(EngineError::UnknownParameter(_))
        ));
        assert!(store.get_by_key("Volume").is_err());
    }

    #[test]
    fn test_set_by_key() {
        let store = ParameterStore::new();
        store.set_by_key("HighMidGain", 4.5).unwrap();
        assert_eq!(store.get_by_key("HighMidGain").unwrap(), 4.5);
        assert_eq!(store.snapshot().eq.high_mid.gain_db, 4.5);
    }

    #[test]
    fn test_hpf_activation_boundary() {
        let store = ParameterStore::new();

        store.set(ParamId::HpfFreq, 17.0).unwrap();
        store.update_activation_states();
        assert_eq!(store.get(ParamId::HpfActive), 0.0);

        store.set(ParamId::HpfFreq, 17.01).unwrap();
        assert!(store.update_activation_states());
        assert_eq!(store.get(ParamId::HpfActive), 1.0);
        assert!(store.snapshot().eq.high_pass.active);
    }

    #[test]
    fn test_lpf_and_effect_activation() {
        let store = ParameterStore::new();
        assert!(!store.update_activation_states(), "defaults are consistent");

        store.set(ParamId::LpfFreq, 22000.0).unwrap();
        store.set(ParamId::DriveAmount, 0.01).unwrap();
        store.set(ParamId::TelefyAmount, 0.5).unwrap();
        assert!(store.update_activation_states());

        let settings = store.snapshot();
        assert!(settings.eq.low_pass.active);
        assert!(settings.drive_active);
        assert!(settings.telefy.active);

        store.set(ParamId::DriveAmount, 0.0).unwrap();
        store.update_activation_states();
        assert!(!store.snapshot().drive_active);
    }

    #[test]
    fn test_manual_flag_is_overridden() {
        let store = ParameterStore::new();
        store.set(ParamId::HpfActive, 1.0).unwrap();
        assert!(store.update_activation_states());
        assert_eq!(store.get(ParamId::HpfActive), 0.0);
    }

    #[test]
    fn test_snapshot_maps_choices() {
        let store = ParameterStore::new();
        store.set(ParamId::HpfSlope, 1.0).unwrap();
        store.set(ParamId::TelefyType, 1.0).unwrap();
        store.set(ParamId::DriveType, 2.0).unwrap();

        let settings = store.snapshot();
        assert_eq!(settings.eq.high_pass.slope, Slope::Slope24);
        assert_eq!(settings.eq.low_pass.slope, Slope::Slope12);
        assert_eq!(settings.telefy.model, 1);
        assert_eq!(settings.drive.model, 2);
    }

    #[test]
    fn test_reset_to_defaults() {
        let store = ParameterStore::new();
        store.set(ParamId::OutputGain, -6.0).unwrap();
        store.set(ParamId::TelefyAmount, 1.0).unwrap();
        store.reset_to_defaults();
        assert_eq!(store.snapshot(), ChainSettings::default());
    }

    #[test]
    fn test_concurrent_writes_and_reads() {
        let store = Arc::new(ParameterStore::new());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..1000 {
                    store.set(ParamId::LowGain, (i % 36) as f32 - 18.0).unwrap();
                }
            })
        };

        for _ in 0..1000 {
            let gain = store.snapshot().eq.low.gain_db;
            assert!((-18.0..=18.0).contains(&gain));
        }
        writer.join().unwrap();
    }
}
