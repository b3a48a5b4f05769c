//! TeLeQ Core - Processing Engine
//!
//! This crate wires the `teleq_dsp` stages into a complete processor:
//! - Lock-free parameter store shared between control and audio threads
//! - Block processor (input gain, Drive, EQ, Telefy, output gain)
//! - Peak telemetry for input/output meters
//! - Versioned parameter state for save/restore
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Control Thread                          │
//! │   set(ParamId, value) ──▶ ParameterStore ◀── restore_state  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ AtomicU32 (relaxed)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   snapshot ──▶ Drive ──▶ EQ ──▶ Telefy ──▶ PeakMeters       │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod params;
mod processor;
mod state;
mod telemetry;

pub use config::StreamConfig;
pub use error::{EngineError, EngineResult};
pub use params::{
    ChainSettings, ParamId, ParamInfo, ParamKind, ParameterStore, HPF_ACTIVATION_HZ,
    LPF_ACTIVATION_HZ, PARAMETERS, PARAM_COUNT,
};
pub use processor::TeleqProcessor;
pub use state::{ParameterState, STATE_VERSION};
pub use telemetry::{gain_to_normalized_db, MeterReading, PeakMeters, PeakSnapshot, METER_DECAY};

// Re-export DSP types for convenience
pub use teleq_dsp::{
    telefy_levels, DriveModel, EqSettings, TelefyLevels, TelefyModel, MAX_CHANNELS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let _config = StreamConfig::default();
        assert_eq!(PARAMETERS.len(), PARAM_COUNT);
        assert!(TeleqProcessor::new(StreamConfig::default()).is_ok());
    }
}
