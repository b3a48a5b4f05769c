//! Engine Error Types

use thiserror::Error;

/// Errors raised on the control side of the engine
///
/// `TeleqProcessor::process` never returns these; they come from
/// configuration, parameter writes and state restore.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value {value} for parameter {id}")]
    InvalidParameterValue { id: String, value: f32 },

    #[error("Unsupported state version {found} (expected at most {supported})")]
    UnsupportedStateVersion { found: u32, supported: u32 },

    #[error("State serialization error: {0}")]
    StateError(#[from] serde_json::Error),

    #[error("DSP error: {0}")]
    DspError(#[from] teleq_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
