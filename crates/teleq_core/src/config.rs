//! Stream Configuration

use serde::{Deserialize, Serialize};
use teleq_dsp::{ProcessSpec, MAX_CHANNELS};

use crate::error::{EngineError, EngineResult};

/// Audio stream configuration, fixed for one prepare/process session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Largest block the host will pass to `process`, in frames
    ///
    /// Larger blocks are still accepted and processed in chunks.
    pub max_block_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            max_block_size: 512,
        }
    }
}

impl StreamConfig {
    pub fn new(sample_rate: u32, channels: u16, max_block_size: u32) -> Self {
        Self {
            sample_rate,
            channels,
            max_block_size,
        }
    }

    /// Calculate latency in milliseconds for one block at this configuration
    pub fn latency_ms(&self) -> f32 {
        (self.max_block_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(EngineError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 || self.channels as usize > MAX_CHANNELS {
            return Err(EngineError::ConfigError(format!(
                "Invalid channel count: {} (mono or stereo only)",
                self.channels
            )));
        }
        if self.max_block_size < 16 || self.max_block_size > 8192 {
            return Err(EngineError::ConfigError(format!(
                "Invalid block size: {}",
                self.max_block_size
            )));
        }
        Ok(())
    }

    /// Validated DSP-side view of this configuration
    pub fn to_process_spec(&self) -> EngineResult<ProcessSpec> {
        self.validate()?;
        Ok(ProcessSpec::new(
            self.sample_rate as f64,
            self.channels as usize,
            self.max_block_size as usize,
        )?)
    }
}
