//! Audio Processor Trait
//!
//! Defines the interface shared by the stages of the TeLeQ pipeline
//! (Drive -> EQ -> Telefy). Stages are composed statically by the block
//! processor; there is no boxed chain and no dynamic dispatch per block.

use crate::error::DspError;

/// Maximum number of channels the core processes (mono or stereo)
///
/// Every per-channel resource (filter banks, auto-gain state, work buffers)
/// is sized to this value.
pub const MAX_CHANNELS: usize = 2;

/// Stream metadata fixed for one prepare/process session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f64,
    pub channels: usize,
    pub max_block_size: usize,
}

impl ProcessSpec {
    /// Validate and build a spec
    pub fn new(sample_rate: f64, channels: usize, max_block_size: usize) -> Result<Self, DspError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(DspError::UnsupportedChannelCount {
                channels,
                max: MAX_CHANNELS,
            });
        }
        if max_block_size == 0 {
            return Err(DspError::InvalidBlockSize(max_block_size));
        }

        Ok(Self {
            sample_rate,
            channels,
            max_block_size,
        })
    }

    /// Nyquist frequency in Hz
    pub fn nyquist(&self) -> f64 {
        self.sample_rate * 0.5
    }
}

/// Trait for the stages of the processing chain
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - Constant or O(n) time complexity where n = block length
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait AudioProcessor: Send {
    /// Process a planar block in-place
    ///
    /// `block[channel][frame]`, all channels the same length. Channels beyond
    /// [`MAX_CHANNELS`] are left untouched.
    fn process(&mut self, block: &mut [&mut [f64]]);

    /// Reset internal state (delay lines, smoothers, RMS accumulators)
    fn reset(&mut self);

    /// Human-readable name for debugging
    fn name(&self) -> &'static str;

    /// Whether this stage would currently alter the signal
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Length of the shortest channel in a planar block
#[inline]
pub(crate) fn block_len(block: &[&mut [f64]]) -> usize {
    block.iter().map(|channel| channel.len()).min().unwrap_or(0)
}
