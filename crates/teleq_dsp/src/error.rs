//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while setting up DSP processing
///
/// Nothing in the per-sample path returns these: degenerate filter
/// parameters are clamped and unknown model tags fall back to identity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),

    #[error("Unsupported channel count: {channels} (must be 1-{max})")]
    UnsupportedChannelCount { channels: usize, max: usize },

    #[error("Maximum block size must be at least 1 frame, got {0}")]
    InvalidBlockSize(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DspError::InvalidSampleRate(-1.0);
        assert!(err.to_string().contains("-1"));

        let err = DspError::UnsupportedChannelCount { channels: 6, max: 2 };
        assert!(err.to_string().contains('6'));
        assert!(err.to_string().contains("1-2"));
    }
}
