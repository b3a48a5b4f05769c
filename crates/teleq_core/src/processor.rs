//! Block Processor
//!
//! Per-block entry point of the engine:
//!
//! ```text
//! f32 in ─▶ input gain ─▶ Drive ─▶ EQ ─▶ Telefy ─▶ output gain ─▶ f32 out
//!              │                                        │
//!              └── input peaks                output peaks ──┘
//! ```
//!
//! Processing runs in `f64` in work buffers sized by `prepare`. Host blocks
//! longer than the prepared size are processed in chunks, so `process` never
//! allocates. Parameters are read once per block; EQ coefficients are
//! redesigned only when the snapshot changed.

use std::sync::Arc;

use teleq_dsp::{AudioProcessor, DriveStage, EqChain, ProcessSpec, TelefyStage, MAX_CHANNELS};
use tracing::{info, warn};

use crate::config::StreamConfig;
use crate::error::EngineResult;
use crate::params::{ChainSettings, ParameterStore};
use crate::state::ParameterState;
use crate::telemetry::PeakMeters;

/// The complete TeLeQ signal path for one plugin instance
pub struct TeleqProcessor {
    params: Arc<ParameterStore>,
    meters: Arc<PeakMeters>,
    config: StreamConfig,
    drive: DriveStage,
    eq: EqChain,
    telefy: TelefyStage,
    work: [Vec<f64>; MAX_CHANNELS],
}

impl TeleqProcessor {
    /// Create a processor with its own parameter store and meters
    pub fn new(config: StreamConfig) -> EngineResult<Self> {
        Self::with_shared(config, Arc::new(ParameterStore::new()), Arc::new(PeakMeters::new()))
    }

    /// Create a processor reading `params` and writing `meters`
    pub fn with_shared(
        config: StreamConfig,
        params: Arc<ParameterStore>,
        meters: Arc<PeakMeters>,
    ) -> EngineResult<Self> {
        let spec = Self::validated_spec(&config)?;
        info!(
            "TeLeQ processor created: {} Hz, {} ch, {} frames",
            config.sample_rate, config.channels, config.max_block_size
        );

        Ok(Self {
            params,
            meters,
            config,
            drive: DriveStage::new(&spec),
            eq: EqChain::new(&spec),
            telefy: TelefyStage::new(&spec),
            work: core::array::from_fn(|_| vec![0.0; spec.max_block_size]),
        })
    }

    fn validated_spec(config: &StreamConfig) -> EngineResult<ProcessSpec> {
        config.to_process_spec().map_err(|e| {
            warn!("Rejected stream configuration {:?}: {}", config, e);
            e
        })
    }

    /// Re-initialize for a new session
    ///
    /// Rebuilds every stage for the new sample rate and block size, which
    /// clears all delay lines, smoothers and RMS accumulators. Must not run
    /// concurrently with `process` (enforced by `&mut self`).
    pub fn prepare(&mut self, config: StreamConfig) -> EngineResult<()> {
        let spec = Self::validated_spec(&config)?;

        self.drive = DriveStage::new(&spec);
        self.eq = EqChain::new(&spec);
        self.telefy = TelefyStage::new(&spec);
        self.work = core::array::from_fn(|_| vec![0.0; spec.max_block_size]);
        self.meters.reset();
        self.config = config;

        info!(
            "TeLeQ processor prepared: {} Hz, {} ch, {} frames ({:.1} ms)",
            config.sample_rate,
            config.channels,
            config.max_block_size,
            config.latency_ms()
        );
        Ok(())
    }

    /// Clear all processing state, keeping the configuration
    pub fn reset(&mut self) {
        self.drive.reset();
        self.eq.reset();
        self.eq.invalidate();
        self.telefy.reset();
        info!("TeLeQ processor reset");
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn meters(&self) -> &Arc<PeakMeters> {
        &self.meters
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Processed block size; longer host blocks are split into chunks of this length
    pub fn chunk_size(&self) -> usize {
        self.work[0].len()
    }

    /// Capture the parameter store as opaque bytes
    pub fn save_state(&self) -> EngineResult<Vec<u8>> {
        ParameterState::capture(&self.params).to_bytes()
    }

    /// Replace all parameters from bytes produced by [`save_state`](Self::save_state)
    ///
    /// Every derived coefficient is recomputed on the next block.
    pub fn restore_state(&mut self, bytes: &[u8]) -> EngineResult<()> {
        ParameterState::from_bytes(bytes)?.apply(&self.params)?;
        self.eq.invalidate();
        Ok(())
    }

    /// Process a planar block in place, every channel carrying input
    ///
    /// # Real-time Safety
    /// No allocations, no locks, no logging.
    pub fn process(&mut self, buffer: &mut [&mut [f32]]) {
        let input_channels = buffer.len();
        self.process_with_inputs(buffer, input_channels);
    }

    /// Process a planar block whose first `input_channels` channels carry input
    ///
    /// Channels beyond `input_channels` are output-only and are cleared
    /// first. Empty blocks are a no-op.
    pub fn process_with_inputs(&mut self, buffer: &mut [&mut [f32]], input_channels: usize) {
        for channel in buffer.iter_mut().skip(input_channels) {
            channel.fill(0.0);
        }

        let channels = buffer.len().min(MAX_CHANNELS);
        let frames = buffer
            .iter()
            .take(channels)
            .map(|channel| channel.len())
            .min()
            .unwrap_or(0);
        if channels == 0 || frames == 0 {
            return;
        }

        self.params.update_activation_states();
        let settings = self.params.snapshot();

        self.drive.update(&settings.drive);
        self.eq.update(&settings.eq);
        self.telefy.update(&settings.telefy);

        let chunk_size = self.chunk_size();
        let mut start = 0;
        while start < frames {
            let end = (start + chunk_size).min(frames);
            self.process_chunk(&mut buffer[..channels], start, end, &settings);
            start = end;
        }
    }

    fn process_chunk(
        &mut self,
        buffer: &mut [&mut [f32]],
        start: usize,
        end: usize,
        settings: &ChainSettings,
    ) {
        let Self {
            drive,
            eq,
            telefy,
            work,
            meters,
            ..
        } = self;

        let frames = end - start;
        let [left, right] = work;
        let mut block: [&mut [f64]; MAX_CHANNELS] = [&mut left[..frames], &mut right[..frames]];
        let block = &mut block[..buffer.len()];

        let input_gain = settings.input_gain();
        for (channel, (work, host)) in block.iter_mut().zip(buffer.iter()).enumerate() {
            let mut peak = 0.0_f64;
            for (sample, &input) in work.iter_mut().zip(&host[start..end]) {
                *sample = input as f64 * input_gain;
                peak = peak.max(sample.abs());
            }
            meters.record_input(channel, peak as f32);
        }

        drive.process(block);
        eq.process(block);
        telefy.process(block);

        let output_gain = settings.output_gain();
        for (channel, (work, host)) in block.iter_mut().zip(buffer.iter_mut()).enumerate() {
            let mut peak = 0.0_f64;
            for (sample, output) in work.iter_mut().zip(&mut host[start..end]) {
                *sample *= output_gain;
                peak = peak.max(sample.abs());
                *output = *sample as f32;
            }
            meters.record_output(channel, peak as f32);
        }
    }
}
