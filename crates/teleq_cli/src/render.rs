//! WAV in, WAV out
//!
//! Files are read into planar `f32` channels, pushed through a
//! [`TeleqProcessor`] in host-sized blocks and written as 32-bit float.

use std::io::{Read, Seek, Write};

use anyhow::{anyhow, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use teleq_core::{PeakSnapshot, TeleqProcessor, MAX_CHANNELS};

/// Planar audio with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarAudio {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl PlanarAudio {
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

/// Decode a WAV stream to planar `f32` in -1..1
pub fn read_audio<R: Read>(reader: WavReader<R>) -> Result<PlanarAudio> {
    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    if channel_count == 0 || channel_count > MAX_CHANNELS {
        return Err(anyhow!(
            "{}-channel audio is not supported (mono or stereo only)",
            channel_count
        ));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("failed to decode float samples")?,
        SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .context("failed to decode integer samples")?
        }
    };

    let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    Ok(PlanarAudio {
        sample_rate: spec.sample_rate,
        channels,
    })
}

/// Encode planar audio as interleaved 32-bit float WAV
pub fn write_audio<W: Write + Seek>(writer: W, audio: &PlanarAudio) -> Result<()> {
    let spec = WavSpec {
        channels: audio.channels.len() as u16,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::new(writer, spec).context("failed to start WAV stream")?;
    for frame in 0..audio.frames() {
        for channel in &audio.channels {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize().context("failed to finalize WAV stream")?;
    Ok(())
}

/// Run `audio` through `processor` in blocks of `block_size` frames
///
/// Returns the highest peaks seen across all blocks.
pub fn render(processor: &mut TeleqProcessor, audio: &mut PlanarAudio, block_size: usize) -> PeakSnapshot {
    let block_size = block_size.max(1);
    let frames = audio.frames();
    let mut peaks = PeakSnapshot::default();

    let mut start = 0;
    while start < frames {
        let end = (start + block_size).min(frames);
        let mut block: Vec<&mut [f32]> = audio
            .channels
            .iter_mut()
            .map(|channel| &mut channel[start..end])
            .collect();
        processor.process(&mut block);

        let block_peaks = processor.meters().snapshot();
        processor.meters().reset();
        peaks.input_left = peaks.input_left.max(block_peaks.input_left);
        peaks.input_right = peaks.input_right.max(block_peaks.input_right);
        peaks.output_left = peaks.output_left.max(block_peaks.output_left);
        peaks.output_right = peaks.output_right.max(block_peaks.output_right);

        start = end;
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;
    use teleq_core::{ParamId, StreamConfig};

    fn encode_int16(channels: u16, samples: &[i16]) -> Cursor<Vec<u8>> {
        let spec = WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn test_read_deinterleaves_and_scales() {
        let cursor = encode_int16(2, &[16384, -16384, 0, 32767]);
        let audio = read_audio(WavReader::new(cursor).unwrap()).unwrap();

        assert_eq!(audio.sample_rate, 44100);
        assert_eq!(audio.channels.len(), 2);
        assert_eq!(audio.channels[0], vec![0.5, 0.0]);
        assert_relative_eq!(audio.channels[1][0], -0.5);
        assert_relative_eq!(audio.channels[1][1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_surround_input_is_rejected() {
        let cursor = encode_int16(3, &[0, 0, 0]);
        assert!(read_audio(WavReader::new(cursor).unwrap()).is_err());
    }

    #[test]
    fn test_float_output_is_lossless() {
        let audio = PlanarAudio {
            sample_rate: 48000,
            channels: vec![vec![0.125, -0.75, 0.333], vec![1.5, 0.0, -0.001]],
        };

        let mut cursor = Cursor::new(Vec::new());
        write_audio(&mut cursor, &audio).unwrap();
        cursor.set_position(0);

        let decoded = read_audio(WavReader::new(cursor).unwrap()).unwrap();
        assert_eq!(decoded, audio);
    }

    #[test]
    fn test_render_applies_output_gain_and_reports_peaks() {
        let mut processor = TeleqProcessor::new(StreamConfig::new(48000, 1, 64)).unwrap();
        processor.params().set(ParamId::OutputGain, -6.0).unwrap();

        let mut audio = PlanarAudio {
            sample_rate: 48000,
            channels: vec![(0..1000).map(|n| if n == 700 { 0.9 } else { 0.1 }).collect()],
        };
        let peaks = render(&mut processor, &mut audio, 100);

        assert_relative_eq!(peaks.input_left, 0.9);
        assert_relative_eq!(peaks.output_left, 0.9 * 0.501_187, max_relative = 1e-4);
        assert_relative_eq!(audio.channels[0][0], 0.1 * 0.501_187, max_relative = 1e-4);
        assert_eq!(audio.frames(), 1000);
    }
}
