//! End-to-end behaviour of the block processor

use std::f32::consts::PI;
use std::sync::Arc;
use std::thread;

use approx::assert_relative_eq;
use teleq_core::{
    telefy_levels, ParamId, ParameterState, ParameterStore, PeakMeters, StreamConfig,
    TeleqProcessor,
};

const FS: u32 = 48000;

fn processor(block: u32) -> TeleqProcessor {
    TeleqProcessor::new(StreamConfig::new(FS, 2, block)).unwrap()
}

fn sine(frequency: f32, amplitude: f32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|n| amplitude * (2.0 * PI * frequency * n as f32 / FS as f32).sin())
        .collect()
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

fn run_stereo(processor: &mut TeleqProcessor, left: &mut [f32], right: &mut [f32]) {
    processor.process(&mut [left, right]);
}

#[test]
fn default_parameters_pass_audio_unchanged() {
    let mut processor = processor(512);
    let input_left = sine(440.0, 0.7, 2048);
    let input_right = sine(3000.0, 0.3, 2048);
    let mut left = input_left.clone();
    let mut right = input_right.clone();

    run_stereo(&mut processor, &mut left, &mut right);

    assert_eq!(left, input_left);
    assert_eq!(right, input_right);
}

#[test]
fn high_pass_engages_just_above_its_floor() {
    let input = vec![0.5_f32; FS as usize];

    let mut at_floor = processor(1024);
    at_floor.params().set(ParamId::HpfFreq, 17.0).unwrap();
    let mut untouched = input.clone();
    at_floor.process(&mut [&mut untouched[..]]);
    assert_eq!(at_floor.params().get(ParamId::HpfActive), 0.0);
    assert_eq!(untouched, input);

    let mut above_floor = processor(1024);
    above_floor.params().set(ParamId::HpfFreq, 17.01).unwrap();
    let mut filtered = input.clone();
    above_floor.process(&mut [&mut filtered[..]]);
    assert_eq!(above_floor.params().get(ParamId::HpfActive), 1.0);
    assert!(filtered.last().unwrap().abs() < 0.01);
}

#[test]
fn low_pass_engages_just_below_its_ceiling() {
    let mut processor = processor(512);
    processor.params().set(ParamId::LpfFreq, 22000.5).unwrap();

    let mut block = sine(1000.0, 0.5, 512);
    processor.process(&mut [&mut block[..]]);
    assert_eq!(processor.params().get(ParamId::LpfActive), 1.0);

    processor.params().set(ParamId::LpfFreq, 22001.0).unwrap();
    processor.process(&mut [&mut block[..]]);
    assert_eq!(processor.params().get(ParamId::LpfActive), 0.0);
}

#[test]
fn low_pass_attenuates_highs() {
    let mut processor = processor(1024);
    processor.params().set(ParamId::LpfFreq, 2000.0).unwrap();
    processor.params().set(ParamId::LpfSlope, 1.0).unwrap();

    let mut passband = sine(200.0, 0.5, 9600);
    let mut stopband = sine(12000.0, 0.5, 9600);
    processor.process(&mut [&mut passband[..], &mut stopband[..]]);

    assert_relative_eq!(rms(&passband[4800..]), 0.5 / 2.0_f32.sqrt(), epsilon = 0.01);
    assert!(rms(&stopband[4800..]) < 0.001);
}

#[test]
fn peak_band_boosts_its_centre() {
    let mut processor = processor(1024);
    processor.params().set(ParamId::HighMidFreq, 2500.0).unwrap();
    processor.params().set(ParamId::HighMidGain, 12.0).unwrap();

    let mut block = sine(2500.0, 0.1, 9600);
    processor.process(&mut [&mut block[..]]);

    let expected = 0.1 * 10.0_f32.powf(12.0 / 20.0) / 2.0_f32.sqrt();
    assert_relative_eq!(rms(&block[4800..]), expected, max_relative = 0.02);
}

#[test]
fn drive_keeps_loudness_and_adds_harmonics() {
    for model in 0..3 {
        let mut processor = processor(512);
        processor.params().set(ParamId::DriveAmount, 1.0).unwrap();
        processor.params().set(ParamId::DriveType, model as f32).unwrap();

        let input = sine(220.0, 0.5, FS as usize);
        let mut output = input.clone();
        processor.process(&mut [&mut output[..]]);

        let tail = FS as usize / 2..;
        assert_eq!(processor.params().get(ParamId::DriveActive), 1.0);
        assert!(output.iter().all(|y| y.is_finite()));
        assert_relative_eq!(rms(&output[tail.clone()]), rms(&input[tail.clone()]), max_relative = 0.1);
        assert_ne!(output[tail.clone()], input[tail]);
    }
}

#[test]
fn telefy_at_full_amount_uses_its_ceiling() {
    let levels = telefy_levels(1.0);
    assert_eq!(levels.mix, 1.0);
    assert_eq!(levels.drive, 0.5);

    let mut processor = processor(512);
    processor.params().set(ParamId::TelefyAmount, 1.0).unwrap();

    let mut low = sine(60.0, 0.5, FS as usize);
    let mut centre = sine(1100.0, 0.5, FS as usize);
    processor.process(&mut [&mut low[..], &mut centre[..]]);

    assert_eq!(processor.params().get(ParamId::TelefyActive), 1.0);
    let tail = FS as usize / 2..;
    assert!(rms(&low[tail.clone()]) < 0.5 * rms(&centre[tail]));
}

#[test]
fn telefy_type_change_alters_the_sound() {
    let render = |model: f32| {
        let mut processor = processor(512);
        processor.params().set(ParamId::TelefyAmount, 0.8).unwrap();
        processor.params().set(ParamId::TelefyType, model).unwrap();
        let mut block = sine(800.0, 0.6, 4800);
        processor.process(&mut [&mut block[..]]);
        block
    };

    assert_ne!(render(0.0), render(1.0));
}

#[test]
fn oversized_host_blocks_match_prepared_blocks() {
    let mut small = processor(32);
    let mut large = processor(8192);
    for processor in [&small, &large] {
        processor.params().set(ParamId::HpfFreq, 120.0).unwrap();
        processor.params().set(ParamId::LowGain, 5.0).unwrap();
        processor.params().set(ParamId::DriveAmount, 0.7).unwrap();
        processor.params().set(ParamId::DriveType, 2.0).unwrap();
        processor.params().set(ParamId::TelefyAmount, 0.6).unwrap();
    }

    let mut a_left = sine(330.0, 0.8, 5000);
    let mut a_right = sine(1500.0, 0.4, 5000);
    let mut b_left = a_left.clone();
    let mut b_right = a_right.clone();
    run_stereo(&mut small, &mut a_left, &mut a_right);
    run_stereo(&mut large, &mut b_left, &mut b_right);

    assert_eq!(a_left, b_left);
    assert_eq!(a_right, b_right);
}

#[test]
fn mono_input_on_stereo_output_clears_the_second_channel() {
    let mut processor = processor(256);
    let mut left = sine(440.0, 0.5, 256);
    let mut right = vec![1.0_f32; 256];

    processor.process_with_inputs(&mut [&mut left[..], &mut right[..]], 1);

    assert!(right.iter().all(|&y| y == 0.0));
    let peaks = processor.meters().snapshot();
    assert!(peaks.input_left > 0.49);
    assert_eq!(peaks.output_right, 0.0);
}

#[test]
fn meters_follow_input_and_output_gain() {
    let mut processor = processor(256);
    processor.params().set(ParamId::InputGain, -6.0).unwrap();
    processor.params().set(ParamId::OutputGain, 12.0).unwrap();

    let mut left = vec![0.5_f32; 256];
    let mut right = vec![-0.25_f32; 256];
    run_stereo(&mut processor, &mut left, &mut right);

    let peaks = processor.meters().snapshot();
    assert_relative_eq!(peaks.input_left, 0.5 * 0.501_187, max_relative = 1e-4);
    assert_relative_eq!(peaks.input_right, 0.25 * 0.501_187, max_relative = 1e-4);
    assert_relative_eq!(peaks.output_left, 0.5 * 0.501_187 * 3.981_072, max_relative = 1e-4);
    assert_relative_eq!(left[0], peaks.output_left, max_relative = 1e-6);
}

#[test]
fn restored_state_takes_effect_on_the_next_block() {
    let mut processor = processor(512);
    let mut warmup = sine(2500.0, 0.1, 512);
    processor.process(&mut [&mut warmup[..]]);

    let source = ParameterStore::new();
    source.set(ParamId::HighMidGain, 12.0).unwrap();
    source.set(ParamId::HighMidFreq, 2500.0).unwrap();
    let bytes = ParameterState::capture(&source).to_bytes().unwrap();
    processor.restore_state(&bytes).unwrap();

    let mut restored = sine(2500.0, 0.1, 9600);
    processor.process(&mut [&mut restored[..]]);

    let mut fresh = TeleqProcessor::with_shared(
        StreamConfig::new(FS, 2, 512),
        Arc::new(source),
        Arc::new(PeakMeters::new()),
    )
    .unwrap();
    let mut reference = sine(2500.0, 0.1, 9600);
    fresh.process(&mut [&mut reference[..]]);

    assert_relative_eq!(rms(&restored[4800..]), rms(&reference[4800..]), max_relative = 1e-3);
    assert!(rms(&restored[4800..]) > 0.2);
}

#[test]
fn prepare_switches_sample_rate_and_clears_meters() {
    let mut processor = processor(256);
    let mut block = vec![0.8_f32; 256];
    processor.process(&mut [&mut block[..]]);
    assert!(processor.meters().snapshot().input_left > 0.0);

    processor.prepare(StreamConfig::new(96000, 2, 1024)).unwrap();
    assert_eq!(processor.config().sample_rate, 96000);
    assert_eq!(processor.chunk_size(), 1024);
    assert_eq!(processor.meters().snapshot().input_left, 0.0);
}

#[test]
fn control_thread_writes_during_processing() {
    let mut processor = processor(256);
    let params = Arc::clone(processor.params());

    let control = thread::spawn(move || {
        for step in 0..500 {
            let t = step as f32 / 500.0;
            params.set(ParamId::HighMidGain, -18.0 + 36.0 * t).unwrap();
            params.set(ParamId::DriveAmount, t).unwrap();
            params.set(ParamId::TelefyAmount, 1.0 - t).unwrap();
            params.set(ParamId::HpfFreq, 17.0 + 400.0 * t).unwrap();
        }
    });

    for _ in 0..200 {
        let mut left = sine(500.0, 0.5, 256);
        let mut right = sine(700.0, 0.5, 256);
        run_stereo(&mut processor, &mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|y| y.is_finite()));
    }

    control.join().unwrap();
}
