//! Performance benchmarks for the DSP stages
//!
//! Run with: cargo bench -p teleq_dsp

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use teleq_dsp::{
    AudioProcessor, CutSettings, DriveSettings, DriveStage, EqChain, EqSettings, ProcessSpec, Slope,
    TelefySettings, TelefyStage,
};

fn busy_settings() -> EqSettings {
    let mut settings = EqSettings::default();
    settings.high_pass = CutSettings {
        active: true,
        frequency: 80.0,
        slope: Slope::Slope24,
    };
    settings.low.gain_db = 4.0;
    settings.low_mid.gain_db = -3.0;
    settings.high_mid.gain_db = 6.0;
    settings.high.gain_db = 2.0;
    settings.high.bell = true;
    settings
}

fn benchmark_eq_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("equalizer");

    // Common buffer sizes in audio applications
    for size in [64, 128, 256, 512, 1024, 2048] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("process_{}_frames", size), |b| {
            let spec = ProcessSpec::new(48000.0, 2, size).unwrap();
            let mut eq = EqChain::new(&spec);
            eq.update(&busy_settings());
            let mut left: Vec<f64> = (0..size).map(|i| (i as f64 * 0.001).sin()).collect();
            let mut right: Vec<f64> = (0..size).map(|i| (i as f64 * 0.002).sin()).collect();

            b.iter(|| {
                eq.process(black_box(&mut [&mut left[..], &mut right[..]]));
            });
        });
    }

    group.finish();
}

fn benchmark_eq_coefficient_update(c: &mut Criterion) {
    c.bench_function("eq_redesign", |b| {
        let spec = ProcessSpec::new(48000.0, 2, 512).unwrap();
        let mut eq = EqChain::new(&spec);
        let mut settings = busy_settings();
        let mut gain = 0.0;

        b.iter(|| {
            // Simulate a knob being automated
            gain = (gain + 1.0) % 18.0;
            settings.high_mid.gain_db = gain;
            black_box(eq.update(&settings));
        });
    });
}

fn benchmark_saturation_stages(c: &mut Criterion) {
    let size = 512;
    let spec = ProcessSpec::new(48000.0, 2, size).unwrap();
    let mut group = c.benchmark_group("saturation");
    group.throughput(Throughput::Elements(size as u64));

    group.bench_function("drive_512_frames", |b| {
        let mut drive = DriveStage::new(&spec);
        drive.update(&DriveSettings {
            amount: 0.6,
            model: 0,
            mix: 1.0,
        });
        let mut left: Vec<f64> = (0..size).map(|i| (i as f64 * 0.01).sin()).collect();
        let mut right = left.clone();

        b.iter(|| {
            drive.process(black_box(&mut [&mut left[..], &mut right[..]]));
        });
    });

    group.bench_function("telefy_512_frames", |b| {
        let mut telefy = TelefyStage::new(&spec);
        telefy.update(&TelefySettings {
            active: true,
            amount: 0.8,
            ..TelefySettings::default()
        });
        let mut left: Vec<f64> = (0..size).map(|i| (i as f64 * 0.01).sin()).collect();
        let mut right = left.clone();

        b.iter(|| {
            telefy.process(black_box(&mut [&mut left[..], &mut right[..]]));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_eq_processing,
    benchmark_eq_coefficient_update,
    benchmark_saturation_stages
);

criterion_main!(benches);
