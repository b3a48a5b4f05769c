//! Processor benchmarks
//!
//! Measures the full block path and the control-side parameter writes.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use teleq_core::{ParamId, StreamConfig, TeleqProcessor};

fn benchmark_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("teleq_processor");

    // Typical buffer sizes used in real-time audio
    for buffer_size in [64, 128, 256, 512, 1024] {
        let mut processor =
            TeleqProcessor::new(StreamConfig::new(48000, 2, buffer_size as u32)).unwrap();
        let params = processor.params();
        params.set(ParamId::HpfFreq, 60.0).unwrap();
        params.set(ParamId::LowMidGain, -3.0).unwrap();
        params.set(ParamId::HighMidGain, 5.0).unwrap();
        params.set(ParamId::DriveAmount, 0.5).unwrap();
        params.set(ParamId::TelefyAmount, 0.3).unwrap();

        let mut left: Vec<f32> = (0..buffer_size).map(|i| (i as f32 * 0.001).sin()).collect();
        let mut right: Vec<f32> = (0..buffer_size).map(|i| (i as f32 * 0.002).sin()).collect();

        group.throughput(Throughput::Elements(buffer_size as u64 * 2));
        group.bench_function(format!("process_{}_frames", buffer_size), |b| {
            b.iter(|| {
                processor.process(black_box(&mut [&mut left[..], &mut right[..]]));
            })
        });
    }

    group.finish();
}

fn benchmark_parameter_write(c: &mut Criterion) {
    let processor = TeleqProcessor::new(StreamConfig::default()).unwrap();
    let params = processor.params();

    c.bench_function("parameter_write", |b| {
        b.iter(|| {
            params.set(ParamId::HighMidGain, black_box(3.0)).unwrap();
            params.set(ParamId::HighMidGain, black_box(-3.0)).unwrap();
        })
    });
}

fn benchmark_snapshot(c: &mut Criterion) {
    let processor = TeleqProcessor::new(StreamConfig::default()).unwrap();

    c.bench_function("parameter_snapshot", |b| {
        b.iter(|| black_box(processor.params().snapshot()))
    });
}

criterion_group!(
    benches,
    benchmark_processor,
    benchmark_parameter_write,
    benchmark_snapshot
);
criterion_main!(benches);
