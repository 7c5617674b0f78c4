//! Benchmarks for the columnar frame codec.
//!
//! Run with: cargo bench --package seriate
//!
//! ## Benchmark Categories
//!
//! - **Encode**: plain and delta framing across both algorithms
//! - **Decode**: frame reading and delta reconstruction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use seriate::codec::{Algorithm, CodecConfig, FrameCodec};
use seriate::Timestamp;

/// Generate typical time series ticks (regular intervals with jitter).
fn generate_ticks(count: usize) -> Vec<Timestamp> {
    let start = 1_000_000_000_000i64;
    let interval = 1_000_000_000i64;
    (0..count)
        .map(|i| Timestamp::from_nanos(start + i as i64 * interval + (i as i64 % 7) * 1_000))
        .collect()
}

/// Generate slowly varying metric values.
fn generate_values(count: usize) -> Vec<f64> {
    let mut value = 50.0;
    (0..count)
        .map(|i| {
            value += (i as f64 * 0.1).sin() * 0.1;
            value
        })
        .collect()
}

fn bench_encode_plain(c: &mut Criterion) {
    let values = generate_values(10_000);
    let mut group = c.benchmark_group("encode_plain_10k");
    group.throughput(Throughput::Bytes((values.len() * 8) as u64));

    for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
        let codec = FrameCodec::new(CodecConfig::default().with_algorithm(algorithm));
        let mut frame = vec![0u8; codec.max_frame_len::<f64>(values.len())];
        group.bench_function(BenchmarkId::from_parameter(algorithm.name()), |b| {
            b.iter(|| codec.encode(black_box(&values), &mut frame).unwrap())
        });
    }
    group.finish();
}

fn bench_encode_delta(c: &mut Criterion) {
    let ticks = generate_ticks(10_000);
    let mut group = c.benchmark_group("encode_delta_10k");
    group.throughput(Throughput::Bytes((ticks.len() * 8) as u64));

    for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
        let codec = FrameCodec::new(CodecConfig::default().with_algorithm(algorithm));
        let mut frame = vec![0u8; codec.max_frame_len::<Timestamp>(ticks.len())];
        group.bench_function(BenchmarkId::from_parameter(algorithm.name()), |b| {
            b.iter(|| codec.encode_delta(black_box(&ticks), &mut frame).unwrap())
        });
    }
    group.finish();
}

fn bench_decode_delta(c: &mut Criterion) {
    let ticks = generate_ticks(10_000);
    let mut group = c.benchmark_group("decode_delta_10k");
    group.throughput(Throughput::Bytes((ticks.len() * 8) as u64));

    for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
        let codec = FrameCodec::new(CodecConfig::default().with_algorithm(algorithm));
        let mut frame = vec![0u8; codec.max_frame_len::<Timestamp>(ticks.len())];
        let total = codec.encode_delta(&ticks, &mut frame).unwrap();
        frame.truncate(total);
        group.bench_function(BenchmarkId::from_parameter(algorithm.name()), |b| {
            b.iter(|| codec.decode_delta::<Timestamp>(black_box(&frame)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encode_plain,
    bench_encode_delta,
    bench_decode_delta
);
criterion_main!(benches);
