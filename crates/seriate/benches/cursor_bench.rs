//! Benchmarks for cursor iteration and composition.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use seriate::cursor::{Cursor, CursorExt};
use seriate::series::{LiveSeries, Series};

fn build_series(count: usize, stride: i64) -> LiveSeries<i64, f64> {
    (0..count as i64)
        .map(|i| (i * stride, i as f64))
        .collect()
}

fn bench_iterate_plain(c: &mut Criterion) {
    let series = build_series(10_000, 1);
    let mut group = c.benchmark_group("cursor_iterate_10k");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("plain", |b| {
        b.iter(|| {
            let mut cursor = series.cursor();
            let mut sum = 0.0;
            while cursor.move_next() {
                sum += cursor.value().unwrap();
            }
            black_box(sum)
        })
    });
    group.bench_function("mapped", |b| {
        b.iter(|| {
            let mut cursor = series.cursor().add(1.0).mul(2.0);
            let mut sum = 0.0;
            while cursor.move_next() {
                sum += cursor.value().unwrap();
            }
            black_box(sum)
        })
    });
    group.finish();
}

fn bench_zip_overlap(c: &mut Criterion) {
    // Strides 2 and 3 overlap on multiples of 6, so alignment seeks on
    // most steps.
    let left = build_series(10_000, 2);
    let right = build_series(10_000, 3);
    let mut group = c.benchmark_group("zip_10k");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("intersection", |b| {
        b.iter(|| {
            let mut zip = left.cursor().zip(right.cursor());
            let mut count = 0u64;
            while zip.move_next() {
                count += 1;
            }
            black_box(count)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_iterate_plain, bench_zip_overlap);
criterion_main!(benches);
