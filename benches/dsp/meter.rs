//! Benchmarks for level measurement over a meter window.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_studio::dsp::meter;

pub fn bench_meter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/meter");

    // Meter windows, not audio blocks
    for &size in &[1024usize, 2048, 4096] {
        let window: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();

        group.bench_with_input(BenchmarkId::new("rms", size), &size, |b, _| {
            b.iter(|| meter::rms(black_box(&window)))
        });
    }

    group.finish();
}
