//! Benchmarks for the stereo panner.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_studio::dsp::pan;

use crate::BLOCK_SIZES;

pub fn bench_pan(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/pan");

    for &size in BLOCK_SIZES {
        let source: Vec<f32> = (0..size).map(|i| (i as f32 * 0.01).sin()).collect();
        let mut left = source.clone();
        let mut right = source.clone();

        group.bench_with_input(BenchmarkId::new("mono", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&source);
                right.copy_from_slice(&source);
                pan::pan_mono(black_box(&mut left), black_box(&mut right), black_box(-0.3))
            })
        });

        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&source);
                right.copy_from_slice(&source);
                pan::pan_stereo(black_box(&mut left), black_box(&mut right), black_box(0.6))
            })
        });
    }

    group.finish();
}
