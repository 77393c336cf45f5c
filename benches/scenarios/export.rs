//! Benchmarks for the export path: offline mixdown and WAV encoding.

use std::hint::black_box;

use criterion::Criterion;
use saavy_studio::{
    io::wav::encode_wav, AudioBuffer, Engine, EngineConfig, ManualBackend, TrackKind,
};

fn arrangement() -> Engine<ManualBackend> {
    let config = EngineConfig::default();
    let mut engine = Engine::new(ManualBackend::new(48_000, &config), config).unwrap();
    for (i, name) in ["drums", "bass", "keys", "vocals"].into_iter().enumerate() {
        let id = engine.create_track(Some(name), TrackKind::Audio);
        let samples = (0..44_100 * 5)
            .map(|n| ((n + i * 100) as f32 * 0.02).sin() * 0.4)
            .collect();
        engine
            .add_clip(id, AudioBuffer::from_mono(samples, 44_100), i as f64 * 0.5)
            .unwrap();
        engine.set_pan(id, i as f32 * 0.5 - 0.75).unwrap();
    }
    engine
}

pub fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/export");
    group.sample_size(10);

    let mut engine = arrangement();
    group.bench_function("render_mixdown_4_track", |b| {
        b.iter(|| black_box(engine.render_mixdown().unwrap()))
    });

    let rendered = engine.render_mixdown().unwrap();
    group.bench_function("encode_wav", |b| {
        b.iter(|| black_box(encode_wav(black_box(&rendered)).unwrap()))
    });

    group.finish();
}
