//! Benchmarks for live mixer blocks.
//!
//! Each track plays one long clip through its tap → pan → gain chain, the
//! same work the device callback does during playback.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use saavy_studio::{
    graph::{
        chain::TrackChain,
        mixer::{Mixer, MixerCommand, ScheduledClip},
        tap::{meter_tap, MeterTap},
    },
    AudioBuffer, TrackId,
};

use crate::BLOCK_SIZES;

const RATE: u32 = 48_000;

fn session(tracks: u64, clip: &Arc<AudioBuffer>) -> (Mixer, Vec<MeterTap>) {
    let mut mixer = Mixer::offline(RATE as f32);
    let mut meters = Vec::new();
    for raw in 0..tracks {
        let (tap, meter) = meter_tap(2048);
        meters.push(meter);
        let pan = raw as f32 / tracks as f32 * 2.0 - 1.0;
        mixer.apply(MixerCommand::AddTrack(Box::new(TrackChain::new(
            TrackId::from_raw(raw),
            tap,
            pan,
            0.8,
        ))));
    }
    schedule(&mut mixer, tracks, clip);
    (mixer, meters)
}

fn schedule(mixer: &mut Mixer, tracks: u64, clip: &Arc<AudioBuffer>) {
    let start_frame = mixer.frame();
    let batch = (0..tracks)
        .map(|raw| ScheduledClip {
            track: TrackId::from_raw(raw),
            buffer: clip.clone(),
            start_frame,
            offset: 0.0,
        })
        .collect();
    mixer.apply(MixerCommand::Schedule(batch));
}

pub fn bench_mixer(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/mixer");
    let clip = Arc::new(AudioBuffer::from_mono(
        (0..RATE as usize * 10).map(|i| (i as f32 * 0.01).sin() * 0.5).collect(),
        RATE,
    ));

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        for tracks in [2u64, 8, 16] {
            let (mut mixer, mut meters) = session(tracks, &clip);
            group.bench_with_input(
                BenchmarkId::new(format!("{tracks}_track"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        if mixer.voice_count() == 0 {
                            schedule(&mut mixer, tracks, &clip);
                        }
                        mixer.render_block(black_box(&mut left), black_box(&mut right));
                        meters.iter_mut().for_each(MeterTap::drain);
                    })
                },
            );
        }
    }

    group.finish();
}
