use std::f32::consts::FRAC_1_SQRT_2;

use saavy_studio::{
    io::wav::{decode_wav, read_header},
    AudioBuffer, Engine, EngineConfig, EngineError, ExportStage, ManualBackend, TrackId, TrackKind,
};

const LIVE_RATE: u32 = 1_000;

fn engine() -> Engine<ManualBackend> {
    let config = EngineConfig::default();
    Engine::new(ManualBackend::new(LIVE_RATE, &config), config).unwrap()
}

fn constant(value: f32, seconds: f64, rate: u32) -> AudioBuffer {
    AudioBuffer::from_mono(vec![value; (seconds * rate as f64) as usize], rate)
}

/// Two tracks, 2 s clips at 0, T2 at half volume.
fn two_track_session() -> (Engine<ManualBackend>, TrackId, TrackId) {
    let mut engine = engine();
    let t1 = engine.create_track(Some("T1"), TrackKind::Audio);
    let t2 = engine.create_track(Some("T2"), TrackKind::Audio);
    engine.set_volume(t2, 0.5).unwrap();
    engine.add_clip(t1, constant(0.5, 2.0, 44_100), 0.0).unwrap();
    engine.add_clip(t2, constant(0.5, 2.0, 44_100), 0.0).unwrap();
    (engine, t1, t2)
}

#[test]
fn mixdown_length_is_clips_plus_tail() {
    let (mut engine, _, _) = two_track_session();
    assert!((engine.total_duration() - 3.0).abs() < 1e-9);

    let out = engine.render_mixdown().unwrap();
    assert_eq!(out.num_channels(), 2);
    assert_eq!(out.sample_rate(), 44_100);
    assert_eq!(out.frames(), 132_300);
    assert!((out.duration() - 3.0).abs() < 1e-9);
}

#[test]
fn mixdown_sums_tracks_through_pan_and_gain() {
    let (mut engine, _, _) = two_track_session();
    let out = engine.render_mixdown().unwrap();

    // Centre pan on a mono source puts 1/√2 on each side
    let expected = 0.5 * FRAC_1_SQRT_2 * (1.0 + 0.5);
    for channel in 0..2 {
        let samples = out.channel(channel);
        assert!((samples[0] - expected).abs() < 1e-5);
        assert!((samples[88_199] - expected).abs() < 1e-5);
        assert!(samples[88_200..].iter().all(|&s| s == 0.0), "tail is silent");
    }
}

#[test]
fn solo_silences_other_tracks_in_mixdown() {
    let (mut engine, t1, _) = two_track_session();
    let before = engine.render_mixdown().unwrap();

    engine.set_solo(t1, true).unwrap();
    let after = engine.render_mixdown().unwrap();

    let t1_alone = 0.5 * FRAC_1_SQRT_2;
    assert!((after.channel(0)[1_000] - t1_alone).abs() < 1e-5);
    assert!(after.channel(0)[1_000] < before.channel(0)[1_000]);
}

#[test]
fn solo_beats_mute_on_unsoloed_tracks() {
    let (mut engine, t1, t2) = two_track_session();
    engine.set_mute(t2, false).unwrap();
    engine.set_solo(t1, true).unwrap();
    engine.set_mute(t1, true).unwrap();

    // Soloed but muted: silent; unsoloed: silent regardless of mute
    let out = engine.render_mixdown().unwrap();
    assert!(out.channels().iter().flatten().all(|&s| s == 0.0));
}

#[test]
fn solo_silences_other_tracks_live() {
    let mut engine = engine();
    let t1 = engine.create_track(None, TrackKind::Audio);
    let t2 = engine.create_track(None, TrackKind::Audio);
    engine.add_clip(t1, constant(1.0, 1.0, LIVE_RATE), 0.0).unwrap();
    engine.add_clip(t2, constant(1.0, 1.0, LIVE_RATE), 0.0).unwrap();
    engine.set_pan(t1, -1.0).unwrap();
    engine.set_pan(t2, 1.0).unwrap();
    engine.set_mute(t2, true).unwrap();
    engine.set_mute(t2, false).unwrap();
    engine.set_solo(t1, true).unwrap();

    engine.play(0.0);
    let out = engine.backend_mut().advance(500);
    assert!(out.channel(0).iter().all(|s| (s - 1.0).abs() < 1e-6));
    assert!(out.channel(1).iter().all(|s| s.abs() < 1e-6));

    // Releasing the solo brings T2 back on the next block
    engine.set_solo(t1, false).unwrap();
    let out = engine.backend_mut().advance(100);
    assert!(out.channel(1).iter().all(|s| (s - 1.0).abs() < 1e-6));
}

#[test]
fn live_playback_matches_mixdown() {
    let config = EngineConfig {
        render_sample_rate: LIVE_RATE,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(ManualBackend::new(LIVE_RATE, &config), config).unwrap();
    let a = engine.create_track(None, TrackKind::Audio);
    let b = engine.create_track(None, TrackKind::Instrument);
    engine.add_clip(a, constant(0.3, 0.5, LIVE_RATE), 0.25).unwrap();
    engine.add_clip(b, constant(-0.2, 1.0, LIVE_RATE), 0.0).unwrap();
    engine.set_pan(a, 0.4).unwrap();
    engine.set_volume(b, 0.7).unwrap();

    let offline = engine.render_mixdown().unwrap();
    engine.play(0.0);
    let live = engine.backend_mut().advance(offline.frames());
    for channel in 0..2 {
        for (l, o) in live.channel(channel).iter().zip(offline.channel(channel)) {
            assert!((l - o).abs() < 1e-6);
        }
    }
}

#[test]
fn nothing_to_render_without_clips() {
    let mut engine = engine();
    engine.create_track(None, TrackKind::Audio);
    assert!(matches!(engine.render_mixdown(), Err(EngineError::NothingToRender)));

    let mut stages = Vec::new();
    let result = engine.export_wav(|p| stages.push(p.stage));
    assert!(matches!(result, Err(EngineError::NothingToRender)));
    assert_eq!(stages, vec![ExportStage::Preparing]);
}

#[test]
fn export_reports_every_stage() {
    let (mut engine, _, _) = two_track_session();
    let mut seen = Vec::new();
    let blob = engine.export_wav(|p| seen.push((p.stage, p.percent))).unwrap();

    assert_eq!(
        seen,
        vec![
            (ExportStage::Preparing, 0),
            (ExportStage::Routing, 20),
            (ExportStage::Rendering, 50),
            (ExportStage::Encoding, 80),
            (ExportStage::Done, 100),
        ]
    );
    assert_eq!(blob.mime, "audio/wav");
    assert_eq!(blob.file_name, "mixdown.wav");
    assert_eq!(blob.len(), 44 + 132_300 * 2 * 2);
}

#[test]
fn wav_round_trip_preserves_shape_and_samples() {
    let (mut engine, t1, _) = two_track_session();
    // Overdriven clip inside the arrangement exercises clamping
    engine.add_clip(t1, constant(3.0, 0.1, 44_100), 2.5).unwrap();
    let rendered = engine.render_mixdown().unwrap();
    let blob = engine.encode_wav(&rendered).unwrap();

    let (spec, _) = read_header(&blob.bytes).unwrap();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.frames, rendered.frames());

    let decoded = decode_wav("mixdown.wav", &blob.bytes).unwrap();
    let lsb = 1.0 / 32_767.0;
    for channel in 0..2 {
        for (orig, back) in rendered.channel(channel).iter().zip(decoded.channel(channel)) {
            let clamped = orig.clamp(-1.0, 1.0);
            assert!((clamped - back).abs() <= lsb, "{orig} -> {back}");
        }
    }
}
