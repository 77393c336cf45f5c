//! Headless bounce: build a short arrangement and export it to a WAV file.
//!
//! Run with: cargo run --example offline_bounce [out.wav]

use std::{f32::consts::TAU, fs};

use saavy_studio::{
    AudioBuffer, BlobSink, Engine, EngineConfig, EngineError, ManualBackend, TrackKind,
};

struct FileSink;

impl BlobSink for FileSink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> saavy_studio::Result<()> {
        fs::write(file_name, bytes).map_err(|e| EngineError::Delivery(e.to_string()))
    }
}

fn tone(freq: f32, seconds: f32, rate: u32) -> AudioBuffer {
    let frames = (seconds * rate as f32) as usize;
    let samples = (0..frames)
        .map(|n| (TAU * freq * n as f32 / rate as f32).sin() * 0.3)
        .collect();
    AudioBuffer::from_mono(samples, rate)
}

fn main() -> saavy_studio::Result<()> {
    let out = std::env::args().nth(1);
    let config = EngineConfig::default();
    let mut engine = Engine::new(ManualBackend::new(48_000, &config), config)?;

    let low = engine.create_track(Some("Low"), TrackKind::Audio);
    let high = engine.create_track(Some("High"), TrackKind::Instrument);
    engine.add_clip(low, tone(110.0, 2.0, 44_100), 0.0)?;
    engine.add_clip(high, tone(440.0, 1.0, 44_100), 0.5)?;
    engine.set_pan(low, -0.5)?;
    engine.set_pan(high, 0.5)?;
    engine.set_volume(high, 0.6)?;

    let blob = engine.export_wav(|p| println!("{:>3}% {}", p.percent, p.stage))?;
    blob.save(&mut FileSink, out.as_deref())?;

    println!(
        "Bounced {:.2}s to {} ({} bytes)",
        engine.total_duration(),
        out.as_deref().unwrap_or(&blob.file_name),
        blob.len()
    );
    Ok(())
}
