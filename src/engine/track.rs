//! Tracks, clips and the read-only views handed to the UI.

use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    buffer::AudioBuffer,
    graph::{
        chain::TrackChain,
        tap::{meter_tap, MeterTap},
    },
};

/// Opaque track handle, unique for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackId(u64);

impl TrackId {
    /// Rebuild an id from its raw value (e.g. one a host stored earlier).
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

/// Informational only; both kinds mix the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    #[default]
    Audio,
    Instrument,
}

/// An audio buffer placed at a fixed time on a track. Immutable.
#[derive(Debug, Clone)]
pub struct Clip {
    buffer: Arc<AudioBuffer>,
    start_time: f64,
}

impl Clip {
    /// Negative (or NaN) start times are pinned to 0.
    pub fn new(buffer: AudioBuffer, start_time: f64) -> Self {
        Self {
            buffer: Arc::new(buffer),
            start_time: start_time.max(0.0),
        }
    }

    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }

    /// Engine-relative start, in seconds.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Derived from the buffer's frame count and sample rate.
    pub fn duration(&self) -> f64 {
        self.buffer.duration()
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration()
    }
}

/// Control-side state of one track.
///
/// The track's nodes live on the audio thread inside a [`TrackChain`]; the
/// track keeps only the reading end of its analysis tap.
pub struct Track {
    id: TrackId,
    name: String,
    kind: TrackKind,
    volume: f32,
    pan: f32,
    mute: bool,
    solo: bool,
    meter_value: f32,
    clips: Vec<Clip>,
    pub(crate) meter: MeterTap,
}

impl Track {
    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    pub fn is_soloed(&self) -> bool {
        self.solo
    }

    /// Last sampled RMS, 0..=1.
    pub fn meter_value(&self) -> f32 {
        self.meter_value
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// End of the last clip on this track, 0 when empty.
    pub fn end_time(&self) -> f64 {
        self.clips.iter().map(Clip::end_time).fold(0.0, f64::max)
    }

    pub fn view(&self) -> TrackView {
        TrackView {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            volume: self.volume,
            pan: self.pan,
            mute: self.mute,
            solo: self.solo,
            meter_value: self.meter_value,
            clip_count: self.clips.len(),
        }
    }

    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
    }

    pub(crate) fn set_pan(&mut self, pan: f32) {
        self.pan = if pan.is_nan() { 0.0 } else { pan.clamp(-1.0, 1.0) };
    }

    pub(crate) fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
    }

    pub(crate) fn set_solo(&mut self, solo: bool) {
        self.solo = solo;
    }

    pub(crate) fn set_meter_value(&mut self, value: f32) {
        self.meter_value = value.clamp(0.0, 1.0);
    }

    pub(crate) fn push_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }
}

/// Read-only projection of a track for UI polling and subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackView {
    pub id: TrackId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub volume: f32,
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    pub meter_value: f32,
    pub clip_count: usize,
}

/// Builds a track together with the audio-thread chain it owns.
///
/// ```ignore
/// let (track, chain) = TrackBuilder::new(id)
///     .name("Vocals")
///     .volume(0.8)
///     .pan(-0.25)
///     .build();
/// ```
pub struct TrackBuilder {
    id: TrackId,
    name: Option<String>,
    kind: TrackKind,
    volume: f32,
    pan: f32,
    meter_window: usize,
}

impl TrackBuilder {
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            name: None,
            kind: TrackKind::Audio,
            volume: 1.0,
            pan: 0.0,
            meter_window: 2048,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: TrackKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn pan(mut self, pan: f32) -> Self {
        self.pan = pan;
        self
    }

    pub fn meter_window(mut self, samples: usize) -> Self {
        self.meter_window = samples;
        self
    }

    /// Unnamed tracks are called "Track {n}" after their id.
    pub fn build(self) -> (Track, TrackChain) {
        let (tap, meter) = meter_tap(self.meter_window);
        let mut track = Track {
            id: self.id,
            name: self
                .name
                .unwrap_or_else(|| format!("Track {}", self.id.raw() + 1)),
            kind: self.kind,
            volume: 1.0,
            pan: 0.0,
            mute: false,
            solo: false,
            meter_value: 0.0,
            clips: Vec::new(),
            meter,
        };
        track.set_volume(self.volume);
        track.set_pan(self.pan);

        let chain = TrackChain::new(self.id, tap, track.pan, track.volume);
        (track, chain)
    }
}
