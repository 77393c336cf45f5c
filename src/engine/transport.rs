//! Play/stop/seek and the derived playhead.
//!
//! `play` schedules every clip of every audible track in one batch, so the
//! audio thread receives the whole arrangement in a single command and all
//! tracks start against the same reference frame. The playhead is never
//! stored while playing; it is `clock - reference`.

use tracing::{debug, info};

use crate::{
    config::StopMode,
    engine::track::Track,
    graph::mixer::{MixerCommand, MixerHandle, ScheduledClip},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportState {
    Stopped,
    Playing,
}

pub struct Transport {
    state: TransportState,
    /// Engine clock value that corresponds to timeline position 0.
    reference: f64,
    /// Playhead while stopped.
    position: f64,
    stop_mode: StopMode,
}

impl Transport {
    pub fn new(stop_mode: StopMode) -> Self {
        Self {
            state: TransportState::Stopped,
            reference: 0.0,
            position: 0.0,
            stop_mode,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Timeline position in seconds given the engine clock `now`.
    pub fn current_time(&self, now: f64) -> f64 {
        match self.state {
            TransportState::Playing => (now - self.reference).max(0.0),
            TransportState::Stopped => self.position,
        }
    }

    /// Start playback at timeline position `start_at`.
    ///
    /// Returns `false` (and does nothing) when already playing. Muted
    /// tracks are skipped; soloed-out tracks are scheduled and rely on
    /// their zero gain.
    pub fn play(&mut self, start_at: f64, tracks: &[Track], mixer: &mut MixerHandle) -> bool {
        if self.is_playing() {
            return false;
        }
        let start_at = start_at.max(0.0);
        let now = mixer.current_time();
        let rate = mixer.sample_rate() as f64;
        self.reference = now - start_at;

        let mut batch = Vec::new();
        for track in tracks.iter().filter(|t| !t.is_muted()) {
            for clip in track.clips() {
                let when = clip.start_time() + self.reference;
                let (start, offset) = if when >= now {
                    (when, 0.0)
                } else {
                    // Playhead is already inside (or past) this clip
                    let offset = now - when;
                    if offset >= clip.duration() {
                        continue;
                    }
                    (now, offset)
                };
                batch.push(ScheduledClip {
                    track: track.id(),
                    buffer: clip.buffer().clone(),
                    start_frame: (start * rate).round() as u64,
                    offset,
                });
            }
        }

        info!(start_at, clips = batch.len(), "play");
        mixer.send(MixerCommand::Schedule(batch));
        self.state = TransportState::Playing;
        true
    }

    /// Stop playback, remembering the playhead. Returns `false` if already
    /// stopped.
    pub fn stop(&mut self, mixer: &mut MixerHandle) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.position = self.current_time(mixer.current_time());
        self.state = TransportState::Stopped;

        match self.stop_mode {
            StopMode::Retract => mixer.send(MixerCommand::CancelAll),
            StopMode::CancelPending => mixer.send(MixerCommand::CancelPending),
            StopMode::LetRing => {}
        }
        info!(position = self.position, mode = ?self.stop_mode, "stop");
        true
    }

    /// `stop(); play(t)`.
    pub fn seek(&mut self, t: f64, tracks: &[Track], mixer: &mut MixerHandle) {
        self.stop(mixer);
        debug!(t, "seek");
        self.play(t, tracks, mixer);
    }

    /// Stop and rewind to 0.
    pub fn reset(&mut self, mixer: &mut MixerHandle) {
        self.stop(mixer);
        self.position = 0.0;
        self.reference = 0.0;
    }
}
