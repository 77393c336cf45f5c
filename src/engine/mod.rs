//! The engine control surface.
//!
//! [`Engine`] is an explicit instance owned by the host; there is no global
//! state, so several engines (one per test, say) can coexist. All methods
//! run on the control thread. The audio thread only ever sees
//! [`MixerCommand`](crate::graph::mixer::MixerCommand)s.
//!
//! ```ignore
//! let config = EngineConfig::default();
//! let mut engine = Engine::new(CpalBackend::open(&config)?, config)?;
//! let vocals = engine.create_track(Some("Vocals"), TrackKind::Audio);
//! engine.start_recording(vocals)?;
//! // ... call engine.tick() from the UI refresh loop ...
//! engine.stop_recording()?;
//! engine.play(0.0);
//! ```

pub mod capture;
pub mod graph;
pub mod meter;
pub mod mixdown;
pub mod solo;
pub mod subscribe;
pub mod track;
pub mod transport;

use tracing::{info, warn};

use self::{
    capture::Recorder,
    graph::AudioGraph,
    mixdown::{ExportProgress, ExportStage},
    subscribe::{SubscriptionId, Subscribers, TransportUpdate},
    track::{Clip, Track, TrackId, TrackKind, TrackView},
    transport::Transport,
};
use crate::{
    backend::AudioBackend,
    buffer::AudioBuffer,
    config::EngineConfig,
    error::{EngineError, Result},
    io::{
        export::EncodedBlob,
        wav::{decode_wav, encode_wav},
    },
};

/// One file of a multi-stem import.
pub struct Stem<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

pub struct Engine<B: AudioBackend> {
    config: EngineConfig,
    backend: B,
    graph: AudioGraph,
    transport: Transport,
    recorder: Recorder,
    subscribers: Subscribers,
}

impl<B: AudioBackend> Engine<B> {
    pub fn new(backend: B, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        info!(
            sample_rate = backend.sample_rate(),
            render_rate = config.render_sample_rate,
            "engine created"
        );
        Ok(Self {
            graph: AudioGraph::new(config.meter_window),
            transport: Transport::new(config.stop_mode),
            recorder: Recorder::new(config.capture_chunk_frames),
            subscribers: Subscribers::new(),
            backend,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // Tracks

    pub fn create_track(&mut self, name: Option<&str>, kind: TrackKind) -> TrackId {
        self.graph.create_track(self.backend.mixer(), name, kind)
    }

    /// Remove a track and disconnect its nodes. A recording into it is
    /// abandoned.
    pub fn remove_track(&mut self, id: TrackId) -> Result<()> {
        if self.recorder.track() == Some(id) {
            self.recorder.cancel();
        }
        self.graph.remove_track(self.backend.mixer(), id)?;
        Ok(())
    }

    pub fn set_volume(&mut self, id: TrackId, volume: f32) -> Result<()> {
        self.graph.set_volume(self.backend.mixer(), id, volume)
    }

    pub fn set_pan(&mut self, id: TrackId, pan: f32) -> Result<()> {
        self.graph.set_pan(self.backend.mixer(), id, pan)
    }

    pub fn set_mute(&mut self, id: TrackId, mute: bool) -> Result<()> {
        self.graph.set_mute(self.backend.mixer(), id, mute)
    }

    pub fn set_solo(&mut self, id: TrackId, solo: bool) -> Result<()> {
        self.graph.set_solo(self.backend.mixer(), id, solo)
    }

    /// Flip mute; returns the new value.
    pub fn toggle_mute(&mut self, id: TrackId) -> Result<bool> {
        let mute = !self.graph.track(id)?.is_muted();
        self.set_mute(id, mute)?;
        Ok(mute)
    }

    /// Flip solo; returns the new value.
    pub fn toggle_solo(&mut self, id: TrackId) -> Result<bool> {
        let solo = !self.graph.track(id)?.is_soloed();
        self.set_solo(id, solo)?;
        Ok(solo)
    }

    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.graph.track(id)
    }

    pub fn tracks(&self) -> &[Track] {
        self.graph.tracks()
    }

    pub fn snapshot(&self) -> Vec<TrackView> {
        self.graph.snapshot()
    }

    // Clips

    /// Place `buffer` on a track at `start_time` seconds.
    pub fn add_clip(&mut self, id: TrackId, buffer: AudioBuffer, start_time: f64) -> Result<Clip> {
        let clip = Clip::new(buffer, start_time);
        self.graph.add_clip(id, clip.clone())?;
        Ok(clip)
    }

    /// Decode a 16-bit PCM WAV file and place it on a track.
    pub fn import_wav(
        &mut self,
        id: TrackId,
        name: &str,
        bytes: &[u8],
        start_time: f64,
    ) -> Result<Clip> {
        self.graph.track(id)?;
        let buffer = decode_wav(name, bytes)?;
        self.add_clip(id, buffer, start_time)
    }

    /// One new track per stem, each with its clip at 0.
    ///
    /// Results line up with the input. A stem that fails to decode leaves
    /// no track behind and does not stop the rest.
    pub fn load_stems<'a>(
        &mut self,
        stems: impl IntoIterator<Item = Stem<'a>>,
    ) -> Vec<Result<TrackId>> {
        stems
            .into_iter()
            .map(|stem| {
                let buffer = decode_wav(stem.name, stem.bytes).inspect_err(|e| {
                    warn!(stem = stem.name, error = %e, "stem skipped");
                })?;
                let name = stem
                    .name
                    .rsplit_once('.')
                    .map_or(stem.name, |(base, _)| base);
                let id = self.create_track(Some(name), TrackKind::Audio);
                self.add_clip(id, buffer, 0.0)?;
                Ok(id)
            })
            .collect()
    }

    /// Latest clip end plus the configured tail.
    pub fn total_duration(&self) -> f64 {
        self.graph.total_duration(self.config.tail_seconds)
    }

    // Subscriptions

    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&TransportUpdate) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // Capture

    /// Start capturing from the default input into `id`.
    pub fn start_recording(&mut self, id: TrackId) -> Result<()> {
        if self.recorder.is_recording() {
            return Err(EngineError::AlreadyRecording);
        }
        self.graph.track(id)?;
        let device = self.backend.open_input(&self.config)?;
        self.recorder.start(id, device)?;
        // The track meter follows the live input while recording
        self.graph.track_mut(id)?.meter.set_external(true);
        Ok(())
    }

    /// Finish the session and append its clip to the recorded track.
    ///
    /// `Ok(None)` when idle, or when nothing was captured.
    pub fn stop_recording(&mut self) -> Result<Option<Clip>> {
        let Some(take) = self.recorder.stop() else {
            return Ok(None);
        };
        let track = self.graph.track_mut(take.track)?;
        track.meter.set_external(false);
        if take.buffer.is_empty() {
            info!(track = %take.track, "recording captured no samples");
            return Ok(None);
        }
        let clip = Clip::new(take.buffer, 0.0);
        self.graph.add_clip(take.track, clip.clone())?;
        Ok(Some(clip))
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn recording_track(&self) -> Option<TrackId> {
        self.recorder.track()
    }

    /// Seconds captured in the active session.
    pub fn recording_elapsed(&self) -> f64 {
        self.recorder.elapsed()
    }

    // Transport

    /// Start playback at `start_at` seconds. No-op while playing.
    pub fn play(&mut self, start_at: f64) {
        let Self {
            backend,
            graph,
            transport,
            ..
        } = self;
        transport.play(start_at, graph.tracks(), backend.mixer());
    }

    /// No-op while stopped.
    pub fn stop(&mut self) {
        self.transport.stop(self.backend.mixer());
    }

    pub fn seek(&mut self, t: f64) {
        let Self {
            backend,
            graph,
            transport,
            ..
        } = self;
        transport.seek(t, graph.tracks(), backend.mixer());
    }

    /// Stop and rewind to 0.
    pub fn reset(&mut self) {
        self.transport.reset(self.backend.mixer());
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Playhead in seconds.
    pub fn current_time(&self) -> f64 {
        self.transport.current_time(self.backend.current_time())
    }

    /// Drive the engine from the host's refresh loop.
    ///
    /// Flushes queued mixer commands, drains capture and refreshes meters.
    /// While playing or recording, pushes an update to every subscriber;
    /// the update is also returned.
    pub fn tick(&mut self) -> Option<TransportUpdate> {
        self.backend.mixer().flush();

        if let Some(id) = self.recorder.track() {
            let fresh = self.recorder.poll();
            if let Ok(track) = self.graph.track_mut(id) {
                track.meter.feed(fresh);
            }
            if self.recorder.is_faulted() {
                warn!(track = %id, "input device lost; ending recording");
                if let Err(e) = self.stop_recording() {
                    warn!(error = %e, "failed to keep recording after device loss");
                }
            }
        }

        // Taps keep filling while stopped
        self.graph.update_meters();
        if !self.transport.is_playing() && !self.recorder.is_recording() {
            return None;
        }

        let update = TransportUpdate {
            current_time: self.current_time(),
            tracks: self.graph.snapshot(),
            is_recording: self.recorder.is_recording(),
            recording_elapsed: self.recorder.elapsed(),
        };
        self.subscribers.notify(&update);
        Some(update)
    }

    // Export

    /// Render the current mix offline.
    pub fn render_mixdown(&mut self) -> Result<AudioBuffer> {
        let job = mixdown::plan(self.graph.tracks(), &self.config)?;
        self.backend.render_offline(&job)
    }

    /// Encode a rendered buffer as WAV.
    pub fn encode_wav(&self, buffer: &AudioBuffer) -> Result<EncodedBlob> {
        let bytes = encode_wav(buffer)?;
        Ok(EncodedBlob::wav(bytes, self.config.export_file_name.clone()))
    }

    /// Render and encode, reporting each stage to `progress`.
    pub fn export_wav(&mut self, mut progress: impl FnMut(ExportProgress)) -> Result<EncodedBlob> {
        let mut report = |stage: ExportStage| {
            info!(percent = stage.percent(), "{stage}");
            progress(stage.into());
        };

        report(ExportStage::Preparing);
        let job = mixdown::plan(self.graph.tracks(), &self.config)?;
        report(ExportStage::Routing);
        report(ExportStage::Rendering);
        let rendered = self.backend.render_offline(&job)?;
        report(ExportStage::Encoding);
        let blob = self.encode_wav(&rendered)?;
        report(ExportStage::Done);
        Ok(blob)
    }
}
