//! Control-side routing state: the track list and everything the mixer
//! needs to hear about when it changes.

use tracing::{debug, info};

use crate::{
    engine::{
        meter::sample_rms,
        mixdown, solo,
        track::{Clip, Track, TrackBuilder, TrackId, TrackKind, TrackView},
    },
    error::{EngineError, Result},
    graph::mixer::{MixerCommand, MixerHandle},
};

pub struct AudioGraph {
    tracks: Vec<Track>,
    next_id: u64,
    meter_window: usize,
}

impl AudioGraph {
    pub fn new(meter_window: usize) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 0,
            meter_window,
        }
    }

    /// Allocate a track, hand its chain to the mixer and append it.
    ///
    /// Ids are never reused, even after removal.
    pub fn create_track(
        &mut self,
        mixer: &mut MixerHandle,
        name: Option<&str>,
        kind: TrackKind,
    ) -> TrackId {
        let id = TrackId::from_raw(self.next_id);
        self.next_id += 1;

        let mut builder = TrackBuilder::new(id)
            .kind(kind)
            .meter_window(self.meter_window);
        if let Some(name) = name {
            builder = builder.name(name);
        }
        let (track, chain) = builder.build();
        info!(track = %id, name = track.name(), "track created");

        mixer.send(MixerCommand::AddTrack(Box::new(chain)));
        self.tracks.push(track);
        // A new track must respect an existing solo
        self.apply_policy(mixer);
        id
    }

    /// Disconnect the track's chain from the master bus and drop it.
    pub fn remove_track(&mut self, mixer: &mut MixerHandle, id: TrackId) -> Result<Track> {
        let pos = self.position(id)?;
        let track = self.tracks.remove(pos);
        mixer.send(MixerCommand::RemoveTrack(id));
        info!(track = %id, "track removed");
        self.apply_policy(mixer);
        Ok(track)
    }

    pub fn set_volume(&mut self, mixer: &mut MixerHandle, id: TrackId, volume: f32) -> Result<()> {
        self.track_mut(id)?.set_volume(volume);
        self.apply_policy(mixer);
        Ok(())
    }

    pub fn set_pan(&mut self, mixer: &mut MixerHandle, id: TrackId, pan: f32) -> Result<()> {
        let track = self.track_mut(id)?;
        track.set_pan(pan);
        let pan = track.pan();
        mixer.send(MixerCommand::SetPan(id, pan));
        self.apply_policy(mixer);
        Ok(())
    }

    pub fn set_mute(&mut self, mixer: &mut MixerHandle, id: TrackId, mute: bool) -> Result<()> {
        self.track_mut(id)?.set_mute(mute);
        self.apply_policy(mixer);
        Ok(())
    }

    pub fn set_solo(&mut self, mixer: &mut MixerHandle, id: TrackId, solo: bool) -> Result<()> {
        self.track_mut(id)?.set_solo(solo);
        self.apply_policy(mixer);
        Ok(())
    }

    pub fn add_clip(&mut self, id: TrackId, clip: Clip) -> Result<()> {
        if clip.buffer().sample_rate() == 0 {
            return Err(EngineError::InvalidBuffer("sample rate is zero".into()));
        }
        let track = self.track_mut(id)?;
        debug!(
            track = %id,
            start = clip.start_time(),
            duration = clip.duration(),
            "clip added"
        );
        track.push_clip(clip);
        Ok(())
    }

    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.tracks
            .iter()
            .find(|t| t.id() == id)
            .ok_or(EngineError::UnknownTrack(id))
    }

    pub fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or(EngineError::UnknownTrack(id))
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn snapshot(&self) -> Vec<TrackView> {
        self.tracks.iter().map(Track::view).collect()
    }

    pub fn has_solo(&self) -> bool {
        solo::has_solo(&self.tracks)
    }

    /// Latest clip end plus `tail` seconds.
    pub fn total_duration(&self, tail: f64) -> f64 {
        mixdown::total_duration(&self.tracks, tail)
    }

    /// Resample every track's meter from its tap.
    pub fn update_meters(&mut self) {
        for track in self.tracks.iter_mut() {
            let level = sample_rms(&mut track.meter);
            track.set_meter_value(level);
        }
    }

    /// Push the effective gain of every track to the mixer.
    fn apply_policy(&self, mixer: &mut MixerHandle) {
        let any_solo = self.has_solo();
        for track in &self.tracks {
            mixer.send(MixerCommand::SetGain(
                track.id(),
                solo::effective_gain(track, any_solo),
            ));
        }
    }

    fn position(&self, id: TrackId) -> Result<usize> {
        self.tracks
            .iter()
            .position(|t| t.id() == id)
            .ok_or(EngineError::UnknownTrack(id))
    }
}
