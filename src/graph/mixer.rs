//! The mixer: every track chain summed onto one master bus.
//!
//! ```text
//! ┌────────────────┐  commands   ┌────────────────┐
//! │ Control thread │────────────►│  Audio thread  │
//! │ (MixerHandle)  │◄────────────│    (Mixer)     │
//! └───────▲────────┘   retired   └───────┬────────┘
//!         │ Acquire                      │ Release
//!         └────────── frame clock ◄──────┘
//! ```
//!
//! The audio thread never allocates or frees. Track and voice storage is
//! reserved by the control side before it is needed, and everything the
//! mixer lets go of (chains, finished voices, spent batches, outgrown
//! storage) travels back over the retired ring to be dropped there.
//!
//! The same `Mixer` renders the live device callback and the offline
//! mixdown, so an export sounds exactly like playback.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::{
    buffer::AudioBuffer,
    dsp::amplify::{apply_gain, mix_into},
    engine::track::TrackId,
    graph::{chain::TrackChain, node::RenderCtx, source::ClipVoice},
    MAX_BLOCK_SIZE,
};

/// Track slots reserved up front.
const INITIAL_TRACKS: usize = 16;
/// Voice slots reserved up front.
const INITIAL_VOICES: usize = 256;

/// A clip the transport wants played, handed to the audio thread.
pub struct ScheduledClip {
    pub track: TrackId,
    pub buffer: Arc<AudioBuffer>,
    /// Absolute mixer frame the clip starts at.
    pub start_frame: u64,
    /// Seconds to skip into the buffer.
    pub offset: f64,
}

/// Messages from the control thread to the audio thread.
pub enum MixerCommand {
    /// Take ownership of a chain and connect it to the master bus.
    AddTrack(Box<TrackChain>),
    /// Disconnect a chain and retire it together with its voices.
    RemoveTrack(TrackId),
    SetGain(TrackId, f32),
    SetPan(TrackId, f32),
    /// Start a batch of clip voices. One batch is one scheduling pass.
    Schedule(Vec<ScheduledClip>),
    /// Drop voices that have not started yet.
    CancelPending,
    /// Drop every voice.
    CancelAll,
    /// Larger storage, allocated on the control thread.
    Reserve(Reservation),
}

/// Replacement storage for the mixer's track or voice lists.
///
/// Only [`MixerHandle`] builds these, sized from its own bookkeeping.
pub struct Reservation {
    tracks: Option<Vec<Box<TrackChain>>>,
    voices: Option<Vec<Voice>>,
}

struct Voice {
    track: TrackId,
    voice: ClipVoice,
    /// Cancelled or orphaned, waiting for room on the retired ring.
    dead: bool,
}

/// Things the audio thread is done with. Dropped on the control thread.
enum Retired {
    Chain(Box<TrackChain>),
    Voice(ClipVoice),
    Batch(Vec<ScheduledClip>),
    Tracks(Vec<Box<TrackChain>>),
    Voices(Vec<Voice>),
}

pub struct Mixer {
    sample_rate: f32,
    rx: Option<Consumer<MixerCommand>>,
    /// `None` offline, where dropping in place is fine.
    retired: Option<Producer<Retired>>,
    tracks: Vec<Box<TrackChain>>,
    voices: Vec<Voice>,
    master_gain: f32,
    master_left: Vec<f32>,
    master_right: Vec<f32>,
    frame: u64,
    clock: Arc<AtomicU64>,
}

impl Mixer {
    /// A mixer driven directly through [`Mixer::apply`], with no command ring.
    pub fn offline(sample_rate: f32) -> Self {
        Self::with_rings(sample_rate, None, None, Arc::new(AtomicU64::new(0)))
    }

    fn with_rings(
        sample_rate: f32,
        rx: Option<Consumer<MixerCommand>>,
        retired: Option<Producer<Retired>>,
        clock: Arc<AtomicU64>,
    ) -> Self {
        Self {
            sample_rate,
            rx,
            retired,
            tracks: Vec::with_capacity(INITIAL_TRACKS),
            voices: Vec::with_capacity(INITIAL_VOICES),
            master_gain: 1.0,
            master_left: vec![0.0; MAX_BLOCK_SIZE],
            master_right: vec![0.0; MAX_BLOCK_SIZE],
            frame: 0,
            clock,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Voices still playing or waiting to start.
    pub fn voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.dead).count()
    }

    pub fn apply(&mut self, command: MixerCommand) {
        match command {
            MixerCommand::AddTrack(mut chain) => {
                chain.connect();
                self.tracks.push(chain);
            }
            MixerCommand::RemoveTrack(id) => {
                if let Some(pos) = self.tracks.iter().position(|t| t.id() == id) {
                    let mut chain = self.tracks.remove(pos);
                    chain.disconnect();
                    self.retire(Retired::Chain(chain));
                }
                self.kill_voices(|v| v.track == id);
            }
            MixerCommand::SetGain(id, gain) => {
                if let Some(chain) = self.chain_mut(id) {
                    chain.gain.set_gain(gain);
                }
            }
            MixerCommand::SetPan(id, pan) => {
                if let Some(chain) = self.chain_mut(id) {
                    chain.pan.set_pan(pan);
                }
            }
            MixerCommand::Schedule(mut batch) => {
                let rate = self.sample_rate;
                for clip in batch.drain(..) {
                    self.voices.push(Voice {
                        track: clip.track,
                        voice: ClipVoice::new(clip.buffer, clip.start_frame, clip.offset, rate),
                        dead: false,
                    });
                }
                self.retire(Retired::Batch(batch));
            }
            MixerCommand::CancelPending => {
                let now = self.frame;
                self.kill_voices(|v| !v.voice.has_started(now));
            }
            MixerCommand::CancelAll => self.kill_voices(|_| true),
            MixerCommand::Reserve(reservation) => self.take_reservation(reservation),
        }
    }

    /// Render one block (at most `MAX_BLOCK_SIZE` frames) of the master bus.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        let frames = left.len().min(MAX_BLOCK_SIZE);

        self.drain_commands();

        let ctx = RenderCtx::new(self.sample_rate, self.frame);
        let master_l = &mut self.master_left[..frames];
        let master_r = &mut self.master_right[..frames];
        master_l.fill(0.0);
        master_r.fill(0.0);

        for chain in self.tracks.iter_mut() {
            let id = chain.id();
            let connected = chain.is_connected();
            let voices = self
                .voices
                .iter_mut()
                .filter(|v| v.track == id && !v.dead)
                .map(|v| &mut v.voice);
            let (track_l, track_r) = chain.render(voices, frames, &ctx);
            if connected {
                mix_into(master_l, track_l, 1.0);
                mix_into(master_r, track_r, 1.0);
            }
        }

        apply_gain(master_l, self.master_gain);
        apply_gain(master_r, self.master_gain);
        left[..frames].copy_from_slice(master_l);
        right[..frames].copy_from_slice(master_r);

        self.sweep_voices();

        self.frame += frames as u64;
        self.clock.store(self.frame, Ordering::Release);
    }

    /// Render into an interleaved device buffer of `channels` channels.
    ///
    /// Mono devices get the L/R average; extra channels beyond two are
    /// silent.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let mut left = [0.0f32; MAX_BLOCK_SIZE];
        let mut right = [0.0f32; MAX_BLOCK_SIZE];

        for block in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
            let frames = block.len() / channels;
            self.render_block(&mut left[..frames], &mut right[..frames]);
            for (i, frame) in block.chunks_exact_mut(channels).enumerate() {
                if channels == 1 {
                    frame[0] = (left[i] + right[i]) * 0.5;
                } else {
                    frame[0] = left[i];
                    frame[1] = right[i];
                    frame[2..].fill(0.0);
                }
            }
        }
    }

    fn drain_commands(&mut self) {
        while let Some(command) = self.rx.as_mut().and_then(|rx| rx.pop().ok()) {
            self.apply(command);
        }
    }

    fn chain_mut(&mut self, id: TrackId) -> Option<&mut TrackChain> {
        self.tracks
            .iter_mut()
            .find(|t| t.id() == id)
            .map(|chain| &mut **chain)
    }

    fn take_reservation(&mut self, reservation: Reservation) {
        if let Some(mut tracks) = reservation.tracks {
            tracks.append(&mut self.tracks);
            let old = std::mem::replace(&mut self.tracks, tracks);
            self.retire(Retired::Tracks(old));
        }
        if let Some(mut voices) = reservation.voices {
            voices.append(&mut self.voices);
            let old = std::mem::replace(&mut self.voices, voices);
            self.retire(Retired::Voices(old));
        }
    }

    fn kill_voices(&mut self, mut doomed: impl FnMut(&Voice) -> bool) {
        for voice in self.voices.iter_mut() {
            if doomed(voice) {
                voice.dead = true;
            }
        }
        self.sweep_voices();
    }

    /// Hand finished and dead voices back. A voice that finds the retired
    /// ring full stays in the list, silent, until a later block.
    fn sweep_voices(&mut self) {
        let mut i = 0;
        while i < self.voices.len() {
            let voice = &mut self.voices[i];
            if !voice.dead && !voice.voice.is_finished() {
                i += 1;
                continue;
            }
            if self.retired.as_ref().is_some_and(|tx| tx.slots() == 0) {
                voice.dead = true;
                i += 1;
                continue;
            }
            let voice = self.voices.remove(i);
            self.retire(Retired::Voice(voice.voice));
        }
    }

    fn retire(&mut self, item: Retired) {
        if let Some(tx) = self.retired.as_mut() {
            // Only reached when the control side stopped collecting
            if let Err(PushError::Full(item)) = tx.push(item) {
                drop(item);
            }
        }
    }
}

/// Create a connected mixer/handle pair.
pub fn mixer_channel(sample_rate: u32, capacity: usize) -> (MixerHandle, Mixer) {
    let capacity = capacity.max(1);
    let (tx, rx) = RingBuffer::<MixerCommand>::new(capacity);
    let (retired_tx, retired_rx) = RingBuffer::<Retired>::new(capacity * 2 + INITIAL_VOICES * 2);
    let clock = Arc::new(AtomicU64::new(0));
    let mixer = Mixer::with_rings(sample_rate as f32, Some(rx), Some(retired_tx), clock.clone());
    let handle = MixerHandle {
        tx,
        retired: retired_rx,
        backlog: VecDeque::new(),
        clock,
        sample_rate,
        tracks: 0,
        track_capacity: INITIAL_TRACKS,
        voices: 0,
        voice_capacity: INITIAL_VOICES,
    };
    (handle, mixer)
}

/// Control-thread side of a mixer.
///
/// Commands that do not fit in the ring wait in a backlog and go out, in
/// order, on the next `send` or `flush`. Sending never fails.
///
/// The handle counts the tracks and voices it has handed over and not yet
/// seen retired. That count is an upper bound on what the mixer holds, so
/// a `Reserve` queued ahead of an `AddTrack` or `Schedule` always arrives
/// before the mixer would have to grow on its own.
pub struct MixerHandle {
    tx: Producer<MixerCommand>,
    retired: Consumer<Retired>,
    backlog: VecDeque<MixerCommand>,
    clock: Arc<AtomicU64>,
    sample_rate: u32,
    tracks: usize,
    track_capacity: usize,
    voices: usize,
    voice_capacity: usize,
}

impl MixerHandle {
    pub fn send(&mut self, command: MixerCommand) {
        match &command {
            MixerCommand::AddTrack(_) => {
                self.tracks += 1;
                if self.tracks > self.track_capacity {
                    self.track_capacity = self.tracks + INITIAL_TRACKS;
                    self.backlog.push_back(MixerCommand::Reserve(Reservation {
                        tracks: Some(Vec::with_capacity(self.track_capacity)),
                        voices: None,
                    }));
                }
            }
            MixerCommand::Schedule(batch) => {
                self.voices += batch.len();
                if self.voices > self.voice_capacity {
                    self.voice_capacity = self.voices + INITIAL_VOICES;
                    self.backlog.push_back(MixerCommand::Reserve(Reservation {
                        tracks: None,
                        voices: Some(Vec::with_capacity(self.voice_capacity)),
                    }));
                }
            }
            _ => {}
        }
        self.backlog.push_back(command);
        self.flush();
    }

    /// Push as much of the backlog as the ring accepts, then drop whatever
    /// the mixer has retired.
    pub fn flush(&mut self) {
        while let Some(command) = self.backlog.pop_front() {
            if let Err(PushError::Full(command)) = self.tx.push(command) {
                self.backlog.push_front(command);
                break;
            }
        }
        self.collect();
    }

    fn collect(&mut self) {
        while let Ok(item) = self.retired.pop() {
            match item {
                Retired::Chain(chain) => {
                    self.tracks = self.tracks.saturating_sub(1);
                    drop(chain);
                }
                Retired::Voice(voice) => {
                    self.voices = self.voices.saturating_sub(1);
                    drop(voice);
                }
                Retired::Batch(batch) => drop(batch),
                Retired::Tracks(tracks) => drop(tracks),
                Retired::Voices(voices) => drop(voices),
            }
        }
    }

    /// Commands still waiting for room in the ring.
    pub fn backlog(&self) -> usize {
        self.backlog.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames the audio thread has rendered.
    pub fn frame(&self) -> u64 {
        self.clock.load(Ordering::Acquire)
    }

    /// The engine clock, in seconds.
    pub fn current_time(&self) -> f64 {
        self.frame() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tap::TapNode;

    const RATE: u32 = 48_000;

    fn chain(raw: u64, pan: f32, gain: f32) -> Box<TrackChain> {
        Box::new(TrackChain::new(
            TrackId::from_raw(raw),
            TapNode::detached(),
            pan,
            gain,
        ))
    }

    fn ones(frames: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::from_mono(vec![1.0; frames], RATE))
    }

    fn schedule(track: u64, buffer: Arc<AudioBuffer>, start_frame: u64) -> MixerCommand {
        MixerCommand::Schedule(vec![ScheduledClip {
            track: TrackId::from_raw(track),
            buffer,
            start_frame,
            offset: 0.0,
        }])
    }

    #[test]
    fn sums_tracks_onto_master() {
        let mut mixer = Mixer::offline(RATE as f32);
        mixer.apply(MixerCommand::AddTrack(chain(1, -1.0, 1.0)));
        mixer.apply(MixerCommand::AddTrack(chain(2, 1.0, 0.5)));
        mixer.apply(schedule(1, ones(64), 0));
        mixer.apply(schedule(2, ones(64), 0));

        let mut left = [0.0; 64];
        let mut right = [0.0; 64];
        mixer.render_block(&mut left, &mut right);
        assert!(left.iter().all(|s| (s - 1.0).abs() < 1e-6));
        assert!(right.iter().all(|s| (s - 0.5).abs() < 1e-6));
        assert_eq!(mixer.frame(), 64);
    }

    #[test]
    fn gain_update_reaches_chain() {
        let mut mixer = Mixer::offline(RATE as f32);
        mixer.apply(MixerCommand::AddTrack(chain(1, -1.0, 1.0)));
        mixer.apply(MixerCommand::SetGain(TrackId::from_raw(1), 0.0));
        mixer.apply(schedule(1, ones(32), 0));

        let mut left = [0.0; 32];
        let mut right = [0.0; 32];
        mixer.render_block(&mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn removing_a_track_drops_its_voices() {
        let mut mixer = Mixer::offline(RATE as f32);
        mixer.apply(MixerCommand::AddTrack(chain(1, 0.0, 1.0)));
        mixer.apply(schedule(1, ones(256), 0));
        assert_eq!(mixer.voice_count(), 1);

        mixer.apply(MixerCommand::RemoveTrack(TrackId::from_raw(1)));
        assert_eq!(mixer.track_count(), 0);
        assert_eq!(mixer.voice_count(), 0);
    }

    #[test]
    fn cancel_pending_keeps_sounding_voices() {
        let mut mixer = Mixer::offline(RATE as f32);
        mixer.apply(MixerCommand::AddTrack(chain(1, 0.0, 1.0)));
        mixer.apply(schedule(1, ones(1024), 0));
        mixer.apply(schedule(1, ones(1024), 10_000));

        let mut left = [0.0; 128];
        let mut right = [0.0; 128];
        mixer.render_block(&mut left, &mut right);
        mixer.apply(MixerCommand::CancelPending);
        assert_eq!(mixer.voice_count(), 1);

        mixer.apply(MixerCommand::CancelAll);
        assert_eq!(mixer.voice_count(), 0);
    }

    #[test]
    fn finished_voices_are_released() {
        let mut mixer = Mixer::offline(RATE as f32);
        mixer.apply(MixerCommand::AddTrack(chain(1, 0.0, 1.0)));
        mixer.apply(schedule(1, ones(16), 0));

        let mut left = [0.0; 64];
        let mut right = [0.0; 64];
        mixer.render_block(&mut left, &mut right);
        assert_eq!(mixer.voice_count(), 0);
        assert!(left[16..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn commands_travel_through_the_ring() {
        let (mut handle, mut mixer) = mixer_channel(RATE, 4);
        handle.send(MixerCommand::AddTrack(chain(1, 0.0, 1.0)));
        let mut left = [0.0; 32];
        let mut right = [0.0; 32];
        mixer.render_block(&mut left, &mut right);
        assert_eq!(mixer.track_count(), 1);
        assert_eq!(handle.frame(), 32);
        assert!((handle.current_time() - 32.0 / RATE as f64).abs() < 1e-12);
    }

    #[test]
    fn full_ring_backs_up_in_order() {
        let (mut handle, mut mixer) = mixer_channel(RATE, 1);
        handle.send(MixerCommand::AddTrack(chain(1, 0.0, 1.0)));
        handle.send(MixerCommand::AddTrack(chain(2, 0.0, 1.0)));
        handle.send(MixerCommand::SetGain(TrackId::from_raw(2), 0.25));
        assert_eq!(handle.backlog(), 2);

        let mut left = [0.0; 8];
        let mut right = [0.0; 8];
        for _ in 0..3 {
            handle.flush();
            mixer.render_block(&mut left, &mut right);
        }
        assert_eq!(handle.backlog(), 0);
        assert_eq!(mixer.track_count(), 2);
        assert_eq!(mixer.chain_mut(TrackId::from_raw(2)).map(|c| c.gain.gain()), Some(0.25));
    }

    #[test]
    fn retired_buffers_are_freed_on_the_control_side() {
        let (mut handle, mut mixer) = mixer_channel(RATE, 8);
        let buffer = ones(4096);
        handle.send(MixerCommand::AddTrack(chain(1, 0.0, 1.0)));
        handle.send(schedule(1, buffer.clone(), 0));
        let mut left = [0.0; 64];
        let mut right = [0.0; 64];
        mixer.render_block(&mut left, &mut right);
        assert_eq!(Arc::strong_count(&buffer), 2);

        handle.send(MixerCommand::RemoveTrack(TrackId::from_raw(1)));
        mixer.render_block(&mut left, &mut right);
        assert_eq!(mixer.track_count(), 0);
        assert_eq!(mixer.voice_count(), 0);
        // The voice is parked on the retired ring, not dropped in the callback
        assert_eq!(Arc::strong_count(&buffer), 2);

        handle.flush();
        assert_eq!(Arc::strong_count(&buffer), 1);
        assert_eq!(handle.tracks, 0);
        assert_eq!(handle.voices, 0);
    }

    #[test]
    fn finished_voices_come_back_for_dropping() {
        let (mut handle, mut mixer) = mixer_channel(RATE, 8);
        let buffer = ones(16);
        handle.send(MixerCommand::AddTrack(chain(1, 0.0, 1.0)));
        handle.send(schedule(1, buffer.clone(), 0));
        let mut left = [0.0; 64];
        let mut right = [0.0; 64];
        mixer.render_block(&mut left, &mut right);
        assert_eq!(mixer.voice_count(), 0);
        assert_eq!(Arc::strong_count(&buffer), 2);
        handle.flush();
        assert_eq!(Arc::strong_count(&buffer), 1);
    }

    #[test]
    fn storage_is_reserved_before_it_is_needed() {
        let (mut handle, mut mixer) = mixer_channel(RATE, 8);
        for raw in 0..(INITIAL_TRACKS as u64 + 2) {
            handle.send(MixerCommand::AddTrack(chain(raw, 0.0, 1.0)));
        }
        let batch = (0..INITIAL_VOICES + 10)
            .map(|_| ScheduledClip {
                track: TrackId::from_raw(0),
                buffer: ones(8_192),
                start_frame: 0,
                offset: 0.0,
            })
            .collect();
        handle.send(MixerCommand::Schedule(batch));

        let mut left = [0.0; 32];
        let mut right = [0.0; 32];
        for _ in 0..4 {
            handle.flush();
            mixer.render_block(&mut left, &mut right);
        }
        assert_eq!(handle.backlog(), 0);
        assert_eq!(mixer.track_count(), INITIAL_TRACKS + 2);
        assert_eq!(mixer.voice_count(), INITIAL_VOICES + 10);
        assert!(mixer.tracks.capacity() >= handle.track_capacity);
        assert!(mixer.voices.capacity() >= handle.voice_capacity);
        assert!(handle.voice_capacity > INITIAL_VOICES + 10);
    }

    #[test]
    fn interleaves_for_the_device() {
        let mut mixer = Mixer::offline(RATE as f32);
        mixer.apply(MixerCommand::AddTrack(chain(1, -1.0, 1.0)));
        mixer.apply(schedule(1, ones(4096), 0));

        let mut data = vec![9.0; 3 * 3000];
        mixer.render_interleaved(&mut data, 3);
        for frame in data.chunks_exact(3) {
            assert!((frame[0] - 1.0).abs() < 1e-6);
            assert!(frame[1].abs() < 1e-6);
            assert_eq!(frame[2], 0.0);
        }
        assert_eq!(mixer.frame(), 3000);
    }
}
