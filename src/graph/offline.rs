//! Faster-than-realtime render of a whole arrangement.
//!
//! Builds a fresh [`Mixer`] with detached taps, schedules every clip at its
//! timeline position, then renders block by block into a pre-sized buffer.

use std::sync::Arc;

use crate::{
    buffer::AudioBuffer,
    engine::track::TrackId,
    error::{EngineError, Result},
    graph::{
        chain::TrackChain,
        mixer::{Mixer, MixerCommand, ScheduledClip},
        tap::TapNode,
    },
    MAX_BLOCK_SIZE,
};

/// One track as the offline renderer sees it: settings already resolved.
#[derive(Clone)]
pub struct OfflineTrack {
    pub pan: f32,
    /// Effective gain (0 when silenced by solo/mute).
    pub gain: f32,
    /// `(buffer, start_seconds)` pairs.
    pub clips: Vec<(Arc<AudioBuffer>, f64)>,
}

/// Everything needed to render a mixdown without touching live state.
#[derive(Clone)]
pub struct OfflineJob {
    pub sample_rate: u32,
    /// 1 (downmixed) or 2.
    pub channels: usize,
    pub frames: usize,
    pub tracks: Vec<OfflineTrack>,
}

pub fn render(job: &OfflineJob) -> Result<AudioBuffer> {
    if job.sample_rate == 0 {
        return Err(EngineError::Backend("offline sample rate must be non-zero".into()));
    }
    if !(1..=2).contains(&job.channels) {
        return Err(EngineError::Backend(format!(
            "offline render supports 1 or 2 channels, got {}",
            job.channels
        )));
    }

    let rate = job.sample_rate as f64;
    let mut mixer = Mixer::offline(job.sample_rate as f32);
    for (index, track) in job.tracks.iter().enumerate() {
        let id = TrackId::from_raw(index as u64);
        mixer.apply(MixerCommand::AddTrack(Box::new(TrackChain::new(
            id,
            TapNode::detached(),
            track.pan,
            track.gain,
        ))));
        let batch = track
            .clips
            .iter()
            .map(|(buffer, start)| ScheduledClip {
                track: id,
                buffer: buffer.clone(),
                start_frame: (start.max(0.0) * rate).round() as u64,
                offset: 0.0,
            })
            .collect();
        mixer.apply(MixerCommand::Schedule(batch));
    }

    let mut left = vec![0.0f32; job.frames];
    let mut right = vec![0.0f32; job.frames];
    for (l, r) in left
        .chunks_mut(MAX_BLOCK_SIZE)
        .zip(right.chunks_mut(MAX_BLOCK_SIZE))
    {
        mixer.render_block(l, r);
    }

    if job.channels == 1 {
        let mono = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| (l + r) * 0.5)
            .collect();
        Ok(AudioBuffer::from_mono(mono, job.sample_rate))
    } else {
        AudioBuffer::from_channels(vec![left, right], job.sample_rate)
    }
}
