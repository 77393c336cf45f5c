//! Mixdown planning and export progress.
//!
//! A mixdown rebuilds the live topology in an offline context: every clip
//! of every track, through that track's pan and effective gain, into one
//! master. The solo/mute policy is evaluated once, up front, so the render
//! matches what live playback would let you hear.

use std::fmt;

use tracing::debug;

use crate::{
    config::EngineConfig,
    engine::{solo, track::Track},
    error::{EngineError, Result},
    graph::offline::{OfflineJob, OfflineTrack},
};

/// Latest clip end across all tracks, plus `tail` seconds.
pub fn total_duration(tracks: &[Track], tail: f64) -> f64 {
    tracks.iter().map(Track::end_time).fold(0.0, f64::max) + tail
}

/// Snapshot the tracks into a self-contained render job.
pub fn plan(tracks: &[Track], config: &EngineConfig) -> Result<OfflineJob> {
    let total = total_duration(tracks, config.tail_seconds);
    if total <= config.tail_seconds {
        return Err(EngineError::NothingToRender);
    }

    let any_solo = solo::has_solo(tracks);
    let frames = (total * config.render_sample_rate as f64).floor() as usize;
    let tracks = tracks
        .iter()
        .map(|track| OfflineTrack {
            pan: track.pan(),
            gain: solo::effective_gain(track, any_solo),
            clips: track
                .clips()
                .iter()
                .map(|clip| (clip.buffer().clone(), clip.start_time()))
                .collect(),
        })
        .collect();

    debug!(duration = total, frames, "mixdown planned");
    Ok(OfflineJob {
        sample_rate: config.render_sample_rate,
        channels: config.render_channels as usize,
        frames,
        tracks,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Routing,
    Rendering,
    Encoding,
    Done,
}

impl ExportStage {
    pub fn percent(self) -> u8 {
        match self {
            Self::Preparing => 0,
            Self::Routing => 20,
            Self::Rendering => 50,
            Self::Encoding => 80,
            Self::Done => 100,
        }
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preparing => "preparing tracks",
            Self::Routing => "routing tracks",
            Self::Rendering => "rendering mixdown",
            Self::Encoding => "encoding WAV",
            Self::Done => "export complete",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    pub stage: ExportStage,
    pub percent: u8,
}

impl From<ExportStage> for ExportProgress {
    fn from(stage: ExportStage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
        }
    }
}
