//! What the UI draws, rebuilt from the engine every frame.

use saavy_studio::TrackView;

#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub is_playing: bool,
    pub is_recording: bool,
    /// Seconds captured in the active take
    pub recording_elapsed: f64,
    /// Playhead in seconds
    pub current_time: f64,
    /// Latest clip end plus tail
    pub total_duration: f64,
    /// Output device rate in Hz
    pub sample_rate: u32,
    pub tracks: Vec<TrackView>,
    pub selected: usize,
    /// Overview of the selected track's newest clip
    pub waveform: Vec<f32>,
    /// Last action or error
    pub status: String,
}
