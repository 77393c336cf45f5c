//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change:
//!
//! ```toml
//! render_sample_rate = 48000
//! stop_mode = "retract"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// What `stop()` does with clip voices the scheduler already handed to the
/// audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopMode {
    /// Silence everything immediately, sounding or not.
    Retract,
    /// Drop voices that have not started yet; sounding voices ring out.
    #[default]
    CancelPending,
    /// Leave every scheduled voice alone.
    LetRing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate of the offline mixdown.
    pub render_sample_rate: u32,
    /// Channel count of the offline mixdown (1 or 2).
    pub render_channels: u16,
    /// Silence appended after the last clip when sizing a mixdown.
    pub tail_seconds: f64,
    /// Samples per meter analysis window.
    pub meter_window: usize,
    /// Fixed size of a capture chunk, in frames.
    pub capture_chunk_frames: usize,
    /// Capacity of the device → control thread capture ring, in seconds.
    pub capture_ring_seconds: f64,
    /// Capacity of the control → audio thread command ring.
    pub command_capacity: usize,
    pub stop_mode: StopMode,
    /// File name suggested to the download collaborator.
    pub export_file_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_sample_rate: 44_100,
            render_channels: 2,
            tail_seconds: 1.0,
            meter_window: 2048,
            capture_chunk_frames: 4096,
            capture_ring_seconds: 10.0,
            command_capacity: 256,
            stop_mode: StopMode::CancelPending,
            export_file_name: "mixdown.wav".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.render_sample_rate == 0 {
            return Err(EngineError::Config(
                "render_sample_rate must be positive".into(),
            ));
        }
        if !matches!(self.render_channels, 1 | 2) {
            return Err(EngineError::Config(format!(
                "render_channels must be 1 or 2, got {}",
                self.render_channels
            )));
        }
        if !self.tail_seconds.is_finite() || self.tail_seconds < 0.0 {
            return Err(EngineError::Config(
                "tail_seconds must be a non-negative number".into(),
            ));
        }
        if self.meter_window == 0 || self.capture_chunk_frames == 0 {
            return Err(EngineError::Config(
                "meter_window and capture_chunk_frames must be positive".into(),
            ));
        }
        if self.capture_ring_seconds.is_nan() || self.capture_ring_seconds <= 0.0 {
            return Err(EngineError::Config(
                "capture_ring_seconds must be positive".into(),
            ));
        }
        if self.command_capacity == 0 {
            return Err(EngineError::Config(
                "command_capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Capture ring capacity in samples for a device running at `sample_rate`.
    pub fn capture_ring_capacity(&self, sample_rate: u32) -> usize {
        let samples = (self.capture_ring_seconds * sample_rate as f64).ceil() as usize;
        samples.max(self.capture_chunk_frames)
    }
}
