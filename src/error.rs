//! Engine error types (thiserror-based).

use thiserror::Error;

use crate::engine::track::TrackId;

/// Everything the engine can report back to its host.
///
/// All variants are recoverable: the engine stays usable after returning
/// any of them.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Microphone permission denied or no input device present.
    #[error("audio input unavailable: {0}")]
    DeviceUnavailable(String),

    /// `start_recording` was called while a session is active.
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// Export requested with no clips on any track.
    #[error("nothing to render: add at least one clip first")]
    NothingToRender,

    /// Operation referenced a track id that does not exist (or was removed).
    #[error("unknown track {0}")]
    UnknownTrack(TrackId),

    /// Imported audio could not be decoded.
    #[error("failed to decode {name}: {reason}")]
    DecodeFailure { name: String, reason: String },

    /// Buffer construction with inconsistent shape.
    #[error("invalid audio buffer: {0}")]
    InvalidBuffer(String),

    /// Host audio API failure (stream build, play, device config).
    #[error("audio backend error: {0}")]
    Backend(String),

    /// Rejected engine configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Upload or save collaborator failed to take the encoded blob.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl EngineError {
    pub(crate) fn decode(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecodeFailure {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::DeviceUnavailable("permission denied".to_string());
        assert_eq!(
            err.to_string(),
            "audio input unavailable: permission denied"
        );
    }

    #[test]
    fn decode_failure_names_the_item() {
        let err = EngineError::decode("vocals.wav", "missing RIFF header");
        assert_eq!(
            err.to_string(),
            "failed to decode vocals.wav: missing RIFF header"
        );
    }
}
