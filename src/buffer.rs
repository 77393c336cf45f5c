//! Decoded, planar audio buffers.

use crate::error::{EngineError, Result};

/// Planar f32 audio at a fixed sample rate.
///
/// Clips hold one of these behind an `Arc` so the audio thread can read it
/// while the control thread keeps ownership of the clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Silent buffer with `channels` channels of `frames` frames each.
    pub fn silent(channels: usize, frames: usize, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: vec![vec![0.0; frames]; channels.max(1)],
        }
    }

    /// Single-channel buffer, the shape produced by capture.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: vec![samples],
        }
    }

    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(EngineError::InvalidBuffer("sample rate is zero".into()));
        }
        let Some(first) = channels.first() else {
            return Err(EngineError::InvalidBuffer("no channels".into()));
        };
        let frames = first.len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(EngineError::InvalidBuffer(
                "channels have different lengths".into(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Split interleaved samples (`L R L R ...`) into planar channels.
    ///
    /// A trailing partial frame is discarded.
    pub fn from_interleaved(samples: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(EngineError::InvalidBuffer("no channels".into()));
        }
        let frames = samples.len() / channels;
        let mut planar = vec![Vec::with_capacity(frames); channels];
        for frame in samples.chunks_exact(channels) {
            for (ch, &s) in planar.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::from_channels(planar, sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Length in seconds (`frames / sample_rate`), zero for a buffer with no
    /// sample rate.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Frame-major copy: every channel's sample for frame 0, then frame 1, ...
    pub fn interleaved(&self) -> Vec<f32> {
        let num_channels = self.num_channels();
        let mut out = Vec::with_capacity(self.frames() * num_channels);
        for frame in 0..self.frames() {
            for ch in &self.channels {
                out.push(ch[frame]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_frames_and_rate() {
        let buffer = AudioBuffer::from_mono(vec![0.0; 88_200], 44_100);
        assert_eq!(buffer.frames(), 88_200);
        assert_eq!(buffer.duration(), 2.0);
    }

    #[test]
    fn interleaves_frame_major() {
        let buffer =
            AudioBuffer::from_channels(vec![vec![1.0, 2.0], vec![-1.0, -2.0]], 8_000).unwrap();
        assert_eq!(buffer.interleaved(), vec![1.0, -1.0, 2.0, -2.0]);
    }

    #[test]
    fn deinterleave_drops_partial_frame() {
        let buffer = AudioBuffer::from_interleaved(&[0.1, 0.2, 0.3, 0.4, 0.5], 2, 8_000).unwrap();
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.channel(0), &[0.1, 0.3]);
        assert_eq!(buffer.channel(1), &[0.2, 0.4]);
    }

    #[test]
    fn rejects_ragged_channels() {
        let err = AudioBuffer::from_channels(vec![vec![0.0; 3], vec![0.0; 2]], 8_000);
        assert!(matches!(err, Err(EngineError::InvalidBuffer(_))));
    }

    #[test]
    fn rejects_zero_rate() {
        assert!(AudioBuffer::from_channels(vec![vec![0.0]], 0).is_err());
    }

    #[test]
    fn rateless_buffer_has_no_length() {
        assert_eq!(AudioBuffer::from_mono(vec![0.5; 64], 0).duration(), 0.0);
        assert_eq!(AudioBuffer::silent(2, 64, 0).duration(), 0.0);
    }
}
