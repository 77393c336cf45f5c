//! One-shot clip playback.

use std::sync::Arc;

use crate::{
    buffer::AudioBuffer,
    dsp::interpolate::read_linear,
    graph::node::{Bus, RenderCtx},
};

/// Plays one clip buffer once, starting at an absolute frame.
///
/// When the buffer's sample rate differs from the graph's, the voice steps
/// through the buffer at `buffer_rate / graph_rate` and interpolates.
pub struct ClipVoice {
    buffer: Arc<AudioBuffer>,
    start_frame: u64,
    /// Read position (in buffer frames) at `start_frame`.
    offset: f64,
    step: f64,
    finished: bool,
}

impl ClipVoice {
    /// `offset_seconds` skips into the buffer, used when the transport starts
    /// in the middle of a clip.
    pub fn new(
        buffer: Arc<AudioBuffer>,
        start_frame: u64,
        offset_seconds: f64,
        graph_rate: f32,
    ) -> Self {
        let buffer_rate = buffer.sample_rate() as f64;
        let finished = buffer.is_empty();
        Self {
            step: buffer_rate / graph_rate as f64,
            offset: offset_seconds.max(0.0) * buffer_rate,
            buffer,
            start_frame,
            finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the voice is producing sound at or before `frame`.
    pub fn has_started(&self, frame: u64) -> bool {
        self.start_frame <= frame
    }

    /// Add this voice's contribution for the block onto `bus`.
    pub fn render(&mut self, bus: &mut Bus<'_>, ctx: &RenderCtx) {
        if self.finished {
            return;
        }
        let frames = bus.frames();
        let block_end = ctx.frame + frames as u64;
        if block_end <= self.start_frame {
            return;
        }

        let len = self.buffer.frames() as f64;
        let first = self.start_frame.saturating_sub(ctx.frame) as usize;
        let stereo_source = self.buffer.num_channels() > 1;
        let left_src = self.buffer.channel(0);
        let right_src = if stereo_source {
            self.buffer.channel(1)
        } else {
            left_src
        };

        for i in first..frames {
            let elapsed = (ctx.frame + i as u64 - self.start_frame) as f64;
            let pos = self.offset + elapsed * self.step;
            if pos >= len {
                self.finished = true;
                break;
            }
            bus.left[i] += read_linear(left_src, pos);
            bus.right[i] += read_linear(right_src, pos);
        }

        if stereo_source {
            bus.stereo = true;
        }

        let end_pos = self.offset + (block_end - self.start_frame) as f64 * self.step;
        if end_pos >= len {
            self.finished = true;
        }
    }
}
