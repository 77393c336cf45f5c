//! A backend clocked by hand.
//!
//! Nothing runs on its own: `advance` renders the mixer for a number of
//! frames and returns what a device would have played. Input is whatever
//! the caller pushes into the producer returned by `attach_input`.

use crate::{
    backend::{capture_ring, AudioBackend, CaptureDevice, CaptureProducer, RingCapture},
    buffer::AudioBuffer,
    config::EngineConfig,
    error::{EngineError, Result},
    graph::mixer::{mixer_channel, Mixer, MixerHandle},
    MAX_BLOCK_SIZE,
};

pub struct ManualBackend {
    sample_rate: u32,
    config: EngineConfig,
    handle: MixerHandle,
    mixer: Mixer,
    input: Option<RingCapture>,
}

impl ManualBackend {
    pub fn new(sample_rate: u32, config: &EngineConfig) -> Self {
        let (handle, mixer) = mixer_channel(sample_rate, config.command_capacity);
        Self {
            sample_rate,
            config: config.clone(),
            handle,
            mixer,
            input: None,
        }
    }

    /// Render `frames` frames of the master bus, as a stereo buffer.
    pub fn advance(&mut self, frames: usize) -> AudioBuffer {
        let mut out = AudioBuffer::silent(2, frames, self.sample_rate);
        let mut left = [0.0f32; MAX_BLOCK_SIZE];
        let mut right = [0.0f32; MAX_BLOCK_SIZE];

        let mut done = 0;
        while done < frames {
            self.handle.flush();
            let n = (frames - done).min(MAX_BLOCK_SIZE);
            self.mixer.render_block(&mut left[..n], &mut right[..n]);
            out.channel_mut(0)[done..done + n].copy_from_slice(&left[..n]);
            out.channel_mut(1)[done..done + n].copy_from_slice(&right[..n]);
            done += n;
        }
        out
    }

    /// Advance the clock by `seconds`, discarding the output.
    pub fn advance_seconds(&mut self, seconds: f64) {
        let frames = (seconds * self.sample_rate as f64).round() as usize;
        self.advance(frames);
    }

    /// Plug in an input device for the next recording session.
    ///
    /// Without one, `open_input` reports the device as unavailable.
    pub fn attach_input(&mut self, sample_rate: u32) -> CaptureProducer {
        let capacity = self.config.capture_ring_capacity(sample_rate);
        let (producer, capture) = capture_ring(sample_rate, capacity);
        self.input = Some(capture);
        producer
    }

    /// The audio-thread mixer, for inspection.
    pub fn mixer_state(&self) -> &Mixer {
        &self.mixer
    }
}

impl AudioBackend for ManualBackend {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn mixer(&mut self) -> &mut MixerHandle {
        &mut self.handle
    }

    fn current_time(&self) -> f64 {
        self.handle.current_time()
    }

    fn open_input(&mut self, _config: &EngineConfig) -> Result<Box<dyn CaptureDevice>> {
        self.input
            .take()
            .map(|capture| Box::new(capture) as Box<dyn CaptureDevice>)
            .ok_or_else(|| EngineError::DeviceUnavailable("no input attached".into()))
    }
}
