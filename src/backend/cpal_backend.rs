//! Real hardware through cpal.
//!
//! The output stream callback owns the [`Mixer`]; the engine keeps the
//! [`MixerHandle`]. Input streams push into a capture ring and flag a fault
//! from their error callback.

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
};
use tracing::{error, info, warn};

use crate::{
    backend::{capture_ring, AudioBackend, CaptureDevice, CaptureProducer, RingCapture},
    config::EngineConfig,
    error::{EngineError, Result},
    graph::mixer::{mixer_channel, Mixer, MixerHandle},
    MAX_BLOCK_SIZE,
};

pub struct CpalBackend {
    handle: MixerHandle,
    sample_rate: u32,
    _output: Stream,
}

impl CpalBackend {
    /// Open the default output device and start its stream.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::Backend("no default output device available".into()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| EngineError::Backend(format!("failed to fetch output config: {e}")))?;

        let sample_rate = supported.sample_rate().0;
        let format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();
        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels = stream_config.channels,
            ?format,
            "opening output"
        );

        let (handle, mixer) = mixer_channel(sample_rate, config.command_capacity);
        let stream = match format {
            SampleFormat::F32 => build_output::<f32>(&device, &stream_config, mixer),
            SampleFormat::I16 => build_output::<i16>(&device, &stream_config, mixer),
            SampleFormat::U16 => build_output::<u16>(&device, &stream_config, mixer),
            other => Err(EngineError::Backend(format!(
                "unsupported output sample format {other:?}"
            ))),
        }?;
        stream
            .play()
            .map_err(|e| EngineError::Backend(format!("failed to start output: {e}")))?;

        Ok(Self {
            handle,
            sample_rate,
            _output: stream,
        })
    }
}

impl AudioBackend for CpalBackend {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn mixer(&mut self) -> &mut MixerHandle {
        &mut self.handle
    }

    fn current_time(&self) -> f64 {
        self.handle.current_time()
    }

    fn open_input(&mut self, config: &EngineConfig) -> Result<Box<dyn CaptureDevice>> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| EngineError::DeviceUnavailable("no default input device".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| EngineError::DeviceUnavailable(e.to_string()))?;

        let sample_rate = supported.sample_rate().0;
        let format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();
        let (producer, ring) = capture_ring(sample_rate, config.capture_ring_capacity(sample_rate));

        let stream = match format {
            SampleFormat::F32 => build_input::<f32>(&device, &stream_config, producer),
            SampleFormat::I16 => build_input::<i16>(&device, &stream_config, producer),
            SampleFormat::U16 => build_input::<u16>(&device, &stream_config, producer),
            other => Err(EngineError::DeviceUnavailable(format!(
                "unsupported input sample format {other:?}"
            ))),
        }?;
        stream
            .play()
            .map_err(|e| EngineError::DeviceUnavailable(format!("failed to start input: {e}")))?;
        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            "input opened"
        );

        Ok(Box::new(CpalCapture {
            ring,
            stream: Some(stream),
        }))
    }
}

fn build_output<T>(device: &cpal::Device, config: &StreamConfig, mut mixer: Mixer) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch = vec![0.0f32; MAX_BLOCK_SIZE * channels];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for block in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                    let out = &mut scratch[..block.len()];
                    mixer.render_interleaved(out, channels);
                    for (dst, &src) in block.iter_mut().zip(out.iter()) {
                        *dst = T::from_sample(src);
                    }
                }
            },
            |err| error!("output stream error: {err}"),
            None,
        )
        .map_err(|e| EngineError::Backend(format!("failed to build output stream: {e}")))
}

fn build_input<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: CaptureProducer,
) -> Result<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let fault = producer.fault_handle();
    let mut scratch: Vec<f32> = Vec::with_capacity(MAX_BLOCK_SIZE * channels);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                scratch.clear();
                scratch.extend(data.iter().map(|&s| f32::from_sample(s)));
                producer.push_interleaved(&scratch, channels);
            },
            move |err| {
                error!("input stream error: {err}");
                fault.set();
            },
            None,
        )
        .map_err(|e| EngineError::DeviceUnavailable(format!("failed to build input stream: {e}")))
}

/// A cpal input stream feeding a capture ring.
struct CpalCapture {
    ring: RingCapture,
    stream: Option<Stream>,
}

impl CaptureDevice for CpalCapture {
    fn sample_rate(&self) -> u32 {
        self.ring.sample_rate()
    }

    fn read_available(&mut self, out: &mut Vec<f32>) -> usize {
        self.ring.read_available(out)
    }

    fn dropped_samples(&self) -> usize {
        self.ring.dropped_samples()
    }

    fn is_faulted(&self) -> bool {
        self.ring.is_faulted()
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("failed to pause input stream: {e}");
            }
        }
        self.ring.close();
    }
}
