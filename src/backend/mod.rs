//! Host audio abstraction.
//!
//! The engine only talks to an [`AudioBackend`]: a mixer handle for the
//! real-time graph, an offline renderer, and input devices for capture.
//! [`CpalBackend`] drives real hardware; [`manual::ManualBackend`] is
//! clocked by hand, for tests and headless renders.
//!
//! ```text
//! input callback ──push──► capture ring ──read_available──► Recorder
//! (device thread)          (rtrb SPSC)                      (control thread)
//! ```

pub mod cpal_backend;
pub mod manual;

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    buffer::AudioBuffer,
    config::EngineConfig,
    error::Result,
    graph::{
        mixer::MixerHandle,
        offline::{self, OfflineJob},
    },
};

pub use self::{cpal_backend::CpalBackend, manual::ManualBackend};

pub trait AudioBackend {
    /// Rate the real-time graph runs at.
    fn sample_rate(&self) -> u32;

    /// Control side of the real-time mixer.
    fn mixer(&mut self) -> &mut MixerHandle;

    /// Engine clock in seconds: frames rendered by the real-time graph.
    fn current_time(&self) -> f64;

    /// Acquire the default input device.
    ///
    /// Fails with `DeviceUnavailable` when there is no device or access
    /// was refused.
    fn open_input(&mut self, config: &EngineConfig) -> Result<Box<dyn CaptureDevice>>;

    /// Render a job faster than real time. The context is created and
    /// discarded per call.
    fn render_offline(&mut self, job: &OfflineJob) -> Result<AudioBuffer> {
        offline::render(job)
    }
}

/// An open input device, read from the control thread.
pub trait CaptureDevice {
    fn sample_rate(&self) -> u32;

    /// Append every sample delivered since the last call to `out`.
    /// Returns how many were appended.
    fn read_available(&mut self, out: &mut Vec<f32>) -> usize;

    /// Samples lost because the ring was full.
    fn dropped_samples(&self) -> usize;

    /// The device stopped delivering (unplugged, stream error).
    fn is_faulted(&self) -> bool;

    /// Release the device. Further reads return nothing.
    fn close(&mut self);
}

struct CaptureShared {
    dropped: AtomicUsize,
    faulted: AtomicBool,
    closed: AtomicBool,
}

/// Create a capture ring holding up to `capacity` mono samples.
pub fn capture_ring(sample_rate: u32, capacity: usize) -> (CaptureProducer, RingCapture) {
    let (tx, rx) = RingBuffer::<f32>::new(capacity.max(1));
    let shared = Arc::new(CaptureShared {
        dropped: AtomicUsize::new(0),
        faulted: AtomicBool::new(false),
        closed: AtomicBool::new(false),
    });
    (
        CaptureProducer {
            tx,
            shared: shared.clone(),
        },
        RingCapture {
            rx,
            sample_rate,
            shared,
        },
    )
}

/// Device-thread half of a capture ring. Never blocks; drops on overflow.
pub struct CaptureProducer {
    tx: Producer<f32>,
    shared: Arc<CaptureShared>,
}

impl CaptureProducer {
    /// Push mono samples.
    pub fn push(&mut self, samples: &[f32]) {
        if self.is_closed() {
            return;
        }
        let mut lost = 0;
        for &sample in samples {
            if self.tx.push(sample).is_err() {
                lost += 1;
            }
        }
        self.count_drops(lost);
    }

    /// Push the first channel of an interleaved device buffer.
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) {
        if self.is_closed() {
            return;
        }
        let mut lost = 0;
        for frame in data.chunks_exact(channels.max(1)) {
            if self.tx.push(frame[0]).is_err() {
                lost += 1;
            }
        }
        self.count_drops(lost);
    }

    /// Report that the device failed. The session ends on the next tick.
    pub fn set_faulted(&self) {
        self.fault_handle().set();
    }

    /// A handle the device's error callback can hold on to.
    pub fn fault_handle(&self) -> FaultHandle {
        FaultHandle(self.shared.clone())
    }

    /// Whether the reading side released the device.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    fn count_drops(&self, lost: usize) {
        if lost > 0 {
            self.shared.dropped.fetch_add(lost, Ordering::Relaxed);
        }
    }
}

#[derive(Clone)]
pub struct FaultHandle(Arc<CaptureShared>);

impl FaultHandle {
    pub fn set(&self) {
        self.0.faulted.store(true, Ordering::Release);
    }
}

/// Control-thread half of a capture ring.
pub struct RingCapture {
    rx: Consumer<f32>,
    sample_rate: u32,
    shared: Arc<CaptureShared>,
}

impl CaptureDevice for RingCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_available(&mut self, out: &mut Vec<f32>) -> usize {
        if self.shared.closed.load(Ordering::Acquire) {
            return 0;
        }
        let available = self.rx.slots();
        out.reserve(available);
        let mut read = 0;
        while let Ok(sample) = self.rx.pop() {
            out.push(sample);
            read += 1;
        }
        read
    }

    fn dropped_samples(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    fn is_faulted(&self) -> bool {
        self.shared.faulted.load(Ordering::Acquire)
    }

    fn close(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_arrive_in_order() {
        let (mut input, mut device) = capture_ring(48_000, 16);
        input.push(&[0.1, 0.2]);
        input.push(&[0.3]);
        let mut out = Vec::new();
        assert_eq!(device.read_available(&mut out), 3);
        assert_eq!(out, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn interleaved_input_keeps_first_channel() {
        let (mut input, mut device) = capture_ring(48_000, 16);
        input.push_interleaved(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 2);
        let mut out = Vec::new();
        device.read_available(&mut out);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn closed_device_ignores_input() {
        let (mut input, mut device) = capture_ring(48_000, 16);
        device.close();
        assert!(input.is_closed());
        input.push(&[1.0]);
        let mut out = Vec::new();
        assert_eq!(device.read_available(&mut out), 0);
    }

    #[test]
    fn fault_is_visible_to_reader() {
        let (input, device) = capture_ring(48_000, 16);
        assert!(!device.is_faulted());
        input.set_faulted();
        assert!(device.is_faulted());
    }
}
