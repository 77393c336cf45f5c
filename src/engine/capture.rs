//! Recording sessions: Idle → Recording → Idle.
//!
//! The input device delivers samples on its own thread into a lock-free
//! ring. The recorder drains that ring on the control thread and packs the
//! samples into fixed-size chunks, appended strictly in arrival order. On
//! stop the chunks are concatenated into one mono buffer.

use tracing::{info, warn};

use crate::{
    backend::CaptureDevice,
    buffer::AudioBuffer,
    engine::track::TrackId,
    error::{EngineError, Result},
};

/// What a finished session produced.
pub struct Take {
    pub track: TrackId,
    pub buffer: AudioBuffer,
    /// Samples the device could not hand over in time.
    pub dropped: usize,
}

struct Session {
    track: TrackId,
    device: Box<dyn CaptureDevice>,
    chunks: Vec<Vec<f32>>,
    current: Vec<f32>,
    fresh: Vec<f32>,
    captured: usize,
}

pub struct Recorder {
    chunk_frames: usize,
    session: Option<Session>,
}

impl Recorder {
    pub fn new(chunk_frames: usize) -> Self {
        Self {
            chunk_frames: chunk_frames.max(1),
            session: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Track the active session records into.
    pub fn track(&self) -> Option<TrackId> {
        self.session.as_ref().map(|s| s.track)
    }

    /// Begin a session on an already opened device.
    pub fn start(&mut self, track: TrackId, mut device: Box<dyn CaptureDevice>) -> Result<()> {
        if self.session.is_some() {
            return Err(EngineError::AlreadyRecording);
        }
        if device.sample_rate() == 0 {
            device.close();
            return Err(EngineError::DeviceUnavailable(
                "input device reports a zero sample rate".into(),
            ));
        }
        info!(track = %track, sample_rate = device.sample_rate(), "recording started");
        self.session = Some(Session {
            track,
            device,
            chunks: Vec::new(),
            current: Vec::with_capacity(self.chunk_frames),
            fresh: Vec::with_capacity(self.chunk_frames),
            captured: 0,
        });
        Ok(())
    }

    /// Move everything the device has delivered into the chunk list.
    ///
    /// Returns the samples that arrived since the last poll, for live
    /// metering. Empty when idle.
    pub fn poll(&mut self) -> &[f32] {
        let chunk_frames = self.chunk_frames;
        let Some(session) = self.session.as_mut() else {
            return &[];
        };
        session.fresh.clear();
        session.device.read_available(&mut session.fresh);
        session.captured += session.fresh.len();

        let mut rest = session.fresh.as_slice();
        while !rest.is_empty() {
            let room = chunk_frames - session.current.len();
            let (head, tail) = rest.split_at(room.min(rest.len()));
            session.current.extend_from_slice(head);
            if session.current.len() == chunk_frames {
                let full =
                    std::mem::replace(&mut session.current, Vec::with_capacity(chunk_frames));
                session.chunks.push(full);
            }
            rest = tail;
        }
        &session.fresh
    }

    /// Whether the device reported a fault (unplugged, stream error).
    pub fn is_faulted(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.device.is_faulted())
    }

    /// Seconds captured so far in the active session.
    pub fn elapsed(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |s| {
            s.captured as f64 / s.device.sample_rate() as f64
        })
    }

    /// End the session and assemble its buffer. `None` when idle.
    pub fn stop(&mut self) -> Option<Take> {
        self.poll();
        let mut session = self.session.take()?;
        session.device.close();

        let dropped = session.device.dropped_samples();
        if dropped > 0 {
            warn!(track = %session.track, dropped, "capture ring overflowed");
        }

        let mut samples = Vec::with_capacity(session.captured);
        for chunk in session.chunks.drain(..) {
            samples.extend_from_slice(&chunk);
        }
        samples.extend_from_slice(&session.current);

        let buffer = AudioBuffer::from_mono(samples, session.device.sample_rate());
        info!(
            track = %session.track,
            duration = buffer.duration(),
            "recording stopped"
        );
        Some(Take {
            track: session.track,
            buffer,
            dropped,
        })
    }

    /// Drop the active session and its samples.
    pub fn cancel(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.device.close();
            info!(track = %session.track, "recording cancelled");
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.device.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::capture_ring;

    #[test]
    fn chunks_concatenate_in_order() {
        let (mut input, device) = capture_ring(8_000, 1024);
        let mut recorder = Recorder::new(4);
        recorder.start(TrackId::from_raw(0), Box::new(device)).unwrap();

        let a: Vec<f32> = (0..5).map(|i| i as f32).collect();
        let b: Vec<f32> = (5..11).map(|i| i as f32).collect();
        let c: Vec<f32> = (11..14).map(|i| i as f32).collect();
        input.push(&a);
        assert_eq!(recorder.poll(), a.as_slice());
        input.push(&b);
        recorder.poll();
        input.push(&c);

        let take = recorder.stop().unwrap();
        let expected: Vec<f32> = a.iter().chain(&b).chain(&c).copied().collect();
        assert_eq!(take.buffer.channel(0), expected.as_slice());
        assert_eq!(take.buffer.sample_rate(), 8_000);
        assert_eq!(take.buffer.num_channels(), 1);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn second_start_is_rejected() {
        let (_input, first) = capture_ring(8_000, 16);
        let (_other, second) = capture_ring(8_000, 16);
        let mut recorder = Recorder::new(4);
        recorder.start(TrackId::from_raw(0), Box::new(first)).unwrap();
        assert!(matches!(
            recorder.start(TrackId::from_raw(1), Box::new(second)),
            Err(EngineError::AlreadyRecording)
        ));
        assert_eq!(recorder.track(), Some(TrackId::from_raw(0)));
    }

    #[test]
    fn rateless_device_is_refused_and_closed() {
        let (input, device) = capture_ring(0, 16);
        let mut recorder = Recorder::new(4);
        assert!(matches!(
            recorder.start(TrackId::from_raw(0), Box::new(device)),
            Err(EngineError::DeviceUnavailable(_))
        ));
        assert!(!recorder.is_recording());
        assert!(input.is_closed());
    }

    #[test]
    fn stop_while_idle_is_none() {
        let mut recorder = Recorder::new(4);
        assert!(recorder.stop().is_none());
        assert!(recorder.poll().is_empty());
    }

    #[test]
    fn stop_closes_the_device() {
        let (input, device) = capture_ring(8_000, 16);
        let mut recorder = Recorder::new(4);
        recorder.start(TrackId::from_raw(0), Box::new(device)).unwrap();
        assert!(!input.is_closed());
        recorder.stop();
        assert!(input.is_closed());
    }

    #[test]
    fn elapsed_counts_captured_samples() {
        let (mut input, device) = capture_ring(100, 1024);
        let mut recorder = Recorder::new(64);
        recorder.start(TrackId::from_raw(0), Box::new(device)).unwrap();
        input.push(&[0.0; 150]);
        recorder.poll();
        assert!((recorder.elapsed() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn overflow_is_counted() {
        let (mut input, device) = capture_ring(100, 4);
        let mut recorder = Recorder::new(2);
        recorder.start(TrackId::from_raw(0), Box::new(device)).unwrap();
        input.push(&[1.0; 10]);
        let take = recorder.stop().unwrap();
        assert_eq!(take.buffer.frames(), 4);
        assert_eq!(take.dropped, 6);
    }
}
