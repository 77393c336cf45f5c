//! Analysis tap: copies a track's pre-fader signal out of the audio thread.
//!
//! The audio side pushes samples into a lock-free ring (dropping on overflow,
//! never blocking). The control side drains the ring into a fixed-size window
//! that the level meter reads.

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::graph::node::{Bus, GraphNode, RenderCtx};

/// Ring capacity in analysis windows.
const TAP_RING_WINDOWS: usize = 8;

/// Create a connected tap pair with a `window`-sample analysis window.
pub fn meter_tap(window: usize) -> (TapNode, MeterTap) {
    let window = window.max(1);
    let (tx, rx) = RingBuffer::<f32>::new(window * TAP_RING_WINDOWS);
    (TapNode { tx: Some(tx) }, MeterTap::new(rx, window))
}

/// Audio-thread half of the tap. Passes the signal through untouched.
pub struct TapNode {
    tx: Option<Producer<f32>>,
}

impl TapNode {
    /// A tap with nothing listening (offline renders).
    pub fn detached() -> Self {
        Self { tx: None }
    }
}

impl GraphNode for TapNode {
    fn process(&mut self, bus: &mut Bus<'_>, _ctx: &RenderCtx) {
        let Some(tx) = self.tx.as_mut() else {
            return;
        };
        // Meter the downmix; a mono bus carries the same signal on both sides
        for (&l, &r) in bus.left.iter().zip(bus.right.iter()) {
            let s = if bus.stereo { (l + r) * 0.5 } else { l };
            if let Err(PushError::Full(_)) = tx.push(s) {
                break; // drop remainder if full
            }
        }
    }
}

/// Control-thread half of the tap: the most recent `window` samples.
pub struct MeterTap {
    rx: Consumer<f32>,
    window: Vec<f32>,
    write_pos: usize,
    external: bool,
}

impl MeterTap {
    fn new(rx: Consumer<f32>, window: usize) -> Self {
        Self {
            rx,
            window: vec![0.0; window],
            write_pos: 0,
            external: false,
        }
    }

    /// Pull everything the audio thread has pushed since the last drain.
    ///
    /// While an external feed is active the tapped samples are discarded so
    /// the window only reflects the fed signal.
    pub fn drain(&mut self) {
        while let Ok(sample) = self.rx.pop() {
            if !self.external {
                self.write(sample);
            }
        }
    }

    /// Push samples that did not pass through the audio graph (live input).
    pub fn feed(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.write(sample);
        }
    }

    /// Switch the window between the tapped signal and an external feed.
    pub fn set_external(&mut self, external: bool) {
        if self.external != external {
            self.external = external;
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.window.fill(0.0);
        self.write_pos = 0;
    }

    /// The analysis window. Order is rotated; RMS does not care.
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    fn write(&mut self, sample: f32) {
        self.window[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.window.len();
    }
}
