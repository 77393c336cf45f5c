//! Level measurement over a fixed analysis window.

/*
RMS Metering
============

Peak level reacts to single samples; RMS (root-mean-square) tracks energy
and matches perceived loudness far better, which is why track meters use it.

    rms = sqrt( (x₀² + x₁² + ... + xₙ₋₁²) / n )

Reference values for a full-scale signal:

    square wave  →  1.000
    sine wave    →  0.707  (1/√2)
    silence      →  0.000

Samples are clamped to [-1, 1] first, so a clipping signal reads at most 1.0
and the meter range is always [0, 1].
*/

/// RMS of the whole window, in [0, 1]. An empty window reads as silence.
pub fn rms(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum: f32 = window
        .iter()
        .map(|&s| {
            let v = s.clamp(-1.0, 1.0);
            v * v
        })
        .sum();
    (sum / window.len() as f32).sqrt()
}
