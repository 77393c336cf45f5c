//! Low-level DSP primitives used by the mixer graph.
//!
//! These functions are allocation-free and realtime-safe, so graph nodes can
//! call them from inside the audio callback. They stay focused on the math;
//! routing and scheduling live in `graph`.

/// Gain, summing and dB conversion.
pub mod amplify;
/// Fractional sample reads for rate-converting playback.
pub mod interpolate;
/// RMS measurement.
pub mod meter;
/// Equal-power stereo panning.
pub mod pan;
