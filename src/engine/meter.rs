//! Level metering shared by playback and recording.

use crate::{dsp::meter, graph::tap::MeterTap};

/// RMS of the tap's full analysis window, in `[0, 1]`.
///
/// Drains whatever the audio thread pushed since the last call first, so
/// the result tracks the most recent window. Playback and live input feed
/// the same window, which keeps both readings in the same units.
pub fn sample_rms(tap: &mut MeterTap) -> f32 {
    tap.drain();
    meter::rms(tap.window())
}
