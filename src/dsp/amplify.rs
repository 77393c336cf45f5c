//! Gain and summing primitives.

/*
Gain and Summing
================

A mixer does two things to samples: it scales them, and it adds them up.

Vocabulary
----------

  gain          A multiplier applied to amplitude.
                  gain > 1.0  →  louder
                  gain = 1.0  →  unity, unchanged
                  gain = 0.0  →  silence (mute)

  summing       Adding several signals sample-by-sample. Every track in a
                session is summed onto the master bus. Summing does not
                normalise, so loud tracks can push the master past full
                scale; the encoder clamps at export time.


Decibels
--------

Faders are usually labelled in dB because hearing is logarithmic:

    dB   = 20 × log₁₀(gain)
    gain = 10^(dB / 20)

    ×1.0  =   0 dB
    ×0.5  ≈  -6 dB
    ×0.0  =  -∞ dB

Track volume is stored as a linear gain (0.0 - 1.0+, default 1.0). The
conversions below are for display only.
*/

/// Multiply a signal by a constant gain factor (in-place).
#[inline]
pub fn apply_gain(signal: &mut [f32], gain: f32) {
    for sample in signal.iter_mut() {
        *sample *= gain;
    }
}

/// Add `source × gain` onto `dest` (the summing half of a mixer).
#[inline]
pub fn mix_into(dest: &mut [f32], source: &[f32], gain: f32) {
    debug_assert_eq!(dest.len(), source.len());

    for (d, &s) in dest.iter_mut().zip(source.iter()) {
        *d += s * gain;
    }
}

/// Linear gain to decibels. Silence maps to negative infinity.
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * gain.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_gain() {
        let mut signal = [1.0, 0.5, -0.5, -1.0];
        apply_gain(&mut signal, 0.5);
        assert_eq!(signal, [0.5, 0.25, -0.25, -0.5]);
    }

    #[test]
    fn test_zero_gain_silences() {
        let mut signal = [0.3, -0.7, 0.5];
        apply_gain(&mut signal, 0.0);
        assert!(signal.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_mix_into_accumulates() {
        let mut bus = [0.1, 0.1, 0.1];
        mix_into(&mut bus, &[1.0, -1.0, 0.0], 0.5);
        mix_into(&mut bus, &[0.2, 0.2, 0.2], 1.0);
        let expected = [0.8, -0.2, 0.3];
        for (got, want) in bus.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_gain_to_db() {
        assert_eq!(gain_to_db(1.0), 0.0);
        assert!((gain_to_db(0.5) + 6.0206).abs() < 1e-3);
        assert!((gain_to_db(0.1) + 20.0).abs() < 1e-4);
        assert_eq!(gain_to_db(0.0), f32::NEG_INFINITY);
    }
}
