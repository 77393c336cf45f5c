//! Fractional-position sample reads.

/// Read `samples` at a fractional index using linear interpolation.
///
/// Positions past the last sample interpolate towards silence; negative or
/// out-of-range positions read as 0.0. Integer positions return the stored
/// sample exactly, so playback at the buffer's own rate is bit-identical.
#[inline]
pub fn read_linear(samples: &[f32], pos: f64) -> f32 {
    if pos < 0.0 {
        return 0.0;
    }
    let index = pos as usize;
    let Some(&s0) = samples.get(index) else {
        return 0.0;
    };
    let frac = (pos - index as f64) as f32;
    if frac == 0.0 {
        return s0;
    }
    let s1 = samples.get(index + 1).copied().unwrap_or(0.0);
    s0 + (s1 - s0) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_positions_are_exact() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(read_linear(&samples, 0.0), 0.1);
        assert_eq!(read_linear(&samples, 2.0), 0.3);
    }

    #[test]
    fn halfway_is_the_average() {
        let samples = [0.0, 1.0];
        assert!((read_linear(&samples, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_is_silent() {
        let samples = [0.5, 0.5];
        assert_eq!(read_linear(&samples, 2.0), 0.0);
        assert_eq!(read_linear(&samples, -1.0), 0.0);
        assert!((read_linear(&samples, 1.5) - 0.25).abs() < 1e-6);
    }
}
