//! Float ↔ 16-bit PCM sample conversion.
//!
//! The scale is asymmetric: negative values map onto 32768 steps and
//! positive values onto 32767, so both -1.0 and 1.0 land exactly on the
//! i16 limits without overflow.

pub fn f32_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32_768.0) as i16
    } else {
        (s * 32_767.0) as i16
    }
}

pub fn i16_to_f32(sample: i16) -> f32 {
    if sample < 0 {
        sample as f32 / 32_768.0
    } else {
        sample as f32 / 32_767.0
    }
}
