//! Equal-power stereo panning.

/*
Stereo Panning
==============

Panning places a signal between the left and right speakers. `pan` runs from
-1.0 (hard left) through 0.0 (centre) to +1.0 (hard right).

Why not linear?
---------------

A linear pan (L = 1 - x, R = x) puts both sides at 0.5 in the centre. Two
speakers at half amplitude sound quieter than one at full amplitude, so a
sound swept across the field dips in loudness in the middle.

Equal-power law
---------------

Use a quarter sine/cosine instead. With x = (pan + 1) / 2:

    L = cos(x × π/2)
    R = sin(x × π/2)

Because cos² + sin² = 1, total power stays constant everywhere. In the
centre both gains are cos(π/4) ≈ 0.7071 (-3 dB).

    pan = -1.0  →  L = 1.000  R = 0.000
    pan =  0.0  →  L = 0.707  R = 0.707
    pan = +1.0  →  L = 0.000  R = 1.000

Stereo input
------------

A stereo source is already spread, so panning it is a *balance* control: the
side we pan away from is attenuated and folded into the other side instead of
being lost.

    pan ≤ 0:  x = pan + 1
              L = inL + inR × cos(x × π/2)
              R =       inR × sin(x × π/2)

    pan > 0:  x = pan
              L =       inL × cos(x × π/2)
              R = inR + inL × sin(x × π/2)

At pan = 0 a stereo source passes through unchanged; a mono source is
centred at -3 dB on each side. This matches the panner every browser uses,
so a mix sounds the same here as in a web front end.
*/

use std::f32::consts::FRAC_PI_2;

/// Left/right gains for a mono source at `pan`.
#[inline]
pub fn mono_gains(pan: f32) -> (f32, f32) {
    let x = (pan.clamp(-1.0, 1.0) + 1.0) * 0.5;
    ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin())
}

/// Pan a mono signal held in `left` into `left`/`right` (in-place).
///
/// `right`'s previous contents are overwritten.
#[inline]
pub fn pan_mono(left: &mut [f32], right: &mut [f32], pan: f32) {
    debug_assert_eq!(left.len(), right.len());

    let (gain_l, gain_r) = mono_gains(pan);
    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let s = *l;
        *l = s * gain_l;
        *r = s * gain_r;
    }
}

/// Balance a stereo signal (in-place).
#[inline]
pub fn pan_stereo(left: &mut [f32], right: &mut [f32], pan: f32) {
    debug_assert_eq!(left.len(), right.len());

    let pan = pan.clamp(-1.0, 1.0);
    if pan <= 0.0 {
        let x = (pan + 1.0) * FRAC_PI_2;
        let (keep, fold) = (x.sin(), x.cos());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (in_l, in_r) = (*l, *r);
            *l = in_l + in_r * fold;
            *r = in_r * keep;
        }
    } else {
        let x = pan * FRAC_PI_2;
        let (keep, fold) = (x.cos(), x.sin());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (in_l, in_r) = (*l, *r);
            *l = in_l * keep;
            *r = in_r + in_l * fold;
        }
    }
}
