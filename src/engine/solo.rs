//! The solo/mute policy.
//!
//! With any track soloed, only soloed tracks that are not muted are heard.
//! With none soloed, each track is heard unless muted. The policy is global:
//! one track's solo can silence every other track, so callers re-evaluate
//! it for all tracks after any change.

use crate::engine::track::Track;

pub fn has_solo(tracks: &[Track]) -> bool {
    tracks.iter().any(Track::is_soloed)
}

pub fn is_silenced(mute: bool, solo: bool, has_solo: bool) -> bool {
    if has_solo {
        !solo || mute
    } else {
        mute
    }
}

/// The gain a track actually plays at.
pub fn effective_gain(track: &Track, has_solo: bool) -> f32 {
    if is_silenced(track.is_muted(), track.is_soloed(), has_solo) {
        0.0
    } else {
        track.volume()
    }
}
