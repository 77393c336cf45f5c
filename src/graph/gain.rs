use crate::{
    dsp::amplify::apply_gain,
    graph::node::{Bus, GraphNode, RenderCtx},
};

/// Fader stage of a track chain.
///
/// Holds the *effective* gain: the track volume after the solo/mute policy
/// has been applied on the control thread.
pub struct GainNode {
    gain: f32,
}

impl GainNode {
    pub fn new(gain: f32) -> Self {
        Self {
            gain: gain.max(0.0),
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }
}

impl GraphNode for GainNode {
    fn process(&mut self, bus: &mut Bus<'_>, _ctx: &RenderCtx) {
        apply_gain(bus.left, self.gain);
        apply_gain(bus.right, self.gain);
    }
}
