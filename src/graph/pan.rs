use crate::{
    dsp::pan::{pan_mono, pan_stereo},
    graph::node::{Bus, GraphNode, RenderCtx},
};

/// Stereo panner stage of a track chain.
pub struct PanNode {
    pan: f32,
}

impl PanNode {
    pub fn new(pan: f32) -> Self {
        Self {
            pan: pan.clamp(-1.0, 1.0),
        }
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }
}

impl GraphNode for PanNode {
    fn process(&mut self, bus: &mut Bus<'_>, _ctx: &RenderCtx) {
        if bus.stereo {
            pan_stereo(bus.left, bus.right, self.pan);
        } else {
            pan_mono(bus.left, bus.right, self.pan);
        }
        bus.stereo = true;
    }
}
