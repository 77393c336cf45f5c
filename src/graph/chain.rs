//! A track's fixed processing chain: tap → pan → gain.

use crate::{
    engine::track::TrackId,
    graph::{
        gain::GainNode,
        node::{Bus, GraphNode, RenderCtx},
        pan::PanNode,
        source::ClipVoice,
        tap::TapNode,
    },
    MAX_BLOCK_SIZE,
};

/// The three nodes a track owns, plus its bus scratch.
///
/// Built on the control thread, then moved into the mixer, which is the
/// only owner from then on. While disconnected the chain renders nothing
/// and its clip voices are not mixed onto the master.
pub struct TrackChain {
    id: TrackId,
    pub tap: TapNode,
    pub pan: PanNode,
    pub gain: GainNode,
    connected: bool,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl TrackChain {
    pub fn new(id: TrackId, tap: TapNode, pan: f32, gain: f32) -> Self {
        Self {
            id,
            tap,
            pan: PanNode::new(pan),
            gain: GainNode::new(gain),
            connected: false,
            left: vec![0.0; MAX_BLOCK_SIZE],
            right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Route the chain's output to the master bus.
    pub fn connect(&mut self) {
        self.connected = true;
    }

    /// Detach from the master bus. Detached chains produce silence.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Sum `voices` onto the track bus and run tap → pan → gain.
    ///
    /// Returns the processed left/right block, ready for the master bus.
    pub fn render<'v>(
        &mut self,
        voices: impl Iterator<Item = &'v mut ClipVoice>,
        frames: usize,
        ctx: &RenderCtx,
    ) -> (&[f32], &[f32]) {
        let Self {
            tap,
            pan,
            gain,
            left,
            right,
            ..
        } = self;
        let mut bus = Bus::new(&mut left[..frames], &mut right[..frames]);
        bus.clear();
        for voice in voices {
            voice.render(&mut bus, ctx);
        }
        tap.process(&mut bus, ctx);
        pan.process(&mut bus, ctx);
        gain.process(&mut bus, ctx);

        (&self.left[..frames], &self.right[..frames])
    }
}
