/// Context passed to graph nodes during rendering
///
/// - sample_rate: rate the graph is running at (device or offline rate)
/// - frame: absolute frame index of the first sample in the block
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frame: u64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, frame: u64) -> Self {
        Self { sample_rate, frame }
    }
}

/// A two-channel block flowing through a track chain.
///
/// `stereo` is false while the content is still mono (both sides hold the
/// same signal). Sources set it when they write distinct channels; the pan
/// node picks its law from it and always leaves the bus stereo.
pub struct Bus<'a> {
    pub left: &'a mut [f32],
    pub right: &'a mut [f32],
    pub stereo: bool,
}

impl<'a> Bus<'a> {
    pub fn new(left: &'a mut [f32], right: &'a mut [f32]) -> Self {
        debug_assert_eq!(left.len(), right.len());
        Self {
            left,
            right,
            stereo: false,
        }
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.stereo = false;
    }
}

/// Core trait for nodes in a track's processing chain
pub trait GraphNode: Send {
    fn process(&mut self, bus: &mut Bus<'_>, ctx: &RenderCtx);
}
