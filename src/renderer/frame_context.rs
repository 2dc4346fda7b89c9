/// Everything a tick is allowed to depend on, passed explicitly to every
/// per-tick call instead of being read from global frame state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameContext {
    /// Starts at 0 and grows by exactly 1 per simulated frame.
    pub tick: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl FrameContext {
    pub fn new(tick: u64, viewport_width: u32, viewport_height: u32) -> Self {
        Self { tick, viewport_width, viewport_height }
    }

    pub fn next(&self) -> Self {
        Self { tick: self.tick + 1, ..*self }
    }
}
