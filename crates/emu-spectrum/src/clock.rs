//! Frame clock.
//!
//! Counts t-states since power-on and since the start of the current frame.
//! A frame ends on the first instruction boundary at or past the budget; the
//! overshoot becomes the next frame's starting t-state.

use emu_core::Ticks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    /// T-states since power-on.
    total: Ticks,
    /// `total` at the start of the current frame.
    frame_start: Ticks,
    /// Frame budget in t-states.
    frame_length: u32,
}

impl FrameClock {
    #[must_use]
    pub fn new(frame_length: u32) -> Self {
        Self {
            total: Ticks::ZERO,
            frame_start: Ticks::ZERO,
            frame_length,
        }
    }

    pub fn advance(&mut self, t_states: u32) {
        self.total += Ticks::new(u64::from(t_states));
    }

    /// T-states since the start of the current frame.
    #[must_use]
    pub fn t_state(&self) -> u32 {
        self.total.since(self.frame_start)
    }

    #[must_use]
    pub fn total(&self) -> Ticks {
        self.total
    }

    #[must_use]
    pub fn frame_length(&self) -> u32 {
        self.frame_length
    }

    /// True once the frame budget has been met or exceeded.
    #[must_use]
    pub fn frame_complete(&self) -> bool {
        self.t_state() >= self.frame_length
    }

    /// Close the current frame. Returns the overshoot, which is also the
    /// t-state the new frame starts at.
    pub fn next_frame(&mut self) -> u32 {
        let overshoot = self.t_state().saturating_sub(self.frame_length);
        self.frame_start = self.total - Ticks::new(u64::from(overshoot));
        overshoot
    }

    /// Start a fresh frame at t-state 0 without touching the total.
    pub fn restart(&mut self) {
        self.frame_start = self.total;
    }
}
