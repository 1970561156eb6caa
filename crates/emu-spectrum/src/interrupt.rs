//! Per-frame maskable interrupt bookkeeping.
//!
//! The ULA raises INT once per frame and holds it for a fixed number of
//! t-states. The CPU only samples it at instruction boundaries, so an
//! interrupt can be serviced late within the window or missed entirely
//! (DI, or a long instruction straddling the window). Missed interrupts are
//! never queued.

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterruptState {
    /// No interrupt outstanding.
    #[default]
    Idle,
    /// INT asserted, waiting for the CPU to accept it.
    Pending,
    /// Accepted by the CPU this frame.
    Serviced,
}

impl InterruptState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Serviced => "serviced",
        }
    }
}

impl fmt::Display for InterruptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the frame's interrupt, by frame t-state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterruptSummary {
    pub raised_at: Option<u32>,
    pub serviced_at: Option<u32>,
    pub missed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InterruptController {
    state: InterruptState,
    summary: InterruptSummary,
}

impl InterruptController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to Idle for a new frame, whatever happened in the last one.
    pub fn start_frame(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn state(&self) -> InterruptState {
        self.state
    }

    /// Whether INT has already been raised this frame.
    #[must_use]
    pub fn raised(&self) -> bool {
        self.summary.raised_at.is_some()
    }

    /// Assert INT at frame t-state `t`. Only the first call per frame counts.
    pub fn raise(&mut self, t: u32) {
        if self.state == InterruptState::Idle && !self.raised() {
            self.state = InterruptState::Pending;
            self.summary.raised_at = Some(t);
        }
    }

    /// The CPU accepted the pending interrupt at `t`.
    pub fn service(&mut self, t: u32) {
        debug_assert_eq!(self.state, InterruptState::Pending);
        self.state = InterruptState::Serviced;
        self.summary.serviced_at = Some(t);
    }

    /// The INT window closed at `t` with the interrupt still pending.
    pub fn expire(&mut self, t: u32) {
        if self.state == InterruptState::Pending {
            log::trace!(
                "interrupt raised at t-state {} missed (window closed at {t})",
                self.summary.raised_at.unwrap_or_default()
            );
            self.state = InterruptState::Idle;
            self.summary.missed = true;
        }
    }

    #[must_use]
    pub fn missed(&self) -> bool {
        self.summary.missed
    }

    #[must_use]
    pub fn summary(&self) -> InterruptSummary {
        self.summary
    }
}
