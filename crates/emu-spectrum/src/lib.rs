//! Cycle-accurate ZX Spectrum emulator core.
//!
//! Covers the 48K and 128K models. The CPU drives a bus that owns the
//! frame clock, so every memory and I/O cycle lands at an exact frame
//! t-state and picks up ULA contention there. The host feeds input
//! (keyboard rows, EAR level) and pulls output (screen memory, border,
//! port writes) between frames.

mod bus;
mod clock;
mod config;
mod error;
mod interrupt;
mod keyboard;
mod memory;
mod snapshot;
mod spectrum;

pub use bus::{PortWrite, SpectrumBus};
pub use clock::FrameClock;
pub use config::{PAGE_SIZE, SpectrumConfig, SpectrumModel};
pub use error::SpectrumError;
pub use interrupt::{InterruptController, InterruptState, InterruptSummary};
pub use keyboard::{KeyboardState, SpectrumKey};
pub use memory::{Memory48K, Memory128K, Page, SpectrumMemory, for_model};
pub use snapshot::{AySnapshot, Snapshot};
pub use spectrum::{FrameResult, Spectrum};
