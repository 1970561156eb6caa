//! Core traits and types for t-state accurate emulation.
//!
//! The CPU never owns memory. It borrows a [`Bus`] for the duration of one
//! instruction, and every bus access advances the bus's clock by the cost of
//! that access, including any wait states the bus chooses to insert. Timing
//! therefore lives with whoever owns the bus, not with the CPU.

mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, IoBus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
