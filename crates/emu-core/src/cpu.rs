//! CPU core trait.

use crate::IoBus;

/// An instruction-stepped CPU.
///
/// The bus is borrowed for each call, never owned, so the machine that owns
/// the bus can inspect and mutate it between instructions (interrupt lines,
/// input state, frame boundaries).
pub trait Cpu {
    /// The type used for register inspection and snapshots.
    type Registers;

    /// Execute one instruction and return the t-states it took.
    ///
    /// The count includes every wait state the bus inserted.
    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Offer a maskable interrupt with `data` on the data bus.
    ///
    /// Returns the t-states spent on the response, or `None` when the CPU
    /// is not currently accepting interrupts.
    fn interrupt<B: IoBus>(&mut self, bus: &mut B, data: u8) -> Option<u32>;

    /// Service a non-maskable interrupt. Returns the t-states spent.
    fn nmi<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Reset to the power-on state.
    fn reset(&mut self);

    /// Current program counter.
    fn pc(&self) -> u16;

    /// Copy of the full register file.
    fn registers(&self) -> Self::Registers;

    /// True while executing HALT.
    fn is_halted(&self) -> bool;
}
