//! Zilog Z80 CPU core.
//!
//! Instructions are decoded through flat opcode tables (see [`decode`]) and
//! executed as a sequence of bus accesses. The bus owns the clock: the core
//! reports each fetch, read, write and internal cycle, and the bus adds any
//! wait states. This keeps the core machine-agnostic while still giving
//! exact per-cycle contention on the Spectrum.
//!
//! Undocumented behaviour is modelled: IXH/IXL/IYH/IYL, SLL, the DDCB
//! register copies, flag bits 3 and 5 (including the WZ and Q sources),
//! and the repeat-cycle flag adjustments of the block instructions.

pub mod alu;
mod cpu;
pub mod decode;
mod flags;
mod registers;

pub use cpu::Z80;
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF, parity, sz53, sz53p};
pub use registers::Registers;
