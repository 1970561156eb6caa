//! Z80 CPU core.
//!
//! The CPU executes whole instructions. Timing lives on the bus: every
//! fetch, read, write and internal cycle is reported to it, and the bus
//! inserts whatever wait states the machine imposes. `step()` returns the
//! difference in the bus clock across the instruction.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

mod execute;

use emu_core::{Cpu, IoBus, Observable, Ticks, Value};

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::Registers;

/// Which register an index-prefixed instruction substitutes for HL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Index {
    Hl,
    Ix,
    Iy,
}

/// Z80 CPU.
///
/// The CPU does not own the bus. It is borrowed for each `step()`, so the
/// machine can inspect and drive it between instructions.
pub struct Z80 {
    regs: Registers,
    /// Q from the previous instruction, captured before this one starts.
    prev_q: u8,
    /// Active substitution for HL in the current instruction.
    index: Index,
    /// Effective address of the current `(HL)` / `(IX+d)` operand.
    ea: u16,
    total_ticks: Ticks,
}

impl Z80 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::power_on(),
            prev_q: 0,
            index: Index::Hl,
            ea: 0,
            total_ticks: Ticks::ZERO,
        }
    }

    /// Mutable access for snapshot loading and test setup.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Replace the whole register file.
    pub fn set_registers(&mut self, regs: Registers) {
        self.regs = regs;
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.regs.pc = pc;
    }

    #[must_use]
    pub fn a(&self) -> u8 {
        self.regs.a
    }

    #[must_use]
    pub fn f(&self) -> u8 {
        self.regs.f
    }

    #[must_use]
    pub fn bc(&self) -> u16 {
        self.regs.bc()
    }

    #[must_use]
    pub fn de(&self) -> u16 {
        self.regs.de()
    }

    #[must_use]
    pub fn hl(&self) -> u16 {
        self.regs.hl()
    }

    #[must_use]
    pub fn ix(&self) -> u16 {
        self.regs.ix
    }

    #[must_use]
    pub fn iy(&self) -> u16 {
        self.regs.iy
    }

    #[must_use]
    pub fn sp(&self) -> u16 {
        self.regs.sp
    }

    /// T-states executed since construction.
    #[must_use]
    pub fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }

    /// True when a maskable interrupt would be accepted now.
    #[must_use]
    pub fn accepts_interrupt(&self) -> bool {
        self.regs.iff1 && !self.regs.ei_delay
    }

    fn push<B: IoBus>(&mut self, bus: &mut B, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, (value >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, value as u8);
    }

    fn pop<B: IoBus>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = bus.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    fn finish<B: IoBus>(&mut self, bus: &B, start: Ticks) -> u32 {
        let elapsed = bus.elapsed().since(start);
        self.total_ticks += Ticks::new(u64::from(elapsed));
        elapsed
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Z80 {
    type Registers = Registers;

    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let start = bus.elapsed();
        self.prev_q = self.regs.q;
        self.regs.q = 0;
        self.regs.ei_delay = false;

        if self.regs.halted {
            // HALT keeps issuing NOP fetches at the following address.
            bus.fetch(self.regs.pc);
            self.regs.inc_r();
        } else {
            self.execute_next(bus);
        }
        self.finish(bus, start)
    }

    fn interrupt<B: IoBus>(&mut self, bus: &mut B, data: u8) -> Option<u32> {
        if !self.accepts_interrupt() {
            return None;
        }
        let start = bus.elapsed();
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.q = 0;
        self.regs.inc_r();

        // Acknowledge cycle: M1 plus two automatic wait states.
        bus.tick(7);
        self.push(bus, self.regs.pc);

        let target = match self.regs.im {
            0 if data & 0xC7 == 0xC7 => u16::from(data & 0x38),
            0 => {
                log::warn!("IM 0 interrupt with non-RST data byte {data:#04X}, using RST 38h");
                0x0038
            }
            1 => 0x0038,
            2 => {
                let vector = (u16::from(self.regs.i) << 8) | u16::from(data);
                let lo = bus.read(vector);
                let hi = bus.read(vector.wrapping_add(1));
                u16::from_le_bytes([lo, hi])
            }
            mode => unreachable!("interrupt mode {mode} cannot be set by any instruction"),
        };
        self.regs.pc = target;
        self.regs.wz = target;
        Some(self.finish(bus, start))
    }

    fn nmi<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let start = bus.elapsed();
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.q = 0;
        self.regs.ei_delay = false;

        // The opcode fetched here is discarded.
        bus.fetch(self.regs.pc);
        self.regs.inc_r();
        bus.tick(1);
        self.push(bus, self.regs.pc);
        self.regs.pc = 0x0066;
        self.regs.wz = 0x0066;
        self.finish(bus, start)
    }

    fn reset(&mut self) {
        self.regs = Registers::power_on();
        self.prev_q = 0;
        self.index = Index::Hl;
        self.ea = 0;
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.regs.halted
    }
}

#[rustfmt::skip]
const Z80_QUERY_PATHS: &[&str] = &[
    // Main registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    // Register pairs
    "af", "bc", "de", "hl",
    // Alternate registers
    "a'", "f'", "b'", "c'", "d'", "e'", "h'", "l'",
    "af'", "bc'", "de'", "hl'",
    // Index registers
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    // Other registers
    "sp", "pc", "i", "r", "wz", "q",
    // Flags (individual)
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.p", "flags.n", "flags.c",
    // Interrupt state
    "iff1", "iff2", "im", "ei_delay",
    // CPU state
    "halted", "ticks",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        match path {
            "a" => Some(r.a.into()),
            "f" => Some(r.f.into()),
            "b" => Some(r.b.into()),
            "c" => Some(r.c.into()),
            "d" => Some(r.d.into()),
            "e" => Some(r.e.into()),
            "h" => Some(r.h.into()),
            "l" => Some(r.l.into()),

            "af" => Some(r.af().into()),
            "bc" => Some(r.bc().into()),
            "de" => Some(r.de().into()),
            "hl" => Some(r.hl().into()),

            "a'" => Some(r.a_alt.into()),
            "f'" => Some(r.f_alt.into()),
            "b'" => Some(r.b_alt.into()),
            "c'" => Some(r.c_alt.into()),
            "d'" => Some(r.d_alt.into()),
            "e'" => Some(r.e_alt.into()),
            "h'" => Some(r.h_alt.into()),
            "l'" => Some(r.l_alt.into()),
            "af'" => Some(r.af_alt().into()),
            "bc'" => Some(r.bc_alt().into()),
            "de'" => Some(r.de_alt().into()),
            "hl'" => Some(r.hl_alt().into()),

            "ix" => Some(r.ix.into()),
            "iy" => Some(r.iy.into()),
            "ixh" => Some(((r.ix >> 8) as u8).into()),
            "ixl" => Some((r.ix as u8).into()),
            "iyh" => Some(((r.iy >> 8) as u8).into()),
            "iyl" => Some((r.iy as u8).into()),

            "sp" => Some(r.sp.into()),
            "pc" => Some(r.pc.into()),
            "i" => Some(r.i.into()),
            "r" => Some(r.r.into()),
            "wz" => Some(r.wz.into()),
            "q" => Some(r.q.into()),

            "flags.s" => Some((r.f & SF != 0).into()),
            "flags.z" => Some((r.f & ZF != 0).into()),
            "flags.y" => Some((r.f & YF != 0).into()),
            "flags.h" => Some((r.f & HF != 0).into()),
            "flags.x" => Some((r.f & XF != 0).into()),
            "flags.p" => Some((r.f & PF != 0).into()),
            "flags.n" => Some((r.f & NF != 0).into()),
            "flags.c" => Some((r.f & CF != 0).into()),

            "iff1" => Some(r.iff1.into()),
            "iff2" => Some(r.iff2.into()),
            "im" => Some(r.im.into()),
            "ei_delay" => Some(r.ei_delay.into()),

            "halted" => Some(r.halted.into()),
            "ticks" => Some(self.total_ticks.get().into()),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
