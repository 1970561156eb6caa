//! General Instrument AY-3-8910 Programmable Sound Generator register file.
//!
//! The Spectrum 128 talks to the AY through two ports: $FFFD selects a
//! register (and reads it back), $BFFD writes the selected register. This
//! crate holds the chip's programmer-visible state; turning it into sound is
//! left to the host's mixer, which can read the decoded fields below.
//!
//! # Register map (16 registers, active 0–13)
//!
//! | Reg | Name      | Bits |
//! |-----|-----------|------|
//! | R0  | A fine    | 7-0  |
//! | R1  | A coarse  | 3-0  |
//! | R2  | B fine    | 7-0  |
//! | R3  | B coarse  | 3-0  |
//! | R4  | C fine    | 7-0  |
//! | R5  | C coarse  | 3-0  |
//! | R6  | Noise     | 4-0  |
//! | R7  | Mixer     | 7-0  |
//! | R8  | A volume  | 4-0  |
//! | R9  | B volume  | 4-0  |
//! | R10 | C volume  | 4-0  |
//! | R11 | Env fine  | 7-0  |
//! | R12 | Env coarse| 7-0  |
//! | R13 | Env shape | 3-0  |
//! | R14 | Port A    | 7-0  |
//! | R15 | Port B    | 7-0  |
//!
//! Unused bits are not stored: reading a register back returns the value
//! written with the unimplemented bits cleared.

/// Implemented bits per register.
const REGISTER_MASKS: [u8; 16] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, 0x1F, 0xFF,
    0x1F, 0x1F, 0x1F, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF,
];

/// Index of the envelope shape register.
pub const ENVELOPE_SHAPE: u8 = 13;

/// AY-3-8910 Programmable Sound Generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ay3_8910 {
    /// Raw register file (16 bytes).
    regs: [u8; 16],
    /// Currently selected register index.
    selected_reg: u8,
}

impl Ay3_8910 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Power-on state: every register zero, R0 selected.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Select a register by index (0–15).
    pub fn select_register(&mut self, reg: u8) {
        self.selected_reg = reg & 0x0F;
    }

    #[must_use]
    pub fn selected_register(&self) -> u8 {
        self.selected_reg
    }

    /// Write a value to the currently selected register.
    pub fn write_data(&mut self, value: u8) {
        let reg = self.selected_reg as usize;
        self.regs[reg] = value & REGISTER_MASKS[reg];
    }

    /// Read the currently selected register.
    #[must_use]
    pub fn read_data(&self) -> u8 {
        self.regs[self.selected_reg as usize]
    }

    /// Read any register without changing the selection.
    #[must_use]
    pub fn register(&self, index: u8) -> u8 {
        self.regs[(index & 0x0F) as usize]
    }

    #[must_use]
    pub fn registers(&self) -> &[u8; 16] {
        &self.regs
    }

    /// Restore the full register file, e.g. from a snapshot.
    pub fn load_registers(&mut self, regs: &[u8; 16], selected: u8) {
        for (i, (dst, &src)) in self.regs.iter_mut().zip(regs).enumerate() {
            *dst = src & REGISTER_MASKS[i];
        }
        self.select_register(selected);
    }

    /// 12-bit tone period for channel 0 (A), 1 (B) or 2 (C).
    #[must_use]
    pub fn tone_period(&self, channel: usize) -> u16 {
        let fine = self.regs[channel * 2];
        let coarse = self.regs[channel * 2 + 1];
        u16::from(fine) | (u16::from(coarse) << 8)
    }

    /// 5-bit noise period.
    #[must_use]
    pub fn noise_period(&self) -> u8 {
        self.regs[6]
    }

    /// Mixer control. Bits 0-2 disable tone A-C, bits 3-5 disable noise A-C.
    #[must_use]
    pub fn mixer(&self) -> u8 {
        self.regs[7]
    }

    /// Channel amplitude: bits 0-3 fixed level, bit 4 selects the envelope.
    #[must_use]
    pub fn amplitude(&self, channel: usize) -> u8 {
        self.regs[8 + channel]
    }

    /// 16-bit envelope period.
    #[must_use]
    pub fn envelope_period(&self) -> u16 {
        u16::from(self.regs[11]) | (u16::from(self.regs[12]) << 8)
    }

    #[must_use]
    pub fn envelope_shape(&self) -> u8 {
        self.regs[ENVELOPE_SHAPE as usize]
    }
}
