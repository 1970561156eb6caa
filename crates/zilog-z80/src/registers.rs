//! Z80 register set.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

/// Full Z80 register file, including the internal latches that leak into
/// flag results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct Registers {
    // Main registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    // Alternate registers
    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    // Index registers
    pub ix: u16,
    pub iy: u16,

    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,

    /// WZ/MEMPTR. Its high byte supplies bits 3/5 for `BIT n,(HL)`.
    pub wz: u16,
    /// Flags written by the last instruction, or 0 if it left F alone.
    pub q: u8,

    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    /// Set by EI; interrupts are not accepted until one more instruction
    /// has run.
    pub ei_delay: bool,

    pub halted: bool,
}

impl Registers {
    /// Power-on state: general registers all ones, SP at the top of memory,
    /// interrupts disabled in mode 0.
    #[must_use]
    pub const fn power_on() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0xFF,
            c: 0xFF,
            d: 0xFF,
            e: 0xFF,
            h: 0xFF,
            l: 0xFF,
            a_alt: 0xFF,
            f_alt: 0xFF,
            b_alt: 0xFF,
            c_alt: 0xFF,
            d_alt: 0xFF,
            e_alt: 0xFF,
            h_alt: 0xFF,
            l_alt: 0xFF,
            ix: 0xFFFF,
            iy: 0xFFFF,
            sp: 0xFFFF,
            pc: 0,
            i: 0,
            r: 0,
            wz: 0,
            q: 0,
            iff1: false,
            iff2: false,
            im: 0,
            ei_delay: false,
            halted: false,
        }
    }

    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    #[must_use]
    pub const fn af_alt(&self) -> u16 {
        (self.a_alt as u16) << 8 | self.f_alt as u16
    }

    #[must_use]
    pub const fn bc_alt(&self) -> u16 {
        (self.b_alt as u16) << 8 | self.c_alt as u16
    }

    #[must_use]
    pub const fn de_alt(&self) -> u16 {
        (self.d_alt as u16) << 8 | self.e_alt as u16
    }

    #[must_use]
    pub const fn hl_alt(&self) -> u16 {
        (self.h_alt as u16) << 8 | self.l_alt as u16
    }

    /// I in the high byte, R in the low byte: the address driven during
    /// refresh and internal cycles.
    #[must_use]
    pub const fn ir(&self) -> u16 {
        (self.i as u16) << 8 | self.r as u16
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8;
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    /// Bump the refresh counter. Bit 7 is left alone.
    pub fn inc_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::power_on()
    }
}
