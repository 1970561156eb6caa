//! ZX Spectrum keyboard.
//!
//! The Spectrum keyboard is an 8×5 matrix of half-rows, read via port $FE.
//! The high byte of the port address selects which half-rows to scan: each
//! cleared bit (A8-A15) enables one half-row. Scanning several rows at once
//! ANDs them together.
//!
//! # Half-row layout
//!
//! | Addr bit | Row | Keys (bit 0-4)                |
//! |----------|-----|-------------------------------|
//! | A8       | 0   | Shift, Z, X, C, V            |
//! | A9       | 1   | A, S, D, F, G                |
//! | A10      | 2   | Q, W, E, R, T                |
//! | A11      | 3   | 1, 2, 3, 4, 5                |
//! | A12      | 4   | 0, 9, 8, 7, 6                |
//! | A13      | 5   | P, O, I, U, Y                |
//! | A14      | 6   | Enter, L, K, J, H            |
//! | A15      | 7   | Space, Sym, M, N, B          |
//!
//! A pressed key reads as 0 (active low).

/// Logical key on the Spectrum keyboard.
///
/// Declared in matrix order, five keys per half-row, so the discriminant
/// encodes the (row, bit) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[rustfmt::skip]
pub enum SpectrumKey {
    CapsShift, Z, X, C, V,
    A, S, D, F, G,
    Q, W, E, R, T,
    N1, N2, N3, N4, N5,
    N0, N9, N8, N7, N6,
    P, O, I, U, Y,
    Enter, L, K, J, H,
    Space, SymShift, M, N, B,
}

impl SpectrumKey {
    /// The (row, bit) pair for this key in the keyboard matrix.
    #[must_use]
    pub const fn matrix(self) -> (usize, u8) {
        let index = self as u8;
        ((index / 5) as usize, index % 5)
    }
}

/// Keyboard matrix: 8 half-rows, bits 0-4 active low.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardState {
    rows: [u8; 8],
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: [0x1F; 8] }
    }

    /// Replace a whole half-row. `bits` is active low; only bits 0-4 are kept.
    /// Rows outside 0-7 are ignored.
    pub fn set_row(&mut self, row: usize, bits: u8) {
        if let Some(r) = self.rows.get_mut(row) {
            *r = bits & 0x1F;
        }
    }

    #[must_use]
    pub fn row(&self, row: usize) -> u8 {
        self.rows.get(row).copied().unwrap_or(0x1F)
    }

    /// Set or clear a key. `row` is 0-7, `bit` is 0-4.
    pub fn set_key(&mut self, row: usize, bit: u8, pressed: bool) {
        if row < 8 && bit < 5 {
            if pressed {
                self.rows[row] &= !(1 << bit);
            } else {
                self.rows[row] |= 1 << bit;
            }
        }
    }

    /// Bits 0-4 of a port $FE read.
    ///
    /// `addr_high` is the high byte of the port address. Every half-row
    /// whose address bit is 0 is ANDed into the result.
    #[must_use]
    pub fn read(&self, addr_high: u8) -> u8 {
        self.rows
            .iter()
            .enumerate()
            .filter(|&(i, _)| addr_high & (1 << i) == 0)
            .fold(0x1F, |acc, (_, &row)| acc & row)
    }

    pub fn release_all(&mut self) {
        self.rows = [0x1F; 8];
    }
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new()
    }
}
