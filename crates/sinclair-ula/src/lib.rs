//! Sinclair ULA (Uncommitted Logic Array) timing.
//!
//! The ULA shares the lower RAM bus with the Z80. While it fetches screen
//! bytes it holds the CPU off, asserts INT once per frame, and leaves its
//! last fetched byte on the data bus for unattached ports to pick up. This
//! crate models those three effects as pure functions of the frame t-state,
//! so the system bus can ask "what happens at t-state N" without ticking a
//! beam position.
//!
//! # Standalone IC
//!
//! This crate has no dependencies. VRAM is read through closures passed by
//! the caller, keeping it decoupled from any particular memory model.
//!
//! # Timing
//!
//! | Model | Frame  | Line | First contended | INT length |
//! |-------|--------|------|-----------------|------------|
//! | 48K   | 69,888 | 224  | 14,335          | 32         |
//! | 128K  | 70,908 | 228  | 14,361          | 36         |
//!
//! # Screen memory layout
//!
//! Bitmap at $4000-$57FF (6144 bytes), attributes at $5800-$5AFF (768 bytes).
//! Bitmap address: `010Y7 Y6Y2 Y1Y0 Y5Y4Y3 X4X3X2X1X0`
//! Attribute address: `0101 10Y7 Y6Y5 Y4Y3 X4X3X2X1X0`
//!
//! # Contention
//!
//! For the first 128 t-states of each of the 192 display lines, the ULA
//! contends memory access. The pattern repeats every 8 t-states:
//! `[6, 5, 4, 3, 2, 1, 0, 0]`, starting at the model's first contended
//! t-state.

/// Number of display lines.
pub const DISPLAY_LINES: u32 = 192;

/// T-states per line during which the ULA fetches screen data.
const CONTENTION_WIDTH: u32 = 128;

/// Contention delay pattern (repeats every 8 t-states).
const CONTENTION_PATTERN: [u8; 8] = [6, 5, 4, 3, 2, 1, 0, 0];

/// The first screen byte appears on the floating bus this many t-states
/// after the first contended t-state.
const FLOATING_BUS_LAG: u32 = 3;

/// Size of the screen region (bitmap + attributes).
pub const SCREEN_BYTES: usize = 6912;

/// Per-model frame geometry, in CPU t-states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UlaTiming {
    /// T-states per frame; the INT period.
    pub frame_t_states: u32,
    /// T-states per scanline.
    pub t_states_per_line: u32,
    /// Frame t-state of the first contended cycle (top-left of the display).
    pub contention_start: u32,
    /// How long INT stays asserted.
    pub int_length: u32,
}

impl UlaTiming {
    /// 48K PAL: 312 lines of 224 t-states.
    pub const ZX48K: Self = Self {
        frame_t_states: 69_888,
        t_states_per_line: 224,
        contention_start: 14_335,
        int_length: 32,
    };

    /// 128K PAL: 311 lines of 228 t-states.
    pub const ZX128K: Self = Self {
        frame_t_states: 70_908,
        t_states_per_line: 228,
        contention_start: 14_361,
        int_length: 36,
    };

    #[must_use]
    pub const fn lines_per_frame(&self) -> u32 {
        self.frame_t_states / self.t_states_per_line
    }
}

/// Standard Sinclair ULA.
pub struct Ula {
    timing: UlaTiming,
    /// Frame t-state at which INT is raised.
    int_offset: u32,
    /// Current border colour (0-7).
    border: u8,
}

impl Ula {
    #[must_use]
    pub fn new(timing: UlaTiming, int_offset: u32) -> Self {
        Self {
            timing,
            int_offset: int_offset % timing.frame_t_states,
            border: 7, // White border on power-up
        }
    }

    #[must_use]
    pub fn timing(&self) -> &UlaTiming {
        &self.timing
    }

    #[must_use]
    pub fn int_offset(&self) -> u32 {
        self.int_offset
    }

    /// Wait states for a contended memory access starting at frame t-state `t`.
    ///
    /// The caller decides whether the address is in contended memory; this
    /// only answers whether the ULA is fetching at that moment.
    #[must_use]
    pub fn contention(&self, t: u32) -> u32 {
        let Some((_, x)) = self.display_position(t, self.timing.contention_start) else {
            return 0;
        };
        u32::from(CONTENTION_PATTERN[(x % 8) as usize])
    }

    /// Extra t-states added to a 4 t-state I/O cycle that starts at `t`.
    ///
    /// The I/O cycle is 4 t-states. Contention depends on two factors:
    ///   1. Whether the high byte of the port address lies in contended memory
    ///   2. Whether the port is even (ULA port, bit 0 clear)
    ///
    /// | High contended? | Even (ULA)? | Pattern                        |
    /// |-----------------|-------------|--------------------------------|
    /// | No              | Yes         | N:1, C:3                       |
    /// | No              | No          | N:4 (no contention)            |
    /// | Yes             | Yes         | C:1, C:3                       |
    /// | Yes             | No          | C:1, C:1, C:1, C:1             |
    ///
    /// "N:n" means n t-states pass without contention.
    /// "C:n" means apply contention at the current t-state, then advance n.
    #[must_use]
    pub fn io_contention(&self, t: u32, high_contended: bool, ula_port: bool) -> u32 {
        match (high_contended, ula_port) {
            (false, false) => 0,
            (false, true) => self.contention(t + 1),
            (true, true) => {
                let d0 = self.contention(t);
                d0 + self.contention(t + d0 + 1)
            }
            (true, false) => {
                let mut at = t;
                let mut total = 0;
                for _ in 0..4 {
                    let delay = self.contention(at);
                    total += delay;
                    at += delay + 1;
                }
                total
            }
        }
    }

    /// The byte an unattached port reads at frame t-state `t`.
    ///
    /// Within each 8 t-state fetch group the ULA reads bitmap, attribute,
    /// bitmap+1, attribute+1, then leaves the bus idle ($FF) for 4 t-states.
    /// Outside the display fetch window the bus is always idle.
    #[must_use]
    pub fn floating_bus(&self, t: u32, read_vram: impl Fn(u16) -> u8) -> u8 {
        let origin = self.timing.contention_start + FLOATING_BUS_LAG;
        let Some((line, x)) = self.display_position(t, origin) else {
            return 0xFF;
        };

        let column = (x / 8) * 2;
        let screen_y = line as u8;
        let addr = match x % 8 {
            0 => bitmap_addr(screen_y, column as u8),
            1 => attr_addr(screen_y, column as u8),
            2 => bitmap_addr(screen_y, column as u8 + 1),
            3 => attr_addr(screen_y, column as u8 + 1),
            _ => return 0xFF,
        };
        read_vram(addr)
    }

    /// True while INT is asserted at frame t-state `t`.
    #[must_use]
    pub fn int_active(&self, t: u32) -> bool {
        let frame = self.timing.frame_t_states;
        let since = (t % frame + frame - self.int_offset) % frame;
        since < self.timing.int_length
    }

    /// First t-state after the INT window closes.
    #[must_use]
    pub fn int_end(&self) -> u32 {
        self.int_offset + self.timing.int_length
    }

    #[must_use]
    pub fn border_colour(&self) -> u8 {
        self.border
    }

    pub fn set_border_colour(&mut self, colour: u8) {
        self.border = colour & 0x07;
    }

    /// Display line and t-state within the fetch window, if `t` falls inside it.
    fn display_position(&self, t: u32, origin: u32) -> Option<(u32, u32)> {
        let t = t % self.timing.frame_t_states;
        let offset = t.checked_sub(origin)?;
        let line = offset / self.timing.t_states_per_line;
        let x = offset % self.timing.t_states_per_line;
        (line < DISPLAY_LINES && x < CONTENTION_WIDTH).then_some((line, x))
    }
}

/// Bitmap address for a given screen Y and character column.
#[must_use]
pub const fn bitmap_addr(screen_y: u8, char_col: u8) -> u16 {
    let y7y6 = (screen_y >> 6) & 0x03;
    let y5y4y3 = (screen_y >> 3) & 0x07;
    let y2y1y0 = screen_y & 0x07;
    0x4000
        | ((y7y6 as u16) << 11)
        | ((y2y1y0 as u16) << 8)
        | ((y5y4y3 as u16) << 5)
        | (char_col & 0x1F) as u16
}

/// Attribute address for a given screen Y and character column.
#[must_use]
pub const fn attr_addr(screen_y: u8, char_col: u8) -> u16 {
    0x5800 | (((screen_y / 8) as u16) << 5) | (char_col & 0x1F) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestMemory {
        data: Vec<u8>,
    }

    impl TestMemory {
        fn new() -> Self {
            Self {
                data: vec![0; 0x10000],
            }
        }

        fn peek(&self, addr: u16) -> u8 {
            self.data[addr as usize]
        }

        fn write(&mut self, addr: u16, val: u8) {
            self.data[addr as usize] = val;
        }
    }

    fn ula48() -> Ula {
        Ula::new(UlaTiming::ZX48K, 0)
    }

    #[test]
    fn frame_geometry() {
        assert_eq!(UlaTiming::ZX48K.lines_per_frame(), 312);
        assert_eq!(UlaTiming::ZX128K.lines_per_frame(), 311);
        assert_eq!(224 * 312, UlaTiming::ZX48K.frame_t_states);
        assert_eq!(228 * 311, UlaTiming::ZX128K.frame_t_states);
    }

    #[test]
    fn int_timing() {
        let ula = ula48();
        assert!(ula.int_active(0));
        assert!(ula.int_active(31));
        assert!(!ula.int_active(32));
        assert!(!ula.int_active(69_887));
        // Next frame's t-state 0
        assert!(ula.int_active(69_888));
    }

    #[test]
    fn int_window_follows_offset() {
        let ula = Ula::new(UlaTiming::ZX128K, 100);
        assert!(!ula.int_active(99));
        assert!(ula.int_active(100));
        assert!(ula.int_active(135));
        assert!(!ula.int_active(136));
        assert_eq!(ula.int_end(), 136);
    }

    #[test]
    fn border_colour() {
        let mut ula = ula48();
        assert_eq!(ula.border_colour(), 7);

        ula.set_border_colour(2);
        assert_eq!(ula.border_colour(), 2);

        ula.set_border_colour(0xFF);
        assert_eq!(ula.border_colour(), 7);
    }

    // === Contention tests ===

    #[test]
    fn contention_in_screen_area() {
        let ula = ula48();
        assert_eq!(ula.contention(14_335), 6);
        assert_eq!(ula.contention(14_336), 5);
        assert_eq!(ula.contention(14_340), 1);
        assert_eq!(ula.contention(14_341), 0);
        assert_eq!(ula.contention(14_342), 0);
        assert_eq!(ula.contention(14_343), 6);

        // Second line starts one line length later
        assert_eq!(ula.contention(14_335 + 224), 6);
    }

    #[test]
    fn contention_outside_screen_area() {
        let ula = ula48();
        assert_eq!(ula.contention(0), 0);
        assert_eq!(ula.contention(14_334), 0);

        // Right border of the first display line
        assert_eq!(ula.contention(14_335 + 128), 0);
        assert_eq!(ula.contention(14_335 + 223), 0);

        // Below the last display line
        assert_eq!(ula.contention(14_335 + 192 * 224), 0);
    }

    #[test]
    fn contention_last_display_line() {
        let ula = ula48();
        let line_191 = 14_335 + 191 * 224;
        assert_eq!(ula.contention(line_191), 6);
        assert_eq!(ula.contention(line_191 + 121), 5);
    }

    #[test]
    fn contention_128k_uses_its_own_geometry() {
        let ula = Ula::new(UlaTiming::ZX128K, 0);
        assert_eq!(ula.contention(14_360), 0);
        assert_eq!(ula.contention(14_361), 6);
        assert_eq!(ula.contention(14_361 + 228), 6);
        assert_eq!(ula.contention(14_361 + 224), 0);
    }

    #[test]
    fn io_contention_no_contended_no_ula() {
        let ula = ula48();
        assert_eq!(ula.io_contention(14_335, false, false), 0);
    }

    #[test]
    fn io_contention_no_contended_ula() {
        let ula = ula48();
        // N:1 then C:3 at 14336 -> 5
        assert_eq!(ula.io_contention(14_335, false, true), 5);
    }

    #[test]
    fn io_contention_contended_ula() {
        let ula = ula48();
        // C:1 at 14335 -> 6, then C:3 at 14342 -> 0
        assert_eq!(ula.io_contention(14_335, true, true), 6);
    }

    #[test]
    fn io_contention_contended_not_ula() {
        let ula = ula48();
        // 14335 -> 6, 14342 -> 0, 14343 -> 6, 14350 -> 0
        assert_eq!(ula.io_contention(14_335, true, false), 12);
    }

    #[test]
    fn io_contention_outside_screen() {
        let ula = ula48();
        for (high, ula_port) in [(false, false), (false, true), (true, true), (true, false)] {
            assert_eq!(ula.io_contention(100, high, ula_port), 0);
        }
    }

    // === Floating bus tests ===

    #[test]
    fn floating_bus_during_border() {
        let ula = ula48();
        let mem = TestMemory::new();
        assert_eq!(ula.floating_bus(0, |addr| mem.peek(addr)), 0xFF);
        assert_eq!(ula.floating_bus(14_337, |addr| mem.peek(addr)), 0xFF);
    }

    #[test]
    fn floating_bus_fetch_sequence() {
        let ula = ula48();
        let mut mem = TestMemory::new();
        mem.write(0x4000, 0xAA);
        mem.write(0x5800, 0x38);
        mem.write(0x4001, 0x55);
        mem.write(0x5801, 0x47);

        let read = |t| ula.floating_bus(t, |addr| mem.peek(addr));
        assert_eq!(read(14_338), 0xAA);
        assert_eq!(read(14_339), 0x38);
        assert_eq!(read(14_340), 0x55);
        assert_eq!(read(14_341), 0x47);
    }

    #[test]
    fn floating_bus_idle_phase() {
        let ula = ula48();
        let mut mem = TestMemory::new();
        mem.write(0x4000, 0xAA);

        for t in 14_342..14_346 {
            assert_eq!(ula.floating_bus(t, |addr| mem.peek(addr)), 0xFF);
        }
    }

    #[test]
    fn floating_bus_next_group_and_line() {
        let ula = ula48();
        let mut mem = TestMemory::new();
        mem.write(0x4002, 0x12);
        mem.write(0x4100, 0x34);

        assert_eq!(ula.floating_bus(14_346, |addr| mem.peek(addr)), 0x12);
        // Screen line 1: pixel row 1 of character row 0
        assert_eq!(ula.floating_bus(14_338 + 224, |addr| mem.peek(addr)), 0x34);
    }

    #[test]
    fn screen_addresses() {
        assert_eq!(bitmap_addr(0, 0), 0x4000);
        assert_eq!(bitmap_addr(1, 0), 0x4100);
        assert_eq!(bitmap_addr(8, 0), 0x4020);
        assert_eq!(bitmap_addr(64, 31), 0x481F);
        assert_eq!(bitmap_addr(191, 31), 0x57FF);
        assert_eq!(attr_addr(0, 0), 0x5800);
        assert_eq!(attr_addr(191, 31), 0x5AFF);
    }
}
