//! Spectrum bus: memory and I/O routing.
//!
//! The bus connects the Z80 CPU to memory, the ULA, the keyboard and (on
//! 128K) the paging latch and AY chip. It also owns the frame clock: every
//! access advances it by its base cost plus whatever contention the ULA
//! imposes at the t-state the access starts.
//!
//! # Contention
//!
//! Memory contention is delegated to the ULA via `ula.contention()`, and only
//! applies when the memory reports the address as contended. I/O contention
//! is similarly delegated via `ula.io_contention()`, using the high byte of
//! the port as an address.
//!
//! # Port decoding
//!
//! | Port mask          | Read              | Write                |
//! |--------------------|-------------------|----------------------|
//! | A0 = 0             | keyboard + EAR    | border, MIC, beeper  |
//! | `& 0x8002 == 0`    | -                 | paging latch (128K)  |
//! | `& 0xC002 == 0xC000` | AY data (128K)  | AY select (128K)     |
//! | `& 0xC002 == 0x8000` | -               | AY data (128K)       |
//!
//! Reads nothing answers return the floating bus.

use emu_core::{Bus, IoBus, Ticks};
use gi_ay_3_8910::Ay3_8910;
use sinclair_ula::Ula;

use crate::clock::FrameClock;
use crate::keyboard::KeyboardState;
use crate::memory::SpectrumMemory;

/// One port write, stamped with the frame t-state its I/O cycle began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortWrite {
    pub t_state: u32,
    pub port: u16,
    pub value: u8,
}

/// The Spectrum bus, implementing `emu_core::Bus` and `emu_core::IoBus`.
///
/// Owns the memory, ULA, keyboard and frame clock. The CPU accesses all of
/// these through the bus traits.
pub struct SpectrumBus {
    pub memory: Box<dyn SpectrumMemory>,
    pub ula: Ula,
    pub keyboard: KeyboardState,
    /// AY-3-8910 sound chip (present on 128K).
    pub ay: Option<Ay3_8910>,
    pub clock: FrameClock,
    /// Level on the EAR input (bit 6 of port $FE reads).
    pub tape_input: bool,
    /// Last value written to port $FE.
    pub last_fe_write: u8,
    /// Port writes since the frame started.
    port_writes: Vec<PortWrite>,
}

impl SpectrumBus {
    #[must_use]
    pub fn new(memory: Box<dyn SpectrumMemory>, ula: Ula) -> Self {
        let clock = FrameClock::new(ula.timing().frame_t_states);
        Self {
            memory,
            ula,
            keyboard: KeyboardState::new(),
            ay: None,
            clock,
            tape_input: false,
            last_fe_write: 0,
            port_writes: Vec::new(),
        }
    }

    /// Enable the AY sound chip (for 128K models).
    pub fn enable_ay(&mut self) {
        self.ay = Some(Ay3_8910::new());
    }

    /// Current frame t-state.
    #[must_use]
    pub fn t_state(&self) -> u32 {
        self.clock.t_state()
    }

    /// MIC output (bit 3 of the last $FE write).
    #[must_use]
    pub fn mic(&self) -> bool {
        self.last_fe_write & 0x08 != 0
    }

    /// Beeper level (bit 4 of the last $FE write).
    #[must_use]
    pub fn beeper(&self) -> bool {
        self.last_fe_write & 0x10 != 0
    }

    #[must_use]
    pub fn port_writes(&self) -> &[PortWrite] {
        &self.port_writes
    }

    /// Drain the port write log.
    pub fn take_port_writes(&mut self) -> Vec<PortWrite> {
        std::mem::take(&mut self.port_writes)
    }

    /// Memory wait states for an access to `addr` starting now.
    fn memory_contention(&self, addr: u16) -> u32 {
        if self.memory.is_contended(addr) {
            self.ula.contention(self.clock.t_state())
        } else {
            0
        }
    }

    /// Advance the clock over one I/O cycle. Returns the frame t-state at
    /// which the data bus is sampled.
    fn io_cycle(&mut self, port: u16) -> u32 {
        let t = self.clock.t_state();
        let high_contended = self.memory.is_contended(port);
        let ula_port = port & 0x01 == 0;
        let early = if high_contended { self.ula.contention(t) } else { 0 };
        let wait = self.ula.io_contention(t, high_contended, ula_port);
        self.clock.advance(4 + wait);
        t + early + 1
    }

    fn read_port(&self, port: u16, sample_at: u32) -> u8 {
        if port & 0x01 == 0 {
            // Bits 0-4: keyboard, bits 5 and 7: always 1, bit 6: EAR input
            let keyboard = self.keyboard.read((port >> 8) as u8);
            let ear = if self.tape_input { 0x40 } else { 0x00 };
            return keyboard | 0xA0 | ear;
        }

        // Port $FFFD: AY register read
        if port & 0xC002 == 0xC000
            && let Some(ay) = &self.ay
        {
            return ay.read_data();
        }

        // Nothing drives the bus: the ULA's current fetch leaks through
        let screen = self.memory.screen();
        self.ula.floating_bus(sample_at, |addr| {
            screen
                .get(usize::from(addr.wrapping_sub(0x4000)))
                .copied()
                .unwrap_or(0xFF)
        })
    }

    fn write_port(&mut self, port: u16, value: u8) {
        if port & 0x01 == 0 {
            self.last_fe_write = value;
            // Bits 0-2: border, bit 3: MIC, bit 4: beeper
            self.ula.set_border_colour(value & 0x07);
        }

        // Port $7FFD; 48K memory has no latch and ignores it
        if port & 0x8002 == 0x0000 {
            self.memory.write_paging_register(value);
        }

        if let Some(ay) = &mut self.ay {
            match port & 0xC002 {
                0xC000 => ay.select_register(value),
                0x8000 => ay.write_data(value),
                _ => {}
            }
        }
    }
}

impl Bus for SpectrumBus {
    fn fetch(&mut self, address: u16) -> u8 {
        let wait = self.memory_contention(address);
        self.clock.advance(wait + 4);
        self.memory.read(address)
    }

    fn read(&mut self, address: u16) -> u8 {
        let wait = self.memory_contention(address);
        self.clock.advance(wait + 3);
        self.memory.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        let wait = self.memory_contention(address);
        self.clock.advance(wait + 3);
        self.memory.write(address, value);
    }

    fn contend(&mut self, address: u16, cycles: u32) {
        for _ in 0..cycles {
            let wait = self.memory_contention(address);
            self.clock.advance(wait + 1);
        }
    }

    fn tick(&mut self, cycles: u32) {
        self.clock.advance(cycles);
    }

    fn peek(&self, address: u16) -> u8 {
        self.memory.peek(address)
    }

    fn elapsed(&self) -> Ticks {
        self.clock.total()
    }
}

impl IoBus for SpectrumBus {
    fn read_io(&mut self, port: u16) -> u8 {
        let sample_at = self.io_cycle(port);
        self.read_port(port, sample_at)
    }

    fn write_io(&mut self, port: u16, value: u8) {
        let t_state = self.clock.t_state();
        self.io_cycle(port);
        self.port_writes.push(PortWrite {
            t_state,
            port,
            value,
        });
        self.write_port(port, value);
    }
}
