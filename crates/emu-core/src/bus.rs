//! Memory and I/O bus interfaces.

use crate::Ticks;

/// A memory bus with its own t-state clock.
///
/// Every access advances the clock by the base cost of the machine cycle plus
/// whatever wait states the bus inserts (memory contention on the Spectrum).
/// A CPU measures how long an instruction took by comparing [`Bus::elapsed`]
/// before and after it.
pub trait Bus {
    /// Opcode fetch (M1 cycle): 4 t-states plus any wait states.
    fn fetch(&mut self, address: u16) -> u8;

    /// Memory read: 3 t-states plus any wait states.
    fn read(&mut self, address: u16) -> u8;

    /// Memory write: 3 t-states plus any wait states.
    fn write(&mut self, address: u16, value: u8);

    /// Internal cycles during which `address` is still driven on the bus.
    ///
    /// Each of the `cycles` t-states is subject to contention individually,
    /// which is why this is not the same as `tick(cycles)`.
    fn contend(&mut self, address: u16, cycles: u32);

    /// Internal cycles with no address on the bus. Never contended.
    fn tick(&mut self, cycles: u32);

    /// Read without advancing the clock or triggering side effects.
    fn peek(&self, address: u16) -> u8;

    /// Total t-states elapsed on this bus.
    fn elapsed(&self) -> Ticks;
}

/// A bus with a separate 16-bit I/O space (Z80 `IN`/`OUT`).
pub trait IoBus: Bus {
    /// I/O read: 4 t-states plus any wait states.
    fn read_io(&mut self, port: u16) -> u8;

    /// I/O write: 4 t-states plus any wait states.
    fn write_io(&mut self, port: u16, value: u8);
}

/// Flat 64K RAM with uncontended timing.
///
/// Used to exercise CPU cores in isolation. Port reads return `io_value` and
/// port writes are recorded in order.
pub struct SimpleBus {
    memory: Vec<u8>,
    clock: Ticks,
    /// Value returned by every port read.
    pub io_value: u8,
    /// Port writes in execution order: `(port, value)`.
    pub io_writes: Vec<(u16, u8)>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x1_0000],
            clock: Ticks::ZERO,
            io_value: 0xFF,
            io_writes: Vec::new(),
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.memory[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Store a byte without advancing the clock.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn fetch(&mut self, address: u16) -> u8 {
        self.clock += Ticks::new(4);
        self.memory[usize::from(address)]
    }

    fn read(&mut self, address: u16) -> u8 {
        self.clock += Ticks::new(3);
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.clock += Ticks::new(3);
        self.memory[usize::from(address)] = value;
    }

    fn contend(&mut self, _address: u16, cycles: u32) {
        self.clock += Ticks::new(u64::from(cycles));
    }

    fn tick(&mut self, cycles: u32) {
        self.clock += Ticks::new(u64::from(cycles));
    }

    fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn elapsed(&self) -> Ticks {
        self.clock
    }
}

impl IoBus for SimpleBus {
    fn read_io(&mut self, _port: u16) -> u8 {
        self.clock += Ticks::new(4);
        self.io_value
    }

    fn write_io(&mut self, port: u16, value: u8) {
        self.clock += Ticks::new(4);
        self.io_writes.push((port, value));
    }
}
