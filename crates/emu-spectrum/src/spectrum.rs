//! Top-level Spectrum system.
//!
//! # Frame loop
//!
//! `run_frame()` steps the CPU one instruction boundary at a time until the
//! frame budget is met (69,888 t-states on 48K, 70,908 on 128K). At each
//! boundary the machine first delivers a triggered NMI, then raises INT once
//! the frame reaches the interrupt offset and offers it to the CPU for as
//! long as the ULA holds the line. Whatever the last instruction overran by
//! becomes the first t-state of the next frame.
//!
//! When the offset sits so close to the end of the frame that no boundary
//! lands between it and the budget, the frame runs past the budget until
//! INT has been raised and either taken or let go.

use emu_core::{Cpu, Observable, Value};
use sinclair_ula::Ula;
use zilog_z80::Z80;

use crate::bus::{PortWrite, SpectrumBus};
use crate::config::{SpectrumConfig, SpectrumModel};
use crate::error::SpectrumError;
use crate::interrupt::{InterruptController, InterruptState, InterruptSummary};
use crate::keyboard::SpectrumKey;
use crate::memory;
use crate::snapshot::{AySnapshot, Snapshot};

/// Byte on the data bus during an interrupt acknowledge. Nothing drives
/// it on the Spectrum, so IM 2 vectors read through $FF.
const INT_DATA_BUS: u8 = 0xFF;

/// Outcome of one `run_frame()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameResult {
    /// T-states executed during this call.
    pub t_states: u32,
    /// Port writes in execution order, stamped with frame t-states.
    pub port_writes: Vec<PortWrite>,
    /// Border colour at the end of the frame.
    pub border: u8,
    pub interrupt: InterruptSummary,
}

/// ZX Spectrum system.
pub struct Spectrum {
    cpu: Z80,
    bus: SpectrumBus,
    model: SpectrumModel,
    interrupt: InterruptController,
    /// NMI requested by `trigger_nmi`, delivered at the next boundary.
    nmi_pending: bool,
    /// Completed frame counter.
    frame_count: u64,
}

impl Spectrum {
    /// Create a new Spectrum from the given configuration.
    pub fn new(config: &SpectrumConfig) -> Result<Self, SpectrumError> {
        let timing = config.timing();
        if config.interrupt_offset >= timing.frame_t_states {
            return Err(SpectrumError::InterruptOffset {
                offset: config.interrupt_offset,
                frame_t_states: timing.frame_t_states,
            });
        }

        let memory = memory::for_model(config.model, &config.rom)?;
        let ula = Ula::new(timing, config.interrupt_offset);
        let mut bus = SpectrumBus::new(memory, ula);
        if config.model.has_paging() {
            bus.enable_ay();
        }

        Ok(Self {
            cpu: Z80::new(),
            bus,
            model: config.model,
            interrupt: InterruptController::new(),
            nmi_pending: false,
            frame_count: 0,
        })
    }

    /// Power-on registers and default paging. RAM is left as it was.
    pub fn reset(&mut self) {
        log::debug!("reset {:?}", self.model);
        self.cpu.reset();
        self.bus.memory.reset_paging();
        if let Some(ay) = &mut self.bus.ay {
            ay.reset();
        }
        self.bus.clock.restart();
        self.bus.take_port_writes();
        self.interrupt.start_frame();
        self.nmi_pending = false;
    }

    /// Execute up to the next instruction boundary: an NMI response, an
    /// interrupt response, or one instruction. Returns the t-states taken.
    ///
    /// Does not close the frame; `run_frame()` does that.
    pub fn step(&mut self) -> u32 {
        if self.nmi_pending {
            self.nmi_pending = false;
            return self.cpu.nmi(&mut self.bus);
        }

        let t = self.bus.t_state();
        if !self.interrupt.raised() && t >= self.bus.ula.int_offset() {
            self.interrupt.raise(t);
        }
        if self.interrupt.state() == InterruptState::Pending {
            if t >= self.bus.ula.int_end() {
                self.interrupt.expire(t);
            } else if let Some(cost) = self.cpu.interrupt(&mut self.bus, INT_DATA_BUS) {
                self.interrupt.service(t);
                return cost;
            }
        }

        self.cpu.step(&mut self.bus)
    }

    /// Run until the frame budget is met or exceeded.
    pub fn run_frame(&mut self) -> FrameResult {
        let start = self.bus.t_state();
        while !self.bus.clock.frame_complete() || self.interrupt_outstanding() {
            self.step();
        }
        let end = self.bus.t_state();

        self.interrupt.expire(end);
        let interrupt = self.interrupt.summary();

        self.bus.clock.next_frame();
        self.interrupt.start_frame();
        self.frame_count += 1;

        FrameResult {
            t_states: end - start,
            port_writes: self.bus.take_port_writes(),
            border: self.bus.ula.border_colour(),
            interrupt,
        }
    }

    /// True while this frame's INT still has to be raised or offered.
    ///
    /// An offset near the end of the frame can fall after the last boundary
    /// inside the budget, and its window can reach past the budget. The
    /// frame then runs on until the CPU takes the interrupt or the window
    /// closes.
    fn interrupt_outstanding(&self) -> bool {
        match self.interrupt.state() {
            InterruptState::Idle => !self.interrupt.raised(),
            InterruptState::Pending => self.bus.t_state() < self.bus.ula.int_end(),
            InterruptState::Serviced => false,
        }
    }

    /// The 6912-byte screen region of the RAM page the ULA displays.
    #[must_use]
    pub fn screen(&self) -> &[u8] {
        self.bus.memory.screen()
    }

    /// Replace a keyboard half-row. `bits` is active low (0 = pressed),
    /// bits 0-4 only.
    pub fn set_key_matrix_row(&mut self, row: usize, bits: u8) {
        self.bus.keyboard.set_row(row, bits);
    }

    /// Press a key (stays pressed until released).
    pub fn press_key(&mut self, key: SpectrumKey) {
        let (row, bit) = key.matrix();
        self.bus.keyboard.set_key(row, bit, true);
    }

    pub fn release_key(&mut self, key: SpectrumKey) {
        let (row, bit) = key.matrix();
        self.bus.keyboard.set_key(row, bit, false);
    }

    pub fn release_all_keys(&mut self) {
        self.bus.keyboard.release_all();
    }

    /// Level on the EAR input.
    pub fn set_tape_input_bit(&mut self, bit: bool) {
        self.bus.tape_input = bit;
    }

    /// Level on the MIC output.
    #[must_use]
    pub fn read_tape_output_bit(&self) -> bool {
        self.bus.mic()
    }

    #[must_use]
    pub fn beeper_level(&self) -> bool {
        self.bus.beeper()
    }

    #[must_use]
    pub fn border(&self) -> u8 {
        self.bus.ula.border_colour()
    }

    /// Request a non-maskable interrupt at the next instruction boundary.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Restore machine state. Nothing changes unless the whole snapshot is
    /// valid for this model.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SpectrumError> {
        if let Err(err) = snapshot.validate(self.model) {
            log::warn!("snapshot rejected: {err}");
            return Err(err);
        }

        for (page, data) in snapshot.ram.iter().enumerate() {
            self.bus.memory.load_ram_page(page, data)?;
        }
        self.bus.memory.reset_paging();
        self.bus.memory.restore_paging(snapshot.paging);
        for (slot, &page) in snapshot.slots.iter().enumerate() {
            self.bus.memory.select_page(slot, page)?;
        }
        self.cpu.set_registers(snapshot.registers);
        self.bus.ula.set_border_colour(snapshot.border);
        self.bus.last_fe_write = (self.bus.last_fe_write & !0x07) | (snapshot.border & 0x07);
        if let Some(ay) = &mut self.bus.ay {
            match &snapshot.ay {
                Some(state) => ay.load_registers(&state.registers, state.selected),
                None => ay.reset(),
            }
        }
        self.nmi_pending = false;
        Ok(())
    }

    #[must_use]
    pub fn dump_snapshot(&self) -> Snapshot {
        let memory = &self.bus.memory;
        Snapshot {
            model: self.model,
            registers: self.cpu.registers(),
            ram: (0..memory.ram_page_count())
                .filter_map(|page| memory.ram_page(page).map(<[u8]>::to_vec))
                .collect(),
            paging: memory.paging_register(),
            slots: [0, 1, 2, 3].map(|slot| memory.mapped(slot)),
            border: self.bus.ula.border_colour(),
            ay: self.bus.ay.as_ref().map(|ay| AySnapshot {
                registers: *ay.registers(),
                selected: ay.selected_register(),
            }),
        }
    }

    #[must_use]
    pub fn model(&self) -> SpectrumModel {
        self.model
    }

    #[must_use]
    pub fn interrupt_state(&self) -> InterruptState {
        self.interrupt.state()
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &SpectrumBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SpectrumBus {
        &mut self.bus
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl Observable for Spectrum {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|a| Value::U8(self.bus.memory.peek(a)))
        } else if let Some(rest) = path.strip_prefix("ay.") {
            let ay = self.bus.ay.as_ref()?;
            match rest {
                "selected" => Some(ay.selected_register().into()),
                reg => {
                    let index: u8 = reg.strip_prefix('r')?.parse().ok()?;
                    (index < 16).then(|| ay.register(index).into())
                }
            }
        } else {
            match path {
                "ula.border" => Some(self.bus.ula.border_colour().into()),
                "ula.t_state" => Some(self.bus.t_state().into()),
                "ula.int_active" => Some(self.bus.ula.int_active(self.bus.t_state()).into()),
                "interrupt.state" => Some(self.interrupt.state().as_str().into()),
                "interrupt.missed" => Some(self.interrupt.missed().into()),
                "paging" => Some(self.bus.memory.paging_register().into()),
                "paging.locked" => Some(self.bus.memory.paging_locked().into()),
                "tape.ear" => Some(self.bus.tape_input.into()),
                "tape.mic" => Some(self.bus.mic().into()),
                "beeper" => Some(self.bus.beeper().into()),
                "frame_count" => Some(self.frame_count.into()),
                "ticks" => Some(self.bus.clock.total().get().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "ula.border",
            "ula.t_state",
            "ula.int_active",
            "interrupt.state",
            "interrupt.missed",
            "paging",
            "paging.locked",
            "tape.ear",
            "tape.mic",
            "beeper",
            "frame_count",
            "ticks",
        ]
    }
}
