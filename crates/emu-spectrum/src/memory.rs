//! Spectrum memory subsystem.
//!
//! The 64K address space is four 16K slots. Each slot maps one ROM or RAM
//! page; the trait abstracts the model differences in page count, paging
//! latch and contention so the bus doesn't need to know which model is
//! active.

use sinclair_ula::SCREEN_BYTES;

use crate::config::{PAGE_SIZE, SpectrumModel};
use crate::error::SpectrumError;

/// A page that can be mapped into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Page {
    Rom(usize),
    Ram(usize),
}

/// Memory interface for all Spectrum variants.
///
/// `read` and `write` resolve through the current slot mapping and have no
/// side effects on it. Paging only changes through `select_page` or the
/// model's paging latch.
pub trait SpectrumMemory {
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to the given address. ROM writes are silently ignored.
    fn write(&mut self, addr: u16, val: u8);

    /// Read a byte without side effects (debuggers, observation).
    fn peek(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    /// Is this address in contended RAM?
    ///
    /// For 48K: $4000-$7FFF is contended.
    /// For 128K: odd RAM pages (1, 3, 5, 7) are contended wherever mapped.
    fn is_contended(&self, addr: u16) -> bool;

    /// Map `page` into `slot` (0-3, one per 16K of address space).
    fn select_page(&mut self, slot: usize, page: Page) -> Result<(), SpectrumError>;

    /// Page currently mapped into `slot`.
    fn mapped(&self, slot: usize) -> Page;

    /// Write the paging latch ($7FFD). No-op on 48K.
    fn write_paging_register(&mut self, _value: u8) {}

    /// Last value accepted by the paging latch. Always 0 on 48K.
    fn paging_register(&self) -> u8 {
        0
    }

    /// True once bit 5 of the latch has been written.
    fn paging_locked(&self) -> bool {
        false
    }

    /// Load the latch ignoring the lock, e.g. from a snapshot.
    fn restore_paging(&mut self, _value: u8) {}

    /// Power-on mapping.
    fn reset_paging(&mut self);

    /// RAM page the ULA displays.
    fn screen_page(&self) -> usize;

    /// The 6912-byte bitmap + attribute region of the current screen page.
    fn screen(&self) -> &[u8];

    fn ram_page_count(&self) -> usize;

    /// Contents of a RAM page, `None` if out of range.
    fn ram_page(&self, page: usize) -> Option<&[u8]>;

    /// Replace a RAM page. `data` must be exactly 16K.
    fn load_ram_page(&mut self, page: usize, data: &[u8]) -> Result<(), SpectrumError>;
}

type PageData = Box<[u8; PAGE_SIZE]>;

/// Page storage and slot mapping shared by every model.
struct Pages {
    rom: Vec<PageData>,
    ram: Vec<PageData>,
    slots: [Page; 4],
}

impl Pages {
    fn new(
        model: SpectrumModel,
        rom: &[u8],
        slots: [Page; 4],
    ) -> Result<Self, SpectrumError> {
        if rom.len() != model.rom_size() {
            return Err(SpectrumError::RomSize {
                model,
                expected: model.rom_size(),
                actual: rom.len(),
            });
        }
        let rom = rom
            .chunks_exact(PAGE_SIZE)
            .map(|chunk| {
                let mut page = Box::new([0u8; PAGE_SIZE]);
                page.copy_from_slice(chunk);
                page
            })
            .collect();
        let ram = (0..model.ram_pages())
            .map(|_| Box::new([0u8; PAGE_SIZE]))
            .collect();
        Ok(Self { rom, ram, slots })
    }

    fn split(addr: u16) -> (usize, usize) {
        (usize::from(addr >> 14), usize::from(addr) & (PAGE_SIZE - 1))
    }

    fn read(&self, addr: u16) -> u8 {
        let (slot, offset) = Self::split(addr);
        match self.slots[slot] {
            Page::Rom(p) => self.rom[p][offset],
            Page::Ram(p) => self.ram[p][offset],
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        let (slot, offset) = Self::split(addr);
        if let Page::Ram(p) = self.slots[slot] {
            self.ram[p][offset] = val;
        }
    }

    fn ram_at(&self, addr: u16) -> Option<usize> {
        match self.slots[Self::split(addr).0] {
            Page::Ram(p) => Some(p),
            Page::Rom(_) => None,
        }
    }

    fn select(&mut self, slot: usize, page: Page) -> Result<(), SpectrumError> {
        if slot >= self.slots.len() {
            return Err(SpectrumError::InvalidSlot(slot));
        }
        let (index, count) = match page {
            Page::Rom(p) => (p, self.rom.len()),
            Page::Ram(p) => (p, self.ram.len()),
        };
        if index >= count {
            return Err(SpectrumError::InvalidPage { page: index, count });
        }
        self.slots[slot] = page;
        Ok(())
    }

    fn screen(&self, page: usize) -> &[u8] {
        &self.ram[page][..SCREEN_BYTES]
    }

    fn load(&mut self, page: usize, data: &[u8]) -> Result<(), SpectrumError> {
        let count = self.ram.len();
        let dst = self
            .ram
            .get_mut(page)
            .ok_or(SpectrumError::InvalidPage { page, count })?;
        if data.len() != PAGE_SIZE {
            return Err(SpectrumError::SnapshotPageSize {
                page,
                actual: data.len(),
            });
        }
        dst.copy_from_slice(data);
        Ok(())
    }
}

/// 48K Spectrum memory: 16K ROM + 48K RAM.
///
/// Layout:
/// - $0000-$3FFF: ROM (writes ignored)
/// - $4000-$7FFF: RAM page 0, contended (shared with ULA)
/// - $8000-$BFFF: RAM page 1
/// - $C000-$FFFF: RAM page 2
pub struct Memory48K {
    pages: Pages,
}

const SLOTS_48K: [Page; 4] = [Page::Rom(0), Page::Ram(0), Page::Ram(1), Page::Ram(2)];

impl Memory48K {
    /// Create a new 48K memory with the given 16K ROM.
    pub fn new(rom: &[u8]) -> Result<Self, SpectrumError> {
        Ok(Self {
            pages: Pages::new(SpectrumModel::Spectrum48K, rom, SLOTS_48K)?,
        })
    }
}

impl SpectrumMemory for Memory48K {
    fn read(&self, addr: u16) -> u8 {
        self.pages.read(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.pages.write(addr, val);
    }

    fn is_contended(&self, addr: u16) -> bool {
        // The ULA shares the bus with whatever holds the screen
        self.pages.ram_at(addr) == Some(0)
    }

    fn select_page(&mut self, slot: usize, page: Page) -> Result<(), SpectrumError> {
        self.pages.select(slot, page)
    }

    fn mapped(&self, slot: usize) -> Page {
        self.pages.slots[slot & 3]
    }

    fn reset_paging(&mut self) {
        self.pages.slots = SLOTS_48K;
    }

    fn screen_page(&self) -> usize {
        0
    }

    fn screen(&self) -> &[u8] {
        self.pages.screen(0)
    }

    fn ram_page_count(&self) -> usize {
        self.pages.ram.len()
    }

    fn ram_page(&self, page: usize) -> Option<&[u8]> {
        self.pages.ram.get(page).map(|p| &p[..])
    }

    fn load_ram_page(&mut self, page: usize, data: &[u8]) -> Result<(), SpectrumError> {
        self.pages.load(page, data)
    }
}

/// 128K Spectrum memory: 2×16K ROM + 8×16K RAM with bank switching.
///
/// Layout:
/// - $0000-$3FFF: ROM 0 or 1 (bit 4 of $7FFD)
/// - $4000-$7FFF: RAM page 5 (contended)
/// - $8000-$BFFF: RAM page 2
/// - $C000-$FFFF: RAM page 0-7 (bits 0-2 of $7FFD)
///
/// Bit 3 of $7FFD selects the shadow screen (page 7 instead of page 5).
/// Bit 5 of $7FFD locks the latch until reset.
pub struct Memory128K {
    pages: Pages,
    /// $7FFD latch value.
    latch: u8,
    /// Once bit 5 is set, further writes to $7FFD are ignored.
    locked: bool,
}

const SLOTS_128K: [Page; 4] = [Page::Rom(0), Page::Ram(5), Page::Ram(2), Page::Ram(0)];

impl Memory128K {
    /// Create a new 128K memory with the given 32K ROM.
    ///
    /// The ROM is split into two 16K pages: ROM 0 (128K editor) at the
    /// start and ROM 1 (48K BASIC) at offset $4000.
    pub fn new(rom: &[u8]) -> Result<Self, SpectrumError> {
        Ok(Self {
            pages: Pages::new(SpectrumModel::Spectrum128K, rom, SLOTS_128K)?,
            latch: 0,
            locked: false,
        })
    }

    fn apply_latch(&mut self, value: u8) {
        self.latch = value;
        self.locked = value & 0x20 != 0;
        self.pages.slots[0] = Page::Rom(usize::from((value >> 4) & 1));
        self.pages.slots[3] = Page::Ram(usize::from(value & 0x07));
        log::debug!(
            "paging ${value:02X}: RAM {} at $C000, ROM {}, screen {}{}",
            value & 0x07,
            (value >> 4) & 1,
            self.screen_page(),
            if self.locked { ", locked" } else { "" }
        );
    }
}

impl SpectrumMemory for Memory128K {
    fn read(&self, addr: u16) -> u8 {
        self.pages.read(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.pages.write(addr, val);
    }

    fn is_contended(&self, addr: u16) -> bool {
        self.pages.ram_at(addr).is_some_and(|p| p & 1 != 0)
    }

    fn select_page(&mut self, slot: usize, page: Page) -> Result<(), SpectrumError> {
        self.pages.select(slot, page)
    }

    fn mapped(&self, slot: usize) -> Page {
        self.pages.slots[slot & 3]
    }

    fn write_paging_register(&mut self, value: u8) {
        if self.locked {
            log::trace!("paging write ${value:02X} ignored: latch locked");
            return;
        }
        self.apply_latch(value);
    }

    fn paging_register(&self) -> u8 {
        self.latch
    }

    fn paging_locked(&self) -> bool {
        self.locked
    }

    fn restore_paging(&mut self, value: u8) {
        self.pages.slots = SLOTS_128K;
        self.apply_latch(value);
    }

    fn reset_paging(&mut self) {
        self.pages.slots = SLOTS_128K;
        self.latch = 0;
        self.locked = false;
    }

    fn screen_page(&self) -> usize {
        if self.latch & 0x08 != 0 { 7 } else { 5 }
    }

    fn screen(&self) -> &[u8] {
        self.pages.screen(self.screen_page())
    }

    fn ram_page_count(&self) -> usize {
        self.pages.ram.len()
    }

    fn ram_page(&self, page: usize) -> Option<&[u8]> {
        self.pages.ram.get(page).map(|p| &p[..])
    }

    fn load_ram_page(&mut self, page: usize, data: &[u8]) -> Result<(), SpectrumError> {
        self.pages.load(page, data)
    }
}

/// Build the memory for `model`.
pub fn for_model(
    model: SpectrumModel,
    rom: &[u8],
) -> Result<Box<dyn SpectrumMemory>, SpectrumError> {
    Ok(match model {
        SpectrumModel::Spectrum48K => Box::new(Memory48K::new(rom)?),
        SpectrumModel::Spectrum128K => Box::new(Memory128K::new(rom)?),
    })
}
