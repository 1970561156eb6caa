//! Machine state snapshots.
//!
//! A `Snapshot` is the in-memory image that file-format loaders (SNA, Z80,
//! SZX) translate to and from. It carries everything needed to resume
//! execution: CPU registers, every RAM page in page order, the paging
//! latch, the slot map, the border colour and the AY register file.

use zilog_z80::Registers;

use crate::config::{PAGE_SIZE, SpectrumModel};
use crate::error::SpectrumError;
use crate::memory::Page;

/// AY-3-8910 state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AySnapshot {
    pub registers: [u8; 16],
    pub selected: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub model: SpectrumModel,
    pub registers: Registers,
    /// RAM pages in page order. 48K: the pages at $4000, $8000, $C000.
    /// 128K: pages 0-7.
    pub ram: Vec<Vec<u8>>,
    /// Last value written to $7FFD. Always 0 on 48K.
    pub paging: u8,
    /// Page mapped into each 16K slot. Restored after `paging`, so it also
    /// carries mappings made directly with `select_page`.
    pub slots: [Page; 4],
    pub border: u8,
    /// Present on 128K.
    pub ay: Option<AySnapshot>,
}

impl Snapshot {
    /// Check the snapshot fits `model` before any state is touched.
    pub fn validate(&self, model: SpectrumModel) -> Result<(), SpectrumError> {
        if self.model != model {
            return Err(SpectrumError::SnapshotModel {
                expected: model,
                actual: self.model,
            });
        }
        if self.ram.len() != model.ram_pages() {
            return Err(SpectrumError::SnapshotPageCount {
                expected: model.ram_pages(),
                actual: self.ram.len(),
            });
        }
        if let Some((page, data)) = self
            .ram
            .iter()
            .enumerate()
            .find(|(_, data)| data.len() != PAGE_SIZE)
        {
            return Err(SpectrumError::SnapshotPageSize {
                page,
                actual: data.len(),
            });
        }
        for page in self.slots {
            let (index, count) = match page {
                Page::Rom(p) => (p, model.rom_pages()),
                Page::Ram(p) => (p, model.ram_pages()),
            };
            if index >= count {
                return Err(SpectrumError::InvalidPage { page: index, count });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(model: SpectrumModel) -> Snapshot {
        Snapshot {
            model,
            registers: Registers::default(),
            ram: vec![vec![0; PAGE_SIZE]; model.ram_pages()],
            paging: 0,
            slots: [Page::Rom(0), Page::Ram(0), Page::Ram(1), Page::Ram(2)],
            border: 7,
            ay: None,
        }
    }

    #[test]
    fn valid_snapshot_passes() {
        assert_eq!(blank(SpectrumModel::Spectrum48K).validate(SpectrumModel::Spectrum48K), Ok(()));
        assert_eq!(blank(SpectrumModel::Spectrum128K).validate(SpectrumModel::Spectrum128K), Ok(()));
    }

    #[test]
    fn wrong_model_rejected() {
        let snap = blank(SpectrumModel::Spectrum128K);
        assert_eq!(
            snap.validate(SpectrumModel::Spectrum48K),
            Err(SpectrumError::SnapshotModel {
                expected: SpectrumModel::Spectrum48K,
                actual: SpectrumModel::Spectrum128K,
            })
        );
    }

    #[test]
    fn wrong_page_count_rejected() {
        let mut snap = blank(SpectrumModel::Spectrum48K);
        snap.ram.pop();
        assert_eq!(
            snap.validate(SpectrumModel::Spectrum48K),
            Err(SpectrumError::SnapshotPageCount { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn short_page_rejected() {
        let mut snap = blank(SpectrumModel::Spectrum128K);
        snap.ram[6].truncate(100);
        assert_eq!(
            snap.validate(SpectrumModel::Spectrum128K),
            Err(SpectrumError::SnapshotPageSize { page: 6, actual: 100 })
        );
    }

    #[test]
    fn slot_out_of_range_rejected() {
        let mut snap = blank(SpectrumModel::Spectrum48K);
        snap.slots[3] = Page::Ram(5);
        assert_eq!(
            snap.validate(SpectrumModel::Spectrum48K),
            Err(SpectrumError::InvalidPage { page: 5, count: 3 })
        );

        snap.slots[3] = Page::Ram(2);
        snap.slots[0] = Page::Rom(1);
        assert_eq!(
            snap.validate(SpectrumModel::Spectrum48K),
            Err(SpectrumError::InvalidPage { page: 1, count: 1 })
        );
    }
}
