//! Spectrum model configuration.

use sinclair_ula::UlaTiming;

/// Size of one ROM or RAM page.
pub const PAGE_SIZE: usize = 0x4000;

/// Supported Spectrum models.
///
/// The machine uses a trait object (`Box<dyn SpectrumMemory>`) internally,
/// selected by this enum at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpectrumModel {
    Spectrum48K,
    Spectrum128K,
}

impl SpectrumModel {
    /// Frame geometry for this model.
    #[must_use]
    pub const fn timing(self) -> UlaTiming {
        match self {
            Self::Spectrum48K => UlaTiming::ZX48K,
            Self::Spectrum128K => UlaTiming::ZX128K,
        }
    }

    #[must_use]
    pub const fn rom_pages(self) -> usize {
        match self {
            Self::Spectrum48K => 1,
            Self::Spectrum128K => 2,
        }
    }

    #[must_use]
    pub const fn ram_pages(self) -> usize {
        match self {
            Self::Spectrum48K => 3,
            Self::Spectrum128K => 8,
        }
    }

    /// Expected ROM image size in bytes.
    #[must_use]
    pub const fn rom_size(self) -> usize {
        self.rom_pages() * PAGE_SIZE
    }

    /// Whether the model has the $7FFD paging latch and the AY chip.
    #[must_use]
    pub const fn has_paging(self) -> bool {
        matches!(self, Self::Spectrum128K)
    }
}

/// Configuration for creating a Spectrum instance.
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    pub model: SpectrumModel,
    /// ROM data. Must be the correct size for the model (16,384 bytes for
    /// 48K, 32,768 for 128K with the editor ROM first).
    pub rom: Vec<u8>,
    /// Frame t-state at which INT is raised. Real hardware uses 0.
    pub interrupt_offset: u32,
}

impl SpectrumConfig {
    #[must_use]
    pub fn new(model: SpectrumModel, rom: Vec<u8>) -> Self {
        Self {
            model,
            rom,
            interrupt_offset: 0,
        }
    }

    /// Per-model timing constants.
    #[must_use]
    pub fn timing(&self) -> UlaTiming {
        self.model.timing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_geometry() {
        assert_eq!(SpectrumModel::Spectrum48K.rom_size(), 16_384);
        assert_eq!(SpectrumModel::Spectrum128K.rom_size(), 32_768);
        assert_eq!(SpectrumModel::Spectrum48K.timing().frame_t_states, 69_888);
        assert_eq!(SpectrumModel::Spectrum128K.timing().frame_t_states, 70_908);
        assert!(!SpectrumModel::Spectrum48K.has_paging());
    }

    #[test]
    fn config_defaults_to_hardware_interrupt_offset() {
        let config = SpectrumConfig::new(SpectrumModel::Spectrum48K, vec![0; 0x4000]);
        assert_eq!(config.interrupt_offset, 0);
        assert_eq!(config.timing(), UlaTiming::ZX48K);
    }
}
