//! Errors surfaced to callers of the machine API.

use std::fmt;

use crate::config::{PAGE_SIZE, SpectrumModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpectrumError {
    /// ROM image has the wrong size for the model.
    RomSize {
        model: SpectrumModel,
        expected: usize,
        actual: usize,
    },
    /// Interrupt offset lies outside the frame.
    InterruptOffset { offset: u32, frame_t_states: u32 },
    /// Snapshot was taken on a different model.
    SnapshotModel {
        expected: SpectrumModel,
        actual: SpectrumModel,
    },
    /// Snapshot carries the wrong number of RAM pages.
    SnapshotPageCount { expected: usize, actual: usize },
    /// A snapshot RAM page is not 16K.
    SnapshotPageSize { page: usize, actual: usize },
    /// Page index out of range for the model.
    InvalidPage { page: usize, count: usize },
    /// Memory slot index out of range (0-3).
    InvalidSlot(usize),
}

impl fmt::Display for SpectrumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RomSize {
                model,
                expected,
                actual,
            } => write!(
                f,
                "{model:?} ROM must be exactly {expected} bytes, got {actual}"
            ),
            Self::InterruptOffset {
                offset,
                frame_t_states,
            } => write!(
                f,
                "interrupt offset {offset} is outside the {frame_t_states} t-state frame"
            ),
            Self::SnapshotModel { expected, actual } => {
                write!(f, "snapshot is for {actual:?}, machine is {expected:?}")
            }
            Self::SnapshotPageCount { expected, actual } => {
                write!(f, "snapshot has {actual} RAM pages, expected {expected}")
            }
            Self::SnapshotPageSize { page, actual } => write!(
                f,
                "snapshot RAM page {page} is {actual} bytes, expected {PAGE_SIZE}"
            ),
            Self::InvalidPage { page, count } => {
                write!(f, "page {page} out of range (model has {count})")
            }
            Self::InvalidSlot(slot) => write!(f, "memory slot {slot} out of range (0-3)"),
        }
    }
}

impl std::error::Error for SpectrumError {}
