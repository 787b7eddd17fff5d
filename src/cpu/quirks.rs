// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Controls the [Quirks] behavior of the CPU on a granular level.

use super::Mode;

/// Selects between historically divergent behaviors of the CPU.
///
/// Fixed when the [CPU](super::CPU) is constructed. `false` is CHIP-48-like behavior
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quirks {
    /// Cosmac VIP: Shift ops in `8xy`(`6`, `E`) source from vY instead of vX
    pub shift: bool,
    /// Cosmac VIP: DMA instructions `Fx55`/`Fx65` leave I at I + x + 1
    pub dma_inc: bool,
}

impl From<bool> for Quirks {
    /// Enables (`true`) or disables (`false`) every quirk at once
    fn from(value: bool) -> Self {
        Quirks {
            shift: value,
            dma_inc: value,
        }
    }
}

impl From<Mode> for Quirks {
    fn from(value: Mode) -> Self {
        match value {
            Mode::Chip8 => Quirks::from(true),
            Mode::SChip => Quirks::from(false),
        }
    }
}
