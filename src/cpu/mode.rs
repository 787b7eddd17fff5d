// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Names the [Quirks](super::Quirks) presets of well-known interpreters

use crate::error::Error;
use std::str::FromStr;

/// Selects a [Quirks](super::Quirks) preset by the interpreter it imitates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mode {
    /// Cosmac VIP emulation mode
    #[default]
    Chip8,
    /// Chip-48 / Super-Chip emulation mode
    SChip,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chip8" | "chip-8" | "vip" => Ok(Mode::Chip8),
            "schip" | "superchip" | "chip48" | "chip-48" => Ok(Mode::SChip),
            _ => Err(Error::InvalidMode {
                mode: s.to_string(),
            }),
        }
    }
}
