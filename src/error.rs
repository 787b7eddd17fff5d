// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for Chirp8

use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Chirp8.
#[derive(Debug, Error)]
pub enum Error {
    /// Represents an opcode that matches no instruction
    #[error("opcode {word:04x} not recognized")]
    UnknownOpcode {
        /// The offending word
        word: u16,
    },
    /// A subroutine call was made with all 16 stack levels in use
    #[error("stack overflow calling from {pc:03x}")]
    StackOverflow {
        /// Address of the offending call
        pc: u16,
    },
    /// A return was made with an empty stack
    #[error("stack underflow returning from {pc:03x}")]
    StackUnderflow {
        /// Address of the offending return
        pc: u16,
    },
    /// Represents a breakpoint being hit
    #[error("breakpoint hit: {addr:03x} ({next:04x})")]
    BreakpointHit {
        /// The address of the breakpoint
        addr: u16,
        /// The instruction after the breakpoint
        next: u16,
    },
    /// Tried to press a key that doesn't exist
    #[error("tried to press key {key:X} which does not exist")]
    InvalidKey {
        /// The offending key
        key: usize,
    },
    /// The program doesn't fit in program memory
    #[error("program of {len} bytes exceeds the {max} bytes of program memory")]
    ProgramTooLarge {
        /// Length of the rejected program
        len: usize,
        /// Size of program memory
        max: usize,
    },
    /// Tried to get/set an out-of-bounds register
    #[error("tried to access register v{reg:X} which does not exist")]
    InvalidRegister {
        /// The offending register
        reg: usize,
    },
    /// Tried to convert string into mode, but it did not match.
    #[error("no suitable conversion of \"{mode}\" into Mode")]
    InvalidMode {
        /// The string which failed to become a mode
        mode: String,
    },
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "minifb")]
    /// Error originated in [minifb]
    #[error(transparent)]
    MinifbError(#[from] minifb::Error),
}

impl Error {
    /// Returns true if this error stops the interpreter for good
    ///
    /// Breakpoints only pause execution, and can be resumed from.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::BreakpointHit { .. })
    }
}
