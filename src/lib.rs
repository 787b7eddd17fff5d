// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! This crate implements a Chip-8 interpreter as if it were a real CPU architecture.
//!
//! The [CPU] owns the registers, stack, and timers. Everything it touches while running
//! (the [Mem]ory, the [Screen], and the [Keypad]) is passed in per step, so a host can
//! inspect or poke any of it between instructions. [Chip8] bundles them all together.
//!
//! Timing is left to the host: call [CPU::tick] as often as you like, and
//! [CPU::tick_timers] at [TIMER_HZ]. [Ticker] makes that easy.

pub mod cpu;
pub mod error;
pub mod keypad;
pub mod mem;
pub mod screen;
pub mod timer;

use std::path::Path;

// Common imports for chirp8
pub use cpu::{
    flags::Flags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    mode::Mode,
    quirks::Quirks,
    CPU, STACK_DEPTH,
};
pub use error::Result;
pub use keypad::Keypad;
pub use mem::{Mem, Region, Region::*, FONT, FONT_ADDR, MEM_SIZE, PROGRAM_ADDR};
pub use screen::Screen;
pub use timer::{Ticker, TIMER_HZ};

/// Holds the state of a Chip-8
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chip8 {
    /// Contains the registers, flags, and operating state for a single Chip-8
    pub cpu: CPU,
    /// Contains the 4096 bytes of addressable memory
    pub mem: Mem,
    /// The 64x32 monochrome framebuffer
    pub screen: Screen,
    /// The hex keypad
    pub keys: Keypad,
    rom: Vec<u8>,
}

impl Chip8 {
    /// Creates a new Chip-8 with the provided [Quirks], and nothing loaded
    pub fn new(quirks: Quirks) -> Self {
        Self {
            cpu: CPU::new(quirks, Flags::default(), vec![]),
            ..Default::default()
        }
    }

    /// Loads a program into memory, and remembers it for [Chip8::reset]
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut ch8 = Chip8::default();
    /// ch8.load_program(&[0x60, 0x05]).unwrap();
    /// ch8.tick().unwrap();
    /// assert_eq!(0x05, ch8.cpu.v()[0]);
    /// ```
    pub fn load_program(&mut self, program: &[u8]) -> Result<&mut Self> {
        self.mem.load_program(program)?;
        self.rom = program.to_vec();
        Ok(self)
    }

    /// Reads a ROM file from disk, and loads it with [Chip8::load_program]
    pub fn load_rom(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let rom = std::fs::read(path)?;
        self.load_program(&rom)
    }

    /// Gets the most recently loaded program
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    /// Executes a single instruction. See [CPU::tick]
    pub fn tick(&mut self) -> Result<&mut Self> {
        self.cpu.tick(&mut self.mem, &mut self.screen, &mut self.keys)?;
        Ok(self)
    }

    /// Executes a single instruction, even when paused. See [CPU::singlestep]
    pub fn singlestep(&mut self) -> Result<&mut Self> {
        self.cpu
            .singlestep(&mut self.mem, &mut self.screen, &mut self.keys)?;
        Ok(self)
    }

    /// Executes `steps` instructions. See [CPU::multistep]
    pub fn multistep(&mut self, steps: usize) -> Result<&mut Self> {
        self.cpu
            .multistep(&mut self.mem, &mut self.screen, &mut self.keys, steps)?;
        Ok(self)
    }

    /// Counts the timers down once. See [CPU::tick_timers]
    pub fn tick_timers(&mut self) -> bool {
        self.cpu.tick_timers()
    }

    /// Puts the machine back in its power-on state, with the last program reloaded
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut ch8 = Chip8::default();
    /// ch8.load_program(&[0x60, 0x05, 0xa2, 0x00, 0xf0, 0x55]).unwrap();
    /// ch8.multistep(3).unwrap();
    /// assert_eq!(0x05, ch8.mem.read_byte(0x200u16));
    /// ch8.reset().unwrap();
    /// assert_eq!(0x60, ch8.mem.read_byte(0x200u16));
    /// assert_eq!(0x200, ch8.cpu.pc());
    /// ```
    pub fn reset(&mut self) -> Result<&mut Self> {
        self.cpu.reset();
        self.mem.reset().load_program(&self.rom)?;
        self.screen.clear();
        self.keys.release_all();
        Ok(self)
    }
}

/// Common imports for chirp8
pub mod prelude {
    pub use super::{
        error::{Error, Result},
        timer::TIMER_HZ,
        Chip8, Dis, Disassembler, Flags, Insn, Keypad, Mem, Mode, Quirks, Region, Screen,
        Ticker, CPU,
    };
    pub use crate::mem::Region::*;
}
