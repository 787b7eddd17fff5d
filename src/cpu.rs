// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes and runs instructions

#[cfg(test)]
mod tests;

pub mod behavior;
pub mod flags;
pub mod instruction;
pub mod mode;
pub mod quirks;

use self::{
    flags::Flags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    quirks::Quirks,
};
use crate::{
    error::{Error, Result},
    keypad::Keypad,
    mem::{Mem, FONT_ADDR, GLYPH_LEN, PROGRAM_ADDR},
    screen::Screen,
};
pub use mode::Mode;
use owo_colors::OwoColorize;
use std::fmt::Debug;

type Reg = usize;
type Adr = u16;
type Nib = u8;

/// Number of return addresses the call stack can hold
pub const STACK_DEPTH: usize = 16;

/// Represents the internal state of the CPU interpreter
#[derive(Clone, PartialEq)]
pub struct CPU {
    /// Flags that control how the CPU is run, but which aren't inherent to the
    /// chip-8. Includes debug and pause state.
    pub flags: Flags,
    quirks: Quirks,
    // memory
    stack: [Adr; STACK_DEPTH],
    sp: usize,
    // registers
    pc: Adr,
    i: Adr,
    v: [u8; 16],
    delay: u8,
    sound: u8,
    // Execution data
    cycle: usize,
    breakpoints: Vec<Adr>,
    disassembler: Dis,
}

// public interface
impl CPU {
    /// Constructs a new CPU, taking all configurable parameters
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let cpu = CPU::new(
    ///     Quirks::from(Mode::Chip8),
    ///     Flags::default(),
    ///     vec![], // Breakpoints
    /// );
    /// assert_eq!(0x200, cpu.pc());
    /// assert!(cpu.quirks().shift);
    /// ```
    pub fn new(quirks: Quirks, flags: Flags, breakpoints: Vec<Adr>) -> Self {
        CPU {
            flags,
            quirks,
            stack: [0; STACK_DEPTH],
            sp: 0,
            pc: PROGRAM_ADDR,
            i: 0,
            v: [0; 16],
            delay: 0,
            sound: 0,
            cycle: 0,
            breakpoints,
            disassembler: Dis::default(),
        }
    }

    /// Sets a general purpose register in the CPU.
    /// If the register doesn't exist, returns [Error::InvalidRegister]
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// // Create a new CPU, and set v4 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x4, 0x41).unwrap();
    /// assert_eq!(0x41, cpu.v()[4]);
    /// ```
    pub fn set_v(&mut self, reg: Reg, value: u8) -> Result<()> {
        if let Some(gpr) = self.v.get_mut(reg) {
            *gpr = value;
            Ok(())
        } else {
            Err(Error::InvalidRegister { reg })
        }
    }

    /// Gets a slice of the entire general purpose registers
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x0, 0x41).unwrap();
    /// assert_eq!(
    ///     cpu.v(),
    ///     [0x41, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    /// )
    /// ```
    pub fn v(&self) -> &[u8] {
        self.v.as_slice()
    }

    /// Gets the program counter
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let cpu = CPU::default();
    /// assert_eq!(0x200, cpu.pc());
    /// ```
    pub fn pc(&self) -> Adr {
        self.pc
    }

    /// Gets the I register
    pub fn i(&self) -> Adr {
        self.i
    }

    /// Gets the value in the Sound Timer register
    pub fn sound(&self) -> u8 {
        self.sound
    }

    /// Gets the value in the Delay Timer register
    pub fn delay(&self) -> u8 {
        self.delay
    }

    /// Gets the return addresses on the stack, oldest first
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let cpu = CPU::default();
    /// assert!(cpu.stack().is_empty());
    /// ```
    pub fn stack(&self) -> &[Adr] {
        &self.stack[..self.sp]
    }

    /// Gets the [Quirks] this CPU was built with
    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Gets the number of cycles the CPU has executed
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Resets the CPU to its power-on state.
    ///
    /// Touches the [Flags] (keypause), stack, pc, registers, timers, and cycle count.
    ///
    /// Does not touch [Quirks], breakpoints, or the debug and pause flags.
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x3, 0x33).unwrap();
    /// cpu.flags.keypause = true;
    /// cpu.reset();
    /// assert_eq!(CPU::default(), cpu);
    /// ```
    pub fn reset(&mut self) {
        self.flags.keypause = false;
        // clear the stack
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        // Reset the program counter
        self.pc = PROGRAM_ADDR;
        // Zero the registers
        self.i = 0;
        self.v = [0; 16];
        self.delay = 0;
        self.sound = 0;
        // Execution data
        self.cycle = 0;
    }

    /// Set a breakpoint
    pub fn set_break(&mut self, point: Adr) -> &mut Self {
        if !self.breakpoints.contains(&point) {
            self.breakpoints.push(point)
        }
        self
    }

    /// Unset a breakpoint
    pub fn unset_break(&mut self, point: Adr) -> &mut Self {
        self.breakpoints.retain(|&bp| bp != point);
        self
    }

    /// Gets a slice of breakpoints
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let cpu = CPU::default();
    /// assert_eq!(cpu.breakpoints(), &[]);
    /// ```
    pub fn breakpoints(&self) -> &[Adr] {
        self.breakpoints.as_slice()
    }

    /// Counts both timers down by one, stopping at zero.
    ///
    /// Returns true if the sound timer was running, and a tone should play for this tick.
    ///
    /// Call this at [TIMER_HZ](crate::timer::TIMER_HZ), independent of the instruction rate.
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut cpu = CPU::default();
    /// assert!(!cpu.tick_timers());
    /// assert_eq!(0, cpu.delay());
    /// ```
    pub fn tick_timers(&mut self) -> bool {
        self.delay = self.delay.saturating_sub(1);
        let tone = self.sound > 0;
        self.sound = self.sound.saturating_sub(1);
        tone
    }

    /// Unpauses the emulator for a single tick,
    /// even if cpu.flags.pause is set.
    ///
    /// Like with [CPU::tick], this returns [Error::UnknownOpcode]
    /// if the instruction is unimplemented.
    ///
    /// NOTE: does not synchronize with delay timers
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let (mut cpu, mut mem, mut screen, mut keys) =
    ///     (CPU::default(), Mem::new(), Screen::default(), Keypad::new());
    /// mem.load_program(&[
    ///     0x00, 0xe0, // cls
    ///     0x22, 0x02, // call 0x202
    /// ]).unwrap();
    /// cpu.flags.pause = true;
    /// cpu.singlestep(&mut mem, &mut screen, &mut keys).unwrap();
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// assert!(cpu.flags.pause);
    /// ```
    pub fn singlestep(
        &mut self,
        mem: &mut Mem,
        screen: &mut Screen,
        keys: &mut Keypad,
    ) -> Result<&mut Self> {
        self.flags.pause = false;
        let result = self.tick(mem, screen, keys).map(|_| ());
        self.flags.pause = true;
        result?;
        Ok(self)
    }

    /// Runs `steps` instructions, stopping early on error
    ///
    /// NOTE: does not synchronize with delay timers
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let (mut cpu, mut mem, mut screen, mut keys) =
    ///     (CPU::default(), Mem::new(), Screen::default(), Keypad::new());
    /// mem.load_program(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// cpu.multistep(&mut mem, &mut screen, &mut keys, 0x20)
    ///     .expect("The program should only have valid opcodes.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(0x20, cpu.cycle());
    /// ```
    pub fn multistep(
        &mut self,
        mem: &mut Mem,
        screen: &mut Screen,
        keys: &mut Keypad,
        steps: usize,
    ) -> Result<&mut Self> {
        for _ in 0..steps {
            self.tick(mem, screen, keys)?;
        }
        Ok(self)
    }

    /// Executes a single instruction
    ///
    /// Returns [Error::BreakpointHit] if a breakpoint was hit after the instruction executed.
    /// This result contains information about the breakpoint, but can be safely ignored.
    ///
    /// Returns [Error::UnknownOpcode], [Error::StackOverflow], or [Error::StackUnderflow]
    /// if the instruction at `pc` can't be executed. The CPU is left as it was before the
    /// instruction, and the fault is reported on stderr.
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let (mut cpu, mut mem, mut screen, mut keys) =
    ///     (CPU::default(), Mem::new(), Screen::default(), Keypad::new());
    /// mem.load_program(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// cpu.tick(&mut mem, &mut screen, &mut keys)
    ///     .expect("0x00e0 (cls) should be a valid opcode.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// ```
    /// Returns [Error::UnknownOpcode] if the instruction is not implemented.
    /// ```rust
    /// # use chirp8::*;
    /// # use chirp8::error::Error;
    /// let (mut cpu, mut mem, mut screen, mut keys) =
    ///     (CPU::default(), Mem::new(), Screen::default(), Keypad::new());
    /// # cpu.flags.debug = true; // enable live disassembly
    /// mem.load_program(&[
    ///     0xff, 0xff, // invalid!
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// assert!(matches!(
    ///     cpu.tick(&mut mem, &mut screen, &mut keys),
    ///     Err(Error::UnknownOpcode { word: 0xffff })
    /// ));
    /// ```
    pub fn tick(
        &mut self,
        mem: &mut Mem,
        screen: &mut Screen,
        keys: &mut Keypad,
    ) -> Result<&mut Self> {
        // Do nothing if paused
        if self.flags.pause {
            return Ok(self);
        }
        // fetch opcode
        let pc = self.pc;
        let opcode = mem.read_word(pc);

        // Print opcode disassembly:
        if self.flags.debug && !self.flags.keypause {
            std::println!(
                "{:3} {:03x}: {:<36}",
                (self.cycle + 1).bright_black(),
                pc,
                self.disassembler.once(opcode)
            );
        }

        // decode opcode
        let Some(insn) = Insn::from_word(opcode) else {
            return Err(self.fault(mem, Error::UnknownOpcode { word: opcode }));
        };
        self.pc = pc.wrapping_add(2);
        if let Err(e) = self.execute(insn, mem, screen, keys) {
            self.pc = pc;
            return Err(self.fault(mem, e));
        }
        self.cycle += 1;

        // process breakpoints
        if !self.flags.keypause && self.breakpoints.contains(&self.pc) {
            self.flags.pause = true;
            return Err(Error::BreakpointHit {
                addr: self.pc,
                next: mem.read_word(self.pc),
            });
        }
        Ok(self)
    }

    /// Reports an execution fault on stderr, along with where it happened
    fn fault(&self, mem: &Mem, error: Error) -> Error {
        eprintln!(
            "{}",
            format_args!(
                "{error}\n  pc: {:03x}, opcode: {:04x}, next: {:04x}",
                self.pc,
                mem.read_word(self.pc),
                mem.read_word(self.pc.wrapping_add(2) as usize),
            )
            .bold()
            .red()
        );
        error
    }

    /// Dumps the current state of all CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0200, SP: 0000, I: 0000
    /// v0: 00 v1: 00 v2: 00 v3: 00
    /// v4: 00 v5: 00 v6: 00 v7: 00
    /// v8: 00 v9: 00 vA: 00 vB: 00
    /// vC: 00 vD: 00 vE: 00 vF: 00
    /// DLY: 0, SND: 0, CYC:      0
    /// ```
    pub fn dump(&self) {
        std::println!(
            "PC: {:04x}, SP: {:04x}, I: {:04x}\n{}DLY: {}, SND: {}, CYC: {:6}",
            self.pc,
            self.sp,
            self.i,
            self.v
                .into_iter()
                .enumerate()
                .map(|(i, gpr)| {
                    format!(
                        "v{i:X}: {gpr:02x} {}",
                        match i % 4 {
                            3 => "\n",
                            _ => "",
                        }
                    )
                })
                .collect::<String>(),
            self.delay,
            self.sound,
            self.cycle,
        );
    }
}

impl Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("flags", &self.flags)
            .field("quirks", &self.quirks)
            .field("stack", &self.stack())
            .field("pc", &self.pc)
            .field("i", &self.i)
            .field("v", &self.v)
            .field("delay", &self.delay)
            .field("sound", &self.sound)
            .field("cycle", &self.cycle)
            .field("breakpoints", &self.breakpoints)
            .finish_non_exhaustive()
    }
}

impl Default for CPU {
    /// Constructs a new CPU with no quirks, no breakpoints, and default [Flags]
    ///
    /// # Examples
    /// ```rust
    /// use chirp8::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(Quirks::default(), cpu.quirks());
    /// ```
    fn default() -> Self {
        CPU::new(Quirks::default(), Flags::default(), vec![])
    }
}
