// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Mem represents the interpreter's 4 KiB of byte-addressable memory
//!
//! Addresses wrap: every access is reduced modulo [MEM_SIZE]

use crate::error::{Error, Result};
use owo_colors::{OwoColorize, Style};
use std::{
    fmt::{Display, Formatter},
    ops::Range,
};

/// Size of the address space, in bytes
pub const MEM_SIZE: usize = 0x1000;
/// Address the built-in [FONT] is loaded at
pub const FONT_ADDR: u16 = 0x000;
/// Address programs are loaded at, and where execution starts
pub const PROGRAM_ADDR: u16 = 0x200;
/// Number of bytes in a single font glyph
pub const GLYPH_LEN: u16 = 5;

/// The built-in hexadecimal font: 16 glyphs (`0`..=`F`), 5 rows each
#[rustfmt::skip]
pub const FONT: [u8; 80] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xf0, 0x10, 0xf0, 0x80, 0xf0, // 2
    0xf0, 0x10, 0xf0, 0x10, 0xf0, // 3
    0x90, 0x90, 0xf0, 0x10, 0x10, // 4
    0xf0, 0x80, 0xf0, 0x10, 0xf0, // 5
    0xf0, 0x80, 0xf0, 0x90, 0xf0, // 6
    0xf0, 0x10, 0x20, 0x40, 0x40, // 7
    0xf0, 0x90, 0xf0, 0x90, 0xf0, // 8
    0xf0, 0x90, 0xf0, 0x10, 0xf0, // 9
    0xf0, 0x90, 0xf0, 0x90, 0x90, // A
    0xe0, 0x90, 0xe0, 0x90, 0xe0, // B
    0xf0, 0x80, 0x80, 0x80, 0xf0, // C
    0xe0, 0x90, 0x90, 0x90, 0xe0, // D
    0xf0, 0x80, 0xf0, 0x80, 0xf0, // E
    0xf0, 0x80, 0xf0, 0x80, 0x80, // F
];

/// Represents a named region in memory
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Character ROM (but writable!)
    Charset,
    /// Program memory
    Program,
}

impl Region {
    /// Gets the address range covered by this [Region]
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// assert_eq!(0x200..0x1000, Program.range());
    /// ```
    pub fn range(self) -> Range<usize> {
        match self {
            Region::Charset => FONT_ADDR as usize..FONT_ADDR as usize + FONT.len(),
            Region::Program => PROGRAM_ADDR as usize..MEM_SIZE,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Charset => "Charset",
                Region::Program => "Program",
            }
        )
    }
}

/// Flat, wrapping byte store, with the [FONT] preloaded at [FONT_ADDR]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Mem {
    memory: Vec<u8>,
}

impl Mem {
    /// Constructs a zeroed [Mem] with the built-in font loaded
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mem = Mem::new();
    /// assert_eq!(0xf0, mem.read_byte(0u16));
    /// assert_eq!(0x00, mem.read_byte(0x200u16));
    /// ```
    pub fn new() -> Self {
        let mut mem = Mem {
            memory: vec![0; MEM_SIZE],
        };
        mem.load_font(&FONT);
        mem
    }

    /// Gets the length of the backing memory
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the backing memory contains no elements
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    #[inline(always)]
    fn wrap(&self, addr: impl Into<usize>) -> usize {
        addr.into() % self.memory.len()
    }

    /// Reads the byte at `addr`, modulo the size of memory
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut mem = Mem::new();
    /// mem.write_byte(0x1234u16, 0xaa);
    /// assert_eq!(0xaa, mem.read_byte(0x234u16));
    /// ```
    #[inline(always)]
    pub fn read_byte(&self, addr: impl Into<usize>) -> u8 {
        self.memory[self.wrap(addr)]
    }

    /// Writes `value` to the byte at `addr`, modulo the size of memory
    #[inline(always)]
    pub fn write_byte(&mut self, addr: impl Into<usize>, value: u8) {
        let addr = self.wrap(addr);
        self.memory[addr] = value;
    }

    /// Reads a big-endian word starting at `addr`
    ///
    /// The second byte wraps independently, so a word at the last
    /// address takes its low byte from address 0.
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut mem = Mem::new();
    /// mem.write_byte(0x200u16, 0x60);
    /// mem.write_byte(0x201u16, 0x05);
    /// assert_eq!(0x6005, mem.read_word(0x200u16));
    /// ```
    #[inline(always)]
    pub fn read_word(&self, addr: impl Into<usize>) -> u16 {
        let addr = addr.into();
        u16::from_be_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    /// Copies a font table into memory, starting at [FONT_ADDR]
    pub fn load_font(&mut self, font: &[u8]) -> &mut Self {
        for (offset, &byte) in font.iter().enumerate() {
            self.write_byte(FONT_ADDR as usize + offset, byte);
        }
        self
    }

    /// Copies a program into memory, starting at [PROGRAM_ADDR]
    ///
    /// Returns [Error::ProgramTooLarge] if the program doesn't fit in [Region::Program]
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// # fn main() -> Result<()> {
    /// let mut mem = Mem::new();
    /// mem.load_program(&[0x00, 0xe0])?;
    /// assert_eq!(0x00e0, mem.read_word(0x200u16));
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_program(&mut self, rom: &[u8]) -> Result<&mut Self> {
        self.load_region(Region::Program, rom)
    }

    /// Loads data into the start of a named [Region]
    pub fn load_region(&mut self, name: Region, data: &[u8]) -> Result<&mut Self> {
        let region = self.get_region_mut(name);
        if data.len() > region.len() {
            return Err(Error::ProgramTooLarge {
                len: data.len(),
                max: region.len(),
            });
        }
        region[..data.len()].copy_from_slice(data);
        Ok(self)
    }

    /// Fills a [Region] with zeroes
    pub fn clear_region(&mut self, name: Region) -> &mut Self {
        self.get_region_mut(name).fill(0);
        self
    }

    /// Gets a slice of a named [Region] of memory
    pub fn get_region(&self, name: Region) -> &[u8] {
        &self.memory[name.range()]
    }

    /// Gets a mutable slice of a named [Region] of memory
    pub fn get_region_mut(&mut self, name: Region) -> &mut [u8] {
        &mut self.memory[name.range()]
    }

    /// Zeroes all of memory, then reloads the built-in font
    pub fn reset(&mut self) -> &mut Self {
        self.memory.fill(0);
        self.load_font(&FONT)
    }

    /// Exposes the entire contents of memory, for snapshotting
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mem = Mem::new();
    /// assert_eq!(&FONT[..], &mem.dump()[..80]);
    /// ```
    pub fn dump(&self) -> &[u8] {
        &self.memory
    }
}

impl Default for Mem {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Mem {
    /// Formats memory as a hexdump, collapsing repeated lines into `*`
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Green phosphor style formatting, for taste
        let term: Style = Style::new().bold().green().on_black();
        let mut last: Option<&[u8]> = None;
        let mut skipping = false;
        for (line, bytes) in self.memory.chunks(16).enumerate() {
            if last == Some(bytes) {
                if !skipping {
                    writeln!(f, "*")?;
                    skipping = true;
                }
                continue;
            }
            skipping = false;
            last = Some(bytes);
            write!(f, "{:03x}{} ", (line * 16).style(term), ":".style(term))?;
            for (index, byte) in bytes.iter().enumerate() {
                write!(f, "{byte:02x}")?;
                match index % 16 {
                    0xf => (),
                    0x7 => write!(f, "  ")?,
                    _ if index % 2 == 1 => write!(f, " ")?,
                    _ => (),
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
