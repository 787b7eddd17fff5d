// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Stores and displays the Chip-8's screen memory
//!
//! Pixels are packed eight to a byte, most significant bit leftmost,
//! in row-major order. All coordinates wrap around the edges of the screen.

use std::fmt::{Display, Formatter};

/// Width of the screen, in pixels
pub const WIDTH: usize = 64;
/// Height of the screen, in pixels
pub const HEIGHT: usize = 32;

/// A monochrome, toroidal framebuffer
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Screen {
    bits: Vec<u8>,
    width: usize,
    height: usize,
    dirty: bool,
}

impl Screen {
    /// Creates a new, blank [Screen] with the given dimensions
    ///
    /// # Panics
    /// Panics if either dimension is zero
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "screen must have a nonzero area");
        Screen {
            bits: vec![0; (width * height + 7) / 8],
            width,
            height,
            dirty: true,
        }
    }

    /// Gets the width of the screen, in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Gets the height of the screen, in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Maps (x, y) to a (byte, mask) pair, wrapping both coordinates
    #[inline(always)]
    fn locate(&self, x: usize, y: usize) -> (usize, u8) {
        let index = (y % self.height) * self.width + (x % self.width);
        (index / 8, 0x80 >> (index % 8))
    }

    /// Turns every pixel off
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut screen = Screen::default();
    /// screen.toggle_pixel(3, 4);
    /// screen.clear();
    /// assert!(!screen.pixel(3, 4));
    /// ```
    pub fn clear(&mut self) {
        self.bits.fill(0);
        self.dirty = true;
    }

    /// Flips the pixel at (x, y), after wrapping both coordinates onto the screen.
    ///
    /// Returns true if the pixel was on, and is now off (a collision)
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut screen = Screen::default();
    /// assert!(!screen.toggle_pixel(64, 0)); // (0, 0) turns on
    /// assert!(screen.toggle_pixel(0, 32)); // (0, 0) turns off again
    /// ```
    pub fn toggle_pixel(&mut self, x: usize, y: usize) -> bool {
        let (byte, mask) = self.locate(x, y);
        let collided = self.bits[byte] & mask != 0;
        self.bits[byte] ^= mask;
        self.dirty = true;
        collided
    }

    /// Gets the state of the pixel at (x, y), after wrapping both coordinates
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        let (byte, mask) = self.locate(x, y);
        self.bits[byte] & mask != 0
    }

    /// Returns whether the screen changed since the last call, and clears the flag
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut screen = Screen::default();
    /// screen.take_dirty();
    /// assert!(!screen.take_dirty());
    /// screen.toggle_pixel(0, 0);
    /// assert!(screen.take_dirty());
    /// assert!(!screen.take_dirty());
    /// ```
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Flags the screen for presentation, even if no pixel changed
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether the screen changed since it was last presented
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns true if no pixel is on
    pub fn is_blank(&self) -> bool {
        self.bits.iter().all(|&byte| byte == 0)
    }

    /// Iterates over the rows of the screen, top to bottom
    pub fn pixels(&self) -> impl Iterator<Item = impl Iterator<Item = bool> + '_> + '_ {
        (0..self.height).map(move |y| (0..self.width).map(move |x| self.pixel(x, y)))
    }

    /// Gets the packed screen memory
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}

impl Default for Screen {
    /// A standard 64x32 screen
    fn default() -> Self {
        Self::new(WIDTH, HEIGHT)
    }
}

impl Display for Screen {
    /// Draws the screen with full blocks for lit pixels
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.pixels() {
            for pixel in row {
                write!(f, "{}", if pixel { '█' } else { ' ' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
