// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Tracks the state of the 16-key hexadecimal keypad

use crate::error::{Error, Result};

/// The sixteen logical keys `0`..=`F`, and the most recent keydown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Keypad {
    keys: [bool; 16],
    lastkey: Option<u8>,
}

impl Keypad {
    /// Creates a new [Keypad] with every key released
    pub fn new() -> Self {
        Self::default()
    }

    /// Presses a key, and reports whether the key's state changed.
    /// If key does not exist, returns [Error::InvalidKey].
    ///
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut keys = Keypad::new();
    ///
    /// // press key `7`
    /// let did_press = keys.press(0x7).unwrap();
    /// assert!(did_press);
    ///
    /// // press key `7` again, even though it's already pressed
    /// let did_press = keys.press(0x7).unwrap();
    /// // it was already pressed, so nothing's changed.
    /// assert!(!did_press);
    /// ```
    pub fn press(&mut self, key: usize) -> Result<bool> {
        let keyref = self.keys.get_mut(key).ok_or(Error::InvalidKey { key })?;
        if *keyref {
            return Ok(false);
        }
        *keyref = true;
        self.lastkey = Some(key as u8);
        Ok(true)
    }

    /// Releases a key, and reports whether the key's state changed.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    /// # Examples
    /// ```rust
    /// # use chirp8::*;
    /// let mut keys = Keypad::new();
    /// keys.press(0x7).unwrap();
    /// assert!(keys.release(0x7).unwrap()); // key released
    /// assert!(!keys.release(0x7).unwrap()); // key was not held
    /// ```
    pub fn release(&mut self, key: usize) -> Result<bool> {
        let keyref = self.keys.get_mut(key).ok_or(Error::InvalidKey { key })?;
        Ok(std::mem::replace(keyref, false))
    }

    /// Releases every key, and forgets the last keydown
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    /// Checks whether the key named by the low nibble of `key` is held
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[key as usize & 0xf]
    }

    /// Takes the most recent keydown, if one happened since the last call
    pub fn take_press(&mut self) -> Option<u8> {
        self.lastkey.take()
    }

    /// Gets the held state of every key
    pub fn keys(&self) -> &[bool; 16] {
        &self.keys
    }
}
