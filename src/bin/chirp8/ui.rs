// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Platform-specific IO/UI code, and some debug functionality.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    time::Instant,
};

use chirp8::{
    error::{Error::BreakpointHit, Result},
    Chip8, Screen,
};
use minifb::*;

#[derive(Clone, Debug)]
pub struct UIBuilder {
    pub width: usize,
    pub height: usize,
    pub name: Option<&'static str>,
    pub rom: Option<PathBuf>,
    pub window_options: WindowOptions,
}

impl UIBuilder {
    pub fn new(scale: usize, rom: impl AsRef<Path>) -> Self {
        let mut builder = UIBuilder {
            rom: Some(rom.as_ref().to_owned()),
            ..Default::default()
        };
        builder.window_options.scale = match scale {
            1 => Scale::X1,
            2 => Scale::X2,
            4 => Scale::X4,
            8 => Scale::X8,
            16 => Scale::X16,
            32 => Scale::X32,
            _ => Scale::FitScreen,
        };
        builder
    }
    pub fn build(&self) -> Result<UI> {
        let ui = UI {
            window: Window::new(
                self.name.unwrap_or_default(),
                self.width,
                self.height,
                self.window_options,
            )?,
            keyboard: Default::default(),
            fb: FrameBuffer::new(self.width, self.height),
            rom: self.rom.to_owned().unwrap_or_default(),
            time: Instant::now(),
        };
        Ok(ui)
    }
}

impl Default for UIBuilder {
    fn default() -> Self {
        UIBuilder {
            width: chirp8::screen::WIDTH,
            height: chirp8::screen::HEIGHT,
            name: Some("Chip-8 Interpreter"),
            rom: None,
            window_options: WindowOptions {
                title: true,
                resize: false,
                scale: Scale::X16,
                scale_mode: ScaleMode::AspectRatioStretch,
                none: true,
                ..Default::default()
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameBufferFormat {
    pub fg: u32,
    pub bg: u32,
}

impl Default for FrameBufferFormat {
    fn default() -> Self {
        FrameBufferFormat {
            fg: 0x0011a434,
            bg: 0x001E2431,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameBuffer {
    buffer: Vec<u32>,
    width: usize,
    height: usize,
    format: FrameBufferFormat,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let format = FrameBufferFormat::default();
        FrameBuffer {
            buffer: vec![format.bg; width * height],
            width,
            height,
            format,
        }
    }
    /// Repaints the window if the screen changed, or just pumps its events if not
    pub fn render(&mut self, window: &mut Window, screen: &mut Screen) -> Result<()> {
        if !screen.take_dirty() {
            window.update();
            return Ok(());
        }
        let width = self.width;
        for (y, row) in screen.pixels().enumerate().take(self.height) {
            for (x, lit) in row.enumerate().take(width) {
                self.buffer[y * width + x] = if lit { self.format.fg } else { self.format.bg };
            }
        }
        window.update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct UI {
    window: Window,
    keyboard: Vec<Key>,
    fb: FrameBuffer,
    rom: PathBuf,
    time: Instant,
}

impl UI {
    pub fn frame(&mut self, ch8: &mut Chip8) -> Result<bool> {
        if ch8.cpu.flags.pause {
            self.window.set_title("Chirp8 ⏸")
        } else {
            self.window.set_title(&format!(
                "Chirp8  ▶ {:02.02}",
                (1.0 / self.time.elapsed().as_secs_f64())
            ));
        }
        if !self.window.is_open() {
            return Ok(false);
        }
        self.time = Instant::now();
        // update framebuffer
        self.fb.render(&mut self.window, &mut ch8.screen)?;
        Ok(true)
    }

    pub fn keys(&mut self, ch8: &mut Chip8) -> Result<bool> {
        let held = self.window.get_keys();
        for &key in self.keyboard.iter().filter(|key| !held.contains(key)) {
            if let Some(key) = identify_key(key) {
                ch8.keys.release(key)?;
            }
        }
        // handle keybinds for the UI
        for &key in held.iter().filter(|key| !self.keyboard.contains(key)) {
            use Key::*;
            match key {
                F1 | Comma => ch8.cpu.dump(),
                F2 | Period => println!("{}", ch8.screen),
                F3 => dump_memory(ch8, &self.rom)?,
                F4 | Slash => {
                    ch8.cpu.flags.debug();
                    eprintln!(
                        "Debug {}.",
                        if ch8.cpu.flags.debug { "enabled" } else { "disabled" }
                    )
                }
                F5 | Backslash => {
                    ch8.cpu.flags.pause();
                    eprintln!(
                        "{}.",
                        if ch8.cpu.flags.pause { "Paused" } else { "Unpaused" }
                    )
                }
                F6 | Enter => {
                    eprintln!("Step");
                    step(ch8)?;
                }
                F7 => {
                    eprintln!("Set breakpoint {:03x}.", ch8.cpu.pc());
                    ch8.cpu.set_break(ch8.cpu.pc());
                }
                F8 => {
                    eprintln!("Unset breakpoint {:03x}.", ch8.cpu.pc());
                    ch8.cpu.unset_break(ch8.cpu.pc());
                }
                F9 | Delete => {
                    eprintln!("Reset from {:03x}", ch8.cpu.pc());
                    ch8.reset()?;
                }
                Escape => return Ok(false),
                key => {
                    if let Some(key) = identify_key(key) {
                        ch8.keys.press(key)?;
                    }
                }
            }
        }
        self.keyboard = held;
        Ok(true)
    }
}

pub fn identify_key(key: Key) -> Option<usize> {
    match key {
        Key::Key1 => Some(0x1),
        Key::Key2 => Some(0x2),
        Key::Key3 => Some(0x3),
        Key::Key4 => Some(0xc),
        Key::Q => Some(0x4),
        Key::W => Some(0x5),
        Key::E => Some(0x6),
        Key::R => Some(0xD),
        Key::A => Some(0x7),
        Key::S => Some(0x8),
        Key::D => Some(0x9),
        Key::F => Some(0xE),
        Key::Z => Some(0xA),
        Key::X => Some(0x0),
        Key::C => Some(0xB),
        Key::V => Some(0xF),
        _ => None,
    }
}

/// Runs one instruction, reporting a breakpoint stop instead of failing
pub fn step(ch8: &mut Chip8) -> Result<()> {
    match ch8.singlestep() {
        Err(BreakpointHit { addr, next }) => {
            eprintln!("Breakpoint hit: {:3x} ({:4x})", addr, next);
        }
        Err(e) => return Err(e),
        Ok(_) => (),
    }
    Ok(())
}

/// Writes all of memory to `<rom>_<cycle>.bin` in the working directory
pub fn dump_memory(ch8: &Chip8, rom: &Path) -> Result<()> {
    let path = PathBuf::from(format!(
        "{}_{}.bin",
        rom.file_stem()
            .unwrap_or(OsStr::new("chirp8"))
            .to_string_lossy(),
        ch8.cpu.cycle()
    ));
    std::fs::write(&path, ch8.mem.dump())?;
    eprintln!("Saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypad_layout() {
        let layout = [
            [Key::Key1, Key::Key2, Key::Key3, Key::Key4],
            [Key::Q, Key::W, Key::E, Key::R],
            [Key::A, Key::S, Key::D, Key::F],
            [Key::Z, Key::X, Key::C, Key::V],
        ];
        let expected = [
            [0x1, 0x2, 0x3, 0xc],
            [0x4, 0x5, 0x6, 0xd],
            [0x7, 0x8, 0x9, 0xe],
            [0xa, 0x0, 0xb, 0xf],
        ];
        for (keys, values) in layout.iter().zip(expected) {
            for (&key, value) in keys.iter().zip(values) {
                assert_eq!(Some(value), identify_key(key));
            }
        }
        assert_eq!(None, identify_key(Key::Key5));
    }

    #[test]
    fn step_onto_breakpoint_keeps_running() {
        let mut ch8 = Chip8::default();
        ch8.load_program(&[0x60, 0x01, 0x61, 0x02, 0x62, 0x03]).unwrap();
        ch8.cpu.set_break(0x202);
        step(&mut ch8).unwrap();
        assert_eq!(0x202, ch8.cpu.pc());
        assert!(ch8.cpu.flags.pause);
        step(&mut ch8).unwrap();
        assert_eq!(0x204, ch8.cpu.pc());
        assert_eq!(0x02, ch8.cpu.v()[1]);
    }

    #[test]
    fn step_into_bad_opcode_fails() {
        let mut ch8 = Chip8::default();
        ch8.load_program(&[0x5f, 0xff]).unwrap();
        assert!(step(&mut ch8).unwrap_err().is_fatal());
    }

    #[test]
    fn framebuffer_starts_blank() {
        let fb = FrameBuffer::new(64, 32);
        assert!(fb.buffer.iter().all(|&px| px == fb.format.bg));
    }
}
