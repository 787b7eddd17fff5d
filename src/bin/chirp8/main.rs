// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Chirp8: A chip-8 interpreter in Rust
//! Hello, world!

mod ui;

use chirp8::error::Error::BreakpointHit;
use chirp8::{error::Result, *};
use gumdrop::*;
use owo_colors::OwoColorize;
use std::{path::PathBuf, time::Instant};
use ui::*;

pub fn main() -> Result<()> {
    let options = Arguments::parse_args_default_or_exit();
    let state = State::new(options)?;
    for result in state {
        if let Err(e) = result {
            eprintln!("{}", e.bold().red());
            break;
        }
    }
    Ok(())
}

/// Parses a hexadecimal string into a u16
fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value.trim_start_matches("0x"), 16)
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Load a ROM to run on Chirp8.", required, free)]
    pub file: PathBuf,
    #[options(help = "Print this help message.")]
    help: bool,
    #[options(help = "Enable debug mode at startup.")]
    pub debug: bool,
    #[options(help = "Enable pause mode at startup.")]
    pub pause: bool,

    #[options(help = "Set the instructions-per-frame rate.", default = "10")]
    pub speed: usize,
    #[options(help = "Set the target framerate.", default = "60", meta = "FR")]
    pub frame_rate: u32,

    #[options(help = "Run in (Chip8, SChip) mode.")]
    pub mode: Option<Mode>,

    #[options(
        short = "c",
        help = "Toggle COSMAC VIP style DMA instructions, which leave I at I+x+1."
    )]
    pub memory: bool,

    #[options(
        short = "v",
        help = "Toggle COSMAC VIP style bit-shifts, which source from vY."
    )]
    pub shift: bool,

    #[options(
        long = "break",
        help = "Set breakpoints for the emulator to stop at.",
        parse(try_from_str = "parse_hex"),
        meta = "BP"
    )]
    pub breakpoints: Vec<u16>,

    #[options(help = "Set the window scale (1, 2, 4, 8, 16, 32).", default = "16")]
    pub scale: usize,
}

#[derive(Debug)]
struct State {
    pub speed: usize,
    pub ch8: Chip8,
    pub ui: UI,
    pub frames: Ticker,
    pub timers: Ticker,
    pub tone: bool,
}

impl State {
    fn new(options: Arguments) -> Result<Self> {
        let mut quirks: Quirks = options.mode.unwrap_or_default().into();
        // Flip the state of the quirks
        quirks.dma_inc ^= options.memory;
        quirks.shift ^= options.shift;

        let mut ch8 = Chip8::new(quirks);
        ch8.load_rom(&options.file)?;
        ch8.cpu.flags = Flags {
            debug: options.debug,
            pause: options.pause,
            ..Default::default()
        };
        for point in options.breakpoints {
            ch8.cpu.set_break(point);
        }

        let now = Instant::now();
        Ok(State {
            speed: options.speed,
            ch8,
            ui: UIBuilder::new(options.scale, &options.file).build()?,
            frames: Ticker::starting_at(options.frame_rate, now),
            timers: Ticker::starting_at(TIMER_HZ, now),
            tone: false,
        })
    }
    fn keys(&mut self) -> Result<bool> {
        self.ui.keys(&mut self.ch8)
    }
    fn frame(&mut self) -> Result<bool> {
        self.ui.frame(&mut self.ch8)
    }
    /// Counts the timers down, ringing the bell when a tone starts
    fn tick_timers(&mut self, now: Instant) {
        for _ in 0..self.timers.ticks(now) {
            let tone = self.ch8.tick_timers();
            if tone && !self.tone {
                eprint!("\x07");
            }
            self.tone = tone;
        }
    }
    fn tick_cpu(&mut self, now: Instant) -> Result<()> {
        let frames = self.frames.ticks(now) as usize;
        if !self.ch8.cpu.flags.pause {
            self.ch8.multistep(self.speed * frames)?;
        }
        Ok(())
    }
    fn wait_for_next_frame(&mut self) {
        std::thread::sleep(self.frames.remaining(Instant::now()));
    }
}

impl Iterator for State {
    type Item = Result<()>;

    /// One frame: input, timers, a batch of instructions, then the screen
    fn next(&mut self) -> Option<Self::Item> {
        self.wait_for_next_frame();
        match self.keys() {
            Ok(opt) if !opt => return None,
            Err(e) if !e.is_fatal() => eprintln!("{e}"),
            Err(e) => return Some(Err(e)),
            _ => (),
        }
        let now = Instant::now();
        self.tick_timers(now);
        // Allow breakpoint hit messages
        match self.tick_cpu(now) {
            Err(BreakpointHit { addr, next }) => {
                eprintln!("Breakpoint hit: {:3x} ({:4x})", addr, next);
            }
            Err(e) => return Some(Err(e)),
            _ => (),
        }
        match self.frame() {
            Ok(opt) if !opt => return None,
            Err(e) => return Some(Err(e)),
            _ => (),
        }
        Some(Ok(()))
    }
}
