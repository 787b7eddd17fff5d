// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Disassembles a Chip-8 ROM, one instruction per line
use chirp8::{error::Result, *};
use gumdrop::*;
use owo_colors::OwoColorize;
use std::{fs::read, path::PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Show help text")]
    help: bool,
    #[options(help = "Load a ROM to disassemble", free, required)]
    pub file: PathBuf,
    #[options(
        help = "Load address (usually 200)",
        default = "200",
        parse(try_from_str = "parse_hex")
    )]
    pub loadaddr: u16,
    #[options(help = "Start disassembling at offset...")]
    pub offset: usize,
    #[options(help = "Don't color the output")]
    pub plain: bool,
}

fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value.trim_start_matches("0x"), 16)
}

fn main() -> Result<()> {
    let options = Arguments::parse_args_default_or_exit();
    let contents = read(&options.file)?;
    let disassembler = if options.plain {
        Dis::plain()
    } else {
        Dis::default()
    };
    let start = options.offset.min(contents.len());
    for (index, word) in contents[start..].chunks_exact(2).enumerate() {
        let word = u16::from_be_bytes([word[0], word[1]]);
        let addr = options.loadaddr as usize + start + 2 * index;
        if options.plain {
            println!("{addr:03x}: {} {word:04x}", disassembler.once(word));
        } else {
            println!(
                "{:03x}: {} {:04x}",
                addr,
                disassembler.once(word),
                word.bright_black(),
            );
        }
    }
    Ok(())
}
