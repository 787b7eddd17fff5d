// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Unit tests for [super::CPU]
//!
//! These run instructions, and ensure their output is consistent with previous builds
//!
//! General test format:
//! 1. Prepare to do the thing
//! 2. Do the thing
//! 3. Compare the result to the expected result

use super::*;
use crate::mem::{Region::Program, FONT};
use rand::random;


fn setup_environment() -> (CPU, Mem, Screen, Keypad) {
    let mut mem = Mem::new();
    mem.load_program(&[
        0x60, 0x05, // mov #05, v0
        0x12, 0x02, // jmp 202
    ])
    .unwrap();
    (CPU::default(), mem, Screen::default(), Keypad::new())
}

fn with_quirks(quirks: Quirks) -> CPU {
    CPU::new(quirks, Flags::default(), vec![])
}

/// Writes a single instruction at pc, and runs it
fn run_op(cpu: &mut CPU, mem: &mut Mem, screen: &mut Screen, keys: &mut Keypad, op: u16) -> Result<()> {
    let [hi, lo] = op.to_be_bytes();
    mem.write_byte(cpu.pc, hi);
    mem.write_byte(cpu.pc.wrapping_add(1), lo);
    cpu.tick(mem, screen, keys).map(|_| ())
}

/// Unused instructions
mod unimplemented {
    use super::*;

    fn assert_unknown(op: u16) {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        let before = cpu.clone();
        match run_op(&mut cpu, &mut mem, &mut screen, &mut keys, op) {
            Err(Error::UnknownOpcode { word }) => assert_eq!(op, word),
            other => panic!("{op:04x} should not be an instruction, got {other:?}"),
        }
        // a faulting step leaves the CPU untouched, cycle count included
        assert_eq!(before, cpu);
    }

    #[test]
    fn ins_0nnn() {
        assert_unknown(0x0000);
        assert_unknown(0x0123);
        assert_unknown(0x00fd);
    }
    #[test]
    fn ins_5xyn() {
        assert_unknown(0x500f);
        assert_unknown(0x5fff);
    }
    #[test]
    fn ins_8xyn() {
        for n in [0x8, 0x9, 0xa, 0xb, 0xc, 0xd, 0xf] {
            assert_unknown(0x8120 | n);
        }
    }
    #[test]
    fn ins_9xyn() {
        assert_unknown(0x900f);
    }
    #[test]
    fn ins_exbb() {
        assert_unknown(0xe00f);
        assert_unknown(0xe19f);
    }
    #[test]
    fn ins_fxbb() {
        assert_unknown(0xf00f);
        assert_unknown(0xf030);
        assert_unknown(0xf075);
    }
}

mod sys {
    use super::*;
    /// 00e0: Clears the screen memory to 0
    #[test]
    fn clear_screen() {
        let (mut cpu, _, mut screen, _) = setup_environment();
        for _ in 0..100 {
            screen.toggle_pixel(random::<u8>() as usize, random::<u8>() as usize);
        }
        screen.take_dirty();
        cpu.clear_screen(&mut screen);
        assert!(screen.is_blank());
        assert!(screen.take_dirty());
    }

    /// 00ee: Returns from subroutine
    #[test]
    fn ret() {
        let test_addr = random::<u16>() & 0x7ff;
        let (mut cpu, ..) = setup_environment();
        // Place the address on the stack
        cpu.stack[0] = test_addr;
        cpu.sp = 1;

        cpu.ret().unwrap();

        // Verify the current address is the address from the stack
        assert_eq!(test_addr, cpu.pc);
        assert!(cpu.stack().is_empty());
    }

    /// 00ee: Returning with nothing on the stack is an error
    #[test]
    fn ret_underflow() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        match run_op(&mut cpu, &mut mem, &mut screen, &mut keys, 0x00ee) {
            Err(Error::StackUnderflow { pc }) => assert_eq!(0x200, pc),
            other => panic!("expected StackUnderflow, got {other:?}"),
        }
        assert_eq!(0x200, cpu.pc);
    }
}

/// Tests control-flow instructions
///
/// Basically anything that touches the program counter
mod cf {
    use super::*;
    /// 1aaa: Sets the program counter to an absolute address
    #[test]
    fn jump() {
        let (mut cpu, ..) = setup_environment();
        // Test all valid addresses
        for addr in 0x000..0x1000 {
            // Jump to an address
            cpu.jump(addr);
            // Verify the current address is the jump target address
            assert_eq!(addr, cpu.pc);
        }
    }

    /// 1aaa: Executing a jump lands exactly on the target
    #[test]
    fn jump_tick() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        for addr in 0x200..=0xfff {
            cpu.pc = 0x200;
            run_op(&mut cpu, &mut mem, &mut screen, &mut keys, 0x1000 | addr).unwrap();
            assert_eq!(addr, cpu.pc);
        }
    }

    /// 2aaa: Pushes pc onto the stack, then jumps to a
    #[test]
    fn call() {
        let test_addr = random::<u16>();
        let (mut cpu, ..) = setup_environment();
        // Save the current address
        let curr_addr = cpu.pc;
        // Call an address
        cpu.call(test_addr).unwrap();
        // Verify the current address is the called address
        assert_eq!(test_addr, cpu.pc);
        // Verify the previous address was stored on the stack
        assert_eq!(&[curr_addr], cpu.stack());
    }

    /// 2aaa + 00ee: every nesting depth returns to where it was called from
    #[test]
    fn call_ret_every_depth() {
        let (mut cpu, ..) = setup_environment();
        let mut trail = vec![];
        for depth in 1..=STACK_DEPTH {
            let addr = 0x200 + 0x10 * depth as Adr;
            trail.push(cpu.pc);
            cpu.call(addr).unwrap();
            assert_eq!(depth, cpu.stack().len());
            assert_eq!(addr, cpu.pc);
        }
        while let Some(expected) = trail.pop() {
            cpu.ret().unwrap();
            assert_eq!(expected, cpu.pc);
        }
        assert!(cpu.stack().is_empty());
    }

    /// 2aaa: the 17th nested call overflows the stack
    #[test]
    fn call_overflow() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        // A subroutine that calls itself forever
        mem.write_byte(0x300u16, 0x23);
        mem.write_byte(0x301u16, 0x00);
        cpu.pc = 0x300;
        for _ in 0..STACK_DEPTH {
            cpu.tick(&mut mem, &mut screen, &mut keys).unwrap();
        }
        assert_eq!(&[0x302u16; STACK_DEPTH], cpu.stack());
        match cpu.tick(&mut mem, &mut screen, &mut keys) {
            Err(Error::StackOverflow { pc }) => assert_eq!(0x300, pc),
            other => panic!("expected StackOverflow, got {other:?}"),
        }
        // Nothing was pushed, and pc still points at the call
        assert_eq!(STACK_DEPTH, cpu.stack().len());
        assert_eq!(0x300, cpu.pc);
        assert_eq!(STACK_DEPTH, cpu.cycle());
    }

    /// 3xbb: Skips the next instruction if register X == b
    #[test]
    fn skip_equals_immediate() {
        let (mut cpu, ..) = setup_environment();
        for word in 0..=0xffff {
            let (a, b, addr) = (word as u8, (word >> 8) as u8, random::<u16>() & 0x7fe);
            let x = random::<usize>() & 0xf;
            // set the PC to a random address
            cpu.pc = addr;
            cpu.v[x] = a;

            cpu.skip_equals_immediate(x, b);

            assert_eq!(cpu.pc, addr.wrapping_add(if a == b { 2 } else { 0 }));
        }
    }

    /// 4xbb: Skips the next instruction if register X != b
    #[test]
    fn skip_not_equals_immediate() {
        let (mut cpu, ..) = setup_environment();
        for word in 0..=0xffff {
            let (a, b, addr) = (word as u8, (word >> 8) as u8, random::<u16>() & 0x7fe);
            let x = random::<usize>() & 0xf;
            cpu.pc = addr;
            cpu.v[x] = a;

            cpu.skip_not_equals_immediate(x, b);

            assert_eq!(cpu.pc, addr.wrapping_add(if a != b { 2 } else { 0 }));
        }
    }

    /// 5xy0: Skips the next instruction if register X == register Y
    #[test]
    fn skip_equals() {
        let (mut cpu, ..) = setup_environment();
        for word in 0..=0xffff {
            let (a, b, addr) = (word as u8, (word >> 8) as u8, random::<u16>() & 0x7fe);
            let reg = random::<usize>() & 0xff;
            let (x, y) = (reg & 0xf, reg >> 4);
            if x == y {
                continue;
            }
            cpu.pc = addr;
            (cpu.v[x], cpu.v[y]) = (a, b);

            cpu.skip_equals(x, y);

            assert_eq!(cpu.pc, addr.wrapping_add(if a == b { 2 } else { 0 }));
        }
    }

    /// 9xy0: Skip next instruction if X != y
    #[test]
    fn skip_not_equals() {
        let (mut cpu, ..) = setup_environment();
        for word in 0..=0xffff {
            let (a, b, addr) = (word as u8, (word >> 8) as u8, random::<u16>() & 0x7fe);
            let reg = random::<usize>() & 0xff;
            let (x, y) = (reg & 0xf, reg >> 4);
            if x == y {
                continue;
            }
            cpu.pc = addr;
            (cpu.v[x], cpu.v[y]) = (a, b);

            cpu.skip_not_equals(x, y);

            assert_eq!(cpu.pc, addr.wrapping_add(if a != b { 2 } else { 0 }));
        }
    }

    /// Skips are relative to the instruction after the skip
    #[test]
    fn skip_tick() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        run_op(&mut cpu, &mut mem, &mut screen, &mut keys, 0x3000).unwrap();
        assert_eq!(0x204, cpu.pc);
        run_op(&mut cpu, &mut mem, &mut screen, &mut keys, 0x4000).unwrap();
        assert_eq!(0x206, cpu.pc);
    }

    /// Badr: Jump to &adr + v0
    #[test]
    fn jump_indexed() {
        let (mut cpu, ..) = setup_environment();
        // For every valid address
        for addr in 0..0x1000 {
            // For every valid offset
            for v0 in 0..=0xff {
                // set v[0] = v0
                cpu.v[0] = v0;
                // jump indexed
                cpu.jump_indexed(addr);
                // Validate register set
                assert_eq!(cpu.pc, addr.wrapping_add(v0.into()));
            }
        }
    }
}

/// Tests register manipulation, and the ALU
mod math {
    use super::*;

    /// 6xbb: Loads immediate byte b into register vX, touching nothing else
    #[test]
    fn load_immediate() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        for x in 0..=0xf {
            for b in 0..=0xff {
                let before = cpu.v;
                cpu.pc = 0x200;
                run_op(&mut cpu, &mut mem, &mut screen, &mut keys, 0x6000 | (x << 8) as u16 | b as u16)
                    .unwrap();
                for reg in 0..=0xf {
                    let expected = if reg == x { b } else { before[reg] };
                    assert_eq!(expected, cpu.v[reg]);
                }
                assert_eq!(0x202, cpu.pc);
            }
        }
    }

    /// 7xbb: Adds immediate byte b to register vX
    #[test]
    fn add_immediate() {
        let (mut cpu, ..) = setup_environment();
        for x in 0..=0xf {
            for (a, b) in (0..=0xff).zip((0..=0xff).rev()) {
                cpu.v[0xf] = 0xaa;
                cpu.v[x] = a;
                cpu.add_immediate(x, b);
                assert_eq!(cpu.v[x], a.wrapping_add(b));
                if x != 0xf {
                    // vF is not touched
                    assert_eq!(0xaa, cpu.v[0xf]);
                }
            }
        }
        cpu.v[3] = 0xff;
        cpu.add_immediate(3, 2);
        assert_eq!(1, cpu.v[3]);
    }

    /// 8xy0: Loads the value of y into x
    #[test]
    fn load() {
        let (mut cpu, ..) = setup_environment();
        for (x, y) in (0..=0xf).zip((0..=0xf).rev()) {
            let data = random::<u8>();
            cpu.v[y] = data;
            cpu.load(x, y);
            assert_eq!(data, cpu.v[x]);
            assert_eq!(data, cpu.v[y]);
        }
    }

    /// 8xy1, 8xy2, 8xy3: bitwise ops leave vF alone
    #[test]
    fn bitwise() {
        let (mut cpu, ..) = setup_environment();
        type Op = fn(&mut CPU, Reg, Reg);
        for word in 0..=0xffffu16 {
            let [a, b] = word.to_be_bytes();
            let (x, y) = (1, 2);
            let ops = [
                (CPU::or as Op, a | b),
                (CPU::and as Op, a & b),
                (CPU::xor as Op, a ^ b),
            ];
            for (op, expected) in ops {
                (cpu.v[x], cpu.v[y], cpu.v[0xf]) = (a, b, 0xcc);
                op(&mut cpu, x, y);
                assert_eq!(expected, cpu.v[x]);
                assert_eq!(b, cpu.v[y]);
                assert_eq!(0xcc, cpu.v[0xf]);
            }
        }
    }

    /// 8xy4: Performs addition of vX and vY, and stores the result in vX
    #[test]
    fn add() {
        let (mut cpu, ..) = setup_environment();
        for word in 0..=0xffffu16 {
            let [a, b] = word.to_be_bytes();
            let (x, y) = (0x3, 0xa);
            (cpu.v[x], cpu.v[y]) = (a, b);

            cpu.add(x, y);

            let sum = a as u16 + b as u16;
            assert_eq!((sum % 256) as u8, cpu.v[x]);
            assert_eq!((sum > 255) as u8, cpu.v[0xf]);
        }
    }

    /// 8xy5: Performs subtraction of vX and vY, and stores the result in vX
    #[test]
    fn sub() {
        let (mut cpu, ..) = setup_environment();
        for word in 0..=0xffffu16 {
            let [a, b] = word.to_be_bytes();
            let (x, y) = (0x4, 0x9);
            (cpu.v[x], cpu.v[y]) = (a, b);

            cpu.sub(x, y);

            assert_eq!(((a as i16 - b as i16).rem_euclid(256)) as u8, cpu.v[x]);
            assert_eq!((a > b) as u8, cpu.v[0xf]);
        }
    }

    /// 8xy5: vF is cleared when the operands are equal
    #[test]
    fn sub_equal() {
        let (mut cpu, ..) = setup_environment();
        (cpu.v[1], cpu.v[2], cpu.v[0xf]) = (0x42, 0x42, 1);
        cpu.sub(1, 2);
        assert_eq!(0, cpu.v[1]);
        assert_eq!(0, cpu.v[0xf]);
    }

    /// 8xy7: Performs subtraction of vY and vX, and stores the result in vX
    #[test]
    fn backwards_sub() {
        let (mut cpu, ..) = setup_environment();
        for word in 0..=0xffffu16 {
            let [a, b] = word.to_be_bytes();
            let (x, y) = (0x0, 0xe);
            (cpu.v[x], cpu.v[y]) = (a, b);

            cpu.backwards_sub(x, y);

            assert_eq!(b.wrapping_sub(a), cpu.v[x]);
            assert_eq!((b > a) as u8, cpu.v[0xf]);
        }
    }

    /// The flag is written after the result, so it wins when X is vF
    #[test]
    fn flag_wins_in_vf() {
        let (mut cpu, ..) = setup_environment();
        (cpu.v[0xf], cpu.v[1]) = (0xff, 0x02);
        cpu.add(0xf, 1);
        assert_eq!(1, cpu.v[0xf]);
        (cpu.v[0xf], cpu.v[1]) = (0x01, 0x02);
        cpu.sub(0xf, 1);
        assert_eq!(0, cpu.v[0xf]);
    }

    mod shift {
        use super::*;

        /// 8xy6 (quirk off): Shifts vX right in place, ignoring vY
        #[test]
        fn shift_right_in_place() {
            let mut cpu = with_quirks(Quirks::from(false));
            for word in 0..=0xffffu16 {
                let [a, b] = word.to_be_bytes();
                (cpu.v[1], cpu.v[2]) = (a, b);
                cpu.shift_right(1, 2);
                assert_eq!(a >> 1, cpu.v[1]);
                assert_eq!(a & 1, cpu.v[0xf]);
                assert_eq!(b, cpu.v[2]);
            }
        }

        /// 8xy6 (quirk on): Shifts vY right into vX
        #[test]
        fn shift_right_from_vy() {
            let mut cpu = with_quirks(Quirks {
                shift: true,
                ..Default::default()
            });
            for word in 0..=0xffffu16 {
                let [a, b] = word.to_be_bytes();
                (cpu.v[1], cpu.v[2]) = (a, b);
                cpu.shift_right(1, 2);
                assert_eq!(b >> 1, cpu.v[1]);
                assert_eq!(b & 1, cpu.v[0xf]);
                assert_eq!(b, cpu.v[2]);
            }
        }

        /// 8xyE (quirk off): Shifts vX left in place, ignoring vY
        #[test]
        fn shift_left_in_place() {
            let mut cpu = with_quirks(Quirks::from(false));
            for word in 0..=0xffffu16 {
                let [a, b] = word.to_be_bytes();
                (cpu.v[1], cpu.v[2]) = (a, b);
                cpu.shift_left(1, 2);
                assert_eq!(a << 1, cpu.v[1]);
                assert_eq!(a >> 7, cpu.v[0xf]);
                assert_eq!(b, cpu.v[2]);
            }
        }

        /// 8xyE (quirk on): Shifts vY left into vX
        #[test]
        fn shift_left_from_vy() {
            let mut cpu = with_quirks(Quirks {
                shift: true,
                ..Default::default()
            });
            for word in 0..=0xffffu16 {
                let [a, b] = word.to_be_bytes();
                (cpu.v[1], cpu.v[2]) = (a, b);
                cpu.shift_left(1, 2);
                assert_eq!(b << 1, cpu.v[1]);
                assert_eq!(b >> 7, cpu.v[0xf]);
                assert_eq!(b, cpu.v[2]);
            }
        }

        /// The same input diverges between the two quirk settings
        #[test]
        fn quirks_diverge() {
            let (mut mem, mut screen, mut keys) = (Mem::new(), Screen::default(), Keypad::new());
            let mut results = vec![];
            for shift in [false, true] {
                let mut cpu = with_quirks(Quirks {
                    shift,
                    ..Default::default()
                });
                (cpu.v[1], cpu.v[2]) = (0b0000_0011, 0b1000_0000);
                run_op(&mut cpu, &mut mem, &mut screen, &mut keys, 0x8126).unwrap();
                let shr = (cpu.v[1], cpu.v[0xf]);
                (cpu.v[1], cpu.v[2]) = (0b0100_0000, 0b1000_0001);
                run_op(&mut cpu, &mut mem, &mut screen, &mut keys, 0x812e).unwrap();
                results.push((shr, (cpu.v[1], cpu.v[0xf])));
            }
            assert_eq!(((0b0000_0001, 1), (0b1000_0000, 0)), results[0]);
            assert_eq!(((0b0100_0000, 0), (0b0000_0010, 1)), results[1]);
        }
    }
}

/// Tests instructions that touch I, or memory through I
mod i {
    use super::*;

    /// Aadr: Load address #adr into register I
    #[test]
    fn load_i_immediate() {
        let (mut cpu, ..) = setup_environment();
        for addr in 0..0x1000 {
            cpu.load_i_immediate(addr);
            assert_eq!(addr, cpu.i);
        }
    }

    /// Fx1e: Add vX to I, wrapping at 16 bits
    #[test]
    fn add_i() {
        let (mut cpu, ..) = setup_environment();
        for _ in 0..0x10000 {
            let (i, x, v) = (random::<u16>(), random::<usize>() & 0xf, random::<u8>());
            cpu.i = i;
            cpu.v[x] = v;
            cpu.add_i(x);
            assert_eq!(i.wrapping_add(v as u16), cpu.i);
        }
        cpu.i = 0xffff;
        cpu.v[0] = 2;
        cpu.add_i(0);
        assert_eq!(1, cpu.i);
    }

    /// Fx29: Load sprite for character vX into I
    #[test]
    fn load_sprite() {
        let (mut cpu, mem, ..) = setup_environment();
        for glyph in 0..0x10u8 {
            cpu.v[0xa] = glyph;
            cpu.load_sprite(0xa);
            assert_eq!(glyph as u16 * 5, cpu.i);
            let start = glyph as usize * 5;
            assert_eq!(&FONT[start..start + 5], &mem.dump()[cpu.i as usize..cpu.i as usize + 5]);
        }
    }

    /// Fx33: BCD convert X into I`[0..3]`
    #[test]
    fn bcd_convert() {
        let (mut cpu, mut mem, ..) = setup_environment();
        for value in 0..=0xffu8 {
            cpu.i = 0x300;
            cpu.v[5] = value;
            cpu.bcd_convert(5, &mut mem);
            let digits = [value / 100, value / 10 % 10, value % 10];
            assert_eq!(digits, [mem.read_byte(0x300u16), mem.read_byte(0x301u16), mem.read_byte(0x302u16)]);
            // I is left alone
            assert_eq!(0x300, cpu.i);
        }
    }

    /// Fx55 (quirk off): DMA Stor from I to registers 0..=X, leaving I alone
    #[test]
    fn store_dma() {
        let (mut cpu, mut mem, ..) = setup_environment();
        for x in 0..=0xf {
            mem.clear_region(Program);
            cpu.i = 0x400;
            cpu.v = std::array::from_fn(|reg| 0xa0 | reg as u8);
            cpu.store_dma(x, &mut mem);
            for reg in 0..=0xf {
                let expected = if reg <= x { 0xa0 | reg as u8 } else { 0 };
                assert_eq!(expected, mem.read_byte(0x400 + reg));
            }
            assert_eq!(0x400, cpu.i);
        }
    }

    /// Fx65 (quirk off): DMA Load from I to registers 0..=X, leaving I alone
    #[test]
    fn load_dma() {
        let (mut cpu, mut mem, ..) = setup_environment();
        for (offset, byte) in (0x50..0x60).enumerate() {
            mem.write_byte(0x400 + offset, byte);
        }
        for x in 0..=0xf {
            cpu.i = 0x400;
            cpu.v = [0; 16];
            cpu.load_dma(x, &mem);
            for reg in 0..=0xf {
                let expected = if reg <= x { 0x50 + reg as u8 } else { 0 };
                assert_eq!(expected, cpu.v[reg]);
            }
            assert_eq!(0x400, cpu.i);
        }
    }

    /// Fx55/Fx65 (quirk on): I is left at I + X + 1
    #[test]
    fn dma_inc() {
        let mut mem = Mem::new();
        let mut cpu = with_quirks(Quirks {
            dma_inc: true,
            ..Default::default()
        });
        for x in 0..=0xf {
            cpu.i = 0x400;
            cpu.store_dma(x, &mut mem);
            assert_eq!(0x400 + x as u16 + 1, cpu.i);
            cpu.i = 0x400;
            cpu.load_dma(x, &mem);
            assert_eq!(0x400 + x as u16 + 1, cpu.i);
        }
    }

    /// DMA wraps around the end of memory
    #[test]
    fn dma_wraps() {
        let (mut cpu, mut mem, ..) = setup_environment();
        cpu.i = 0xffe;
        cpu.v[..4].copy_from_slice(&[1, 2, 3, 4]);
        cpu.store_dma(3, &mut mem);
        assert_eq!(
            [1, 2, 3, 4],
            [mem.read_byte(0xffeu16), mem.read_byte(0xfffu16), mem.read_byte(0u16), mem.read_byte(1u16)]
        );
    }
}

/// Tests the draw instruction
mod draw {
    use super::*;

    fn draw_glyph(cpu: &mut CPU, mem: &Mem, screen: &mut Screen, glyph: u8, x: u8, y: u8) {
        (cpu.v[0], cpu.v[1], cpu.v[2]) = (glyph, x, y);
        cpu.load_sprite(0);
        cpu.draw(1, 2, 5, mem, screen);
    }

    /// Dxyn: Draws the sprite at I, MSB leftmost
    #[test]
    fn draw() {
        let (mut cpu, mem, mut screen, _) = setup_environment();
        // "1" is 0x20, 0x60, 0x20, 0x20, 0x70
        draw_glyph(&mut cpu, &mem, &mut screen, 1, 10, 4);
        assert_eq!(0, cpu.v[0xf]);
        for (row, &bits) in FONT[5..10].iter().enumerate() {
            for col in 0..8 {
                assert_eq!(bits & (0x80 >> col) != 0, screen.pixel(10 + col, 4 + row));
            }
        }
        assert!(screen.take_dirty());
    }

    /// Dxyn: Drawing a sprite twice erases it, and reports a collision
    #[test]
    fn xor_idempotence() {
        let (mut cpu, mem, mut screen, _) = setup_environment();
        for _ in 0..0x100 {
            let (glyph, x, y) = (random::<u8>() & 0xf, random::<u8>(), random::<u8>());
            let before = screen.clone();
            draw_glyph(&mut cpu, &mem, &mut screen, glyph, x, y);
            draw_glyph(&mut cpu, &mem, &mut screen, glyph, x, y);
            // every glyph has at least one lit pixel
            assert_eq!(1, cpu.v[0xf]);
            assert_eq!(before.as_bytes(), screen.as_bytes());
        }
    }

    /// Dxyn: Only erasing a lit pixel counts as a collision
    #[test]
    fn collision() {
        let (mut cpu, mem, mut screen, _) = setup_environment();
        draw_glyph(&mut cpu, &mem, &mut screen, 0, 0, 0);
        assert_eq!(0, cpu.v[0xf]);
        // no overlap
        draw_glyph(&mut cpu, &mem, &mut screen, 0, 8, 0);
        assert_eq!(0, cpu.v[0xf]);
        // overlaps the right edge of the first "0"
        draw_glyph(&mut cpu, &mem, &mut screen, 1, 1, 0);
        assert_eq!(1, cpu.v[0xf]);
    }

    /// Dxyn: Sprites wrap around the edges of the screen
    #[test]
    fn wraps() {
        let (mut cpu, mem, mut screen, _) = setup_environment();
        let mut reference = screen.clone();
        draw_glyph(&mut cpu, &mem, &mut screen, 8, 64, 0);
        draw_glyph(&mut cpu, &mem, &mut reference, 8, 0, 0);
        assert_eq!(reference.as_bytes(), screen.as_bytes());

        // Straddle the bottom-right corner
        let mut screen = Screen::default();
        draw_glyph(&mut cpu, &mem, &mut screen, 0, 62, 30);
        // "0" row 0 is 0xf0: x 62, 63, 0, 1 on y 30
        assert!(screen.pixel(62, 30) && screen.pixel(63, 30));
        assert!(screen.pixel(0, 30) && screen.pixel(1, 30));
        // rows 2..5 wrap to the top
        assert!(screen.pixel(62, 0) && screen.pixel(1, 2));
    }

    /// Dxyn: vF is cleared when nothing collides
    #[test]
    fn clears_vf() {
        let (mut cpu, mem, mut screen, _) = setup_environment();
        cpu.v[0xf] = 1;
        cpu.i = 0x300; // zeroes
        cpu.draw(0, 0, 0xf, &mem, &mut screen);
        assert_eq!(0, cpu.v[0xf]);
        assert!(screen.is_blank());
    }

    /// Dxyn: Blank and empty sprites still mark the screen dirty
    #[test]
    fn blank_sprite_marks_dirty() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        cpu.i = 0x300; // zeroes
        for op in [0xd001, 0xd000] {
            screen.take_dirty();
            run_op(&mut cpu, &mut mem, &mut screen, &mut keys, op).unwrap();
            assert!(screen.take_dirty());
            assert!(screen.is_blank());
        }
    }
}

/// Tests keys, timers, and randomness
mod io {
    use super::*;

    /// Cxbb: Stores a random number & the provided byte into vX
    #[test]
    fn rand() {
        let (mut cpu, ..) = setup_environment();
        for b in 0..=0xff {
            for _ in 0..8 {
                cpu.rand(0x7, b);
                assert_eq!(0, cpu.v[0x7] & !b);
            }
        }
        cpu.rand(0x7, 0);
        assert_eq!(0, cpu.v[0x7]);
    }

    /// Ex9E, ExA1: Skip next instruction on key state
    #[test]
    fn skip_key() {
        let (mut cpu, _, _, mut keys) = setup_environment();
        for key in 0..0x10 {
            cpu.v[3] = key as u8;
            for pressed in [false, true] {
                if pressed {
                    keys.press(key).unwrap();
                } else {
                    keys.release(key).unwrap();
                }
                cpu.pc = 0x200;
                cpu.skip_key_equals(3, &keys);
                assert_eq!(if pressed { 0x202 } else { 0x200 }, cpu.pc);
                cpu.pc = 0x200;
                cpu.skip_key_not_equals(3, &keys);
                assert_eq!(if pressed { 0x200 } else { 0x202 }, cpu.pc);
            }
        }
    }

    /// Fx0A: Blocks until a key is pressed after the wait begins
    #[test]
    fn wait_for_key() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        mem.write_byte(0x200u16, 0xf5);
        mem.write_byte(0x201u16, 0x0a);
        // A stale keydown doesn't count
        keys.press(0x9).unwrap();
        for _ in 0..10 {
            cpu.tick(&mut mem, &mut screen, &mut keys).unwrap();
            assert_eq!(0x200, cpu.pc);
            assert!(cpu.flags.keypause);
        }
        // Timers keep running while waiting
        cpu.delay = 3;
        cpu.tick_timers();
        assert_eq!(2, cpu.delay);

        keys.press(0xc).unwrap();
        cpu.tick(&mut mem, &mut screen, &mut keys).unwrap();
        assert_eq!(0xc, cpu.v[5]);
        assert_eq!(0x202, cpu.pc);
        assert!(!cpu.flags.keypause);
    }

    /// Fx07, Fx15, Fx18: move values into and out of the timers
    #[test]
    fn timers() {
        let (mut cpu, ..) = setup_environment();
        for value in 0..=0xff {
            cpu.v[1] = value;
            cpu.store_delay_timer(1);
            cpu.store_sound_timer(1);
            assert_eq!((value, value), (cpu.delay(), cpu.sound()));
            cpu.v[2] = !value;
            cpu.load_delay_timer(2);
            assert_eq!(value, cpu.v[2]);
        }
    }

    /// Timers count down to zero, and the tone plays while sound is nonzero
    #[test]
    fn tick_timers() {
        let (mut cpu, ..) = setup_environment();
        (cpu.delay, cpu.sound) = (3, 2);
        assert!(cpu.tick_timers());
        assert_eq!((2, 1), (cpu.delay, cpu.sound));
        assert!(cpu.tick_timers());
        assert_eq!((1, 0), (cpu.delay, cpu.sound));
        assert!(!cpu.tick_timers());
        assert_eq!((0, 0), (cpu.delay, cpu.sound));
        assert!(!cpu.tick_timers());
        assert_eq!((0, 0), (cpu.delay, cpu.sound));
    }
}

/// Tests the run-control machinery around instructions
mod run {
    use super::*;

    #[test]
    fn paused_does_nothing() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        cpu.flags.pause = true;
        let before = cpu.clone();
        cpu.multistep(&mut mem, &mut screen, &mut keys, 10).unwrap();
        assert_eq!(before, cpu);
    }

    #[test]
    fn singlestep_stays_paused() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        cpu.singlestep(&mut mem, &mut screen, &mut keys).unwrap();
        assert_eq!(5, cpu.v[0]);
        assert_eq!(0x202, cpu.pc);
        assert!(cpu.flags.pause);
    }

    #[test]
    fn breakpoint() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        cpu.set_break(0x202);
        match cpu.tick(&mut mem, &mut screen, &mut keys) {
            Err(Error::BreakpointHit { addr, next }) => {
                assert_eq!(0x202, addr);
                assert_eq!(0x1202, next);
            }
            other => panic!("expected BreakpointHit, got {other:?}"),
        }
        assert!(cpu.flags.pause);
        // the instruction still ran
        assert_eq!(5, cpu.v[0]);
    }

    #[test]
    fn set_unset_break() {
        let mut cpu = CPU::default();
        for _ in 0..100 {
            cpu.set_break(0x234);
        }
        cpu.set_break(0x235);
        assert_eq!(&[0x234u16, 0x235], cpu.breakpoints());
        cpu.unset_break(0x234);
        cpu.unset_break(0x234);
        assert_eq!(&[0x235u16], cpu.breakpoints());
    }

    #[test]
    fn reset() {
        let (mut cpu, ..) = setup_environment();
        cpu.set_break(0x300);
        cpu.call(0x300).unwrap();
        (cpu.delay, cpu.sound, cpu.i, cpu.cycle) = (5, 6, 7, 3);
        cpu.v = [0xff; 16];
        cpu.reset();
        assert_eq!(0x200, cpu.pc);
        assert!(cpu.stack().is_empty());
        assert_eq!((0, 0, 0), (cpu.delay, cpu.sound, cpu.i));
        assert_eq!([0; 16], cpu.v);
        assert_eq!(0, cpu.cycle());
        // breakpoints survive
        assert_eq!(&[0x300u16], cpu.breakpoints());
    }

    #[test]
    fn set_v() {
        let mut cpu = CPU::default();
        cpu.set_v(0xf, 1).unwrap();
        assert_eq!(1, cpu.v()[0xf]);
        match cpu.set_v(0x10, 1) {
            Err(Error::InvalidRegister { reg }) => assert_eq!(0x10, reg),
            other => panic!("expected InvalidRegister, got {other:?}"),
        }
    }

    #[test]
    fn debug_trace() {
        let (mut cpu, mut mem, mut screen, mut keys) = setup_environment();
        cpu.flags.debug = true;
        cpu.multistep(&mut mem, &mut screen, &mut keys, 2).unwrap();
        cpu.dump();
        println!("{cpu:?}");
    }
}
