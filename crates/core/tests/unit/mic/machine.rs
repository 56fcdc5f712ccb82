//! Machine tests.
//!
//! Drives the simulator cycle by cycle against the canonical microcode and
//! against small hand-built control stores, covering dispatch, the one-cycle
//! memory latency, the conditional jams, and the I/O ports.

use std::io::Cursor;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use mic1_core::mic::control::{CONTROL_STORE_BYTES, WORD_BITS};
use mic1_core::mic::machine::bus;
use mic1_core::mic::{MemoryBus, StreamMemory};
use mic1_core::{Error, Machine};

use crate::common::{assemble_source, boot_canonical, TestMemory};

fn empty_memory() -> TestMemory {
    StreamMemory::new(Cursor::new(Vec::new()), Vec::new())
}

/// An all-zero image with one word packed at the given address.
fn image_with_word(address: usize, word: u64) -> Vec<u8> {
    let mut image = vec![0u8; CONTROL_STORE_BYTES];
    for i in 0..WORD_BITS {
        if (word >> (WORD_BITS - 1 - i)) & 1 == 1 {
            let index = address * WORD_BITS + i;
            image[index / 8] |= 1 << (7 - index % 8);
        }
    }
    image
}

/// Runs a control store built from `source` to the halt and returns H.
fn run_flag_program(source: &str) -> i32 {
    let mut machine = Machine::new(empty_memory());
    machine.load_microcode(&assemble_source(source)).unwrap();
    machine.run();
    assert!(machine.halted());
    machine.h()
}

#[test]
fn initial_state_uses_the_configured_bases() {
    let machine = Machine::new(empty_memory());

    assert_eq!(machine.mpc(), 0);
    assert_eq!(machine.registers()[bus::PC], -1);
    assert_eq!(machine.registers()[bus::SP], 0x8000);
    assert_eq!(machine.registers()[bus::CPP], 0x4000);
    assert_eq!(machine.registers()[bus::LV], 0xC000);
    assert_eq!(machine.h(), 0);
    assert!(!machine.halted());
}

#[test]
fn microcode_image_size_is_checked() {
    let mut machine = Machine::new(empty_memory());
    assert_eq!(
        machine.load_microcode(&[0u8; 100]),
        Err(Error::ControlStoreSize(100))
    );
}

/// BIPUSH 0x70, BIPUSH 0x70, IADD, then the halt opcode, followed cycle by
/// cycle. With the canonical allocation the dispatch loop sits at address 2,
/// BIPUSH at 0x10, IADD at 0x60, and the halt word at 0xFF.
#[test]
fn bipush_and_iadd_execute_cycle_accurately() {
    let mut machine = boot_canonical(&[0x10, 0x70, 0x10, 0x70, 0x60, 0xFF], Vec::new());

    // Two warm-up round trips: the first dispatch happens before any opcode
    // has been fetched, so it lands back on the idle word at 0.
    machine.clock();
    assert_eq!(machine.mpc(), 2);
    machine.clock();
    assert_eq!(machine.mpc(), 0);
    machine.clock();
    assert_eq!(machine.registers()[bus::MBRU], 0x10);

    // Dispatch to BIPUSH.
    machine.clock();
    assert_eq!(machine.mpc(), 0x10);
    assert_eq!(machine.registers()[bus::PC], 1);

    machine.clock();
    assert_eq!(machine.registers()[bus::SP], 0x8001);
    assert_eq!(machine.mar(), 0x8001);
    assert_eq!(machine.registers()[bus::MBR], 0x70);

    machine.clock();
    machine.clock();
    assert_eq!(machine.registers()[bus::TOS], 0x70);
    assert_eq!(machine.mpc(), 2);

    // Back through the dispatch loop: the push reaches memory one cycle
    // after `wr` was issued.
    machine.clock();
    assert_eq!(machine.memory().get32(0x8001), 0x70);
    assert_eq!(machine.mpc(), 0x10);

    // Second BIPUSH.
    machine.clock();
    machine.clock();
    machine.clock();
    machine.clock();
    assert_eq!(machine.memory().get32(0x8002), 0x70);
    assert_eq!(machine.mpc(), 0x60);

    // IADD pops the second word, adds, writes back.
    machine.clock();
    assert_eq!(machine.registers()[bus::SP], 0x8001);
    assert_eq!(machine.registers()[bus::MBRU], 0xFF);
    machine.clock();
    assert_eq!(machine.h(), 0x70);
    assert_eq!(machine.registers()[bus::MDR], 0x70);
    machine.clock();
    assert_eq!(machine.registers()[bus::TOS], 0xE0);

    // Dispatch to the halt word, which jumps to itself.
    machine.clock();
    assert_eq!(machine.mpc(), 0xFF);
    assert_eq!(machine.memory().get32(0x8001), 0xE0);
    assert!(!machine.halted());
    machine.clock();
    assert!(machine.halted());
}

#[test]
fn ifeq_takes_the_branch_on_zero() {
    // BIPUSH 0, IFEQ +4 over a halt, BIPUSH 0x31, halt.
    let text = [0x10, 0x00, 0x99, 0x00, 0x04, 0xFF, 0x10, 0x31, 0xFF];
    let mut machine = boot_canonical(&text, Vec::new());
    machine.run();

    assert!(machine.halted());
    assert_eq!(machine.registers()[bus::TOS], 0x31);
}

#[test]
fn ifeq_falls_through_on_nonzero() {
    // BIPUSH 5, IFEQ +4; the fall-through path lands on the halt opcode.
    let text = [0x10, 0x05, 0x99, 0x00, 0x04, 0xFF];
    let mut machine = boot_canonical(&text, Vec::new());
    machine.run();

    assert!(machine.halted());
    // The comparison popped the pushed word; TOS holds the empty stack slot.
    assert_eq!(machine.registers()[bus::TOS], 0);
}

#[test]
fn goto_jumps_over_straight_line_code() {
    // BIPUSH 0x31, GOTO +5 over a second BIPUSH, halt.
    let text = [0x10, 0x31, 0xA7, 0x00, 0x05, 0x10, 0x33, 0xFF];
    let mut machine = boot_canonical(&text, Vec::new());
    machine.run();

    assert!(machine.halted());
    assert_eq!(machine.registers()[bus::TOS], 0x31);
}

#[test]
fn out_writes_the_top_of_stack_to_the_output_port() {
    let mut machine = boot_canonical(&[0x10, 0x41, 0xFD, 0xFF], Vec::new());
    machine.run();

    assert!(machine.halted());
    assert_eq!(machine.memory().sink(), &vec![0x41]);
    // OUT pops its operand.
    assert_eq!(machine.registers()[bus::TOS], 0);
}

#[test]
fn in_pushes_a_byte_from_the_input_port() {
    let mut machine = boot_canonical(&[0xFC, 0xFF], vec![0x41]);
    machine.run();

    assert!(machine.halted());
    assert_eq!(machine.registers()[bus::TOS], 0x41);
    assert_eq!(machine.memory().get32(0x8001), 0x41);
}

#[test]
fn jamz_adds_256_when_the_zero_flag_is_set() {
    let taken = run_flag_program(
        ".label start 0x00\n\
         start\tZ = 0; if (Z) goto yes; else goto no\n\
         no\tH = 1; goto no\n\
         yes\tH = 0; goto yes\n",
    );
    assert_eq!(taken, 0);

    let fallen = run_flag_program(
        ".label start 0x00\n\
         start\tZ = 1; if (Z) goto yes; else goto no\n\
         no\tH = 1; goto no\n\
         yes\tH = 0; goto yes\n",
    );
    assert_eq!(fallen, 1);
}

#[test]
fn jamn_adds_256_when_the_negative_flag_is_set() {
    let taken = run_flag_program(
        ".label start 0x00\n\
         start\tN = -1; if (N) goto yes; else goto no\n\
         no\tH = 1; goto no\n\
         yes\tH = 0; goto yes\n",
    );
    assert_eq!(taken, 0);

    let fallen = run_flag_program(
        ".label start 0x00\n\
         start\tN = 1; if (N) goto yes; else goto no\n\
         no\tH = 1; goto no\n\
         yes\tH = 0; goto yes\n",
    );
    assert_eq!(fallen, 1);
}

#[test]
fn run_until_stops_at_the_requested_address() {
    let mut machine = boot_canonical(&[0x10, 0x70, 0xFF], Vec::new());
    machine.run_until(0x10);

    assert!(!machine.halted());
    assert_eq!(machine.mpc(), 0x10);
    assert_eq!(machine.registers()[bus::PC], 1);
}

proptest! {
    /// Without a jam bit, the next MPC is exactly the encoded next-address
    /// field, whatever else the word does.
    #[test]
    fn next_mpc_is_the_next_address_without_a_jam(
        next in 0u64..512,
        extra in 0u64..(1 << 24),
    ) {
        // Bits 9-11 (the jam bits) stay clear; the low 24 bits are free.
        let word = (next << 27) | extra;
        let mut machine = Machine::new(empty_memory());
        machine.load_microcode(&image_with_word(0, word)).unwrap();
        machine.clock();
        prop_assert_eq!(machine.mpc(), next as u16);
    }
}
