//! Assembler tests.
//!
//! Checks address allocation (anchors, conditional pairs, sequential
//! placement), the encoded fields of representative instructions, the
//! default fill, and the allocation failure modes.

use std::fmt::Write;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use mic1_core::mic::control::{self, DecodedInstruction, Jam, MemoryOp, ShifterOp};
use mic1_core::mic::dump;
use mic1_core::{assemble, parse, Error};

use crate::common::{assemble_source, canonical_store};

/// Decodes word `address` of a packed image.
fn word(image: &[u8], address: usize) -> DecodedInstruction {
    DecodedInstruction::decode(control::word_at(image, address).unwrap())
}

#[test]
fn unlabeled_instructions_are_placed_sequentially() {
    let image = assemble_source("H = 0\nH = 1\nSP = SP + 1\nnop\nH = -1\n");

    for address in 0..4 {
        // Fall-through pre-resolves the next slot before placing it.
        assert_eq!(word(&image, address).next_address, address as u16 + 1);
    }
    // The last instruction has no successor to fall through to.
    assert_eq!(word(&image, 4).next_address, 0);
}

#[test]
fn increment_encodes_the_b_bus_variant() {
    let image = assemble_source("SP = SP + 1");

    let decoded = word(&image, 0);
    assert_eq!(decoded.next_address, 0);
    assert_eq!(decoded.jam, Jam::None);
    assert_eq!(decoded.alu_control, 0b11_01_01);
    assert_eq!(decoded.bus_b, 4);
    assert_eq!(
        decoded.enables,
        [false, false, false, false, false, true, false, false, false]
    );
    assert_eq!(decoded.memory, None);
    assert!(!decoded.fetch);
}

#[test]
fn conditional_targets_land_exactly_256_apart() {
    let image = assemble_source(
        ".label nop1 0x00\n\
         Main1\tgoto (MBR)\n\
         nop1\tgoto Main1\n\
         iflt4\tN = OPC; if (N) goto T; else goto F\n\
         T\tOPC = PC - 1; fetch; goto Main1\n\
         F\tPC = PC + 1\n\
         F2\tPC = PC + 1; fetch\n\
         F3\tgoto Main1\n",
    );

    // The first free pair after the 0x00 anchor is (1, 257).
    let branch = word(&image, 3);
    assert_eq!(branch.jam, Jam::Jamn);
    assert_eq!(branch.next_address, 1);

    let taken = word(&image, 257);
    assert_eq!(taken.next_address, 2);
    assert!(taken.fetch);
    assert_eq!(taken.alu_control, 0b11_01_11);
    assert_eq!(taken.bus_b, 1);

    // The false branch falls through to the next instruction in order.
    assert_eq!(word(&image, 1).next_address, 4);
    assert_eq!(word(&image, 4).next_address, 5);
}

#[test]
fn conditionals_sharing_a_false_label_share_one_pair() {
    let image = assemble_source(
        "first\tZ = OPC; if (Z) goto T; else goto F\n\
         second\tN = OPC; if (N) goto T; else goto F\n\
         T\tgoto T\n\
         F\tgoto F\n",
    );

    // One pair (0, 256) serves both conditionals; the instruction labels
    // then start at address 1.
    let first = word(&image, 1);
    let second = word(&image, 2);
    assert_eq!(first.jam, Jam::Jamz);
    assert_eq!(second.jam, Jam::Jamn);
    assert_eq!(first.next_address, 0);
    assert_eq!(second.next_address, 0);

    assert_eq!(word(&image, 0).next_address, 0);
    assert_eq!(word(&image, 256).next_address, 256);
}

#[test]
fn anchored_instructions_keep_their_slots() {
    let image = assemble_source(".label boot 0x40\nboot\tH = 0\nH = 1\n");

    // The unlabeled successor takes the lowest free slot.
    let anchored = word(&image, 0x40);
    assert_eq!(anchored.next_address, 0);
    assert_eq!(anchored.alu_control, 0b01_00_00);
    assert!(anchored.enables[0]);

    assert_eq!(word(&image, 0).alu_control, 0b01_00_01);
}

#[rstest]
#[case("MDR = TOS = SP + H", 0b11_11_00, 4)]
#[case("OPC = H = H + OPC + 1", 0b11_11_01, 8)]
#[case("H = H + 1", 0b11_10_01, 10)]
#[case("MAR = SP = SP - 1", 0b11_01_11, 4)]
#[case("MDR = TOS = MDR - H", 0b11_11_11, 0)]
#[case("H = -TOS", 0b10_11_11, 7)]
#[case("MDR = TOS = MDR AND H", 0b00_11_00, 0)]
#[case("H = MBRU OR H", 0b01_11_00, 3)]
#[case("H = NOT MDR", 0b10_11_00, 0)]
#[case("H = NOT H", 0b01_10_10, 10)]
#[case("MAR = SP", 0b01_01_00, 4)]
#[case("TOS = H", 0b01_10_00, 10)]
#[case("H = 0", 0b01_00_00, 10)]
#[case("H = 1", 0b01_00_01, 10)]
#[case("OPC = H = -1", 0b01_00_10, 10)]
fn alu_and_bus_fields_encode_per_operation(
    #[case] source: &str,
    #[case] alu: u8,
    #[case] bus_b: u8,
) {
    let decoded = word(&assemble_source(source), 0);
    assert_eq!(decoded.alu_control, alu, "{source}");
    assert_eq!(decoded.bus_b, bus_b, "{source}");
}

#[test]
fn chained_targets_set_every_enable() {
    let decoded = word(&assemble_source("MDR = TOS = SP + H"), 0);
    // Enable order is H,OPC,TOS,CPP,LV,SP,PC,MDR,MAR.
    assert_eq!(
        decoded.enables,
        [false, false, true, false, false, false, false, true, false]
    );
}

#[test]
fn io_fetch_and_shift_bits_encode() {
    let read = word(&assemble_source("MAR = SP; rd"), 0);
    assert_eq!(read.memory, Some(MemoryOp::Read));

    let write = word(&assemble_source("MDR = TOS; wr"), 0);
    assert_eq!(write.memory, Some(MemoryOp::Write));

    let fetch = word(&assemble_source("PC = PC + 1; fetch"), 0);
    assert!(fetch.fetch);

    let left = word(&assemble_source("H = MBRU << 8"), 0);
    assert_eq!(left.shift, Some(ShifterOp::Left8));
    assert_eq!(left.alu_control, 0b01_01_00);

    let right = word(&assemble_source("TOS = TOS >> 1"), 0);
    assert_eq!(right.shift, Some(ShifterOp::Right1));
}

#[test]
fn multiway_dispatch_encodes_its_base() {
    let decoded = word(&assemble_source("goto (MBR OR 0x100)"), 0);
    assert_eq!(decoded.jam, Jam::Jmpc);
    assert_eq!(decoded.next_address, 0x100);
}

#[test]
fn default_fill_covers_every_unused_word() {
    let image = canonical_store();

    // 0x1FF lies above every anchor and allocated label, so it holds the
    // default `goto err1`.
    let filled = word(&image, 0x1FF);
    assert_eq!(filled.next_address, 0xFE);
    assert_eq!(filled.jam, Jam::None);
    assert_eq!(filled.enables, [false; 9]);
    assert_eq!(filled.memory, None);
    assert!(!filled.fetch);
}

#[test]
fn default_with_unbound_label_self_loops_everywhere() {
    let image = assemble_source(".default\tgoto SELF\n");
    for address in 0..control::CONTROL_STORE_WORDS {
        let decoded = word(&image, address);
        assert_eq!(decoded.next_address, address as u16);
        assert_eq!(decoded.jam, Jam::None);
    }
}

#[test]
fn assembly_is_deterministic() {
    let program = parse(crate::common::CANONICAL_MICROCODE).unwrap();
    assert_eq!(assemble(&program).unwrap(), assemble(&program).unwrap());
    assert_eq!(canonical_store(), assemble(&program).unwrap());
}

#[test]
fn halt_word_renders_as_a_bare_self_jump() {
    let image = assemble_source(".label halt1 0xFF\nhalt1\tgoto halt1\n");
    let rendered = dump::render(&image).unwrap();
    assert_eq!(
        rendered.lines().nth(0xFF).unwrap(),
        "0x0FF: 0x0FF 000 00 000000 000000000 000 0000"
    );
}

#[test]
fn undefined_goto_target_is_rejected() {
    let program = parse("goto nowhere").unwrap();
    assert_eq!(
        assemble(&program),
        Err(Error::UndefinedLabel("nowhere".to_string()))
    );
}

#[test]
fn anchored_false_target_past_the_pair_range_is_rejected() {
    let program = parse(".label F 0x130\nx\tN = OPC; if (N) goto T; else goto F\n").unwrap();
    assert_eq!(assemble(&program), Err(Error::AddressOutOfRange(0x130 + 256)));
}

#[test]
fn conditional_pairs_exhaust_when_the_low_half_is_full() {
    let mut source = String::new();
    for address in 0..256 {
        let _ = writeln!(source, ".label pad{address} {address:#x}");
    }
    source.push_str("x\tN = OPC; if (N) goto T; else goto F\n");

    let program = parse(&source).unwrap();
    assert_eq!(assemble(&program), Err(Error::AddressPairExhausted));
}

#[test]
fn placement_fails_once_every_word_is_taken() {
    let program = parse(&"nop\n".repeat(513)).unwrap();
    assert_eq!(assemble(&program), Err(Error::StoreExhausted));
}

proptest! {
    /// The true branch sits exactly 256 above the false branch for every
    /// address the false label can be anchored to.
    #[test]
    fn true_target_is_false_target_plus_256(false_address in 0u16..256) {
        let source = format!(
            ".label F {false_address:#x}\n\
             x\tN = OPC; if (N) goto T; else goto F\n\
             T\tgoto T\n\
             F\tgoto F\n",
        );
        let image = assemble_source(&source);

        // The branch instruction lands on the lowest address its anchor
        // leaves free.
        let branch_address = usize::from(false_address == 0);
        let branch = word(&image, branch_address);
        prop_assert_eq!(branch.jam, Jam::Jamn);
        prop_assert_eq!(branch.next_address, false_address);

        let taken = word(&image, usize::from(false_address) + 256);
        prop_assert_eq!(taken.next_address, false_address + 256);
    }

    /// Unlabeled straight-line programs of any length chain sequentially
    /// from address 0.
    #[test]
    fn straight_line_programs_place_sequentially(length in 1usize..64) {
        let image = assemble_source(&"nop\n".repeat(length));
        for address in 0..length - 1 {
            prop_assert_eq!(word(&image, address).next_address, address as u16 + 1);
        }
        prop_assert_eq!(word(&image, length - 1).next_address, 0);
    }

    /// Assembling the same program twice yields byte-identical images.
    #[test]
    fn assembly_is_idempotent_for_straight_line_programs(length in 1usize..64) {
        let program = parse(&"nop\n".repeat(length)).unwrap();
        prop_assert_eq!(assemble(&program).unwrap(), assemble(&program).unwrap());
    }
}
