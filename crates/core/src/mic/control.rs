//! Control-store word layout and the microinstruction decoder.
//!
//! A control-store image is exactly [`CONTROL_STORE_BYTES`] bytes holding
//! [`CONTROL_STORE_WORDS`] consecutive 36-bit words, packed most-significant
//! bit first: bit `i` of word `w` lives at absolute file bit `36*w + i`,
//! mapped to `byte[index / 8]` bit `7 - (index % 8)`. Bit 0 of a word is the
//! most significant bit of the next-address field.
//!
//! Decoding is the pure inverse of the assembler's field encoding; every
//! 36-bit pattern decodes to a well-formed instruction, so the simulator can
//! never hit an undecodable word.

use crate::common::{Error, Result};

/// Number of microinstruction words in a control store.
pub const CONTROL_STORE_WORDS: usize = 512;
/// Width of one microinstruction in bits.
pub const WORD_BITS: usize = 36;
/// Size of a packed control-store image in bytes.
pub const CONTROL_STORE_BYTES: usize = CONTROL_STORE_WORDS * WORD_BITS / 8;

/// Bit positions within a 36-bit word, most-significant bit = position 0.
pub mod layout {
    /// First bit of the 9-bit next-address field.
    pub const NEXT_ADDRESS: usize = 0;
    /// Multiway dispatch: OR the next address with MBRU.
    pub const JMPC: usize = 9;
    /// Conditional: add 256 to the next address when N is set.
    pub const JAMN: usize = 10;
    /// Conditional: add 256 to the next address when Z is set.
    pub const JAMZ: usize = 11;
    /// Shifter: logical left shift by 8.
    pub const SLL8: usize = 12;
    /// Shifter: arithmetic right shift by 1.
    pub const SRA1: usize = 13;
    /// First bit of the 6-bit ALU control field (F0,F1,ENA,ENB,INVA,INC).
    pub const ALU: usize = 14;
    /// First bit of the 9 bus-C enables (H,OPC,TOS,CPP,LV,SP,PC,MDR,MAR).
    pub const ENABLES: usize = 20;
    /// Latch a memory write for the next cycle.
    pub const WRITE: usize = 29;
    /// Latch a memory read for the next cycle.
    pub const READ: usize = 30;
    /// Latch an opcode fetch for the next cycle.
    pub const FETCH: usize = 31;
    /// First bit of the 4-bit bus-B select field.
    pub const BUS_B: usize = 32;
}

/// Next-address modifier selecting how MPC is computed after a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Jam {
    /// MPC = next address.
    #[default]
    None,
    /// MPC = next address OR MBRU (multiway dispatch).
    Jmpc,
    /// MPC = next address + 256 when N is set.
    Jamn,
    /// MPC = next address + 256 when Z is set.
    Jamz,
}

/// Latched memory operation of a microinstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    /// Load MDR from the word at MAR on the next cycle.
    Read,
    /// Store MDR to the word at MAR on the next cycle.
    Write,
}

/// Shifter setting applied to the ALU output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShifterOp {
    /// Logical left shift by 8.
    Left8,
    /// Arithmetic right shift by 1.
    Right1,
}

/// A fully decoded microinstruction. Derived losslessly from one
/// control-store word and never mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// The statically encoded 9-bit next address.
    pub next_address: u16,
    /// Next-address modifier; first set jam bit wins (JMPC > JAMN > JAMZ).
    pub jam: Jam,
    /// Shifter setting; SLL8 takes priority when both bits are set.
    pub shift: Option<ShifterOp>,
    /// Raw 6-bit ALU control (F0,F1,ENA,ENB,INVA,INC).
    pub alu_control: u8,
    /// Bus-C write enables, in order H,OPC,TOS,CPP,LV,SP,PC,MDR,MAR.
    pub enables: [bool; 9],
    /// Latched memory operation; WRITE is checked before READ.
    pub memory: Option<MemoryOp>,
    /// Latched opcode fetch.
    pub fetch: bool,
    /// Unsigned 4-bit bus-B select; values above 8 read as 0.
    pub bus_b: u8,
}

impl DecodedInstruction {
    /// Decodes a 36-bit word (held in the low 36 bits of `word`).
    pub fn decode(word: u64) -> Self {
        let jam = if bit(word, layout::JMPC) {
            Jam::Jmpc
        } else if bit(word, layout::JAMN) {
            Jam::Jamn
        } else if bit(word, layout::JAMZ) {
            Jam::Jamz
        } else {
            Jam::None
        };

        let shift = if bit(word, layout::SLL8) {
            Some(ShifterOp::Left8)
        } else if bit(word, layout::SRA1) {
            Some(ShifterOp::Right1)
        } else {
            None
        };

        let memory = if bit(word, layout::WRITE) {
            Some(MemoryOp::Write)
        } else if bit(word, layout::READ) {
            Some(MemoryOp::Read)
        } else {
            None
        };

        let mut enables = [false; 9];
        for (i, enable) in enables.iter_mut().enumerate() {
            *enable = bit(word, layout::ENABLES + i);
        }

        Self {
            next_address: field(word, layout::NEXT_ADDRESS, 9) as u16,
            jam,
            shift,
            alu_control: field(word, layout::ALU, 6) as u8,
            enables,
            memory,
            fetch: bit(word, layout::FETCH),
            bus_b: field(word, layout::BUS_B, 4) as u8,
        }
    }
}

/// Extracts word `address` of a packed control-store image into the low 36
/// bits of a `u64`.
///
/// # Errors
///
/// Returns [`Error::ControlStoreSize`] when the image is not exactly
/// [`CONTROL_STORE_BYTES`] long.
pub fn word_at(image: &[u8], address: usize) -> Result<u64> {
    if image.len() != CONTROL_STORE_BYTES {
        return Err(Error::ControlStoreSize(image.len()));
    }

    let mut word = 0u64;
    for i in 0..WORD_BITS {
        let index = address * WORD_BITS + i;
        let raw = (image[index / 8] >> (7 - (index % 8))) & 1;
        word = (word << 1) | u64::from(raw);
    }
    Ok(word)
}

/// Reads bit `position` of a 36-bit word (position 0 = most significant).
const fn bit(word: u64, position: usize) -> bool {
    (word >> (WORD_BITS - 1 - position)) & 1 == 1
}

/// Reads an unsigned field of `width` bits starting at `position`.
const fn field(word: u64, position: usize, width: usize) -> u64 {
    (word >> (WORD_BITS - position - width)) & ((1 << width) - 1)
}
