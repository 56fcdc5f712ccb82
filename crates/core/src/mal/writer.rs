//! MAL assembler.
//!
//! Turns a parsed [`Program`] into a packed 2304-byte control-store image.
//! Assembly runs in five phases over single-use allocation tables:
//! 1. **Anchors:** `.label` directives bind labels to literal addresses.
//! 2. **If-pairs:** every conditional's branch targets are bound to a free
//!    `(f, f + 256)` address pair, since the JAMN/JAMZ mechanism can only
//!    add a fixed offset of 256 to the encoded next-address.
//! 3. **Remaining labels:** unbound instruction labels take the lowest
//!    unused address.
//! 4. **Placement:** instructions are placed in program order (first-fit for
//!    unlabeled ones) and bit-encoded; instructions without a control
//!    statement fall through to the next instruction's pre-resolved address.
//! 5. **Default fill:** every untouched word receives the default
//!    instruction's encoding, re-resolved per slot so that an unbound label
//!    in the default refers to the slot itself.

use std::collections::HashMap;

use tracing::debug;

use super::ast::{Assignment, Condition, ControlFlow, Instruction, IoOp, Operation, Program,
                 Register, Shift};
use crate::common::{Error, Result};
use crate::mic::control::{layout, CONTROL_STORE_BYTES, CONTROL_STORE_WORDS, WORD_BITS};

/// Bus-B sentinel meaning "no B-bus selection"; reads as 0 at runtime.
const BUS_B_NONE: u8 = 10;
/// Offset between the false and true targets of a conditional.
const PAIR_OFFSET: u16 = (CONTROL_STORE_WORDS / 2) as u16;

/// Bus-C enable flag order within the encoded word.
const ENABLE_ORDER: [Register; 9] = [
    Register::H,
    Register::Opc,
    Register::Tos,
    Register::Cpp,
    Register::Lv,
    Register::Sp,
    Register::Pc,
    Register::Mdr,
    Register::Mar,
];

/// Assembles a program into a packed control-store image.
///
/// Idempotent: the same program always yields a byte-identical image.
///
/// # Errors
///
/// Returns [`Error::AddressPairExhausted`] when no free `(f, f + 256)` pair
/// remains for a conditional, [`Error::UndefinedLabel`] for a jump to a
/// label that is never bound, and [`Error::StoreExhausted`] when all 512
/// words are occupied.
pub fn assemble(program: &Program) -> Result<Vec<u8>> {
    Assembler::new(program).run()
}

/// Single-use assembly pass. The allocation tables live and die with one
/// [`assemble`] call.
struct Assembler<'a> {
    program: &'a Program,
    used: [bool; CONTROL_STORE_WORDS],
    labels: HashMap<String, u16>,
    placed: HashMap<usize, u16>,
    words: [u64; CONTROL_STORE_WORDS],
}

impl<'a> Assembler<'a> {
    fn new(program: &'a Program) -> Self {
        Self {
            program,
            used: [false; CONTROL_STORE_WORDS],
            labels: HashMap::new(),
            placed: HashMap::new(),
            words: [0; CONTROL_STORE_WORDS],
        }
    }

    fn run(mut self) -> Result<Vec<u8>> {
        self.bind_anchors();
        self.bind_if_pairs()?;
        self.bind_remaining_labels()?;
        self.place_instructions()?;
        self.fill_default()?;
        Ok(pack(&self.words))
    }

    fn bind_anchors(&mut self) {
        for directive in &self.program.labels {
            debug!(label = %directive.name, address = directive.address, "anchored label");
            self.labels
                .insert(directive.name.clone(), directive.address);
            self.used[usize::from(directive.address)] = true;
        }
    }

    fn bind_if_pairs(&mut self) -> Result<()> {
        for instruction in &self.program.instructions {
            let Some(ControlFlow::If {
                true_label,
                false_label,
                ..
            }) = &instruction.control
            else {
                continue;
            };

            let false_address = match self.labels.get(false_label) {
                Some(&bound) => bound,
                None => self.free_pair()?,
            };
            let true_address = false_address + PAIR_OFFSET;
            if usize::from(true_address) >= CONTROL_STORE_WORDS {
                return Err(Error::AddressOutOfRange(u32::from(true_address)));
            }

            debug!(
                false_label = %false_label,
                false_address,
                true_label = %true_label,
                true_address,
                "bound conditional pair"
            );
            self.labels.insert(false_label.clone(), false_address);
            self.used[usize::from(false_address)] = true;
            self.labels.insert(true_label.clone(), true_address);
            self.used[usize::from(true_address)] = true;
        }
        Ok(())
    }

    fn bind_remaining_labels(&mut self) -> Result<()> {
        for instruction in &self.program.instructions {
            let Some(label) = &instruction.label else {
                continue;
            };
            if self.labels.contains_key(label) {
                continue;
            }
            let address = self.lowest_free()?;
            debug!(label = %label, address, "bound label");
            self.labels.insert(label.clone(), address);
            self.used[usize::from(address)] = true;
        }
        Ok(())
    }

    fn place_instructions(&mut self) -> Result<()> {
        for index in 0..self.program.instructions.len() {
            let instruction = &self.program.instructions[index];
            let mut word = self.encode(instruction, None)?;

            let address = self.address_of(index)?;
            self.lock(index, address);

            // Fall-through: pre-resolve and lock the next instruction's slot
            // so its placement matches the address encoded here.
            if instruction.control.is_none() && index + 1 < self.program.instructions.len() {
                let next = self.address_of(index + 1)?;
                self.lock(index + 1, next);
                set_field(&mut word, layout::NEXT_ADDRESS, 9, u64::from(next));
            }

            self.words[usize::from(address)] = word;
        }
        Ok(())
    }

    fn fill_default(&mut self) -> Result<()> {
        let Some(default) = &self.program.default else {
            return Ok(());
        };
        for slot in 0..CONTROL_STORE_WORDS {
            if self.used[slot] {
                continue;
            }
            self.used[slot] = true;
            self.words[slot] = self.encode(default, Some(slot as u16))?;
        }
        Ok(())
    }

    /// The control-store address of instruction `index`: its locked slot if
    /// already placed, its label's binding if labeled, else the lowest
    /// unused address.
    fn address_of(&self, index: usize) -> Result<u16> {
        if let Some(&address) = self.placed.get(&index) {
            return Ok(address);
        }
        if let Some(label) = &self.program.instructions[index].label {
            return self
                .labels
                .get(label)
                .copied()
                .ok_or_else(|| Error::UndefinedLabel(label.clone()));
        }
        self.lowest_free()
    }

    fn lock(&mut self, index: usize, address: u16) {
        self.used[usize::from(address)] = true;
        let _ = self.placed.insert(index, address);
    }

    /// The lowest `f` in 0..256 with both `f` and `f + 256` unused.
    fn free_pair(&self) -> Result<u16> {
        (0..usize::from(PAIR_OFFSET))
            .find(|&f| !self.used[f] && !self.used[f + usize::from(PAIR_OFFSET)])
            .map(|f| f as u16)
            .ok_or(Error::AddressPairExhausted)
    }

    fn lowest_free(&self) -> Result<u16> {
        (0..CONTROL_STORE_WORDS)
            .find(|&a| !self.used[a])
            .map(|a| a as u16)
            .ok_or(Error::StoreExhausted)
    }

    /// Encodes one instruction into a 36-bit word. `here` is the slot being
    /// filled during the default-fill phase; unbound labels resolve to it,
    /// so a default jumping to an undeclared label self-loops in every
    /// filled slot.
    fn encode(&self, instruction: &Instruction, here: Option<u16>) -> Result<u64> {
        let mut word = 0u64;

        if let Some(assignment) = &instruction.assignment {
            for (i, register) in ENABLE_ORDER.iter().enumerate() {
                if assignment.targets.contains(register) {
                    set_bit(&mut word, layout::ENABLES + i);
                }
            }

            set_field(&mut word, layout::ALU, 6, u64::from(alu_code(assignment)));

            match assignment.shift {
                Some(Shift::Left8) => set_bit(&mut word, layout::SLL8),
                Some(Shift::Right1) => set_bit(&mut word, layout::SRA1),
                None => {}
            }

            let bus = assignment
                .bus_b_operand()
                .and_then(Register::bus_b_index)
                .unwrap_or(BUS_B_NONE);
            set_field(&mut word, layout::BUS_B, 4, u64::from(bus));
        }

        match instruction.io {
            Some(IoOp::Read) => set_bit(&mut word, layout::READ),
            Some(IoOp::Write) => set_bit(&mut word, layout::WRITE),
            None => {}
        }

        if instruction.fetch {
            set_bit(&mut word, layout::FETCH);
        }

        match &instruction.control {
            Some(ControlFlow::Goto(label)) => {
                let next = self.resolve(label, here)?;
                set_field(&mut word, layout::NEXT_ADDRESS, 9, u64::from(next));
            }
            Some(ControlFlow::If {
                cond, false_label, ..
            }) => {
                // Only the false address is encoded; the true branch is
                // reached by the runtime +256.
                let next = self.resolve(false_label, here)?;
                set_field(&mut word, layout::NEXT_ADDRESS, 9, u64::from(next));
                set_bit(
                    &mut word,
                    match cond {
                        Condition::N => layout::JAMN,
                        Condition::Z => layout::JAMZ,
                    },
                );
            }
            Some(ControlFlow::Multiway { base }) => {
                set_field(
                    &mut word,
                    layout::NEXT_ADDRESS,
                    9,
                    u64::from(base.unwrap_or(0)),
                );
                set_bit(&mut word, layout::JMPC);
            }
            None => {}
        }

        Ok(word)
    }

    fn resolve(&self, label: &str, here: Option<u16>) -> Result<u16> {
        self.labels
            .get(label)
            .copied()
            .or(here)
            .ok_or_else(|| Error::UndefinedLabel(label.to_string()))
    }
}

/// The 6-bit ALU control code for an assignment's operation, with the 2-way
/// alternate encoding for identity/not/increment depending on whether the
/// operand drives bus A or bus B.
fn alu_code(assignment: &Assignment) -> u8 {
    let via_a = assignment.uses_bus_a();
    match assignment.op {
        Operation::Identity => {
            if via_a {
                0b01_10_00
            } else {
                0b01_01_00
            }
        }
        Operation::Not => {
            if via_a {
                0b01_10_10
            } else {
                0b10_11_00
            }
        }
        Operation::Add => 0b11_11_00,
        Operation::AddInc => 0b11_11_01,
        Operation::Inc => {
            if via_a {
                0b11_10_01
            } else {
                0b11_01_01
            }
        }
        Operation::Sub => 0b11_11_11,
        Operation::Dec => 0b11_01_11,
        // Not the code the ALU decodes for negation (0b11_10_11); kept so
        // the emitted images stay byte-compatible with existing ones.
        Operation::Negate => 0b10_11_11,
        Operation::And => 0b00_11_00,
        Operation::Or => 0b01_11_00,
        Operation::ConstZero => 0b01_00_00,
        Operation::ConstOne => 0b01_00_01,
        Operation::ConstMinusOne => 0b01_00_10,
    }
}

fn set_bit(word: &mut u64, position: usize) {
    *word |= 1 << (WORD_BITS - 1 - position);
}

fn set_field(word: &mut u64, position: usize, width: usize, value: u64) {
    *word |= (value & ((1 << width) - 1)) << (WORD_BITS - position - width);
}

/// Packs 512 words into the on-disk image, most-significant bit first.
fn pack(words: &[u64; CONTROL_STORE_WORDS]) -> Vec<u8> {
    let mut image = vec![0u8; CONTROL_STORE_BYTES];
    for (w, &word) in words.iter().enumerate() {
        for i in 0..WORD_BITS {
            if (word >> (WORD_BITS - 1 - i)) & 1 == 1 {
                let index = w * WORD_BITS + i;
                image[index / 8] |= 1 << (7 - index % 8);
            }
        }
    }
    image
}
