//! MAL program AST.
//!
//! This module defines the immutable data model produced by the parser and
//! consumed by the writer. It provides:
//! 1. **Registers:** The fixed 13-member register set with writability and
//!    ALU-bus roles.
//! 2. **Operations:** The closed set of ALU operations the grammar accepts.
//! 3. **Statements:** Assignments, IO statements, control flow, and the
//!    instruction/program records.

/// Which ALU input bus a register can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusRole {
    /// The register drives bus A (only `H`).
    A,
    /// The register drives bus B through the 4-bit bus select.
    B,
}

/// The MIC-1 register set.
///
/// `MAR` and the condition registers `Z`/`N` are not bus-readable; `H` is
/// the only A-bus register; the remaining nine are B-bus registers with the
/// fixed select indices 0-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Memory address register (write-only target of bus C).
    Mar,
    /// Memory data register.
    Mdr,
    /// Macro-program counter.
    Pc,
    /// Memory byte register, sign-extended (not writable from bus C).
    Mbr,
    /// Memory byte register, zero-extended (not writable from bus C).
    Mbru,
    /// Stack pointer.
    Sp,
    /// Local variable frame pointer.
    Lv,
    /// Constant pool pointer.
    Cpp,
    /// Top-of-stack cache.
    Tos,
    /// Old program counter / scratch register.
    Opc,
    /// The A-bus holding register.
    H,
    /// Pseudo-target: route bus C through the zero flag.
    Z,
    /// Pseudo-target: route bus C through the negative flag.
    N,
}

impl Register {
    /// Resolves a register from its source-text name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "MAR" => Self::Mar,
            "MDR" => Self::Mdr,
            "PC" => Self::Pc,
            "MBR" => Self::Mbr,
            "MBRU" => Self::Mbru,
            "SP" => Self::Sp,
            "LV" => Self::Lv,
            "CPP" => Self::Cpp,
            "TOS" => Self::Tos,
            "OPC" => Self::Opc,
            "H" => Self::H,
            "Z" => Self::Z,
            "N" => Self::N,
            _ => return None,
        })
    }

    /// Whether the register may appear as an assignment target.
    pub const fn writable(self) -> bool {
        !matches!(self, Self::Mbr | Self::Mbru)
    }

    /// The ALU input bus this register can drive, if any.
    pub const fn bus_role(self) -> Option<BusRole> {
        match self {
            Self::H => Some(BusRole::A),
            Self::Mar | Self::Z | Self::N => None,
            _ => Some(BusRole::B),
        }
    }

    /// The register's 4-bit bus-B select index, for B-bus registers.
    pub const fn bus_b_index(self) -> Option<u8> {
        match self {
            Self::Mdr => Some(0),
            Self::Pc => Some(1),
            Self::Mbr => Some(2),
            Self::Mbru => Some(3),
            Self::Sp => Some(4),
            Self::Lv => Some(5),
            Self::Cpp => Some(6),
            Self::Tos => Some(7),
            Self::Opc => Some(8),
            _ => None,
        }
    }
}

/// The closed set of ALU operations expressible in MAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `H` or `SOURCE` passed through unchanged.
    Identity,
    /// `NOT H` or `NOT SOURCE`.
    Not,
    /// `H + SOURCE`.
    Add,
    /// `H + SOURCE + 1`.
    AddInc,
    /// `H + 1` or `SOURCE + 1`.
    Inc,
    /// `SOURCE - H`.
    Sub,
    /// `SOURCE - 1`.
    Dec,
    /// `-H`.
    Negate,
    /// `H AND SOURCE`.
    And,
    /// `H OR SOURCE`.
    Or,
    /// The constant `0`.
    ConstZero,
    /// The constant `1`.
    ConstOne,
    /// The constant `-1`.
    ConstMinusOne,
}

/// Shifter modifier suffix of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// `<< 8`: logical left shift by eight.
    Left8,
    /// `>> 1`: arithmetic right shift by one.
    Right1,
}

/// A (possibly chained) register assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Distinct writable target registers, in source order.
    pub targets: Vec<Register>,
    /// The ALU operation computing the assigned value.
    pub op: Operation,
    /// Operand registers: at most one A-bus and one B-bus term.
    pub operands: Vec<Register>,
    /// Optional shifter suffix.
    pub shift: Option<Shift>,
}

impl Assignment {
    /// The non-`H` operand register, i.e. the bus-B selection, if any.
    pub fn bus_b_operand(&self) -> Option<Register> {
        self.operands.iter().copied().find(|&r| r != Register::H)
    }

    /// Whether `H` appears among the operands (drives the A bus).
    pub fn uses_bus_a(&self) -> bool {
        self.operands.contains(&Register::H)
    }
}

/// Memory IO statement of an instruction; mutually exclusive pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// `rd`: load MDR from the word at MAR on the next cycle.
    Read,
    /// `wr`: store MDR to the word at MAR on the next cycle.
    Write,
}

/// Condition register tested by an if-statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Branch on the negative flag.
    N,
    /// Branch on the zero flag.
    Z,
}

/// Control statement of an instruction; at most one per instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFlow {
    /// `goto LABEL`: unconditional jump.
    Goto(String),
    /// `if (COND) goto L1; else goto L2`: conditional branch whose targets
    /// must end up exactly 256 words apart.
    If {
        /// The flag tested.
        cond: Condition,
        /// Target when the flag is set.
        true_label: String,
        /// Target when the flag is clear; carries the encoded address.
        false_label: String,
    },
    /// `goto (MBR [OR 0xHEX])`: multiway dispatch on the fetched byte.
    Multiway {
        /// Optional literal base OR'd with MBRU at runtime.
        base: Option<u16>,
    },
}

/// One parsed microinstruction line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instruction {
    /// Optional label naming this instruction's control-store slot.
    pub label: Option<String>,
    /// Optional memory IO statement.
    pub io: Option<IoOp>,
    /// Whether the instruction latches an opcode fetch.
    pub fetch: bool,
    /// Optional register assignment (absent for `nop` and bare gotos).
    pub assignment: Option<Assignment>,
    /// Optional control statement; absence means fall-through.
    pub control: Option<ControlFlow>,
    /// `nop` placeholder marker; mutually exclusive with an assignment.
    pub nop: bool,
}

/// A `.label NAME 0xHEX` directive anchoring a label to a literal slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDirective {
    /// The anchored label.
    pub name: String,
    /// The literal 9-bit control-store address.
    pub address: u16,
}

/// A parsed MAL program. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Instruction filled into every unused control-store slot, if declared.
    pub default: Option<Instruction>,
    /// Anchor directives, in source order.
    pub labels: Vec<LabelDirective>,
    /// Instructions, in source order.
    pub instructions: Vec<Instruction>,
}
