//! The MIC-1 ALU.
//!
//! A stateless combinational mapping from the two input buses and the 6-bit
//! control field (F0,F1,ENA,ENB,INVA,INC) to an output word plus the N/Z
//! condition bits. Only 16 of the 64 control combinations are defined;
//! every other combination yields 0. All arithmetic wraps at 32 bits.

/// Identity of the A bus.
pub const IDENTITY_A: u8 = 0b01_10_00;
/// Identity of the B bus.
pub const IDENTITY_B: u8 = 0b01_01_00;
/// Bitwise complement of A.
pub const NOT_A: u8 = 0b01_10_10;
/// Bitwise complement of B.
pub const NOT_B: u8 = 0b10_11_00;
/// A + B.
pub const ADD: u8 = 0b11_11_00;
/// A + B + 1.
pub const ADD_INC: u8 = 0b11_11_01;
/// A + 1.
pub const INC_A: u8 = 0b11_10_01;
/// B + 1.
pub const INC_B: u8 = 0b11_01_01;
/// B - A.
pub const SUB: u8 = 0b11_11_11;
/// B - 1.
pub const DEC: u8 = 0b11_01_11;
/// -A.
pub const NEG_A: u8 = 0b11_10_11;
/// A AND B.
pub const AND: u8 = 0b00_11_00;
/// A OR B.
pub const OR: u8 = 0b01_11_00;
/// The constant 0.
pub const ZERO: u8 = 0b01_00_00;
/// The constant 1.
pub const ONE: u8 = 0b01_00_01;
/// The constant -1.
pub const MINUS_ONE: u8 = 0b01_00_10;

/// One ALU evaluation: the pre-shift output and its condition bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    /// The raw (pre-shift) output word.
    pub output: i32,
    /// output < 0.
    pub n: bool,
    /// output == 0.
    pub z: bool,
}

/// Evaluates the ALU for one cycle.
pub fn run(bus_a: i32, bus_b: i32, control: u8) -> AluOutput {
    let output = match control {
        IDENTITY_A => bus_a,
        IDENTITY_B => bus_b,
        NOT_A => !bus_a,
        NOT_B => !bus_b,
        ADD => bus_a.wrapping_add(bus_b),
        ADD_INC => bus_a.wrapping_add(bus_b).wrapping_add(1),
        INC_A => bus_a.wrapping_add(1),
        INC_B => bus_b.wrapping_add(1),
        SUB => bus_b.wrapping_sub(bus_a),
        DEC => bus_b.wrapping_sub(1),
        NEG_A => bus_a.wrapping_neg(),
        AND => bus_a & bus_b,
        OR => bus_a | bus_b,
        ZERO => 0,
        ONE => 1,
        MINUS_ONE => -1,
        _ => 0,
    };

    AluOutput {
        output,
        n: output < 0,
        z: output == 0,
    }
}
