//! Configuration for the simulated machine.
//!
//! This module defines the small set of parameters a `Machine` is built
//! with. The defaults match the canonical IJVM memory map; override them by
//! deserializing a JSON document (the CLI's `--config` flag) or by
//! constructing a `Config` directly.

use serde::Deserialize;

/// Default machine constants.
mod defaults {
    /// Initial stack pointer (word address of the operand stack base).
    pub const SP_BASE: i32 = 0x8000;

    /// Initial constant pool pointer (word address; byte address 0x10000,
    /// which is where the macro-program loader places the constant pool).
    pub const CPP_BASE: i32 = 0x4000;

    /// Initial local variable frame pointer (word address).
    pub const LV_BASE: i32 = 0xC000;
}

/// Machine construction parameters.
///
/// `PC` always starts at -1 and every other register at zero; only the
/// three segment bases are configurable.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial value of the SP register.
    pub sp_base: i32,
    /// Initial value of the CPP register.
    pub cpp_base: i32,
    /// Initial value of the LV register.
    pub lv_base: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sp_base: defaults::SP_BASE,
            cpp_base: defaults::CPP_BASE,
            lv_base: defaults::LV_BASE,
        }
    }
}
