//! MIC-1 microprogramming toolchain library.
//!
//! This crate implements the two halves of a MIC-1 toolchain:
//! 1. **Compiler:** A MAL (Micro Assembly Language) lexer, parser, and
//!    writer that resolves labels under the hardware placement constraints
//!    and emits a 512 x 36-bit binary control store.
//! 2. **Simulator:** A control-store decoder, the combinational ALU, and a
//!    cycle-accurate machine that executes IJVM macro-programs one
//!    microcycle per call against a byte-addressable memory/IO boundary.
//!
//! The binary control-store format is bit-exact with existing `.mic1`
//! images: each of the 512 microinstructions is packed MSB-first into a
//! 2304-byte buffer.

/// Shared error taxonomy and result alias.
pub mod common;
/// Machine configuration (initial register bases).
pub mod config;
/// MAL compiler: tokens, lexer, AST, parser, and the control-store writer.
pub mod mal;
/// MIC-1 simulator: decoder, ALU, machine, memory boundary, loader, dump.
pub mod mic;

/// Toolchain error type; every pipeline stage aborts with one of these.
pub use crate::common::error::Error;
/// Crate-wide result alias.
pub use crate::common::error::Result;
/// Machine construction parameters; use `Config::default()` for the
/// canonical register bases.
pub use crate::config::Config;
/// Compiles MAL source text into a program AST.
pub use crate::mal::parse;
/// Assembles a program AST into a packed control-store image.
pub use crate::mal::writer::assemble;
/// The cycle-accurate simulator; construct with `Machine::new`.
pub use crate::mic::machine::Machine;
