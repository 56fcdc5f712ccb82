//! MAL (Micro Assembly Language) compiler.
//!
//! This module implements the textual half of the toolchain. It provides:
//! 1. **Lexer:** Source text to a flat token sequence.
//! 2. **Parser:** Tokens to an immutable program AST.
//! 3. **Writer:** Address allocation under the hardware placement
//!    constraints and bit-exact encoding into the binary control store.

/// Program AST: registers, operations, assignments, instructions.
pub mod ast;
/// Hand-rolled lexer for MAL source text.
pub mod lexer;
/// Recursive-descent parser producing a `Program`.
pub mod parser;
/// Token kinds and the token record.
pub mod token;
/// The assembler: label allocation and control-store encoding.
pub mod writer;

use crate::common::Result;
use ast::Program;

/// Compiles MAL source text into a program AST.
///
/// Convenience wrapper chaining the lexer and the parser.
///
/// # Errors
///
/// Returns a lex or parse error; neither stage attempts recovery.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    parser::Parser::new(tokens).parse()
}
