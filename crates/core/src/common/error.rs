//! Toolchain error definitions.
//!
//! This module defines the error taxonomy for every pipeline stage. It covers:
//! 1. **Lexing:** Unterminated two-character operators and stray characters.
//! 2. **Parsing:** Unexpected tokens and malformed operand combinations.
//! 3. **Assembly:** Address allocation failures and unresolved labels.
//! 4. **Loading:** Macro-program header and control-store image mismatches.
//!
//! None of these are recoverable mid-operation: each aborts its pipeline
//! stage without producing a partial artifact. The simulator itself raises
//! no runtime errors; every control-store word is well-formed by
//! construction and a self-jump is a normal terminal state.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal toolchain errors, one variant per failure class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Tokenization failed at the given byte offset of the source text.
    #[error("lex error at byte {position}: {reason}")]
    Lex {
        /// Byte offset into the source where lexing stopped.
        position: usize,
        /// Human-readable cause.
        reason: String,
    },

    /// Parsing failed at the given token index.
    #[error("parse error at token {token_index}: {reason}")]
    Parse {
        /// Index of the offending token in the token stream.
        token_index: usize,
        /// Human-readable cause.
        reason: String,
    },

    /// No free (f, f+256) address pair remains for an if-statement.
    ///
    /// The JAMN/JAMZ mechanism can only add a fixed offset of 256 to the
    /// encoded next-address, so both halves of the pair must be free.
    #[error("no free conditional-branch address pair (f, f+256) remains in the control store")]
    AddressPairExhausted,

    /// A control statement names a label that is never bound to an address.
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),

    /// Every control-store word is already occupied; no address remains for
    /// an unanchored instruction or label.
    #[error("control store has no unused words left")]
    StoreExhausted,

    /// A label directive's address does not fit the 512-word control store.
    #[error("label address {0:#x} exceeds the 9-bit control-store range")]
    AddressOutOfRange(u32),

    /// The macro-program image does not start with the IJVM magic number.
    #[error("bad macro-program magic {0:#010x}, expected 0x1deadfad")]
    BadMagic(u32),

    /// The macro-program's constant pool origin is not the fixed value.
    #[error("constant pool origin must be 0x00010000, found {0:#010x}")]
    BadConstantPoolOrigin(u32),

    /// The macro-program's text origin is not zero.
    #[error("text origin must be 0x00000000, found {0:#010x}")]
    BadTextOrigin(u32),

    /// The macro-program image ends before its declared sections do.
    #[error("macro-program image is truncated")]
    TruncatedProgram,

    /// A control-store image is not exactly 512 x 36 bits (2304 bytes).
    #[error("control store image is {0} bytes, expected 2304")]
    ControlStoreSize(usize),
}
