//! Unit tests for the MAL compiler.


/// Assembler tests: allocation order, placement, field encoding, and the
/// packed image format.
pub mod writer;
