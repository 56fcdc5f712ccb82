//! MIC-1 simulator.
//!
//! This module implements the binary half of the toolchain. It provides:
//! 1. **Decoder:** Control-store words to typed microinstruction records.
//! 2. **ALU:** The pure combinational function at the processor's heart.
//! 3. **Machine:** Cycle-accurate processor state and the clock transition.
//! 4. **Memory:** The byte-addressable store and stream-I/O boundary.
//! 5. **Loader:** Macro-program header validation and memory population.
//! 6. **Dump:** The human-readable control-store rendering.

/// Combinational ALU function and its control codes.
pub mod alu;
/// Word layout, decoder, and control-store image access.
pub mod control;
/// Control-store dump rendering.
pub mod dump;
/// Macro-program loading.
pub mod loader;
/// Processor state and the per-cycle transition.
pub mod machine;
/// Byte-addressable memory and stream I/O boundary.
pub mod memory;

pub use control::DecodedInstruction;
pub use machine::Machine;
pub use memory::{MemoryBus, StreamMemory};
