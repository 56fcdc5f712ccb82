//! Shared fixtures and machine harness for the toolchain tests.

use std::io::Cursor;

use mic1_core::mic::{loader, StreamMemory};
use mic1_core::{assemble, parse, Config, Machine};

/// The canonical IJVM microcode (Tanenbaum's example, with the IO and halt
/// extensions at opcodes 0xFC-0xFF).
pub const CANONICAL_MICROCODE: &str = include_str!("../fixtures/ijvm.mal");

/// A machine wired to in-memory I/O ports.
pub type TestMemory = StreamMemory<Cursor<Vec<u8>>, Vec<u8>>;

/// Assembles MAL source text, panicking on any pipeline error.
pub fn assemble_source(source: &str) -> Vec<u8> {
    assemble(&parse(source).unwrap()).unwrap()
}

/// The canonical microcode assembled to a control-store image.
pub fn canonical_store() -> Vec<u8> {
    assemble_source(CANONICAL_MICROCODE)
}

/// Wraps raw bytecode in a macro-program image with an empty constant pool.
pub fn ijvm_image(text: &[u8]) -> Vec<u8> {
    ijvm_image_with_pool(&[], text)
}

/// Builds a macro-program image from a constant pool and a text section.
pub fn ijvm_image_with_pool(pool: &[u8], text: &[u8]) -> Vec<u8> {
    let mut image = Vec::new();
    image.extend_from_slice(&loader::MAGIC.to_be_bytes());
    image.extend_from_slice(&loader::CONSTANT_POOL_ORIGIN.to_be_bytes());
    image.extend_from_slice(&(pool.len() as u32).to_be_bytes());
    image.extend_from_slice(pool);
    image.extend_from_slice(&loader::TEXT_ORIGIN.to_be_bytes());
    image.extend_from_slice(&(text.len() as u32).to_be_bytes());
    image.extend_from_slice(text);
    image
}

/// Boots a machine running `text` against the canonical microcode, with
/// `input` available on the input port.
pub fn boot_canonical(text: &[u8], input: Vec<u8>) -> Machine<TestMemory> {
    let memory = StreamMemory::new(Cursor::new(input), Vec::new());
    loader::boot(
        memory,
        &ijvm_image(text),
        &canonical_store(),
        &Config::default(),
    )
    .unwrap()
}
