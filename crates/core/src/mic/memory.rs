//! Byte-addressable memory and the stream I/O boundary.
//!
//! The machine talks to the outside world through [`MemoryBus`]: a sparse
//! byte store with derived big-endian 32-bit word access, plus single-byte
//! `input`/`output` ports used when the memory address register is negative
//! (the negative-address convention marks a memory-mapped I/O port rather
//! than RAM).

use std::collections::HashMap;
use std::io::{Read, Write};

use tracing::warn;

/// The memory/IO boundary the machine clocks against.
///
/// Word access is big-endian and word-addressed: word address `w` covers
/// byte addresses `4w .. 4w+3`.
pub trait MemoryBus {
    /// Reads the signed byte at a byte address; unwritten bytes read as 0.
    fn get8(&self, byte_address: i32) -> i8;

    /// Writes a byte at a byte address.
    fn set8(&mut self, byte_address: i32, value: i8);

    /// Reads one byte from the input port; -1 on end of input.
    fn input(&mut self) -> i32;

    /// Writes the low byte of `data` to the output port.
    fn output(&mut self, data: i32);

    /// Discards all stored bytes.
    fn clear(&mut self);

    /// Reads the byte at a byte address, zero-extended.
    fn get8_unsigned(&self, byte_address: i32) -> i32 {
        i32::from(self.get8(byte_address) as u8)
    }

    /// Reads the big-endian 32-bit word at a word address.
    fn get32(&self, word_address: i32) -> i32 {
        let byte_address = word_address << 2;
        (self.get8_unsigned(byte_address) << 24)
            + (self.get8_unsigned(byte_address + 1) << 16)
            + (self.get8_unsigned(byte_address + 2) << 8)
            + self.get8_unsigned(byte_address + 3)
    }

    /// Writes a big-endian 32-bit word at a word address.
    fn set32(&mut self, word_address: i32, value: i32) {
        let byte_address = word_address << 2;
        self.set8(byte_address, ((value >> 24) & 0xFF) as i8);
        self.set8(byte_address + 1, ((value >> 16) & 0xFF) as i8);
        self.set8(byte_address + 2, ((value >> 8) & 0xFF) as i8);
        self.set8(byte_address + 3, (value & 0xFF) as i8);
    }
}

/// Sparse memory backed by a hash map, with I/O ports wired to a reader and
/// a writer (typically stdin/stdout).
#[derive(Debug)]
pub struct StreamMemory<R, W> {
    cells: HashMap<i32, u8>,
    input: R,
    output: W,
}

impl<R, W> StreamMemory<R, W> {
    /// Creates an empty memory with the given I/O ports.
    pub fn new(input: R, output: W) -> Self {
        Self {
            cells: HashMap::new(),
            input,
            output,
        }
    }

    /// The output port's sink.
    pub const fn sink(&self) -> &W {
        &self.output
    }
}

impl<R: Read, W: Write> MemoryBus for StreamMemory<R, W> {
    fn get8(&self, byte_address: i32) -> i8 {
        self.cells.get(&byte_address).copied().unwrap_or(0) as i8
    }

    fn set8(&mut self, byte_address: i32, value: i8) {
        let _ = self.cells.insert(byte_address, value as u8);
    }

    fn input(&mut self) -> i32 {
        let mut byte = [0u8; 1];
        match self.input.read(&mut byte) {
            Ok(1) => i32::from(byte[0]),
            Ok(_) => -1,
            Err(error) => {
                warn!(%error, "input port read failed");
                -1
            }
        }
    }

    fn output(&mut self, data: i32) {
        let byte = [(data & 0xFF) as u8];
        if let Err(error) = self.output.write_all(&byte).and_then(|()| self.output.flush()) {
            warn!(%error, "output port write failed");
        }
    }

    fn clear(&mut self) {
        self.cells.clear();
    }
}
