//! Macro-program loading.
//!
//! A macro-program image is a big-endian header followed by two sections:
//! `[magic][constantPoolOrigin][constantPoolSize][bytes...]` then
//! `[textOrigin][textSize][bytes...]`. The two origins are fixed: the
//! constant pool lands at byte address 0x10000 and the text section at 0.

use tracing::debug;

use super::machine::Machine;
use super::memory::MemoryBus;
use crate::common::{Error, Result};
use crate::config::Config;

/// Magic number opening every macro-program image.
pub const MAGIC: u32 = 0x1DEA_DFAD;
/// Required constant pool origin (byte address).
pub const CONSTANT_POOL_ORIGIN: u32 = 0x0001_0000;
/// Required text section origin (byte address).
pub const TEXT_ORIGIN: u32 = 0;

/// Validates a macro-program image and copies its sections into memory.
///
/// # Errors
///
/// Returns [`Error::BadMagic`], [`Error::BadConstantPoolOrigin`], or
/// [`Error::BadTextOrigin`] on a header mismatch, and
/// [`Error::TruncatedProgram`] when the image ends before its declared
/// sections do.
pub fn load_program(memory: &mut impl MemoryBus, image: &[u8]) -> Result<()> {
    let mut reader = Reader { image, offset: 0 };

    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(Error::BadMagic(magic));
    }

    let pool_origin = reader.read_u32()?;
    if pool_origin != CONSTANT_POOL_ORIGIN {
        return Err(Error::BadConstantPoolOrigin(pool_origin));
    }
    let pool_size = reader.read_u32()?;
    reader.copy_section(memory, pool_origin, pool_size)?;

    let text_origin = reader.read_u32()?;
    if text_origin != TEXT_ORIGIN {
        return Err(Error::BadTextOrigin(text_origin));
    }
    let text_size = reader.read_u32()?;
    reader.copy_section(memory, text_origin, text_size)?;

    debug!(pool_size, text_size, "loaded macro-program");
    Ok(())
}

/// Loads a macro-program and a control-store image into a fresh machine.
///
/// # Errors
///
/// Propagates the header errors of [`load_program`] and the image-size
/// error of [`Machine::load_microcode`].
pub fn boot<M: MemoryBus>(
    mut memory: M,
    program: &[u8],
    microcode: &[u8],
    config: &Config,
) -> Result<Machine<M>> {
    load_program(&mut memory, program)?;
    let mut machine = Machine::with_config(memory, config);
    machine.load_microcode(microcode)?;
    Ok(machine)
}

/// Forward-only big-endian reader over a program image.
struct Reader<'a> {
    image: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn copy_section(
        &mut self,
        memory: &mut impl MemoryBus,
        origin: u32,
        size: u32,
    ) -> Result<()> {
        let bytes = self.take(size as usize)?;
        for (i, &byte) in bytes.iter().enumerate() {
            memory.set8(origin as i32 + i as i32, byte as i8);
        }
        Ok(())
    }

    fn take(&mut self, count: usize) -> Result<&'_ [u8]> {
        let end = self
            .offset
            .checked_add(count)
            .filter(|&end| end <= self.image.len())
            .ok_or(Error::TruncatedProgram)?;
        let bytes = &self.image[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }
}
