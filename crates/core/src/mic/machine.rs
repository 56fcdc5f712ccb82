//! The MIC-1 machine.
//!
//! Holds the full processor state and advances it one microcycle per
//! [`Machine::clock`] call. Each cycle, in order:
//! 1. Fetch the microinstruction at MPC.
//! 2. Drive bus A from H and bus B from the selected register (0 when the
//!    select addresses none of the nine B-bus registers).
//! 3. Run the ALU, then the shifter; the shifted value is bus C.
//! 4. Service the *previous* cycle's latched memory request, then its
//!    latched fetch (one full cycle of memory latency between request and
//!    completion).
//! 5. Write bus C into every enabled register, then recompute N/Z from the
//!    post-shift value.
//! 6. Compute the next MPC from the jam bits; a microinstruction that jumps
//!    to itself halts the machine.
//! 7. Latch this cycle's own memory/fetch bits for the next cycle.

use tracing::trace;

use super::alu;
use super::control::{self, DecodedInstruction, Jam, MemoryOp, ShifterOp, CONTROL_STORE_WORDS};
use super::memory::MemoryBus;
use crate::common::Result;
use crate::config::Config;

/// B-bus register indices, matching the encoded 4-bit bus-B select.
pub mod bus {
    /// Memory data register.
    pub const MDR: usize = 0;
    /// Macro-program counter.
    pub const PC: usize = 1;
    /// Memory byte register, sign-extended.
    pub const MBR: usize = 2;
    /// Memory byte register, zero-extended.
    pub const MBRU: usize = 3;
    /// Stack pointer.
    pub const SP: usize = 4;
    /// Local variable frame pointer.
    pub const LV: usize = 5;
    /// Constant pool pointer.
    pub const CPP: usize = 6;
    /// Top-of-stack cache.
    pub const TOS: usize = 7;
    /// Old program counter / scratch register.
    pub const OPC: usize = 8;
}

/// A cycle-accurate MIC-1 processor wired to a memory/IO boundary.
#[derive(Debug)]
pub struct Machine<M> {
    store: Vec<DecodedInstruction>,
    memory: M,
    mpc: u16,
    /// The nine B-bus registers, indexed per [`bus`].
    regs: [i32; 9],
    h: i32,
    mar: i32,
    n: bool,
    z: bool,
    to_read: bool,
    to_write: bool,
    to_fetch: bool,
    halted: bool,
}

impl<M: MemoryBus> Machine<M> {
    /// Creates a machine in its initial state with the default register
    /// bases and an all-zero control store.
    pub fn new(memory: M) -> Self {
        Self::with_config(memory, &Config::default())
    }

    /// Creates a machine with explicit register bases.
    ///
    /// Initial state: PC = -1, SP/CPP/LV at their configured bases, every
    /// other register 0, flags clear, no pending requests, not halted.
    pub fn with_config(memory: M, config: &Config) -> Self {
        let mut regs = [0i32; 9];
        regs[bus::SP] = config.sp_base;
        regs[bus::CPP] = config.cpp_base;
        regs[bus::LV] = config.lv_base;
        regs[bus::PC] = -1;

        Self {
            store: vec![DecodedInstruction::default(); CONTROL_STORE_WORDS],
            memory,
            mpc: 0,
            regs,
            h: 0,
            mar: 0,
            n: false,
            z: false,
            to_read: false,
            to_write: false,
            to_fetch: false,
            halted: false,
        }
    }

    /// Decodes a packed control-store image into the instruction table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ControlStoreSize`] when the image is not
    /// exactly 2304 bytes.
    pub fn load_microcode(&mut self, image: &[u8]) -> Result<()> {
        for address in 0..CONTROL_STORE_WORDS {
            self.store[address] = DecodedInstruction::decode(control::word_at(image, address)?);
        }
        Ok(())
    }

    /// Advances the machine by one microcycle.
    pub fn clock(&mut self) {
        let instruction = self.store[usize::from(self.mpc)];

        let bus_b = match usize::from(instruction.bus_b) {
            index @ 0..=8 => self.regs[index],
            _ => 0,
        };
        let raw = alu::run(self.h, bus_b, instruction.alu_control).output;
        let bus_c = match instruction.shift {
            Some(ShifterOp::Left8) => raw << 8,
            Some(ShifterOp::Right1) => raw >> 1,
            None => raw,
        };

        self.service_memory();
        self.service_fetch();
        self.write_registers(&instruction, bus_c);

        self.n = bus_c < 0;
        self.z = bus_c == 0;

        let old = self.mpc;
        self.mpc = self.next_mpc(&instruction);
        self.halted = old == self.mpc;
        trace!(mpc = old, next = self.mpc, bus_c, "clock");

        match instruction.memory {
            Some(MemoryOp::Read) => self.to_read = true,
            Some(MemoryOp::Write) => self.to_write = true,
            None => {}
        }
        if instruction.fetch {
            self.to_fetch = true;
        }
    }

    /// Clocks the machine until it halts.
    pub fn run(&mut self) {
        while !self.halted {
            self.clock();
        }
    }

    /// Clocks the machine until it halts or MPC reaches `address`.
    pub fn run_until(&mut self, address: u16) {
        while !self.halted {
            self.clock();
            if self.mpc == address {
                return;
            }
        }
    }

    fn service_fetch(&mut self) {
        if !self.to_fetch {
            return;
        }
        let byte = self.memory.get8(self.regs[bus::PC]);
        self.regs[bus::MBR] = i32::from(byte);
        self.regs[bus::MBRU] = i32::from(byte as u8);
        self.to_fetch = false;
    }

    fn service_memory(&mut self) {
        if self.to_read {
            self.regs[bus::MDR] = if self.mar < 0 {
                self.memory.input()
            } else {
                self.memory.get32(self.mar)
            };
            self.to_read = false;
        } else if self.to_write {
            if self.mar < 0 {
                self.memory.output(self.regs[bus::MDR]);
            } else {
                self.memory.set32(self.mar, self.regs[bus::MDR]);
            }
            self.to_write = false;
        }
    }

    fn write_registers(&mut self, instruction: &DecodedInstruction, bus_c: i32) {
        // Enable order: H,OPC,TOS,CPP,LV,SP,PC,MDR,MAR.
        let [h, opc, tos, cpp, lv, sp, pc, mdr, mar] = instruction.enables;
        if h {
            self.h = bus_c;
        }
        if opc {
            self.regs[bus::OPC] = bus_c;
        }
        if tos {
            self.regs[bus::TOS] = bus_c;
        }
        if cpp {
            self.regs[bus::CPP] = bus_c;
        }
        if lv {
            self.regs[bus::LV] = bus_c;
        }
        if sp {
            self.regs[bus::SP] = bus_c;
        }
        if pc {
            self.regs[bus::PC] = bus_c;
        }
        if mdr {
            self.regs[bus::MDR] = bus_c;
        }
        if mar {
            self.mar = bus_c;
        }
    }

    fn next_mpc(&self, instruction: &DecodedInstruction) -> u16 {
        let next = match instruction.jam {
            Jam::None => instruction.next_address,
            Jam::Jmpc => instruction.next_address | (self.regs[bus::MBRU] as u16),
            Jam::Jamn => instruction.next_address + if self.n { 256 } else { 0 },
            Jam::Jamz => instruction.next_address + if self.z { 256 } else { 0 },
        };
        next & 0x1FF
    }

    /// Whether the machine has reached a self-jumping microinstruction.
    pub const fn halted(&self) -> bool {
        self.halted
    }

    /// The micro-program counter.
    pub const fn mpc(&self) -> u16 {
        self.mpc
    }

    /// The nine B-bus registers, indexed per [`bus`].
    pub const fn registers(&self) -> &[i32; 9] {
        &self.regs
    }

    /// The A-bus holding register.
    pub const fn h(&self) -> i32 {
        self.h
    }

    /// The memory address register.
    pub const fn mar(&self) -> i32 {
        self.mar
    }

    /// The negative flag, from the last cycle's bus-C value.
    pub const fn n(&self) -> bool {
        self.n
    }

    /// The zero flag, from the last cycle's bus-C value.
    pub const fn z(&self) -> bool {
        self.z
    }

    /// The attached memory/IO boundary.
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    /// Mutable access to the memory/IO boundary.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }
}
