use log::{debug, log_enabled, trace};

use crate::codec::{self, HALT_WORD};
use crate::console::Console;
use crate::dispatch;
use crate::error::MachineError;
use crate::reg;

/// Memory size in words. Address fields are 8 bits, so every encodable address is in range.
pub const MEMORY_WORDS: usize = 256;

/// Execution starts 64 words into the image (256 bytes / 4).
pub const ENTRY_POINT: u32 = 256 / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// `pc` walked off the end of memory.
    PcExhausted,
    /// Fetched the exact halt literal.
    HaltInstruction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted(HaltReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub regs: [u32; reg::COUNT],
    pub hi: u32,
    pub lo: u32,
    /// Word index into `mem`, not a byte offset.
    pub pc: u32,
    pub mem: [u32; MEMORY_WORDS],
    /// Instructions dispatched so far.
    pub steps: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            regs: [0; reg::COUNT],
            hi: 0,
            lo: 0,
            pc: ENTRY_POINT,
            mem: [0; MEMORY_WORDS],
            steps: 0,
        }
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `program` into memory starting at word 0.
    pub fn load_program(&mut self, program: &[u32]) -> Result<(), MachineError> {
        if program.len() > MEMORY_WORDS {
            return Err(MachineError::ProgramTooLarge { words: program.len() });
        }
        self.mem[..program.len()].copy_from_slice(program);
        debug!("Loaded {} words, entry point {}", program.len(), self.pc);
        Ok(())
    }

    /// Register `index`, masked to the register file like a 3-bit field.
    #[inline]
    pub fn reg(&self, index: u8) -> u32 {
        self.regs[index as usize % reg::COUNT]
    }

    #[inline]
    pub fn set_reg(&mut self, index: u8, value: u32) {
        self.regs[index as usize % reg::COUNT] = value;
    }

    /// One fetch-decode-execute cycle.
    ///
    /// `pc` advances by one after every dispatched instruction, jumps included, so a
    /// taken branch to `addr` continues at `addr + 1`. Existing programs rely on this.
    pub fn step(&mut self, console: &mut dyn Console) -> Result<Status, MachineError> {
        let Some(&word) = self.mem.get(self.pc as usize) else {
            return Ok(Status::Halted(HaltReason::PcExhausted));
        };
        if word == HALT_WORD {
            return Ok(Status::Halted(HaltReason::HaltInstruction));
        }

        trace!("{:#04x}: {:#010x}  {}", self.pc, word, codec::disassemble(word));
        dispatch::dispatch(self, console, word)?;
        self.steps += 1;
        self.pc = self.pc.wrapping_add(1);
        Ok(Status::Running)
    }

    /// Steps until the machine halts or a fatal error occurs.
    pub fn run(&mut self, console: &mut dyn Console) -> Result<HaltReason, MachineError> {
        loop {
            if let Status::Halted(reason) = self.step(console)? {
                debug!("Halted at pc {} ({:?}) after {} instructions", self.pc, reason, self.steps);
                if log_enabled!(log::Level::Trace) {
                    self.dump_state();
                }
                return Ok(reason);
            }
        }
    }

    fn dump_state(&self) {
        trace!("Final register state:");
        for (i, value) in self.regs.iter().enumerate() {
            trace!("{} = {:#010x} ({})", reg::name(i as u8), value, value);
        }
        trace!("hi = {:#010x}, lo = {:#010x}", self.hi, self.lo);
    }
}
