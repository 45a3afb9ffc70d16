//! A minimal fantasy processor: eight 32-bit registers, 256 words of memory and a
//! fixed 32-bit instruction set with console syscalls.

pub mod codec;
pub mod console;
pub mod cpu;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod reg;
pub mod syscall;

pub use codec::{Instruction, Opcode};
pub use console::{Console, IoConsole};
pub use cpu::{Cpu, HaltReason, Status};
pub use error::{LoadError, MachineError};
