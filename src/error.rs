use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions raised while the machine runs. None of them are recoverable:
/// the execution loop stops at the first one.
#[derive(Error, Debug)]
pub enum MachineError {
    #[error("invalid opcode {opcode} in word {word:#010x} at pc {pc}")]
    InvalidOpcode { opcode: u32, word: u32, pc: u32 },

    #[error("invalid syscall function {func} at pc {pc}")]
    InvalidSyscall { func: u32, pc: u32 },

    #[error("division by zero at pc {pc}")]
    DivisionByZero { pc: u32 },

    #[error("cannot parse {input:?} as an unsigned integer")]
    InvalidInteger {
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error("program of {words} words does not fit in memory")]
    ProgramTooLarge { words: usize },

    #[error("console I/O failed")]
    Io(#[from] io::Error),
}

/// Errors reading a program image from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read program image {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("program image is {bytes} bytes long, not a whole number of words")]
    Truncated { bytes: usize },
}
