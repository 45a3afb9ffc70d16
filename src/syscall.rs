//! Console syscalls, selected by the 3-bit function field of `syscall`.
//! Register 7 carries the argument or receives the result.

use log::trace;

use crate::console::Console;
use crate::cpu::{Cpu, MEMORY_WORDS};
use crate::error::MachineError;
use crate::reg;

pub type SyscallHandler = fn(&mut Cpu, &mut dyn Console) -> Result<(), MachineError>;

/// Indexed by function code. Code 7 is unassigned.
pub static SYSCALLS: [SyscallHandler; 7] = [
    exit,
    print_uint,
    print_char,
    print_string,
    read_uint,
    read_char,
    read_string,
];

pub fn invoke(cpu: &mut Cpu, console: &mut dyn Console, func: u32) -> Result<(), MachineError> {
    let handler = SYSCALLS
        .get(func as usize)
        .ok_or(MachineError::InvalidSyscall { func, pc: cpu.pc })?;
    trace!("syscall {} with r7 = {:#010x}", func, cpu.regs[reg::SYSCALL]);
    handler(cpu, console)
}

/// The execution loop halts on the canonical encoding before dispatch; any other
/// encoding of `syscall 0` lands here and does nothing.
fn exit(_: &mut Cpu, _: &mut dyn Console) -> Result<(), MachineError> {
    Ok(())
}

fn print_uint(cpu: &mut Cpu, console: &mut dyn Console) -> Result<(), MachineError> {
    console.write_str(&cpu.regs[reg::SYSCALL].to_string())?;
    Ok(())
}

/// Characters are 16-bit code units; lone surrogates print as U+FFFD.
fn code_unit(value: u32) -> char {
    char::from_u32(value & 0xFFFF).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn print_char(cpu: &mut Cpu, console: &mut dyn Console) -> Result<(), MachineError> {
    let c = code_unit(cpu.regs[reg::SYSCALL]);
    console.write_str(c.encode_utf8(&mut [0; 4]))?;
    Ok(())
}

/// Zero-terminated string at address r7; never reads past the end of memory.
fn print_string(cpu: &mut Cpu, console: &mut dyn Console) -> Result<(), MachineError> {
    let start = (cpu.regs[reg::SYSCALL] as usize).min(MEMORY_WORDS);
    let text: String = cpu.mem[start..]
        .iter()
        .take_while(|&&w| w != 0)
        .map(|&w| code_unit(w))
        .collect();
    console.write_str(&text)?;
    Ok(())
}

/// Leaves r7 untouched at end of input.
fn read_uint(cpu: &mut Cpu, console: &mut dyn Console) -> Result<(), MachineError> {
    let Some(line) = console.read_line()? else {
        return Ok(());
    };
    let value = line
        .trim()
        .parse::<u32>()
        .map_err(|source| MachineError::InvalidInteger { input: line.clone(), source })?;
    cpu.regs[reg::SYSCALL] = value;
    Ok(())
}

/// End of input reads as `u32::MAX`.
fn read_char(cpu: &mut Cpu, console: &mut dyn Console) -> Result<(), MachineError> {
    cpu.regs[reg::SYSCALL] = console.read_char()?.map_or(u32::MAX, u32::from);
    Ok(())
}

/// Stores one code point per word from address r7, dropping whatever does not fit.
fn read_string(cpu: &mut Cpu, console: &mut dyn Console) -> Result<(), MachineError> {
    let Some(line) = console.read_line()? else {
        return Ok(());
    };
    let start = (cpu.regs[reg::SYSCALL] as usize).min(MEMORY_WORDS);
    for (slot, c) in cpu.mem[start..].iter_mut().zip(line.chars()) {
        *slot = c as u32;
    }
    Ok(())
}
