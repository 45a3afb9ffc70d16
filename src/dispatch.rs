//! Opcode dispatch table.
//!
//! Each handler decodes its own operand layout from the raw word and mutates the
//! cpu in place. Handlers never touch `pc` except to set a jump target; the
//! execution loop adds the post-dispatch increment.

use crate::codec::{self, Fields, Opcode, LI_IMM_BITS, SI_IMM_BITS};
use crate::console::Console;
use crate::cpu::Cpu;
use crate::error::MachineError;

pub type Handler = fn(&mut Cpu, &mut dyn Console, u32) -> Result<(), MachineError>;

/// Indexed by opcode.
pub static OPCODES: [Handler; Opcode::COUNT] = [
    mov, and, or, not, add, sub, mul, div, mfhi, mflo, li, lw, si, sw, j, je, jne, jgt, jlt, jge,
    jle, syscall,
];

pub fn dispatch(cpu: &mut Cpu, console: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let opcode = codec::opcode(word);
    let handler = OPCODES.get(opcode as usize).ok_or(MachineError::InvalidOpcode {
        opcode,
        word,
        pc: cpu.pc,
    })?;
    handler(cpu, console, word)
}

/// Three-register ALU op: `dst = op(left, right)`.
fn binary(cpu: &mut Cpu, word: u32, op: impl Fn(u32, u32) -> u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (left, right, dst) = (f.reg(), f.reg(), f.reg());
    cpu.set_reg(dst, op(cpu.reg(left), cpu.reg(right)));
    Ok(())
}

fn mov(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (src, dst) = (f.reg(), f.reg());
    cpu.set_reg(dst, cpu.reg(src));
    Ok(())
}

fn and(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    binary(cpu, word, |l, r| l & r)
}

fn or(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    binary(cpu, word, |l, r| l | r)
}

fn not(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (src, dst) = (f.reg(), f.reg());
    cpu.set_reg(dst, !cpu.reg(src));
    Ok(())
}

fn add(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    binary(cpu, word, u32::wrapping_add)
}

fn sub(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    binary(cpu, word, u32::wrapping_sub)
}

fn mul(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (left, right) = (f.reg(), f.reg());
    let wide = cpu.reg(left) as u64 * cpu.reg(right) as u64;
    cpu.hi = (wide >> 32) as u32;
    cpu.lo = wide as u32;
    Ok(())
}

fn div(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (left, right) = (f.reg(), f.reg());
    let (dividend, divisor) = (cpu.reg(left), cpu.reg(right));
    if divisor == 0 {
        return Err(MachineError::DivisionByZero { pc: cpu.pc });
    }
    cpu.lo = dividend / divisor;
    cpu.hi = dividend % divisor;
    Ok(())
}

fn mfhi(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let dst = Fields::new(word).reg();
    cpu.set_reg(dst, cpu.hi);
    Ok(())
}

fn mflo(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let dst = Fields::new(word).reg();
    cpu.set_reg(dst, cpu.lo);
    Ok(())
}

fn li(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (dst, imm) = (f.reg(), f.take(LI_IMM_BITS));
    cpu.set_reg(dst, imm);
    Ok(())
}

fn lw(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (addr, dst) = (f.addr(), f.reg());
    cpu.set_reg(dst, cpu.mem[addr as usize]);
    Ok(())
}

fn si(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (addr, imm) = (f.addr(), f.take(SI_IMM_BITS));
    cpu.mem[addr as usize] = imm;
    Ok(())
}

fn sw(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (src, addr) = (f.reg(), f.addr());
    cpu.mem[addr as usize] = cpu.reg(src);
    Ok(())
}

fn j(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    cpu.pc = Fields::new(word).addr() as u32;
    Ok(())
}

/// Conditional jump: `if cond(src, tgt) { pc = addr }`.
fn branch(cpu: &mut Cpu, word: u32, cond: impl Fn(u32, u32) -> bool) -> Result<(), MachineError> {
    let mut f = Fields::new(word);
    let (src, tgt, addr) = (f.reg(), f.reg(), f.addr());
    if cond(cpu.reg(src), cpu.reg(tgt)) {
        cpu.pc = addr as u32;
    }
    Ok(())
}

fn je(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    branch(cpu, word, |a, b| a == b)
}

fn jne(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    branch(cpu, word, |a, b| a != b)
}

fn jgt(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    branch(cpu, word, |a, b| a > b)
}

fn jlt(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    branch(cpu, word, |a, b| a < b)
}

fn jge(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    branch(cpu, word, |a, b| a >= b)
}

fn jle(cpu: &mut Cpu, _: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    branch(cpu, word, |a, b| a <= b)
}

fn syscall(cpu: &mut Cpu, console: &mut dyn Console, word: u32) -> Result<(), MachineError> {
    let func = Fields::new(word).take(codec::FUNC_BITS);
    crate::syscall::invoke(cpu, console, func)
}
