//! Bit-level instruction format.
//!
//! The opcode always sits in the top 5 bits. Operand fields follow directly below it
//! in encounter order; a field is read by shifting right by `32 - bits_consumed` and
//! masking to its width. Immediates that close a layout therefore occupy the low bits.

use std::fmt;

use crate::reg;

pub const OPCODE_BITS: u32 = 5;
pub const REG_BITS: u32 = 3;
pub const ADDR_BITS: u32 = 8;
pub const FUNC_BITS: u32 = 3;
pub const LI_IMM_BITS: u32 = 24;
pub const SI_IMM_BITS: u32 = 19;

/// `syscall 0` with every operand bit clear. The execution loop stops on this exact word.
pub const HALT_WORD: u32 = (Opcode::Syscall as u32) << (32 - OPCODE_BITS);

#[inline]
const fn mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

/// Opcode of a raw word. May be outside the defined range.
#[inline]
pub fn opcode(word: u32) -> u32 {
    (word >> (32 - OPCODE_BITS)) & mask(OPCODE_BITS)
}

/// Reads operand fields of one word from the top down.
#[derive(Debug, Clone, Copy)]
pub struct Fields {
    word: u32,
    consumed: u32,
}

impl Fields {
    pub fn new(word: u32) -> Self {
        Self { word, consumed: OPCODE_BITS }
    }

    pub fn take(&mut self, width: u32) -> u32 {
        self.consumed += width;
        debug_assert!(self.consumed <= 32, "field layout overruns the word");
        (self.word >> (32 - self.consumed)) & mask(width)
    }

    pub fn reg(&mut self) -> u8 {
        self.take(REG_BITS) as u8
    }

    pub fn addr(&mut self) -> u8 {
        self.take(ADDR_BITS) as u8
    }
}

/// Inverse of [`Fields`]: packs operands below an opcode in the same order.
#[derive(Debug, Clone, Copy)]
pub struct Packer {
    word: u32,
    used: u32,
}

impl Packer {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            word: (opcode as u32) << (32 - OPCODE_BITS),
            used: OPCODE_BITS,
        }
    }

    pub fn put(mut self, width: u32, value: u32) -> Self {
        self.used += width;
        debug_assert!(self.used <= 32, "field layout overruns the word");
        self.word |= (value & mask(width)) << (32 - self.used);
        self
    }

    pub fn reg(self, index: u8) -> Self {
        self.put(REG_BITS, index as u32)
    }

    pub fn addr(self, address: u8) -> Self {
        self.put(ADDR_BITS, address as u32)
    }

    pub fn finish(self) -> u32 {
        self.word
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Mov = 0,
    And = 1,
    Or = 2,
    Not = 3,
    Add = 4,
    Sub = 5,
    Mul = 6,
    Div = 7,
    Mfhi = 8,
    Mflo = 9,
    Li = 10,
    Lw = 11,
    Si = 12,
    Sw = 13,
    J = 14,
    Je = 15,
    Jne = 16,
    Jgt = 17,
    Jlt = 18,
    Jge = 19,
    Jle = 20,
    Syscall = 21,
}

impl Opcode {
    pub const COUNT: usize = 22;

    pub const ALL: [Opcode; Self::COUNT] = [
        Opcode::Mov,
        Opcode::And,
        Opcode::Or,
        Opcode::Not,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mfhi,
        Opcode::Mflo,
        Opcode::Li,
        Opcode::Lw,
        Opcode::Si,
        Opcode::Sw,
        Opcode::J,
        Opcode::Je,
        Opcode::Jne,
        Opcode::Jgt,
        Opcode::Jlt,
        Opcode::Jge,
        Opcode::Jle,
        Opcode::Syscall,
    ];

    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Mov => "mov",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Not => "not",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mfhi => "mfhi",
            Opcode::Mflo => "mflo",
            Opcode::Li => "li",
            Opcode::Lw => "lw",
            Opcode::Si => "si",
            Opcode::Sw => "sw",
            Opcode::J => "j",
            Opcode::Je => "je",
            Opcode::Jne => "jne",
            Opcode::Jgt => "jgt",
            Opcode::Jlt => "jlt",
            Opcode::Jge => "jge",
            Opcode::Jle => "jle",
            Opcode::Syscall => "syscall",
        }
    }
}

/// Typed view of an instruction word. Unused low bits are not represented, so
/// `encode` always yields the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Mov { src: u8, dst: u8 },
    And { left: u8, right: u8, dst: u8 },
    Or { left: u8, right: u8, dst: u8 },
    Not { src: u8, dst: u8 },
    Add { left: u8, right: u8, dst: u8 },
    Sub { left: u8, right: u8, dst: u8 },
    Mul { left: u8, right: u8 },
    Div { left: u8, right: u8 },
    Mfhi { dst: u8 },
    Mflo { dst: u8 },
    Li { dst: u8, imm: u32 },
    Lw { addr: u8, dst: u8 },
    Si { addr: u8, imm: u32 },
    Sw { src: u8, addr: u8 },
    J { addr: u8 },
    Je { src: u8, tgt: u8, addr: u8 },
    Jne { src: u8, tgt: u8, addr: u8 },
    Jgt { src: u8, tgt: u8, addr: u8 },
    Jlt { src: u8, tgt: u8, addr: u8 },
    Jge { src: u8, tgt: u8, addr: u8 },
    Jle { src: u8, tgt: u8, addr: u8 },
    Syscall { func: u8 },
}

impl Instruction {
    pub const HALT: Instruction = Instruction::Syscall { func: 0 };

    pub fn decode(word: u32) -> Option<Self> {
        use Instruction::*;

        let op = Opcode::from_u32(opcode(word))?;
        let mut f = Fields::new(word);
        // struct expressions evaluate their fields in source order
        Some(match op {
            Opcode::Mov => Mov { src: f.reg(), dst: f.reg() },
            Opcode::And => And { left: f.reg(), right: f.reg(), dst: f.reg() },
            Opcode::Or => Or { left: f.reg(), right: f.reg(), dst: f.reg() },
            Opcode::Not => Not { src: f.reg(), dst: f.reg() },
            Opcode::Add => Add { left: f.reg(), right: f.reg(), dst: f.reg() },
            Opcode::Sub => Sub { left: f.reg(), right: f.reg(), dst: f.reg() },
            Opcode::Mul => Mul { left: f.reg(), right: f.reg() },
            Opcode::Div => Div { left: f.reg(), right: f.reg() },
            Opcode::Mfhi => Mfhi { dst: f.reg() },
            Opcode::Mflo => Mflo { dst: f.reg() },
            Opcode::Li => Li { dst: f.reg(), imm: f.take(LI_IMM_BITS) },
            Opcode::Lw => Lw { addr: f.addr(), dst: f.reg() },
            Opcode::Si => Si { addr: f.addr(), imm: f.take(SI_IMM_BITS) },
            Opcode::Sw => Sw { src: f.reg(), addr: f.addr() },
            Opcode::J => J { addr: f.addr() },
            Opcode::Je => Je { src: f.reg(), tgt: f.reg(), addr: f.addr() },
            Opcode::Jne => Jne { src: f.reg(), tgt: f.reg(), addr: f.addr() },
            Opcode::Jgt => Jgt { src: f.reg(), tgt: f.reg(), addr: f.addr() },
            Opcode::Jlt => Jlt { src: f.reg(), tgt: f.reg(), addr: f.addr() },
            Opcode::Jge => Jge { src: f.reg(), tgt: f.reg(), addr: f.addr() },
            Opcode::Jle => Jle { src: f.reg(), tgt: f.reg(), addr: f.addr() },
            Opcode::Syscall => Syscall { func: f.take(FUNC_BITS) as u8 },
        })
    }

    pub fn opcode(&self) -> Opcode {
        use Instruction::*;

        match self {
            Mov { .. } => Opcode::Mov,
            And { .. } => Opcode::And,
            Or { .. } => Opcode::Or,
            Not { .. } => Opcode::Not,
            Add { .. } => Opcode::Add,
            Sub { .. } => Opcode::Sub,
            Mul { .. } => Opcode::Mul,
            Div { .. } => Opcode::Div,
            Mfhi { .. } => Opcode::Mfhi,
            Mflo { .. } => Opcode::Mflo,
            Li { .. } => Opcode::Li,
            Lw { .. } => Opcode::Lw,
            Si { .. } => Opcode::Si,
            Sw { .. } => Opcode::Sw,
            J { .. } => Opcode::J,
            Je { .. } => Opcode::Je,
            Jne { .. } => Opcode::Jne,
            Jgt { .. } => Opcode::Jgt,
            Jlt { .. } => Opcode::Jlt,
            Jge { .. } => Opcode::Jge,
            Jle { .. } => Opcode::Jle,
            Syscall { .. } => Opcode::Syscall,
        }
    }

    pub fn encode(&self) -> u32 {
        use Instruction::*;

        let p = Packer::new(self.opcode());
        let packed = match *self {
            Mov { src, dst } | Not { src, dst } => p.reg(src).reg(dst),
            And { left, right, dst }
            | Or { left, right, dst }
            | Add { left, right, dst }
            | Sub { left, right, dst } => p.reg(left).reg(right).reg(dst),
            Mul { left, right } | Div { left, right } => p.reg(left).reg(right),
            Mfhi { dst } | Mflo { dst } => p.reg(dst),
            Li { dst, imm } => p.reg(dst).put(LI_IMM_BITS, imm),
            Lw { addr, dst } => p.addr(addr).reg(dst),
            Si { addr, imm } => p.addr(addr).put(SI_IMM_BITS, imm),
            Sw { src, addr } => p.reg(src).addr(addr),
            J { addr } => p.addr(addr),
            Je { src, tgt, addr }
            | Jne { src, tgt, addr }
            | Jgt { src, tgt, addr }
            | Jlt { src, tgt, addr }
            | Jge { src, tgt, addr }
            | Jle { src, tgt, addr } => p.reg(src).reg(tgt).addr(addr),
            Syscall { func } => p.put(FUNC_BITS, func as u32),
        };
        packed.finish()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        let m = self.opcode().mnemonic();
        let r = reg::name;
        match *self {
            Mov { src, dst } | Not { src, dst } => write!(f, "{m} {}, {}", r(src), r(dst)),
            And { left, right, dst }
            | Or { left, right, dst }
            | Add { left, right, dst }
            | Sub { left, right, dst } => {
                write!(f, "{m} {}, {}, {}", r(left), r(right), r(dst))
            }
            Mul { left, right } | Div { left, right } => write!(f, "{m} {}, {}", r(left), r(right)),
            Mfhi { dst } | Mflo { dst } => write!(f, "{m} {}", r(dst)),
            Li { dst, imm } => write!(f, "{m} {}, {imm}", r(dst)),
            Lw { addr, dst } => write!(f, "{m} [{addr:#04x}], {}", r(dst)),
            Si { addr, imm } => write!(f, "{m} [{addr:#04x}], {imm}"),
            Sw { src, addr } => write!(f, "{m} {}, [{addr:#04x}]", r(src)),
            J { addr } => write!(f, "{m} {addr:#04x}"),
            Je { src, tgt, addr }
            | Jne { src, tgt, addr }
            | Jgt { src, tgt, addr }
            | Jlt { src, tgt, addr }
            | Jge { src, tgt, addr }
            | Jle { src, tgt, addr } => write!(f, "{m} {}, {}, {addr:#04x}", r(src), r(tgt)),
            Syscall { func } => write!(f, "{m} {func}"),
        }
    }
}

pub fn disassemble(word: u32) -> String {
    match Instruction::decode(word) {
        Some(inst) => inst.to_string(),
        None => format!(".word {word:#010x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halt_word_bit_pattern() {
        assert_eq!(HALT_WORD, 0b10101_000_000000000000000000000000);
        assert_eq!(HALT_WORD, 0xA800_0000);
        assert_eq!(Instruction::HALT.encode(), HALT_WORD);
    }

    #[test]
    fn test_fields_follow_opcode_in_encounter_order() {
        // add r5, r3 -> r6
        let word = (4 << 27) | (5 << 24) | (3 << 21) | (6 << 18);
        let mut f = Fields::new(word);
        assert_eq!(opcode(word), 4);
        assert_eq!(f.reg(), 5, "left operand should be bits 26..24");
        assert_eq!(f.reg(), 3, "right operand should be bits 23..21");
        assert_eq!(f.reg(), 6, "destination should be bits 20..18");
    }

    #[test]
    fn test_li_immediate_is_low_24_bits() {
        let word = (10 << 27) | (2 << 24) | 0x00AB_CDEF;
        assert_eq!(Instruction::decode(word), Some(Instruction::Li { dst: 2, imm: 0xAB_CDEF }));
        assert_eq!(Instruction::Li { dst: 2, imm: 0xAB_CDEF }.encode(), word);
    }

    #[test]
    fn test_si_immediate_is_low_19_bits() {
        let word = (12 << 27) | (0xFE << 19) | 0x7_FFFF;
        assert_eq!(Instruction::decode(word), Some(Instruction::Si { addr: 0xFE, imm: 0x7_FFFF }));
        // immediates wider than the field are truncated on encode
        assert_eq!(Instruction::Si { addr: 0xFE, imm: 0xFFFF_FFFF }.encode(), word);
    }

    #[test]
    fn test_memory_layouts() {
        // lw [0x2a] -> r3: address before register
        let lw = (11 << 27) | (0x2A << 19) | (3 << 16);
        assert_eq!(Instruction::decode(lw), Some(Instruction::Lw { addr: 0x2A, dst: 3 }));
        // sw r3 -> [0x2a]: register before address
        let sw = (13 << 27) | (3 << 24) | (0x2A << 16);
        assert_eq!(Instruction::decode(sw), Some(Instruction::Sw { src: 3, addr: 0x2A }));
    }

    #[test]
    fn test_branch_layout() {
        let word = Instruction::Jle { src: 1, tgt: 7, addr: 0xC8 }.encode();
        assert_eq!(word, (20 << 27) | (1 << 24) | (7 << 21) | (0xC8 << 13));
    }

    #[test]
    fn test_decode_ignores_unused_low_bits() {
        let word = HALT_WORD | 0x1;
        assert_eq!(Instruction::decode(word), Some(Instruction::HALT));
        assert_ne!(word, HALT_WORD);
    }

    #[test]
    fn test_unknown_opcodes_do_not_decode() {
        for op in Opcode::COUNT as u32..32 {
            assert_eq!(Instruction::decode(op << 27), None, "opcode {op} should be invalid");
        }
        assert_eq!(disassemble(0xF800_0000), ".word 0xf8000000");
    }

    #[test]
    fn test_opcode_table_is_dense() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(*op as usize, i);
            assert_eq!(Opcode::from_u32(i as u32), Some(*op));
        }
    }

    #[test]
    fn test_disassembly() {
        let cases = [
            (Instruction::Add { left: 0, right: 1, dst: 2 }, "add r0, r1, r2"),
            (Instruction::Mov { src: 2, dst: 7 }, "mov r2, r7"),
            (Instruction::Li { dst: 0, imm: 5 }, "li r0, 5"),
            (Instruction::Lw { addr: 12, dst: 3 }, "lw [0x0c], r3"),
            (Instruction::Sw { src: 1, addr: 16 }, "sw r1, [0x10]"),
            (Instruction::Je { src: 1, tgt: 2, addr: 0x4A }, "je r1, r2, 0x4a"),
            (Instruction::Syscall { func: 3 }, "syscall 3"),
        ];
        for (inst, text) in cases {
            assert_eq!(inst.to_string(), text);
            assert_eq!(disassemble(inst.encode()), text);
        }
    }
}
